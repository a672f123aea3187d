pub mod order;
pub mod pair;
pub mod signal;

pub use order::{CloseLeg, CloseOrderType, ConditionalClose, OrderRequest};
pub use pair::PairInfo;
pub use signal::{ExitLevels, Side, Signal, SignalError, WebhookPayload};
