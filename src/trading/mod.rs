pub mod dedup;
pub mod executor;
pub mod sizing;
pub mod trade_record;

pub use executor::{ExecutionOutcome, SignalExecutor};
pub use trade_record::{TradeLog, TradeLogRecord};
