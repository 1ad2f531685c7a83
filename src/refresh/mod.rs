pub mod engine;
pub mod retry;

pub use engine::{RefreshEngine, RefreshOutcome};
pub use retry::{AttemptOutcome, RetryPolicy};
