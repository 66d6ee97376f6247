//! The two per-turn background workers. They never talk to each other
//! directly; the only link between them is the SignalFlag in the store.

pub mod completion;
pub mod indicator;

pub use completion::{CompletionOutcome, CompletionWorker};
pub use indicator::{IndicatorWorker, PollResult, StopReason};
