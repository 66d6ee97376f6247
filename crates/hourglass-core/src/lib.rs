//! hourglass-core — turn handling and background coordination, no UI.
//!
//! Every message turn resets a per-conversation SignalFlag, starts a typing
//! indicator and a delayed completion in the background, and replies
//! immediately. Frontends (TUI, Web) receive outgoing activities from a
//! `BroadcastChannel` via tokio::broadcast.

pub mod bot;
pub mod channel;
pub mod config;
pub mod coordinator;
pub mod delay;
pub mod error;
pub mod events;
pub mod signal;
pub mod store;
pub mod supervisor;
pub mod types;
pub mod workers;

#[cfg(test)]
mod testing;
