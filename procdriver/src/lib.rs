//! Helpers for spawning and driving child processes: configurable working
//! directory, environment, and stream redirection; input feeding; ordered
//! output collection or streaming callbacks; a wall-clock timeout; and
//! signal-resilient reaping.
//!
//! The heart of the crate is [`ProcessRunner`]. It pumps a child's three
//! standard streams on concurrent tasks while re-linearizing stdout and
//! stderr through a single-slot hand-off queue drained on the calling task,
//! so caller callbacks never observe any concurrency even though production
//! is concurrent.

pub mod child;
pub mod command;
pub mod config;
pub mod error;
pub mod output;
mod pump;
pub mod redirect;
pub mod runner;
#[cfg(unix)]
mod signal;

pub use child::ChildProcess;
pub use command::Command;
pub use config::{EnvProvider, InvokeConfig, SystemEnv};
pub use error::{InvokeError, Result};
pub use output::{OutputChunk, RunOutput, StreamChannel};
pub use redirect::{OutputSink, StdinSource};
pub use runner::ProcessRunner;
