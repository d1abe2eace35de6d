//! CLI support for the `dindex` binary.

pub mod commands;

pub use commands::{replay_file, Replay, ReplayEvent};
