//! Temperature control of a peltier chamber driven by an LT8722.
//!
//! [`pid`] holds the adaptive PID engine, [`control`] runs it against the
//! hardware once per tick, and [`host`] speaks the serial text protocol.

pub mod config;
pub mod control;
pub mod history;
pub mod host;
pub mod pid;
pub mod table;

pub use config::PidConfig;
pub use control::{Chamber, TickError, TickReport};
pub use pid::{AdaptivePid, ControlOutput, ControlState};
