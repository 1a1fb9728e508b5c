//! Hosted engine for the ball-lock machine.
//!
//! The machine itself is synchronous and clock-agnostic. This module gives it
//! a home on the tokio runtime:
//! - **Commands**: API requests and switch events queue on one channel
//! - **Time**: a tokio interval advances the machine's timer queue
//! - **Ball search**: polled every tick once the playfield goes quiet
//! - **Feed lane**: simulated, reporting launches back as commands

mod handle;
mod launcher;
mod runner;
mod search;
mod types;

pub use handle::EngineHandle;
pub use launcher::SimulatedLauncher;
pub use runner::{spawn_engine, Engine, EngineDeps};
pub use search::BallSearchSchedule;
pub use types::{EngineCommand, EngineError};
