//! Core types for the lxshell application shell
//!
//! This crate provides the foundational pieces shared by the shell and its
//! host: the engine call boundary, run-state and surface types, error
//! handling, configuration, and logging infrastructure.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod null_engine;
pub mod state;
pub mod surface;

pub use config::{BackgroundPolicy, Config};
pub use engine::{Engine, EngineHandle};
pub use error::{EngineFault, Result, ShellError};
pub use null_engine::NullEngine;
pub use state::RunState;
pub use surface::{PixelFormat, SurfaceDesc, SurfaceHandle};
