//! Real-time frequency sweep generator.
//!
//! The [`engine`] produces a sine carrier whose frequency follows a periodic
//! sweep between two bounds. Parameters can be changed from any thread while
//! audio is being rendered; see [`engine::Engine`] for the command side and
//! [`engine::Renderer`] for the audio callback side.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod misc;

pub use engine::{Engine, EngineOptions, Profile, Renderer, State, SweepMode};
pub use error::{EngineError, ErrorKind, Result};
