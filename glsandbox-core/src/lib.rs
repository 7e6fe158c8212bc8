//! The core of the glsandbox renderer. This crate owns every GPU resource a scene needs
//! and hands out [`ObjectId`]s in exchange, so a frontend only deals with ids, model
//! matrices and colors.
//!
//! All GPU access goes through the [`gpu::Gpu`] trait. Use `glow::Context` for a real
//! window, or [`gpu::HeadlessGpu`] to run the same code without one.

pub mod abs;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod primitives;
pub mod projection;

pub use config::EngineConfig;
pub use engine::{GraphicsEngine, ObjectId};
pub use error::{EngineError, Result};
pub use primitives::{CubeFaces, Primitive, ScreenObject};
pub use projection::{FramebufferSize, Projection, ProjectionMode};
