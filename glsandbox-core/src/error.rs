//! Error type shared by every fallible operation of the core.

use std::path::PathBuf;

use crate::engine::ObjectId;
use crate::gpu::ShaderStage;

/// Everything that can go wrong while building or drawing GPU resources.
#[derive(Debug)]
pub enum EngineError {
    /// The shader source file could not be read.
    ShaderRead { path: PathBuf, source: std::io::Error },
    /// A shader source did not contain the given stage.
    MissingShaderStage(ShaderStage),
    /// The driver rejected one stage.
    ShaderCompile { stage: ShaderStage, log: String },
    /// Both stages compiled but the program failed to link.
    ShaderLink(String),
    /// The driver refused to hand out a new object name.
    GpuAllocation(String),
    /// The texture file could not be opened or decoded.
    TextureLoad { path: PathBuf, source: image::ImageError },
    /// The id was never issued by this engine or has been released.
    UnknownObject(ObjectId),
    /// The engine was configured without a shared cube mesh.
    SharedMeshUnavailable,
    /// The context reported an error after `call`. `code` is the first one pending.
    Gpu { call: &'static str, code: u32 },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::ShaderRead { path, source } => {
                write!(f, "failed to read shader '{}': {}", path.display(), source)
            }
            EngineError::MissingShaderStage(stage) => {
                write!(f, "shader source has no {} section", stage)
            }
            EngineError::ShaderCompile { stage, log } => {
                write!(f, "failed to compile {} shader: {}", stage, log.trim_end())
            }
            EngineError::ShaderLink(log) => {
                write!(f, "failed to link shader program: {}", log.trim_end())
            }
            EngineError::GpuAllocation(reason) => write!(f, "GPU allocation failed: {}", reason),
            EngineError::TextureLoad { path, source } => {
                write!(f, "failed to load texture '{}': {}", path.display(), source)
            }
            EngineError::UnknownObject(id) => write!(f, "no object registered under {}", id),
            EngineError::SharedMeshUnavailable => {
                write!(f, "no shared cube mesh was configured for this engine")
            }
            EngineError::Gpu { call, code } => {
                write!(f, "OpenGL error 0x{:04X} after {}", code, call)
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::ShaderRead { source, .. } => Some(source),
            EngineError::TextureLoad { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
