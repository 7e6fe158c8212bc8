//! Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::gpu::TextureWrap;
use crate::projection::ProjectionMode;

/// Shader used when no path is configured.
pub const DEFAULT_SHADER_PATH: &str = "res/shaders/basic.shader";

/// Settings a [`GraphicsEngine`](crate::engine::GraphicsEngine) is built from.
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annotated single-file shader with `u_MVP`, `u_Color` and `u_Texture` uniforms.
    pub shader_path: PathBuf,
    pub projection: ProjectionMode,
    /// Wrap mode of every texture the engine loads.
    pub texture_wrap: TextureWrap,
    /// When set, a cube mesh textured with this image is built at construction and can
    /// be drawn any number of times through `draw_shared_cube`.
    pub shared_cube_texture: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shader_path: PathBuf::from(DEFAULT_SHADER_PATH),
            projection: ProjectionMode::default(),
            texture_wrap: TextureWrap::default(),
            shared_cube_texture: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.shader_path, PathBuf::from(DEFAULT_SHADER_PATH));
        assert_eq!(config.projection, ProjectionMode::Orthographic);
    }

    #[test]
    fn fields_parse_in_snake_case() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "projection": "perspective",
                "texture_wrap": { "clamp_to_border": [1.0, 0.0, 1.0, 1.0] },
                "shared_cube_texture": "res/textures/checker.png"
            }"#,
        )
        .unwrap();
        assert_eq!(config.projection, ProjectionMode::Perspective);
        assert_eq!(config.texture_wrap, TextureWrap::ClampToBorder([1.0, 0.0, 1.0, 1.0]));
        assert_eq!(
            config.shared_cube_texture,
            Some(PathBuf::from("res/textures/checker.png"))
        );

        let repeat: EngineConfig = serde_json::from_str(r#"{ "texture_wrap": "repeat" }"#).unwrap();
        assert_eq!(repeat.texture_wrap, TextureWrap::Repeat);
    }
}
