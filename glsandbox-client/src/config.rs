//! Sandbox configuration, read from a JSON file.

use std::path::{Path, PathBuf};

use glsandbox_core::EngineConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "OpenGL Window".to_string(),
            width: 940,
            height: 680,
            vsync: true,
        }
    }
}

/// Everything the sandbox reads at startup. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub window: WindowConfig,
    pub engine: EngineConfig,
    /// Full-screen shader drawn behind every object. No background pass when unset.
    pub background_shader: Option<PathBuf>,
    pub object_texture: PathBuf,
    pub clear_color: [f32; 4],
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            engine: EngineConfig::default(),
            background_shader: Some(PathBuf::from("res/shaders/background.shader")),
            object_texture: PathBuf::from("res/textures/checker.png"),
            clear_color: [0.1, 0.1, 0.2, 1.0],
        }
    }
}

impl SandboxConfig {
    pub fn from_json(s: &str) -> Result<Self, String> {
        serde_json::from_str(s).map_err(|e| e.to_string())
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
        Self::from_json(&s).map_err(|e| format!("Invalid config '{}': {}", path.display(), e))
    }

    /// `<config dir>/glsandbox/config.json`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("glsandbox").join("config.json"))
    }

    /// Loads the file named on the command line, else the per-user file if it exists,
    /// else the defaults. An explicitly named file must exist and parse.
    pub fn load(arg: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = arg {
            log::info!("Loading config from {}", path.display());
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => {
                log::info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}
