use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use shared_gl::error::{HookError, Result};
use shared_gl::types::GlVersion;
use shared_gl::util::write_log_file;

pub const CONFIG_FILE_NAME: &str = "glhook.yaml";

fn default_true() -> bool {
    true
}

/// Settings read once from `glhook.yaml` in the hook root.  Every field has a default, so a
/// partial file (or no file at all) is valid.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct HookConfig {
    /// When false every entry point is a plain pass-through and no runtime is ever created.
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub log_dir: Option<String>,
    /// Effect source handed to the effect compiler when a runtime initializes.
    #[serde(default)]
    pub effect_path: Option<String>,
    #[serde(default)]
    pub effect_pragmas: Vec<String>,
    #[serde(default)]
    pub capability_floor: GlVersion,
    #[serde(default = "default_true")]
    pub depth_detection: bool,
    #[serde(default)]
    pub log_pixel_formats: bool,
    #[serde(default = "default_true")]
    pub upgrade_context_version: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        HookConfig::new()
    }
}

impl fmt::Display for HookConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "HookConfig {{")?;
        writeln!(f, "  active: {}", self.active)?;
        writeln!(f, "  log_dir: {:?}", self.log_dir)?;
        match self.effect_path.as_ref() {
            None => writeln!(f, "  no effect source")?,
            Some(p) => {
                writeln!(f, "  effect_path: {}", p)?;
                writeln!(f, "  effect_pragmas: {:?}", self.effect_pragmas)?;
            }
        }
        writeln!(f, "  capability_floor: {}", self.capability_floor)?;
        writeln!(f, "  depth_detection: {}", self.depth_detection)?;
        writeln!(f, "  log_pixel_formats: {}", self.log_pixel_formats)?;
        writeln!(f, "  upgrade_context_version: {}", self.upgrade_context_version)?;
        writeln!(f, "}}")
    }
}

impl HookConfig {
    pub fn new() -> Self {
        Self {
            active: true,
            log_dir: None,
            effect_path: None,
            effect_pragmas: vec![],
            capability_floor: GlVersion::default(),
            depth_detection: true,
            log_pixel_formats: false,
            upgrade_context_version: true,
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| HookError::SerdeError(format!("deserialize error: {}", e)))
    }

    /// Load the config from `rootdir`.  A missing file yields the defaults; a file that
    /// exists but can't be read or parsed is an error.
    pub fn load(rootdir: &Path) -> Result<Self> {
        let mut pb = rootdir.to_path_buf();
        pb.push(CONFIG_FILE_NAME);

        if !pb.is_file() {
            write_log_file(&format!("Config file does not exist: {:?}", pb));
            write_log_file("Using defaults");
            return Ok(HookConfig::new());
        }

        let text = std::fs::read_to_string(&pb)
            .map_err(|e| HookError::ConfReadFailed(format!("{:?}: {}", pb, e)))?;
        HookConfig::from_yaml(&text)
    }

    /// Like `load`, but a broken file is logged and the defaults used instead.
    pub fn load_or_default(rootdir: &Path) -> Self {
        HookConfig::load(rootdir).unwrap_or_else(|e| {
            write_log_file(&format!("Error: failed to load config, using defaults: {:?}", e));
            HookConfig::new()
        })
    }

    /// Read the configured effect source, if any.
    pub fn effect_source(&self) -> Result<Option<String>> {
        match self.effect_path.as_ref() {
            None => Ok(None),
            Some(p) => Ok(Some(std::fs::read_to_string(p)?)),
        }
    }
}
