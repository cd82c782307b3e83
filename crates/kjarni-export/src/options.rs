//! User options for preparing an export, and device selection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ExportError;

/// Compute device the model is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Wgpu,
}

impl Device {
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }

    pub fn is_gpu(&self) -> bool {
        matches!(self, Device::Wgpu)
    }
}

impl FromStr for Device {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            // accelerator strings may carry an ordinal, e.g. "cuda:0"
            d if d == "wgpu" || d == "gpu" || d == "cuda" || d.starts_with("cuda:") => {
                Ok(Device::Wgpu)
            }
            _ => Err(ExportError::UnknownDevice(s.to_string())),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Wgpu => write!(f, "wgpu"),
        }
    }
}

/// Inputs for [`crate::initialize_config`] and [`crate::initialize_model`].
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Directory holding `config.json`, the tokenizer files and weights.
    pub model_dir: PathBuf,
    pub device: Device,
    /// Text encoded as the trace input.
    pub input_text: String,
    /// BPE merges file; when set the tokenizer is rebuilt from it.
    pub spm_path: Option<PathBuf>,
    /// Vocabulary paired with `spm_path`.
    pub vocab_path: Option<PathBuf>,
}

impl ExportOptions {
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_input_text(mut self, text: impl Into<String>) -> Self {
        self.input_text = text.into();
        self
    }
}
