//! Error types for kjarni-export.

use thiserror::Error;

/// Errors that can occur while preparing a model for export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A per-layer present state did not hold exactly four tensors.
    #[error("Expected to have four items in layer {layer}. Got {len}")]
    ContractViolation { layer: usize, len: usize },

    /// The tokenizer's EOS token is not the decoder start token.
    #[error("Tokenizer eos_token_id ({eos}) does not match decoder_start_token_id ({decoder_start})")]
    DecoderStartMismatch { eos: u32, decoder_start: u32 },

    /// Names and tensors cannot be paired one to one.
    #[error("Cannot bind {names} names to {states} states")]
    NameMismatch { names: usize, states: usize },

    /// Token missing from the vocabulary (and no `<unk>` fallback).
    #[error("Token '{0}' is not in the vocabulary")]
    UnknownToken(String),

    /// Device string not recognised.
    #[error("Unknown device '{0}'. Expected one of: cpu, wgpu, gpu, cuda")]
    UnknownDevice(String),

    /// A tensor the export relies on is absent from the checkpoint.
    #[error("Weight '{0}' not found in checkpoint")]
    MissingWeight(String),

    /// The tokenizer rejected the input text.
    #[error("Failed to encode input: {0}")]
    Encode(#[source] anyhow::Error),

    /// Reading config, tokenizer or weights failed.
    #[error("Failed to load {what}: {source}")]
    LoadFailed {
        what: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ExportError {
    pub(crate) fn load_failed(what: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::LoadFailed {
            what: what.into(),
            source: source.into(),
        }
    }
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
