//! BART configuration as loaded from `config.json`, plus the export overrides.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{ExportError, ExportResult};
use crate::options::ExportOptions;
use crate::tokenizer::ExportTokenizer;

fn default_extra_pos_embeddings() -> u32 {
    2
}

fn default_model_type() -> String {
    "bart".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BartExportConfig {
    pub d_model: usize,
    pub encoder_layers: usize,
    pub decoder_layers: usize,
    pub encoder_attention_heads: usize,
    pub decoder_attention_heads: usize,
    pub vocab_size: usize,
    pub max_position_embeddings: usize,

    pub eos_token_id: u32,
    pub bos_token_id: u32,
    pub pad_token_id: u32,
    pub decoder_start_token_id: u32,

    #[serde(default = "default_model_type")]
    pub model_type: String,

    // Export knobs; see `ExportOverrides`.
    #[serde(default)]
    pub use_decoder: bool,
    #[serde(default)]
    pub do_blenderbot_90_layernorm: bool,
    #[serde(default = "default_extra_pos_embeddings")]
    pub extra_pos_embeddings: u32,
    #[serde(default)]
    pub force_bos_token_to_be_generated: bool,
    #[serde(default)]
    pub static_position_embeddings: bool,
}

impl BartExportConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads `<model_dir>/config.json`.
    pub fn from_model_dir(model_dir: &Path) -> ExportResult<Self> {
        let path = model_dir.join("config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {:?}", path))
            .map_err(|e| ExportError::load_failed("config", e))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("failed to parse {:?}", path))
            .map_err(|e| ExportError::load_failed("config", e))?;
        config
            .validate()
            .with_context(|| format!("invalid {:?}", path))
            .map_err(|e| ExportError::load_failed("config", e))?;

        log::info!(
            "Loaded {} config: {} encoder / {} decoder layers, d_model {}",
            config.model_type,
            config.encoder_layers,
            config.decoder_layers,
            config.d_model
        );
        Ok(config)
    }

    /// Attention head counts must be non-zero and divide `d_model`.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (field, heads) in [
            ("encoder_attention_heads", self.encoder_attention_heads),
            ("decoder_attention_heads", self.decoder_attention_heads),
        ] {
            if heads == 0 || self.d_model % heads != 0 {
                anyhow::bail!("{} ({}) must divide d_model ({})", field, heads, self.d_model);
            }
        }
        Ok(())
    }

    pub fn decoder_head_dim(&self) -> usize {
        self.d_model / self.decoder_attention_heads
    }

    pub fn encoder_head_dim(&self) -> usize {
        self.d_model / self.encoder_attention_heads
    }
}

/// Field overrides applied after loading for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOverrides {
    pub use_decoder: bool,
    pub do_blenderbot_90_layernorm: bool,
    pub extra_pos_embeddings: u32,
    pub force_bos_token_to_be_generated: bool,
    pub static_position_embeddings: bool,
}

impl Default for ExportOverrides {
    fn default() -> Self {
        Self {
            use_decoder: true,
            do_blenderbot_90_layernorm: false,
            extra_pos_embeddings: 2,
            force_bos_token_to_be_generated: false,
            static_position_embeddings: false,
        }
    }
}

impl ExportOverrides {
    pub fn apply(&self, config: &mut BartExportConfig) {
        config.use_decoder = self.use_decoder;
        config.do_blenderbot_90_layernorm = self.do_blenderbot_90_layernorm;
        config.extra_pos_embeddings = self.extra_pos_embeddings;
        config.force_bos_token_to_be_generated = self.force_bos_token_to_be_generated;
        config.static_position_embeddings = self.static_position_embeddings;
    }
}

/// Loads config and tokenizer for export.
///
/// The tokenizer comes from the model directory unless `spm_path` is set,
/// in which case it is rebuilt from the BPE merges at `spm_path` and the
/// vocabulary at `vocab_path` (default `<model_dir>/vocab.json`). Fails with
/// [`ExportError::DecoderStartMismatch`] when decoding would not start at EOS.
pub fn initialize_config(
    options: &ExportOptions,
) -> ExportResult<(BartExportConfig, ExportTokenizer)> {
    let model_dir = options.model_dir.as_path();
    let mut config = BartExportConfig::from_model_dir(model_dir)?;

    let tokenizer = match &options.spm_path {
        Some(merges) => {
            let vocab = options
                .vocab_path
                .clone()
                .unwrap_or_else(|| model_dir.join("vocab.json"));
            ExportTokenizer::from_bpe_files(&vocab, merges)?
        }
        None => ExportTokenizer::from_model_dir(model_dir)?,
    };

    ExportOverrides::default().apply(&mut config);

    let eos = tokenizer.eos_token_id()?;
    if eos != config.decoder_start_token_id {
        return Err(ExportError::DecoderStartMismatch {
            eos,
            decoder_start: config.decoder_start_token_id,
        });
    }

    Ok((config, tokenizer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{write_tiny_model_dir, TINY_BART_CONFIG_JSON};

    #[test]
    fn test_parse_defaults() {
        let config = BartExportConfig::from_json(TINY_BART_CONFIG_JSON).unwrap();

        assert_eq!(config.d_model, 16);
        assert_eq!(config.decoder_layers, 2);
        assert_eq!(config.decoder_head_dim(), 4);
        assert_eq!(config.encoder_head_dim(), 8);
        assert_eq!(config.model_type, "bart");
        assert!(!config.use_decoder);
        assert_eq!(config.extra_pos_embeddings, 2);
    }

    #[test]
    fn test_overrides_applied() {
        let json = TINY_BART_CONFIG_JSON.replace(
            "\"model_type\": \"bart\"",
            "\"model_type\": \"bart\", \"extra_pos_embeddings\": 0, \"static_position_embeddings\": true, \"do_blenderbot_90_layernorm\": true",
        );
        let mut config = BartExportConfig::from_json(&json).unwrap();
        assert_eq!(config.extra_pos_embeddings, 0);
        assert!(config.static_position_embeddings);

        ExportOverrides::default().apply(&mut config);

        assert!(config.use_decoder);
        assert!(!config.do_blenderbot_90_layernorm);
        assert_eq!(config.extra_pos_embeddings, 2);
        assert!(!config.force_bos_token_to_be_generated);
        assert!(!config.static_position_embeddings);
    }

    #[test]
    fn test_missing_config_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = BartExportConfig::from_model_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::LoadFailed { .. }));
    }

    #[test]
    fn test_invalid_head_counts_rejected() {
        for (from, to) in [
            ("\"decoder_attention_heads\": 4", "\"decoder_attention_heads\": 0"),
            ("\"encoder_attention_heads\": 2", "\"encoder_attention_heads\": 3"),
        ] {
            let json = TINY_BART_CONFIG_JSON.replace(from, to);
            assert!(BartExportConfig::from_json(&json).unwrap().validate().is_err());

            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("config.json"), &json).unwrap();
            let err = BartExportConfig::from_model_dir(dir.path()).unwrap_err();
            assert!(matches!(err, ExportError::LoadFailed { .. }));
            assert!(format!("{:#}", anyhow::Error::new(err)).contains("must divide d_model"));
        }
        assert!(BartExportConfig::from_json(TINY_BART_CONFIG_JSON)
            .unwrap()
            .validate()
            .is_ok());
    }

    #[test]
    fn test_initialize_config() {
        let dir = tempfile::tempdir().unwrap();
        write_tiny_model_dir(dir.path(), TINY_BART_CONFIG_JSON);

        let options = ExportOptions::new(dir.path());
        let (config, tokenizer) = initialize_config(&options).unwrap();

        assert!(config.use_decoder);
        assert_eq!(tokenizer.eos_token_id().unwrap(), config.decoder_start_token_id);
    }

    #[test]
    fn test_initialize_config_from_bpe_files() {
        let dir = tempfile::tempdir().unwrap();
        write_tiny_model_dir(dir.path(), TINY_BART_CONFIG_JSON);
        std::fs::remove_file(dir.path().join("tokenizer.json")).unwrap();

        let mut options = ExportOptions::new(dir.path());
        options.spm_path = Some(dir.path().join("merges.txt"));
        let (_, tokenizer) = initialize_config(&options).unwrap();

        assert_eq!(tokenizer.token_to_id("__en__"), Some(7));
    }

    #[test]
    fn test_decoder_start_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let json = TINY_BART_CONFIG_JSON.replace(
            "\"decoder_start_token_id\": 2",
            "\"decoder_start_token_id\": 0",
        );
        write_tiny_model_dir(dir.path(), &json);

        let err = initialize_config(&ExportOptions::new(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            ExportError::DecoderStartMismatch {
                eos: 2,
                decoder_start: 0
            }
        ));
    }
}
