//! BART checkpoint bound to a device, and trace input preparation.

use std::path::Path;
use std::sync::Arc;

use ndarray::{Array2, ArrayD};

use crate::config::BartExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::names::GraphSignature;
use crate::options::{Device, ExportOptions};
use crate::tokenizer::ExportTokenizer;
use crate::weights::ModelWeights;

/// Language tag prepended to every trace input.
pub const LANG_TOKEN: &str = "__en__";

/// Longest input, in tokens, before the language tag and EOS are added.
pub const MAX_INPUT_TOKENS: usize = 510;

const SHARED_EMBEDDING_KEYS: &[&str] = &[
    "model.shared.weight",
    "model.encoder.embed_tokens.weight",
    "model.decoder.embed_tokens.weight",
];

pub struct BartExportModel {
    config: Arc<BartExportConfig>,
    weights: ModelWeights,
    shared_embedding_key: &'static str,
    device: Device,
}

impl BartExportModel {
    pub fn from_pretrained(
        model_dir: &Path,
        config: Arc<BartExportConfig>,
        device: Device,
    ) -> ExportResult<Self> {
        log::info!("Loading BART weights from {:?} on {}", model_dir, device);

        let weights = ModelWeights::new(model_dir)
            .map_err(|e| ExportError::load_failed(format!("weights {:?}", model_dir), e))?;

        let shared_embedding_key = SHARED_EMBEDDING_KEYS
            .iter()
            .copied()
            .find(|k| weights.contains(k))
            .ok_or_else(|| ExportError::MissingWeight(SHARED_EMBEDDING_KEYS[0].to_string()))?;

        // Every decoder layer must produce cross-attention key/value states.
        for layer in 0..config.decoder_layers {
            for proj in ["k_proj", "v_proj"] {
                let name = format!("model.decoder.layers.{layer}.encoder_attn.{proj}.weight");
                if !weights.contains(&name) {
                    return Err(ExportError::MissingWeight(name));
                }
            }
        }

        Ok(Self {
            config,
            weights,
            shared_embedding_key,
            device,
        })
    }

    pub fn config(&self) -> &BartExportConfig {
        &self.config
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn weights(&self) -> &ModelWeights {
        &self.weights
    }

    pub fn shared_embedding_key(&self) -> &str {
        self.shared_embedding_key
    }

    pub fn shared_embedding(&self) -> ExportResult<ArrayD<f32>> {
        self.weights
            .get_f32(self.shared_embedding_key)
            .map_err(|e| ExportError::load_failed("shared embedding", e))
    }

    pub fn encoder_signature(&self) -> GraphSignature {
        GraphSignature::for_encoder(self.config.decoder_layers)
    }

    pub fn decoder_signature(&self) -> GraphSignature {
        GraphSignature::for_decoder(self.config.decoder_layers)
    }
}

/// Ids for `text`: language tag, up to [`MAX_INPUT_TOKENS`] tokens, EOS.
pub fn encode_input(tokenizer: &ExportTokenizer, text: &str) -> ExportResult<Vec<u32>> {
    let mut features = vec![tokenizer.token_to_id_or_unk(LANG_TOKEN)?];
    features.extend(tokenizer.encode(text, MAX_INPUT_TOKENS)?);
    features.push(tokenizer.eos_token_id()?);
    Ok(features)
}

/// Loads the model and encodes `options.input_text` as a `[1, n]` batch.
pub fn initialize_model(
    config: &BartExportConfig,
    tokenizer: &ExportTokenizer,
    options: &ExportOptions,
) -> ExportResult<(BartExportModel, Array2<i64>)> {
    let model = BartExportModel::from_pretrained(
        &options.model_dir,
        Arc::new(config.clone()),
        options.device,
    )?;

    let features = encode_input(tokenizer, &options.input_text)?;
    let n = features.len();
    let input_data = Array2::from_shape_vec((1, n), features.into_iter().map(i64::from).collect())
        .map_err(|e| ExportError::load_failed("input ids", e))?;

    log::info!("Encoded trace input: {} tokens", n);
    Ok((model, input_data))
}
