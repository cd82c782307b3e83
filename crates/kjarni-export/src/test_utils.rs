//! Fixtures shared by unit tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use safetensors::tensor::TensorView;
use safetensors::Dtype;

use crate::tokenizer::ExportTokenizer;

pub const TINY_BART_CONFIG_JSON: &str = r#"{
  "d_model": 16,
  "encoder_layers": 1,
  "decoder_layers": 2,
  "encoder_attention_heads": 2,
  "decoder_attention_heads": 4,
  "vocab_size": 9,
  "max_position_embeddings": 64,
  "eos_token_id": 2,
  "bos_token_id": 0,
  "pad_token_id": 1,
  "decoder_start_token_id": 2,
  "model_type": "bart"
}"#;

const TINY_VOCAB_JSON: &str = r#"{
  "<s>": 0,
  "<pad>": 1,
  "</s>": 2,
  "<unk>": 3,
  "h": 4,
  "i": 5,
  "hi": 6,
  "__en__": 7,
  "Ġ": 8
}"#;

const TINY_MERGES_TXT: &str = "#version: 0.2\nh i\n";

/// Writes `vocab.json` and `merges.txt`, returning their paths.
pub fn write_bpe_files(dir: &Path) -> (PathBuf, PathBuf) {
    let vocab = dir.join("vocab.json");
    let merges = dir.join("merges.txt");
    fs::write(&vocab, TINY_VOCAB_JSON).unwrap();
    fs::write(&merges, TINY_MERGES_TXT).unwrap();
    (vocab, merges)
}

pub fn write_safetensors(path: &Path, tensors: &[(&str, Vec<f32>, Vec<usize>)]) {
    let stored: Vec<(String, Vec<usize>, Vec<u8>)> = tensors
        .iter()
        .map(|(name, values, shape)| {
            let bytes = values.iter().flat_map(|f| f.to_le_bytes()).collect();
            (name.to_string(), shape.clone(), bytes)
        })
        .collect();

    let mut tensor_map = HashMap::new();
    for (name, shape, bytes) in &stored {
        tensor_map.insert(
            name.clone(),
            TensorView::new(Dtype::F32, shape.clone(), bytes).unwrap(),
        );
    }

    safetensors::serialize_to_file(&tensor_map, &None, path).unwrap();
}

/// Checkpoint tensors for a model with `decoder_layers` layers.
pub fn tiny_checkpoint(decoder_layers: usize) -> Vec<(String, Vec<f32>, Vec<usize>)> {
    let mut tensors = vec![(
        "model.shared.weight".to_string(),
        (0..9 * 4).map(|v| v as f32).collect(),
        vec![9, 4],
    )];
    for layer in 0..decoder_layers {
        for proj in ["k_proj", "v_proj"] {
            tensors.push((
                format!("model.decoder.layers.{layer}.encoder_attn.{proj}.weight"),
                vec![0.0; 4],
                vec![2, 2],
            ));
        }
    }
    tensors
}

/// Lays out config, tokenizer files and weights the way a model dir does.
pub fn write_tiny_model_dir(dir: &Path, config_json: &str) {
    fs::write(dir.join("config.json"), config_json).unwrap();

    let (vocab, merges) = write_bpe_files(dir);
    let tokenizer = ExportTokenizer::from_bpe_files(&vocab, &merges).unwrap();
    tokenizer
        .inner()
        .save(dir.join("tokenizer.json"), false)
        .unwrap();

    let checkpoint = tiny_checkpoint(2);
    let borrowed: Vec<(&str, Vec<f32>, Vec<usize>)> = checkpoint
        .iter()
        .map(|(n, v, s)| (n.as_str(), v.clone(), s.clone()))
        .collect();
    write_safetensors(&dir.join("model.safetensors"), &borrowed);
}
