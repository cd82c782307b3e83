use clap::Parser;

use kjarni_export::{BartExportConfig, GraphSignature};
use kjarni_export_cli::{log_level, Cli, Commands};

use super::names::render;

#[test]
fn test_parse_names() {
    let cli = Cli::try_parse_from(["kjarni-export", "names", "--layers", "6"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Names {
            layers: 6,
            encoder: false
        }
    );
    assert_eq!(cli.verbose, 0);
}

#[test]
fn test_parse_inspect_defaults() {
    let cli = Cli::try_parse_from(["kjarni-export", "-vv", "inspect", "--model-dir", "/m"]).unwrap();
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Commands::Inspect {
            model_dir,
            device,
            text,
            spm_path,
            vocab_path,
            past_len,
        } => {
            assert_eq!(model_dir, "/m");
            assert_eq!(device, "cpu");
            assert!(text.is_empty());
            assert!(spm_path.is_none());
            assert!(vocab_path.is_none());
            assert_eq!(past_len, 1);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_names_requires_layers() {
    assert!(Cli::try_parse_from(["kjarni-export", "names"]).is_err());
}

#[test]
fn test_log_levels() {
    assert_eq!(log_level(0), "warn");
    assert_eq!(log_level(1), "info");
    assert_eq!(log_level(2), "debug");
    assert_eq!(log_level(9), "trace");
}

#[test]
fn test_render_decoder_signature() {
    let out = render(&GraphSignature::for_decoder(1));
    let lines: Vec<&str> = out.lines().map(str::trim).collect();

    assert_eq!(
        lines,
        vec![
            "inputs:",
            "input_ids",
            "encoder_attention_mask",
            "encoder_hidden_states",
            "past_key_self_0",
            "past_value_self_0",
            "past_key_cross_0",
            "past_value_cross_0",
            "outputs:",
            "logits",
            "present_key_self_0",
            "present_value_self_0",
        ]
    );
}

#[test]
fn test_inspect_rejects_bad_device() {
    let err = super::inspect::run("/nonexistent", "tpu", "", None, None, 1).unwrap_err();
    assert!(err.to_string().contains("Unknown device"));
}

#[test]
fn test_inspect_requires_spm_with_vocab() {
    let err = super::inspect::run("/nonexistent", "cpu", "", None, Some("v.json"), 1).unwrap_err();
    assert!(err.to_string().contains("--spm-path"));
}

const TWO_LAYER_CONFIG_JSON: &str = r#"{
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
  "decoder_start_token_id": 2
}"#;

#[test]
fn test_placeholder_bindings_cover_every_layer() {
    let config = BartExportConfig::from_json(TWO_LAYER_CONFIG_JSON).unwrap();
    let bindings = super::inspect::placeholder_bindings(&config, 3, 7).unwrap();

    assert_eq!(bindings.len(), 4 * config.decoder_layers);
    assert_eq!(bindings[0], ("past_key_self_0".to_string(), vec![1, 4, 3, 4]));
    assert_eq!(bindings[3], ("past_value_self_1".to_string(), vec![1, 4, 3, 4]));
    assert_eq!(bindings[4], ("past_key_cross_0".to_string(), vec![1, 4, 7, 4]));
    assert_eq!(bindings[7], ("past_value_cross_1".to_string(), vec![1, 4, 7, 4]));
}

#[test]
fn test_placeholder_bindings_without_decoder_layers() {
    let json = TWO_LAYER_CONFIG_JSON.replace("\"decoder_layers\": 2", "\"decoder_layers\": 0");
    let config = BartExportConfig::from_json(&json).unwrap();
    assert!(super::inspect::placeholder_bindings(&config, 1, 1).unwrap().is_empty());
}
