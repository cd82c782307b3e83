//! Loads a model directory the way export does and reports the bindings.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use kjarni_export::{
    back_group_by_layer, bind_names, dummy_past, group_layers, initialize_config,
    initialize_model, input_names, BartExportConfig, Device, ExportOptions,
};

use super::names::render;

pub fn run(
    model_dir: &str,
    device: &str,
    text: &str,
    spm_path: Option<&str>,
    vocab_path: Option<&str>,
    past_len: usize,
) -> Result<()> {
    if vocab_path.is_some() && spm_path.is_none() {
        return Err(anyhow!("--vocab-path requires --spm-path"));
    }

    let device: Device = device.parse()?;
    let mut options = ExportOptions::new(model_dir)
        .with_device(device)
        .with_input_text(text);
    options.spm_path = spm_path.map(PathBuf::from);
    options.vocab_path = vocab_path.map(PathBuf::from);

    let (config, tokenizer) = initialize_config(&options)?;
    let (model, input_ids) = initialize_model(&config, &tokenizer, &options)?;

    println!("model:     {} ({} decoder layers)", config.model_type, config.decoder_layers);
    println!("device:    {}", model.device());
    println!("input_ids: {:?}", input_ids.row(0).to_vec());
    println!();
    print!("{}", render(&model.decoder_signature()));

    println!();
    println!("past bindings:");
    for (name, shape) in placeholder_bindings(&config, past_len, input_ids.ncols())? {
        println!("  {:<22} {:?}", name, shape);
    }
    Ok(())
}

/// Names and shapes of zeroed past states, flattened the way the decoder
/// graph receives them. The flat layout must regroup into one group per
/// decoder layer.
pub fn placeholder_bindings(
    config: &BartExportConfig,
    past_len: usize,
    encoder_len: usize,
) -> Result<Vec<(String, Vec<usize>)>> {
    let past = dummy_past(config, 1, past_len, encoder_len);
    let names = input_names(&past, false);
    let flat = group_layers(past, true).into_flat();

    let regrouped = back_group_by_layer(&flat).len();
    if regrouped != config.decoder_layers {
        return Err(anyhow!(
            "past states regroup into {} layers, config has {}",
            regrouped,
            config.decoder_layers
        ));
    }
    log::debug!("placeholder past: {} states over {} layers", flat.len(), regrouped);

    Ok(bind_names(names, flat)?
        .into_iter()
        .map(|(name, state)| (name, state.shape().to_vec()))
        .collect())
}
