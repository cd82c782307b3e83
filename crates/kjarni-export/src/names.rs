//! Graph input/output slot names for exported encoder-decoders.

use crate::error::{ExportError, ExportResult};
use crate::past::STATES_PER_LAYER;

pub const INPUT_IDS: &str = "input_ids";
pub const ATTENTION_MASK: &str = "attention_mask";
pub const ENCODER_ATTENTION_MASK: &str = "encoder_attention_mask";
pub const ENCODER_HIDDEN_STATES: &str = "encoder_hidden_states";
pub const LOGITS: &str = "logits";

fn push_pair(names: &mut Vec<String>, prefix: &str, kind: &str, layer: usize) {
    names.push(format!("{prefix}key_{kind}_{layer}"));
    names.push(format!("{prefix}value_{kind}_{layer}"));
}

/// Input names for a sequence of past key/values.
///
/// With `encoder` set the sequence is the flat self-then-cross layout, four
/// states per layer, and names carry the `present_` prefix. Otherwise every
/// element is one decoder layer and names carry `past_`.
pub fn input_names<T>(past_key_values: &[T], encoder: bool) -> Vec<String> {
    input_names_for_len(past_key_values.len(), encoder)
}

pub fn input_names_for_len(len: usize, encoder: bool) -> Vec<String> {
    let (num_layers, prefix) = if encoder {
        (len / STATES_PER_LAYER, "present_")
    } else {
        (len, "past_")
    };

    let mut names = Vec::with_capacity(num_layers * STATES_PER_LAYER);
    for i in 0..num_layers {
        push_pair(&mut names, prefix, "self", i);
    }
    for i in 0..num_layers {
        push_pair(&mut names, prefix, "cross", i);
    }
    names
}

/// Output names for the self-attention present states, one element per layer.
///
/// Cross-attention states do not change between decoding steps and are
/// never graph outputs.
pub fn output_names<T>(present_self: &[T]) -> Vec<String> {
    output_names_for_len(present_self.len())
}

pub fn output_names_for_len(num_layers: usize) -> Vec<String> {
    let mut names = Vec::with_capacity(2 * num_layers);
    for i in 0..num_layers {
        push_pair(&mut names, "present_", "self", i);
    }
    names
}

/// Pairs each name with the state at the same position.
pub fn bind_names<T>(names: Vec<String>, states: Vec<T>) -> ExportResult<Vec<(String, T)>> {
    if names.len() != states.len() {
        return Err(ExportError::NameMismatch {
            names: names.len(),
            states: states.len(),
        });
    }
    Ok(names.into_iter().zip(states).collect())
}

/// Ordered input and output slot names of one exported graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSignature {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl GraphSignature {
    /// Encoder graph that also emits the initial decoder present states.
    pub fn for_encoder(num_layers: usize) -> Self {
        let inputs = vec![INPUT_IDS.to_string(), ATTENTION_MASK.to_string()];

        let mut outputs = vec![ENCODER_HIDDEN_STATES.to_string()];
        outputs.extend(input_names_for_len(num_layers * STATES_PER_LAYER, true));

        Self { inputs, outputs }
    }

    /// Decoder step graph fed with last step's past states.
    pub fn for_decoder(num_layers: usize) -> Self {
        let mut inputs = vec![
            INPUT_IDS.to_string(),
            ENCODER_ATTENTION_MASK.to_string(),
            ENCODER_HIDDEN_STATES.to_string(),
        ];
        inputs.extend(input_names_for_len(num_layers, false));

        let mut outputs = vec![LOGITS.to_string()];
        outputs.extend(output_names_for_len(num_layers));

        Self { inputs, outputs }
    }

    pub fn past_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .map(String::as_str)
            .filter(|n| n.starts_with("past_"))
    }

    pub fn present_outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs
            .iter()
            .map(String::as_str)
            .filter(|n| n.starts_with("present_"))
    }
}
