//! Zero-filled past states used to trace a decoder with a warm cache.

use ndarray::Array4;

use crate::config::BartExportConfig;
use crate::past::LayerGroup;

/// Shape of one cached key or value: `[batch, heads, seq, head_dim]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PastShape {
    pub batch_size: usize,
    pub num_heads: usize,
    pub seq_len: usize,
    pub head_dim: usize,
}

impl PastShape {
    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (self.batch_size, self.num_heads, self.seq_len, self.head_dim)
    }

    pub fn zeros(&self) -> Array4<f32> {
        Array4::zeros(self.dims())
    }
}

/// One zeroed [`LayerGroup`] per decoder layer.
///
/// Self-attention states span `decoder_len` positions, cross-attention
/// states span `encoder_len`.
pub fn dummy_past(
    config: &BartExportConfig,
    batch_size: usize,
    decoder_len: usize,
    encoder_len: usize,
) -> Vec<LayerGroup<Array4<f32>>> {
    let num_heads = config.decoder_attention_heads;
    let head_dim = config.decoder_head_dim();

    let self_shape = PastShape {
        batch_size,
        num_heads,
        seq_len: decoder_len,
        head_dim,
    };
    let cross_shape = PastShape {
        seq_len: encoder_len,
        ..self_shape
    };

    log::debug!(
        "dummy past: {} layers, self {:?}, cross {:?}",
        config.decoder_layers,
        self_shape.dims(),
        cross_shape.dims()
    );

    (0..config.decoder_layers)
        .map(|_| {
            LayerGroup::new(
                self_shape.zeros(),
                self_shape.zeros(),
                cross_shape.zeros(),
                cross_shape.zeros(),
            )
        })
        .collect()
}
