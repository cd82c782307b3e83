//! Kjarni Export: prepare BART encoder-decoders for graph export.
//!
//! - [`past`] moves decoder key/value states between the by-layer grouping a
//!   model produces and the by-attention-type grouping an exported graph binds.
//! - [`names`] generates the graph's positional input/output slot names.
//! - [`config`], [`tokenizer`] and [`model`] load and configure the checkpoint
//!   and encode the trace input.
//!
//! ```ignore
//! use kjarni_export::{initialize_config, initialize_model, ExportOptions};
//!
//! let options = ExportOptions::new("/models/bart").with_input_text("Hello");
//! let (config, tokenizer) = initialize_config(&options)?;
//! let (model, input_ids) = initialize_model(&config, &tokenizer, &options)?;
//! let signature = model.decoder_signature();
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod names;
pub mod options;
pub mod past;
pub mod tokenizer;
pub mod weights;

pub use config::{initialize_config, BartExportConfig, ExportOverrides};
pub use error::{ExportError, ExportResult};
pub use model::{encode_input, initialize_model, BartExportModel};
pub use names::{
    bind_names, input_names, input_names_for_len, output_names, output_names_for_len,
    GraphSignature,
};
pub use options::{Device, ExportOptions};
pub use past::{
    back_group_by_layer, dummy_past, group_by_self_and_cross, group_layers, GroupedPresent,
    LayerGroup, PastShape,
};
pub use tokenizer::ExportTokenizer;

#[cfg(test)]
pub(crate) mod test_utils;
