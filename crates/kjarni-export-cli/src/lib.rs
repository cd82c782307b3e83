use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kjarni-export")]
#[command(about = "Prepare BART encoder-decoders for graph export", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Print graph input/output slot names
    Names {
        /// Number of decoder layers
        #[arg(short, long)]
        layers: usize,

        /// Print the encoder graph instead of the decoder step graph
        #[arg(long)]
        encoder: bool,
    },

    /// Load config, tokenizer and weights and show what export would bind
    Inspect {
        /// Model directory (config.json, tokenizer, model.safetensors)
        #[arg(short, long)]
        model_dir: String,

        /// Compute device (cpu, wgpu, cuda)
        #[arg(short, long, default_value = "cpu")]
        device: String,

        /// Text to encode as the trace input
        #[arg(short, long, default_value = "")]
        text: String,

        /// BPE merges file; rebuilds the tokenizer instead of tokenizer.json
        #[arg(long)]
        spm_path: Option<String>,

        /// Vocabulary paired with --spm-path
        #[arg(long)]
        vocab_path: Option<String>,

        /// Decoder positions covered by the placeholder past states
        #[arg(long, default_value_t = 1)]
        past_len: usize,
    },
}

pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
