mod commands;

use anyhow::Result;
use clap::Parser;

use kjarni_export_cli::{log_level, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level(cli.verbose)),
    )
    .init();

    match cli.command {
        Commands::Names { layers, encoder } => commands::names::run(layers, encoder),

        Commands::Inspect {
            model_dir,
            device,
            text,
            spm_path,
            vocab_path,
            past_len,
        } => commands::inspect::run(
            &model_dir,
            &device,
            &text,
            spm_path.as_deref(),
            vocab_path.as_deref(),
            past_len,
        ),
    }
}
