use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flyer_ocr::config::{Args, Command, Config, OutputFormat};
use flyer_ocr::{engines, export, loader, server, Lexicon, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();

    // Initialize tracing; logs go to stderr so extract output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let command = args.command.take().unwrap_or(Command::Serve);
    let config = Config::from(args);
    config.validate()?;

    let engine = engines::from_config(&config);

    match command {
        Command::Serve => {
            tracing::info!("Starting flyer-ocr-server v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Binding to {}:{}", config.host, config.port);
            server::run(config, engine).await
        }
        Command::Extract {
            files,
            format,
            output,
        } => {
            tokio::task::spawn_blocking(move || {
                extract_files(&config, engine.as_ref(), &files, format, output.as_deref())
            })
            .await?
        }
    }
}

fn extract_files(
    config: &Config,
    engine: &dyn flyer_ocr::OcrEngine,
    files: &[PathBuf],
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let pages = loader::load_paths(files).context("Failed to load input files")?;
    tracing::info!("Processing {} page(s) from {} file(s)", pages.len(), files.len());

    let lexicon = Lexicon::default();
    let result = Orchestrator::new(config, engine, &lexicon).process_document(pages);

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            export::write_records(&result.products, format, &mut writer)?;
            writer.flush()?;
            tracing::info!("Wrote {} records to {}", result.products.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            export::write_records(&result.products, format, stdout.lock())?;
        }
    }

    Ok(())
}
