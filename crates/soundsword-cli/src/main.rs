use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "soundsword-cli", version, about = "Turn song file paths into file URIs for media playback")]
struct Cli {
    /// Song file paths (relative or absolute)
    #[arg(required = true)]
    paths: Vec<String>,

    /// Resolve relative paths against this directory instead of the working directory
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Print a JSON report instead of one line per song
    #[arg(long)]
    json: bool,

    /// Skip inputs whose extension does not look like audio
    #[arg(long)]
    audio_only: bool,
}

impl From<Cli> for soundsword_core::ScanOptions {
    fn from(cli: Cli) -> Self {
        Self {
            paths: cli.paths,
            base_dir: cli.base_dir,
            audio_only: cli.audio_only,
        }
    }
}

fn render_lines(result: &soundsword_core::ScanResult) -> Vec<String> {
    result
        .songs
        .iter()
        .map(|s| format!("{}\t{}", s.uri, s.mime.as_deref().unwrap_or("-")))
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let options: soundsword_core::ScanOptions = cli.into();
    info!("scanning {} paths", options.paths.len());

    let result = soundsword_core::scan(&options).context("Failed to build song references")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in render_lines(&result) {
            println!("{}", line);
        }
    }

    eprintln!(
        "Done! {} songs, {} duplicates removed, {} skipped",
        result.songs.len(),
        result.duplicates_removed,
        result.skipped
    );

    Ok(())
}
