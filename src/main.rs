//! CLI entry point for the hauler tool.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hauler::download::{
    DownloadSession, DownloadState, HttpClient, ProgressSnapshot, fallback_filename_from_url,
};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use url::Url;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so --json output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let dest = args.output.clone().unwrap_or_else(|| {
        Url::parse(&args.url)
            .map(|u| PathBuf::from(fallback_filename_from_url(&u)))
            .unwrap_or_else(|_| PathBuf::from("download.bin"))
    });

    let client = HttpClient::new();
    let mut session = DownloadSession::new(&args.url, &dest, args.overwrite);
    session.start(&client).await?;

    let bar = (!args.json && !args.quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    });

    let mut poll_timer = tokio::time::interval(Duration::from_millis(args.interval));
    while !session.state().is_terminal() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, cancelling download");
                session.cancel().await?;
            }
            _ = poll_timer.tick() => {
                let progress = match session.poll().await {
                    Ok(progress) => progress,
                    Err(error) => {
                        if let Some(bar) = &bar {
                            bar.finish_and_clear();
                        }
                        return Err(error.into());
                    }
                };
                if args.json {
                    println!("{}", serde_json::to_string(&progress)?);
                } else if let Some(bar) = &bar {
                    bar.set_message(render_progress(&progress));
                }
            }
        }
    }

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    match session.state() {
        DownloadState::Completed => {
            info!(
                dest = %dest.display(),
                bytes = session.progress().downloaded_bytes,
                "download complete"
            );
            Ok(())
        }
        DownloadState::Cancelled => anyhow::bail!("download cancelled"),
        state => anyhow::bail!("download ended in unexpected state {state:?}"),
    }
}

/// One-line progress message for the spinner.
fn render_progress(progress: &ProgressSnapshot) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let average = HumanBytes(progress.average_speed.max(0.0) as u64);
    if progress.total_bytes > 0 {
        format!(
            "{} / {} ({:.1}%) {average}/s avg, ETA {}",
            HumanBytes(progress.downloaded_bytes),
            HumanBytes(progress.total_bytes),
            progress.percentage,
            progress.time_left
        )
    } else {
        format!(
            "{} / ? {average}/s avg, ETA {}",
            HumanBytes(progress.downloaded_bytes),
            progress.time_left
        )
    }
}
