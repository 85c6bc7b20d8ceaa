#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::{io, process::ExitCode};

use anyhow::{anyhow, Result};
use clap::Parser;
use drawnstories_core::{Download, Event, Request};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;

mod args;
mod progress;

static USAGE: &str = "Usage: drawnstories-cbz <URL> [book numbers]
Example: drawnstories-cbz https://drawnstories.ru/comics/Oni-press/rick-and-morty 001
";

async fn download(args: Args, tx: mpsc::UnboundedSender<Event>) -> Result<()> {
    let archives = Download::new(reqwest::Client::new(), args.url)
        .set_issues(args.issues)
        .set_outdir(args.outdir)
        .set_staging_dir(args.tmpdir)
        .set_max_parallel_download(args.max_parallel_download)
        .set_sender(tx)
        .request()
        .await?;
    info!("{} archives written", archives.len());

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let (tx, rx) = mpsc::unbounded_channel();
    let progress = progress::spawn(rx);

    let res = tokio::select! {
        res = download(args, tx) => res,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("interrupted")),
    };

    // The sender is dropped with the download, the reporter stops once drained
    if let Err(err) = progress.await {
        warn!("progress reporter failed: {err}");
    }

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("ERROR: {err}\n\n{USAGE}");
            ExitCode::FAILURE
        }
    }
}
