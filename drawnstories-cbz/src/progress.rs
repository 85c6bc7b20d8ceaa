use std::time::Duration;

use drawnstories_core::Event;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::{sync::mpsc, task::JoinHandle};

/// Renders the download events until the sending side is dropped
pub fn spawn(mut rx: mpsc::UnboundedReceiver<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bars = MultiProgress::new();
        let mut current: Option<ProgressBar> = None;

        while let Some(event) = rx.recv().await {
            match event {
                Event::ListingResolved(url) => {
                    let bar = bars.add(ProgressBar::new_spinner());
                    bar.set_style(style("{spinner} {msg}"));
                    bar.set_message(format!("Searching comics on {url}"));
                    bar.enable_steady_tick(Duration::from_millis(120));
                    replace(&mut current, bar);
                }
                Event::BookStarted { identifier, pages } => {
                    let bar = bars.add(ProgressBar::new(u64::try_from(pages).unwrap_or(u64::MAX)));
                    bar.set_style(style("{msg} [{wide_bar}] {pos}/{len}"));
                    bar.set_message(format!("Downloading book {identifier}"));
                    replace(&mut current, bar);
                }
                Event::PageDownloaded(_) => {
                    if let Some(bar) = &current {
                        bar.inc(1);
                    }
                }
                Event::BookArchived(path) => {
                    if let Some(bar) = current.take() {
                        bar.finish_with_message(format!("{path} ✔"));
                    }
                }
                Event::Finished => {
                    if let Some(bar) = current.take() {
                        bar.finish_with_message(format!("{} ✔", bar.message()));
                    }
                }
                Event::Failed(_) => {
                    if let Some(bar) = current.take() {
                        bar.abandon();
                    }
                }
            }
        }

        // Interrupted runs stop sending before finishing their step
        if let Some(bar) = current.take() {
            bar.abandon();
        }
    })
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Marks the previous step as done before starting the next one
fn replace(current: &mut Option<ProgressBar>, bar: ProgressBar) {
    if let Some(previous) = current.replace(bar) {
        previous.finish_with_message(format!("{} ✔", previous.message()));
    }
}
