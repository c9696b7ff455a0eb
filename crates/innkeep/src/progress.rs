//! Stderr spinner fed by a `ProgressChannel` subscription.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use innkeep_core::ProgressChannel;

pub struct Spinner {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl Spinner {
    /// Start rendering progress messages. `None` in quiet mode.
    pub fn attach(progress: &ProgressChannel, quiet: bool) -> Option<Self> {
        if quiet {
            return None;
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        let mut rx = progress.subscribe();
        let sink = bar.clone();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => sink.set_message(message),
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Some(Self { bar, task })
    }

    pub fn finish(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}
