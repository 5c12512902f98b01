//! Progress reporting
//!
//! The install pipeline never talks to the presentation layer directly. It holds
//! a [`ProgressHandle`] and enqueues updates; a single background task owns the
//! [`ProgressObserver`] and is the only code that ever calls it.
//!
//! That task runs one loop selecting over two sources:
//!
//! - explicit updates from the pipeline, always polled first
//! - a trickle ticker that advances the percentage by one on every period, so
//!   the bar keeps moving during long downloads and extractions
//!
//! The ticker continues from the latest explicit value and never goes past the
//! configured ceiling. An explicit update restarts the ticker period, so a tick
//! that was already due cannot overwrite it.
//!
//! ```rust,no_run
//! use molly_installer::config::ProgressConfig;
//! use molly_installer::progress::{ProgressReporter, TerminalObserver};
//!
//! # async fn example() {
//! let (progress, reporter) =
//!     ProgressReporter::spawn(TerminalObserver::new(false), &ProgressConfig::default());
//! progress.report(35, "Downloading Molly Wallet").await;
//! progress.notify_success("Success!", "Molly wallet has been successfully installed.").await;
//! progress.close().await;
//! reporter.join().await;
//! # }
//! ```

mod terminal;

pub use terminal::TerminalObserver;

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::config::ProgressConfig;

/// Something the observer is told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Human-readable description of the current step
    Status(String),
    /// Overall completion, 0 to 100
    Percent(u8),
    /// A step failed
    Error {
        /// Short headline
        title: String,
        /// Failure description
        detail: String,
    },
    /// The workflow finished
    Success {
        /// Short headline
        title: String,
        /// Completion message
        detail: String,
    },
}

/// Receives progress events. Only the reporter task calls it.
pub trait ProgressObserver: Send + 'static {
    /// Handle one event.
    fn on_event(&mut self, event: &ProgressEvent);

    /// Called once after the last event, when the reporter shuts down.
    fn close(&mut self) {}
}

#[derive(Debug)]
enum Command {
    Report { percent: u8, status: String },
    Notify(ProgressEvent),
    Close,
}

/// Cloneable sender side of the reporter.
///
/// Sends wait until the reporter has room, which keeps the pipeline and the
/// observer in step. If the reporter has already stopped, updates are dropped
/// with a debug log; progress output must never fail an install.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    tx: mpsc::Sender<Command>,
}

impl ProgressHandle {
    /// A handle with no reporter behind it; every update is dropped.
    #[must_use]
    pub fn disconnected() -> Self {
        let (tx, _) = mpsc::channel(1);
        Self { tx }
    }

    /// Set the status text, then the percentage.
    pub async fn report(&self, percent: u8, status: impl Into<String>) {
        self.send(Command::Report {
            percent: percent.min(100),
            status: status.into(),
        })
        .await;
    }

    /// Emit an error notification.
    pub async fn notify_error(&self, title: impl Into<String>, detail: impl Into<String>) {
        self.send(Command::Notify(ProgressEvent::Error {
            title: title.into(),
            detail: detail.into(),
        }))
        .await;
    }

    /// Emit a success notification.
    pub async fn notify_success(&self, title: impl Into<String>, detail: impl Into<String>) {
        self.send(Command::Notify(ProgressEvent::Success {
            title: title.into(),
            detail: detail.into(),
        }))
        .await;
    }

    /// Ask the reporter to close the observer and stop.
    pub async fn close(&self) {
        self.send(Command::Close).await;
    }

    async fn send(&self, command: Command) {
        if let Err(e) = self.tx.send(command).await {
            tracing::debug!("Progress reporter already stopped, dropping {:?}", e.0);
        }
    }
}

/// Join handle for the reporter task.
#[derive(Debug)]
pub struct ReporterTask {
    handle: JoinHandle<()>,
}

impl ReporterTask {
    /// Wait for the reporter to drain its queue and close the observer.
    ///
    /// The reporter stops after [`ProgressHandle::close`] or once every handle
    /// has been dropped.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!("Progress reporter task failed: {e}");
        }
    }
}

/// Spawns the reporter task.
pub struct ProgressReporter;

impl ProgressReporter {
    /// Start the reporter loop for `observer` on the current tokio runtime.
    pub fn spawn<O: ProgressObserver>(
        observer: O,
        config: &ProgressConfig,
    ) -> (ProgressHandle, ReporterTask) {
        let (tx, rx) = mpsc::channel(1);
        let ticker = config.tick_interval().map(new_ticker);
        let handle = tokio::spawn(run(observer, rx, ticker, config.tick_ceiling.min(100)));
        (ProgressHandle { tx }, ReporterTask { handle })
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn run<O: ProgressObserver>(
    mut observer: O,
    mut rx: mpsc::Receiver<Command>,
    mut ticker: Option<Interval>,
    ceiling: u8,
) {
    let mut current: u8 = 0;

    loop {
        tokio::select! {
            biased;

            command = rx.recv() => match command {
                Some(Command::Report { percent, status }) => {
                    observer.on_event(&ProgressEvent::Status(status));
                    current = percent;
                    observer.on_event(&ProgressEvent::Percent(current));
                    if let Some(ticker) = ticker.as_mut() {
                        ticker.reset();
                    }
                }
                Some(Command::Notify(event)) => observer.on_event(&event),
                Some(Command::Close) | None => break,
            },

            () = next_tick(&mut ticker), if current < ceiling => {
                current += 1;
                observer.on_event(&ProgressEvent::Percent(current));
            }
        }
    }

    observer.close();
}
