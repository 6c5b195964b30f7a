use crate::ui::output::{elapsed_line, retry_line, skip_line};
use crate::ui::progress_message::ProgressMessage;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::{Duration, Instant};

/// Progress bar fed by the fetcher over a channel.
///
/// The bar is hidden when stdout is not a terminal.
pub struct ScrapeProgress {
    bar: ProgressBar,
    started: Instant,
    handle: thread::JoinHandle<()>,
}

impl ScrapeProgress {
    pub fn new() -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let bar = if console::Term::stdout().is_term() {
            let bar = ProgressBar::new_spinner().with_message("Probing record count");
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };

        let bar_clone = bar.clone();
        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Started { total } => {
                        let style = ProgressStyle::with_template(
                            "{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                        )
                        .unwrap_or_else(|_| ProgressStyle::default_bar());
                        bar_clone.set_style(style);
                        bar_clone.set_length(total);
                        bar_clone.set_message("Fetching projects");
                    }
                    ProgressMessage::Page { start, total_saved, .. } => {
                        bar_clone.set_position(total_saved as u64);
                        bar_clone.set_message(format!("Page at offset {}", start));
                    }
                    ProgressMessage::Retry { start, attempt, error } => {
                        bar_clone.println(retry_line(start, attempt, &error));
                    }
                    ProgressMessage::Skipped { start, length } => {
                        bar_clone.println(skip_line(start, length));
                    }
                    ProgressMessage::Finished { total_saved } => {
                        bar_clone.set_position(total_saved as u64);
                        bar_clone.finish_and_clear();
                    }
                }
            }
        });

        (
            Self {
                bar,
                started: Instant::now(),
                handle,
            },
            tx,
        )
    }

    /// Wait for the channel to close, then print the elapsed time.
    ///
    /// Every sender must be dropped first or this blocks.
    pub fn finish(self) {
        if self.handle.join().is_err() {
            tracing::debug!("progress thread panicked");
        }
        self.bar.finish_and_clear();
        println!("{}", elapsed_line(self.started.elapsed()));
    }
}
