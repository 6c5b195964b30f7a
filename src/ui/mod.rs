pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    banner, caution, done, elapsed_line, failed, quiet, retry_line, scrape_summary, search_heading,
    section, setting, skip_line, stats_heading,
};
pub use progress::ScrapeProgress;
pub use progress_message::ProgressMessage;
pub use table::{results_table, DISPLAY_LIMIT};
pub use theme::{Theme, Tone};
