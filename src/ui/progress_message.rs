/// Events the fetch loop reports while it runs
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressMessage {
    Started {
        total: u64,
    },
    Page {
        start: usize,
        saved: usize,
        total_saved: usize,
    },
    Retry {
        start: usize,
        attempt: u32,
        error: String,
    },
    Skipped {
        start: usize,
        length: usize,
    },
    Finished {
        total_saved: usize,
    },
}
