/// Seconds granted per generated question.
pub const SECONDS_PER_QUESTION: u32 = 120;

/// Question counts a test may be configured with.
pub const ALLOWED_QUESTION_COUNTS: [u16; 5] = [10, 15, 20, 25, 30];

/// Combined violation total that forces submission.
pub const VIOLATION_THRESHOLD: u32 = 3;

/// Every generated question has exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A tab switch and a suspected notification observed this close together
/// are treated as one loss of focus.
pub const DEFAULT_FOCUS_LOSS_WINDOW_MS: i64 = 1_000;

/// Client-reported event times further than this from server receipt are
/// replaced by the receipt time.
pub const MAX_EVENT_CLOCK_SKEW_MS: i64 = 5_000;

pub const DEFAULT_HISTORY_PAGE_SIZE: i64 = 20;
pub const MAX_HISTORY_PAGE_SIZE: i64 = 100;
