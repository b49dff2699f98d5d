//! Editor options.
//!
//! | Option          | Default | Meaning                                      |
//! |-----------------|---------|----------------------------------------------|
//! | `window`        | 23      | lines shown by `L` and `P` with no end       |
//! | `window_lead`   | 11      | lines `L` shows above the current line       |
//! | `backup_suffix` | `~`     | appended to the file name for the backup     |
//! | `prompt`        | `*`     | printed before each command                  |

/// Settings a session is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Number of lines in a default listing. Zero lists a single line.
    pub window: usize,
    /// How far above the current line a default listing starts.
    pub window_lead: usize,
    pub backup_suffix: String,
    pub prompt: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            window: 23,
            window_lead: 11,
            backup_suffix: "~".to_string(),
            prompt: "*".to_string(),
        }
    }
}

impl Options {
    /// Where a listing with no explicit start begins: `window_lead` lines
    /// above `current`, but never before line 1.
    #[must_use]
    pub const fn window_start(&self, current: usize) -> usize {
        if current > self.window_lead {
            current - self.window_lead
        } else {
            1
        }
    }
}
