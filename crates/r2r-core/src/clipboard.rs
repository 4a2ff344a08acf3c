//! Clipboard boundary and the transient "copied" flag.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// How long the "copied" flag stays raised after a successful copy.
pub const COPIED_FLAG_DURATION: Duration = Duration::from_millis(2000);

/// Writes text to the system clipboard.
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// "Copy succeeded recently" flag.
///
/// Every raise returns a generation number; only a lower with the latest
/// generation clears the flag, so an old timer cannot cut a newer copy short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardFlag {
    raised: bool,
    generation: u64,
}

impl ClipboardFlag {
    pub fn is_raised(&self) -> bool {
        self.raised
    }

    pub fn raise(&mut self) -> u64 {
        self.generation += 1;
        self.raised = true;
        self.generation
    }

    /// Lowers the flag if `generation` is the latest raise. Returns whether it did.
    pub fn lower(&mut self, generation: u64) -> bool {
        if self.raised && self.generation == generation {
            self.raised = false;
            true
        } else {
            false
        }
    }
}
