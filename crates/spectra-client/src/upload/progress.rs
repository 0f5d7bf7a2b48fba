//! Maps byte counters onto the displayed percentage.

/// Percentage reported once the record exists.
pub const CREATED_PERCENT: u8 = 10;

/// Ceiling while the transport is still active.
pub const STREAMING_CEILING: u8 = 95;

/// Reported only on confirmed completion.
pub const COMPLETE_PERCENT: u8 = 100;

/// Produces a non-decreasing percentage sequence across both phases.
///
/// Each method returns `Some(percent)` only when the value moved forward.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    /// Create a tracker that has reported nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value reported, if any.
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    /// The record has been created.
    pub fn created(&mut self) -> Option<u8> {
        self.advance(CREATED_PERCENT)
    }

    /// The transport reported `sent` of `total` bytes.
    pub fn transfer(&mut self, sent: u64, total: u64) -> Option<u8> {
        let span = u64::from(STREAMING_CEILING - CREATED_PERCENT);
        let percent = if total == 0 {
            STREAMING_CEILING
        } else {
            let scaled = u64::from(CREATED_PERCENT) + sent.min(total) * span / total;
            scaled.min(u64::from(STREAMING_CEILING)) as u8
        };
        self.advance(percent)
    }

    /// The server acknowledged the payload.
    pub fn complete(&mut self) -> Option<u8> {
        self.advance(COMPLETE_PERCENT)
    }

    fn advance(&mut self, percent: u8) -> Option<u8> {
        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}
