//! Loop guard: stops the model from issuing the same tool call forever.
//!
//! Only immediate repetition counts: the guard remembers the signature of
//! the previous call and how many times in a row it has been seen. A
//! different call in between resets the count.

use scoutline_core::tool::ToolCallSignature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Execute the call. `repeats` is how many times in a row it has now been seen.
    Proceed { repeats: u32 },
    /// Refuse the call.
    Abort { repeats: u32 },
}

#[derive(Debug)]
pub struct LoopGuard {
    last: Option<ToolCallSignature>,
    repeats: u32,
    threshold: u32,
}

impl LoopGuard {
    /// A guard that allows `threshold` identical calls in a row.
    pub fn new(threshold: u32) -> Self {
        Self {
            last: None,
            repeats: 0,
            threshold,
        }
    }

    pub fn check(&mut self, signature: ToolCallSignature) -> Verdict {
        if self.last.as_ref() == Some(&signature) {
            self.repeats += 1;
        } else {
            self.last = Some(signature);
            self.repeats = 1;
        }

        if self.repeats > self.threshold {
            Verdict::Abort {
                repeats: self.repeats,
            }
        } else {
            Verdict::Proceed {
                repeats: self.repeats,
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.repeats = 0;
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(3)
    }
}
