//! Per-session display and reasoning settings.

use serde::{Deserialize, Serialize};

/// An immutable settings snapshot. Updates replace it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Stream model replies as they are generated
    #[serde(default = "default_true")]
    pub streaming: bool,

    /// Ask the model to separate `Thinking:` from `Answer:`
    #[serde(default)]
    pub enable_cot: bool,

    /// Show the thinking segment, not just the answer
    #[serde(default)]
    pub show_thinking: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            streaming: true,
            enable_cot: false,
            show_thinking: false,
        }
    }
}

/// A partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_cot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_thinking: Option<bool>,
}

impl Settings {
    /// Produce the snapshot that results from applying `update`.
    pub fn apply(self, update: SettingsUpdate) -> Self {
        Self {
            streaming: update.streaming.unwrap_or(self.streaming),
            enable_cot: update.enable_cot.unwrap_or(self.enable_cot),
            show_thinking: update.show_thinking.unwrap_or(self.show_thinking),
        }
    }
}
