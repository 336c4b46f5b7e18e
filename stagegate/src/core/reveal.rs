//! Staged reveal schedules (intro story, breach shutdown).
//!
//! A plan only says *when* each line appears and when the sequence is
//! complete. Playing it back is the scheduler's job.

/// Lines shown by the breach shutdown sequence.
pub const BREACH_LINES: [&str; 3] = [
    "Stabilizing Signal...",
    "Closing Gate...",
    "Rebooting Core...",
];

const STORY_FIRST_MS: u64 = 500;
const STORY_SPACING_MS: u64 = 3000;
const STORY_COMPLETE_AFTER_MS: u64 = 1200;
const BREACH_SPACING_MS: u64 = 1800;
const BREACH_COMPLETE_AFTER_MS: u64 = 1500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealLine {
    pub offset_ms: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPlan {
    pub lines: Vec<RevealLine>,
    /// Offset of the completion continuation. `None` when there are no lines.
    pub complete_at_ms: Option<u64>,
}

impl RevealPlan {
    fn evenly_spaced<S: AsRef<str>>(
        lines: &[S],
        first_ms: u64,
        spacing_ms: u64,
        complete_after_ms: u64,
    ) -> Self {
        let lines: Vec<RevealLine> = lines
            .iter()
            .enumerate()
            .map(|(i, text)| RevealLine {
                offset_ms: first_ms + spacing_ms * i as u64,
                text: text.as_ref().to_string(),
            })
            .collect();
        let complete_at_ms = lines.last().map(|last| last.offset_ms + complete_after_ms);
        Self {
            lines,
            complete_at_ms,
        }
    }
}

/// Intro story: first line at 500 ms, then one every 3 s.
pub fn story_plan<S: AsRef<str>>(lines: &[S]) -> RevealPlan {
    RevealPlan::evenly_spaced(
        lines,
        STORY_FIRST_MS,
        STORY_SPACING_MS,
        STORY_COMPLETE_AFTER_MS,
    )
}

pub fn breach_plan() -> RevealPlan {
    RevealPlan::evenly_spaced(&BREACH_LINES, 0, BREACH_SPACING_MS, BREACH_COMPLETE_AFTER_MS)
}
