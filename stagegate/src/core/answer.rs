//! Puzzle answer normalization and comparison.

use std::sync::LazyLock;

use serde::Serialize;

static WHITESPACE_RUN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").unwrap());

/// Trim, uppercase, and collapse whitespace runs to a single space.
pub fn normalize_answer(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    WHITESPACE_RUN.replace_all(&upper, " ").into_owned()
}

/// Compare a candidate answer with the expected one after normalizing both.
pub fn check_answer(candidate: &str, expected: &str) -> bool {
    normalize_answer(candidate) == normalize_answer(expected)
}

/// Outcome of an answer submission, as shown next to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerVerdict {
    Accepted,
    Rejected,
}

impl AnswerVerdict {
    pub fn from_match(matched: bool) -> Self {
        if matched {
            AnswerVerdict::Accepted
        } else {
            AnswerVerdict::Rejected
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AnswerVerdict::Accepted => "ACCESS GRANTED",
            AnswerVerdict::Rejected => "SIGNAL REJECTED - TRY AGAIN",
        }
    }

    /// Accepted inputs are locked against further edits.
    pub fn locks_input(self) -> bool {
        self == AnswerVerdict::Accepted
    }

    /// Rejected inputs are cleared for another try.
    pub fn clears_input(self) -> bool {
        self == AnswerVerdict::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_after_case_fold_and_whitespace_collapse() {
        assert!(check_answer("  alpha BETA ", "Alpha Beta"));
        assert!(check_answer("alpha \t\n beta", "ALPHA BETA"));
    }

    #[test]
    fn expected_side_is_normalized_too() {
        assert!(check_answer("upside down", "  Upside   Down "));
    }

    #[test]
    fn different_words_do_not_match() {
        assert!(!check_answer("alphabeta", "alpha beta"));
        assert!(!check_answer("", "alpha"));
    }

    #[test]
    fn verdict_messages_and_input_handling() {
        let accepted = AnswerVerdict::from_match(true);
        assert_eq!(accepted.message(), "ACCESS GRANTED");
        assert!(accepted.locks_input());
        assert!(!accepted.clears_input());

        let rejected = AnswerVerdict::from_match(false);
        assert!(rejected.clears_input());
        assert!(!rejected.locks_input());
    }
}
