//! Pure admission decision for a gated page.

use crate::core::progress::Progress;
use crate::core::types::Denial;

/// First step in `required` (in rule order) that is not done.
pub fn first_unmet(required: &[u8], progress: &Progress) -> Option<u8> {
    required
        .iter()
        .copied()
        .find(|step| !progress.is_done(*step))
}

/// Decide whether a gated page with an active session may render.
///
/// Depends only on the completed steps and the page's rule.
pub fn admit(progress: &Progress, required: &[u8]) -> Result<(), Denial> {
    match first_unmet(required, progress) {
        Some(step) => Err(Denial::UnmetPrerequisite { step }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn progress(done: &[u8]) -> Progress {
        Progress::from_completed(5, &done.iter().copied().collect::<BTreeSet<u8>>())
    }

    #[test]
    fn empty_rule_always_admits() {
        assert_eq!(admit(&progress(&[]), &[]), Ok(()));
    }

    #[test]
    fn reports_first_unmet_step_in_rule_order() {
        assert_eq!(
            admit(&progress(&[3]), &[1, 2, 3]),
            Err(Denial::UnmetPrerequisite { step: 1 })
        );
        assert_eq!(
            admit(&progress(&[1, 3]), &[1, 2, 3]),
            Err(Denial::UnmetPrerequisite { step: 2 })
        );
    }

    #[test]
    fn admits_iff_every_required_step_is_done() {
        let rule = [1, 2, 3, 4];
        for mask in 0u8..32 {
            let done: Vec<u8> = (1..=5).filter(|s| mask & (1 << (s - 1)) != 0).collect();
            let expected = rule.iter().all(|s| done.contains(s));
            assert_eq!(
                admit(&progress(&done), &rule).is_ok(),
                expected,
                "done={done:?}"
            );
        }
    }
}
