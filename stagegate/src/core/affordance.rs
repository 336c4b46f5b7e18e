//! Hub "next action" table.
//!
//! Each row is a predicate over step completion and is evaluated on its own.
//! With steps completed in order at most one row is visible at a time.

use serde::Serialize;

use crate::core::progress::Progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HubAffordance {
    GoClue1,
    ConfirmDrive,
    GoMorse,
    GoBreach,
    MissionComplete,
}

impl HubAffordance {
    pub const ALL: [HubAffordance; 5] = [
        HubAffordance::GoClue1,
        HubAffordance::ConfirmDrive,
        HubAffordance::GoMorse,
        HubAffordance::GoBreach,
        HubAffordance::MissionComplete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HubAffordance::GoClue1 => "go to clue 1",
            HubAffordance::ConfirmDrive => "confirm drive",
            HubAffordance::GoMorse => "go to morse puzzle",
            HubAffordance::GoBreach => "go to breach",
            HubAffordance::MissionComplete => "mission complete",
        }
    }

    pub fn is_visible(self, progress: &Progress) -> bool {
        let done = |n| progress.is_done(n);
        match self {
            HubAffordance::GoClue1 => !done(2),
            HubAffordance::ConfirmDrive => done(2) && !done(3),
            HubAffordance::GoMorse => done(3) && !done(4),
            HubAffordance::GoBreach => done(4) && !done(5),
            HubAffordance::MissionComplete => done(5),
        }
    }
}

/// Affordances the hub shows for `progress`, in table order.
pub fn visible_affordances(progress: &Progress) -> Vec<HubAffordance> {
    HubAffordance::ALL
        .into_iter()
        .filter(|a| a.is_visible(progress))
        .collect()
}
