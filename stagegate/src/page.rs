//! One page load, modelled as an explicit state machine.
//!
//! Loading a page runs the [`AccessGuard`]; only an admitted page starts the
//! [`CountdownTimer`], which fires immediately and then on a recurring task.
//! Every transition that leaves the page yields a [`Navigation::Redirect`] and
//! tears the context down: pending tasks are dropped and nothing fires again.
//! Only the store outlives a page.

use anyhow::Result;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::core::answer::{AnswerVerdict, check_answer};
use crate::core::progress::Progress;
use crate::core::reveal::RevealPlan;
use crate::core::types::{Denial, Navigation, PageId};
use crate::guard::{AccessGuard, Admission};
use crate::io::config::StageConfig;
use crate::io::store::SessionStore;
use crate::ledger::StepLedger;
use crate::scheduler::{Scheduler, TaskHandle, TaskQueue};
use crate::session::start_session;
use crate::timer::{CountdownTimer, Tick, TickOutcome};

/// Where the page is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagePhase {
    /// Entry or failure page. No guard, no countdown.
    Ungated,
    /// No valid session; navigating to the entry page.
    NoSession,
    /// A prerequisite of `page` is unmet; navigating to the hub.
    AwaitingPrerequisite { page: PageId, step: u8 },
    /// Admitted and counting down.
    Running,
    /// The countdown reached zero on this page.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageTask {
    CountdownTick,
    RevealLine { index: usize, text: String },
    RevealComplete,
    AnswerAccepted,
}

/// Something a collaborator should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Tick(Tick),
    Redirect(PageId),
    RevealLine { index: usize, text: String },
    RevealComplete,
    /// Deferred continuation of an accepted answer.
    AnswerAccepted,
}

pub struct PageContext<'c, S: SessionStore> {
    store: S,
    config: &'c StageConfig,
    clock: Clock,
    page: PageId,
    phase: PagePhase,
    navigation: Navigation,
    timer: CountdownTimer,
    tasks: TaskQueue<PageTask>,
    tick_handle: Option<TaskHandle>,
    last_tick: Option<Tick>,
}

impl<'c, S: SessionStore> PageContext<'c, S> {
    /// Load `page`: guard it, then start the countdown if admitted.
    pub fn load(store: S, config: &'c StageConfig, clock: Clock, page: PageId) -> Result<Self> {
        let admission = AccessGuard::new(config).check(&store, &page)?;
        let mut ctx = Self {
            store,
            config,
            clock,
            page,
            phase: PagePhase::Ungated,
            navigation: Navigation::Stay,
            timer: CountdownTimer::new(config.warning_threshold_secs, config.failure_page()),
            tasks: TaskQueue::new(),
            tick_handle: None,
            last_tick: None,
        };

        match admission {
            Admission::Ungated => {}
            Admission::Redirect { to, denial } => {
                ctx.phase = match denial {
                    Denial::MissingSession => PagePhase::NoSession,
                    Denial::UnmetPrerequisite { step } => PagePhase::AwaitingPrerequisite {
                        page: ctx.page.clone(),
                        step,
                    },
                };
                ctx.leave(to);
            }
            Admission::Admitted { expiry_ms } => {
                ctx.phase = PagePhase::Running;
                ctx.timer.start(expiry_ms);
                let mut events = Vec::new();
                ctx.fire_countdown(&mut events)?;
                if ctx.phase == PagePhase::Running {
                    let now_ms = ctx.clock.now_ms();
                    let handle = ctx.tasks.schedule_every(
                        now_ms,
                        config.tick_interval(),
                        PageTask::CountdownTick,
                    );
                    ctx.tick_handle = Some(handle);
                }
            }
        }
        debug!(page = %ctx.page, phase = ?ctx.phase, "page loaded");
        Ok(ctx)
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    pub fn phase(&self) -> &PagePhase {
        &self.phase
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    /// True until the page navigates away.
    pub fn is_active(&self) -> bool {
        self.navigation == Navigation::Stay
    }

    /// Most recent countdown display, if the countdown ever fired.
    pub fn last_tick(&self) -> Option<&Tick> {
        self.last_tick.as_ref()
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn next_due_ms(&self) -> Option<i64> {
        self.tasks.next_due_ms()
    }

    /// Whether the recurring countdown task is still scheduled.
    pub fn countdown_scheduled(&self) -> bool {
        self.tick_handle
            .is_some_and(|handle| self.tasks.is_pending(handle))
    }

    /// Advance a fixed clock and run whatever became due.
    pub fn advance(&mut self, delta: std::time::Duration) -> Result<Vec<PageEvent>> {
        self.clock.advance(delta);
        self.run_due()
    }

    /// Run every task due at the current time, in due order.
    ///
    /// Stops early when a task navigates away.
    pub fn run_due(&mut self) -> Result<Vec<PageEvent>> {
        let mut events = Vec::new();
        let now_ms = self.clock.now_ms();
        while self.is_active() {
            let Some((_, task)) = self.tasks.pop_due(now_ms) else {
                break;
            };
            match task {
                PageTask::CountdownTick => self.fire_countdown(&mut events)?,
                PageTask::RevealLine { index, text } => {
                    events.push(PageEvent::RevealLine { index, text });
                }
                PageTask::RevealComplete => events.push(PageEvent::RevealComplete),
                PageTask::AnswerAccepted => events.push(PageEvent::AnswerAccepted),
            }
        }
        Ok(events)
    }

    fn fire_countdown(&mut self, events: &mut Vec<PageEvent>) -> Result<()> {
        let now_ms = self.clock.now_ms();
        match self.timer.tick(&self.store, now_ms)? {
            TickOutcome::Inert => {}
            TickOutcome::Running(tick) => {
                self.last_tick = Some(tick.clone());
                events.push(PageEvent::Tick(tick));
            }
            TickOutcome::Expired { tick, redirect } => {
                self.last_tick = Some(tick.clone());
                events.push(PageEvent::Tick(tick));
                if let Some(handle) = self.tick_handle.take() {
                    self.tasks.cancel(handle);
                }
                self.phase = PagePhase::Expired;
                events.push(PageEvent::Redirect(redirect.clone()));
                self.leave(redirect);
            }
        }
        Ok(())
    }

    fn leave(&mut self, to: PageId) {
        info!(from = %self.page, to = %to, "redirect");
        self.navigation = Navigation::Redirect(to);
        self.teardown();
    }

    /// Drop all pending work. The page context is finished afterwards.
    pub fn teardown(&mut self) {
        self.tasks.clear();
        self.tick_handle = None;
        self.timer.stop();
    }

    /// Start a new session from this page and navigate to the hub.
    pub fn start_session(&mut self) -> Result<&Navigation> {
        if let Navigation::Redirect(to) = start_session(&self.store, &self.clock, self.config)? {
            self.leave(to);
        }
        Ok(&self.navigation)
    }

    /// Record a solved step.
    pub fn mark_step(&self, n: u8) -> Result<()> {
        let ledger = StepLedger::new(&self.store, self.config.max_steps);
        ledger.mark_step_done(ledger.step(n)?)
    }

    pub fn progress(&self) -> Result<Progress> {
        StepLedger::new(&self.store, self.config.max_steps).progress()
    }

    /// Check an answer. An accepted answer schedules its continuation.
    pub fn submit_answer(&mut self, candidate: &str, expected: &str) -> AnswerVerdict {
        let verdict = AnswerVerdict::from_match(check_answer(candidate, expected));
        if verdict == AnswerVerdict::Accepted && self.is_active() {
            let now_ms = self.clock.now_ms();
            self.tasks.schedule(
                now_ms,
                self.config.answer_continuation(),
                PageTask::AnswerAccepted,
            );
        }
        debug!(page = %self.page, ?verdict, "answer checked");
        verdict
    }

    /// Queue a staged reveal. Returns false if the page already left.
    pub fn play_reveal(&mut self, plan: &RevealPlan) -> bool {
        if !self.is_active() {
            return false;
        }
        let now_ms = self.clock.now_ms();
        for (index, line) in plan.lines.iter().enumerate() {
            self.tasks.schedule(
                now_ms,
                std::time::Duration::from_millis(line.offset_ms),
                PageTask::RevealLine {
                    index,
                    text: line.text.clone(),
                },
            );
        }
        if let Some(complete_at_ms) = plan.complete_at_ms {
            self.tasks.schedule(
                now_ms,
                std::time::Duration::from_millis(complete_at_ms),
                PageTask::RevealComplete,
            );
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::FIXED_TEST_MS;
    use crate::core::reveal::{breach_plan, story_plan};
    use crate::io::store::MemoryStore;
    use crate::session::{EXPIRY_KEY, read_expiry};

    fn started_store(config: &StageConfig) -> MemoryStore {
        let store = MemoryStore::new();
        start_session(&store, &Clock::fixed(FIXED_TEST_MS), config).expect("start");
        store
    }

    #[test]
    fn admitted_page_ticks_every_second() {
        let config = StageConfig::default();
        let store = started_store(&config);
        let mut page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS),
            PageId::new("dashboard.html"),
        )
        .expect("load");

        assert_eq!(page.phase(), &PagePhase::Running);
        assert_eq!(page.last_tick().map(|t| t.display.as_str()), Some("45:00"));
        assert!(page.countdown_scheduled());

        let mut displays = Vec::new();
        for _ in 0..2 {
            for event in page.advance(Duration::from_secs(1)).expect("advance") {
                if let PageEvent::Tick(tick) = event {
                    displays.push(tick.display);
                }
            }
        }
        assert_eq!(displays, vec!["44:59", "44:58"]);
    }

    #[test]
    fn stalled_page_catches_up_with_a_single_tick() {
        let config = StageConfig::default();
        let store = started_store(&config);
        let mut page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS),
            PageId::new("dashboard.html"),
        )
        .expect("load");

        let events = page.advance(Duration::from_secs(10)).expect("advance");
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], PageEvent::Tick(tick) if tick.display == "44:50"));
        assert_eq!(page.next_due_ms(), Some(FIXED_TEST_MS + 11_000));
    }

    #[test]
    fn reload_resumes_from_stored_expiry() {
        let config = StageConfig::default();
        let store = started_store(&config);
        let later = Clock::fixed(FIXED_TEST_MS + 10 * 60 * 1000);
        let page =
            PageContext::load(&store, &config, later, PageId::new("clue1.html")).expect("load");
        assert_eq!(page.last_tick().map(|t| t.remaining_secs), Some(35 * 60));
    }

    #[test]
    fn expiry_redirects_once_and_stops_ticking() {
        let config = StageConfig::default();
        let store = started_store(&config);
        let mut page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS + 2_699_000),
            PageId::new("dashboard.html"),
        )
        .expect("load");
        assert!(page.last_tick().expect("tick").warning);

        let events = page.advance(Duration::from_secs(5)).expect("advance");
        let redirects: Vec<&PageEvent> = events
            .iter()
            .filter(|e| matches!(e, PageEvent::Redirect(_)))
            .collect();
        assert_eq!(
            redirects,
            vec![&PageEvent::Redirect(PageId::new("fail.html"))]
        );
        assert_eq!(page.phase(), &PagePhase::Expired);
        assert!(!page.countdown_scheduled());
        assert_eq!(read_expiry(&store).expect("read"), None);

        assert!(page.advance(Duration::from_secs(60)).expect("advance").is_empty());
    }

    #[test]
    fn excluded_page_has_no_countdown() {
        let config = StageConfig::default();
        let store = MemoryStore::new();
        let page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS),
            PageId::new("index.html"),
        )
        .expect("load");
        assert_eq!(page.phase(), &PagePhase::Ungated);
        assert!(page.is_active());
        assert!(page.last_tick().is_none());
        assert_eq!(page.next_due_ms(), None);
    }

    #[test]
    fn start_session_from_entry_navigates_to_hub() {
        let config = StageConfig::default();
        let store = MemoryStore::new();
        store.set("step5", "1").expect("set");
        let mut page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS),
            PageId::new("index.html"),
        )
        .expect("load");

        let nav = page.start_session().expect("start").clone();
        assert_eq!(nav, Navigation::Redirect(PageId::new("dashboard.html")));
        assert_eq!(
            store.get(EXPIRY_KEY).expect("get"),
            Some((FIXED_TEST_MS + 2_700_000).to_string())
        );
        assert!(page.progress().expect("progress").completed().is_empty());
    }

    #[test]
    fn accepted_answer_continues_after_delay() {
        let config = StageConfig::default();
        let store = started_store(&config);
        let mut page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS),
            PageId::new("clue1.html"),
        )
        .expect("load");

        assert_eq!(page.submit_answer("wrong", "Alpha Beta"), AnswerVerdict::Rejected);
        assert_eq!(
            page.submit_answer("  alpha BETA ", "Alpha Beta"),
            AnswerVerdict::Accepted
        );
        let early = page.advance(Duration::from_millis(500)).expect("advance");
        assert!(!early.contains(&PageEvent::AnswerAccepted));
        let later = page.advance(Duration::from_millis(100)).expect("advance");
        assert_eq!(later, vec![PageEvent::AnswerAccepted]);
    }

    #[test]
    fn story_reveal_plays_on_entry_page() {
        let config = StageConfig::default();
        let store = MemoryStore::new();
        let mut page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS),
            PageId::new("index.html"),
        )
        .expect("load");

        assert!(page.play_reveal(&story_plan(&["signal lost", "gate open"])));
        let events = page.advance(Duration::from_millis(4700)).expect("advance");
        assert_eq!(
            events,
            vec![
                PageEvent::RevealLine {
                    index: 0,
                    text: "signal lost".to_string()
                },
                PageEvent::RevealLine {
                    index: 1,
                    text: "gate open".to_string()
                },
                PageEvent::RevealComplete,
            ]
        );
    }

    #[test]
    fn expiry_drops_pending_reveal() {
        let config = StageConfig::default();
        let store = started_store(&config);
        let ledger = StepLedger::new(&store, config.max_steps);
        for n in 1..=4 {
            ledger.mark_step_done(ledger.step(n).expect("step")).expect("mark");
        }
        let mut page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS + 2_698_000),
            PageId::new("breach.html"),
        )
        .expect("load");
        assert!(page.play_reveal(&breach_plan()));

        let events = page.advance(Duration::from_secs(10)).expect("advance");
        assert!(events.contains(&PageEvent::Redirect(PageId::new("fail.html"))));
        assert!(!events.contains(&PageEvent::RevealComplete));
        assert!(!page.play_reveal(&breach_plan()));
        assert_eq!(page.next_due_ms(), None);
    }

    #[test]
    fn unmet_prerequisite_navigates_to_hub_without_countdown() {
        let config = StageConfig::default();
        let store = started_store(&config);
        page_mark(&store, &config, 3);
        let page = PageContext::load(
            &store,
            &config,
            Clock::fixed(FIXED_TEST_MS),
            PageId::new("morse.html"),
        )
        .expect("load");

        assert_eq!(
            page.phase(),
            &PagePhase::AwaitingPrerequisite {
                page: PageId::new("morse.html"),
                step: 1
            }
        );
        assert_eq!(
            page.navigation(),
            &Navigation::Redirect(PageId::new("dashboard.html"))
        );
        assert!(!page.countdown_scheduled());
        assert!(page.last_tick().is_none());
    }

    fn page_mark(store: &MemoryStore, config: &StageConfig, n: u8) {
        let ledger = StepLedger::new(store, config.max_steps);
        ledger.mark_step_done(ledger.step(n).expect("step")).expect("mark");
    }
}
