//! Year-resolution state machine
//!
//! Pure bookkeeping: no timers, no I/O. The controller drives it and
//! publishes [`TemporalView`] after each transition.
//!
//! Every request bumps a monotonic generation token. Work started for an
//! older token can still finish, but [`TemporalState::complete`] drops it.

use std::sync::Arc;

use crate::core::calendar::{Year, YearRange};
use crate::core::error::{ChronoError, Result};
use crate::core::types::Locale;
use crate::llm::generator::GeneratorError;
use crate::snapshot::model::Snapshot;

/// Monotonic generation counter
pub type Token = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    PendingDebounce { year: Year },
    Resolving { year: Year, token: Token },
    Resolved { year: Year, snapshot: Arc<Snapshot> },
    Failed { year: Year, reason: GeneratorError },
}

/// Handle returned by a request; identifies the debounce run it started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub year: Year,
    pub token: Token,
}

/// Everything a resolution run needs, captured when it begins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveJob {
    pub year: Year,
    pub token: Token,
    pub force_refresh: bool,
    pub locale: Locale,
}

/// Observable state, as published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalView {
    /// Most recently requested year (already clamped)
    pub year: Year,
    pub phase: Phase,
    /// Last good snapshot; kept through failures
    pub displayed: Option<Arc<Snapshot>>,
    /// Selected civilization name, scoped to the displayed year
    pub selected: Option<String>,
    pub locale: Locale,
    pub autoplay: bool,
    pub token: Token,
}

impl TemporalView {
    pub fn error(&self) -> Option<&GeneratorError> {
        match &self.phase {
            Phase::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            Phase::PendingDebounce { .. } | Phase::Resolving { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct TemporalState {
    range: YearRange,
    year: Year,
    token: Token,
    force_refresh: bool,
    phase: Phase,
    displayed: Option<Arc<Snapshot>>,
    selected: Option<String>,
    locale: Locale,
    autoplay: bool,
}

impl TemporalState {
    pub fn new(range: YearRange, initial_year: Year, locale: Locale) -> Self {
        Self {
            range,
            year: range.clamp(initial_year as i64),
            token: 0,
            force_refresh: false,
            phase: Phase::Idle,
            displayed: None,
            selected: None,
            locale,
            autoplay: false,
        }
    }

    pub fn range(&self) -> YearRange {
        self.range
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn displayed(&self) -> Option<&Arc<Snapshot>> {
        self.displayed.as_ref()
    }

    pub fn is_current(&self, token: Token) -> bool {
        self.token == token
    }

    /// Start (or restart) the debounce window for `year`
    pub fn request(&mut self, year: i64, force_refresh: bool) -> Ticket {
        self.year = self.range.clamp(year);
        self.token += 1;
        self.force_refresh = force_refresh;
        self.phase = Phase::PendingDebounce { year: self.year };
        Ticket {
            year: self.year,
            token: self.token,
        }
    }

    /// Debounce elapsed for `token`; `None` if a newer request superseded it
    pub fn begin(&mut self, token: Token) -> Option<ResolveJob> {
        if !self.is_current(token) {
            return None;
        }
        self.selected = None;
        self.phase = Phase::Resolving {
            year: self.year,
            token,
        };
        Some(ResolveJob {
            year: self.year,
            token,
            force_refresh: self.force_refresh,
            locale: self.locale,
        })
    }

    /// Apply a finished resolution; returns false when the result is stale
    pub fn complete(
        &mut self,
        token: Token,
        outcome: std::result::Result<Arc<Snapshot>, GeneratorError>,
    ) -> bool {
        if !self.is_current(token) {
            return false;
        }
        let year = self.year;
        self.phase = match outcome {
            Ok(snapshot) => {
                self.displayed = Some(Arc::clone(&snapshot));
                self.selected = None;
                Phase::Resolved { year, snapshot }
            }
            Err(reason) => Phase::Failed { year, reason },
        };
        self.force_refresh = false;
        true
    }

    /// Make any in-flight result inert without starting a new request
    pub fn invalidate(&mut self) {
        self.token += 1;
        if self.is_loading() {
            self.phase = Phase::Idle;
        }
    }

    fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            Phase::PendingDebounce { .. } | Phase::Resolving { .. }
        )
    }

    pub fn set_locale(&mut self, locale: Locale) -> bool {
        let changed = self.locale != locale;
        self.locale = locale;
        changed
    }

    pub fn set_autoplay(&mut self, on: bool) {
        self.autoplay = on;
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Select a civilization of the displayed snapshot by name
    pub fn select(&mut self, name: &str) -> Result<()> {
        let known = self
            .displayed
            .as_ref()
            .map_or(false, |s| s.civilization(name).is_some());
        if !known {
            return Err(ChronoError::UnknownCivilization(name.to_string()));
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn view(&self) -> TemporalView {
        TemporalView {
            year: self.year,
            phase: self.phase.clone(),
            displayed: self.displayed.clone(),
            selected: self.selected.clone(),
            locale: self.locale,
            autoplay: self.autoplay,
            token: self.token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fallback::seed_snapshot;

    fn state() -> TemporalState {
        TemporalState::new(YearRange::default(), 0, Locale::English)
    }

    fn snapshot_for(year: Year) -> Arc<Snapshot> {
        let mut snapshot = seed_snapshot();
        snapshot.year = year;
        Arc::new(snapshot)
    }

    #[test]
    fn test_requests_are_clamped() {
        let mut s = state();
        assert_eq!(s.request(3000, false).year, 2024);
        assert_eq!(s.request(-5000, false).year, -3000);
        assert_eq!(s.phase(), &Phase::PendingDebounce { year: -3000 });
    }

    #[test]
    fn test_tokens_are_monotonic() {
        let mut s = state();
        let a = s.request(1, false);
        let b = s.request(2, false);
        assert!(b.token > a.token);
        s.invalidate();
        assert!(s.token() > b.token);
    }

    #[test]
    fn test_superseded_debounce_never_begins() {
        let mut s = state();
        let first = s.request(100, false);
        let second = s.request(200, false);
        assert!(s.begin(first.token).is_none());
        let job = s.begin(second.token).unwrap();
        assert_eq!(job.year, 200);
        assert_eq!(s.phase(), &Phase::Resolving { year: 200, token: second.token });
    }

    #[test]
    fn test_stale_completion_discarded_in_either_order() {
        // y1 resolving, y2 requested; y1 finishes last
        let mut s = state();
        let t1 = s.request(100, false);
        s.begin(t1.token).unwrap();
        let t2 = s.request(200, false);
        s.begin(t2.token).unwrap();
        assert!(s.complete(t2.token, Ok(snapshot_for(200))));
        assert!(!s.complete(t1.token, Ok(snapshot_for(100))));
        assert!(matches!(s.phase(), Phase::Resolved { year: 200, .. }));
        assert_eq!(s.displayed().unwrap().year, 200);

        // y1 finishes first
        let mut s = state();
        let t1 = s.request(100, false);
        s.begin(t1.token).unwrap();
        let t2 = s.request(200, false);
        assert!(!s.complete(t1.token, Ok(snapshot_for(100))));
        assert!(s.displayed().is_none());
        s.begin(t2.token).unwrap();
        assert!(s.complete(t2.token, Ok(snapshot_for(200))));
        assert_eq!(s.displayed().unwrap().year, 200);
    }

    #[test]
    fn test_failure_keeps_displayed_snapshot() {
        let mut s = state();
        let t = s.request(0, false);
        s.begin(t.token).unwrap();
        s.complete(t.token, Ok(snapshot_for(0)));

        let t = s.request(500, false);
        s.begin(t.token).unwrap();
        s.complete(t.token, Err(GeneratorError::Malformed("missing civilizations".into())));

        let view = s.view();
        assert!(matches!(view.error(), Some(GeneratorError::Malformed(_))));
        assert_eq!(view.displayed.unwrap().year, 0);
        assert_eq!(view.year, 500);
    }

    #[test]
    fn test_begin_clears_selection() {
        let mut s = state();
        let t = s.request(0, false);
        s.begin(t.token).unwrap();
        s.complete(t.token, Ok(snapshot_for(0)));
        s.select("Roman Empire").unwrap();
        assert_eq!(s.view().selected.as_deref(), Some("Roman Empire"));

        let t = s.request(10, false);
        // Selection survives the debounce window, cleared once resolution starts
        assert!(s.view().selected.is_some());
        s.begin(t.token).unwrap();
        assert!(s.view().selected.is_none());
    }

    #[test]
    fn test_selection_made_while_resolving_does_not_carry_over() {
        let mut s = state();
        let t = s.request(0, false);
        s.begin(t.token).unwrap();
        s.complete(t.token, Ok(snapshot_for(0)));

        let t = s.request(500, false);
        s.begin(t.token).unwrap();
        // Still showing year 0, so Rome is selectable
        s.select("Roman Empire").unwrap();

        let mut later = seed_snapshot();
        later.year = 500;
        later.civilizations.retain(|c| c.name != "Roman Empire");
        assert!(s.complete(t.token, Ok(Arc::new(later))));

        let view = s.view();
        assert_eq!(view.displayed.unwrap().year, 500);
        assert!(view.selected.is_none());
    }

    #[test]
    fn test_select_unknown_civilization() {
        let mut s = state();
        assert!(matches!(
            s.select("Roman Empire"),
            Err(ChronoError::UnknownCivilization(_))
        ));
        let t = s.request(0, false);
        s.begin(t.token).unwrap();
        s.complete(t.token, Ok(snapshot_for(0)));
        assert!(s.select("Atlantis").is_err());
        assert!(s.select("Han Dynasty").is_ok());
    }

    #[test]
    fn test_force_flag_is_captured_and_reset() {
        let mut s = state();
        let t = s.request(0, true);
        let job = s.begin(t.token).unwrap();
        assert!(job.force_refresh);
        s.complete(t.token, Ok(snapshot_for(0)));
        let t = s.request(0, false);
        assert!(!s.begin(t.token).unwrap().force_refresh);
    }

    #[test]
    fn test_invalidate_makes_inflight_inert() {
        let mut s = state();
        let t = s.request(100, false);
        s.begin(t.token).unwrap();
        s.invalidate();
        assert_eq!(s.phase(), &Phase::Idle);
        assert!(!s.complete(t.token, Ok(snapshot_for(100))));
    }
}
