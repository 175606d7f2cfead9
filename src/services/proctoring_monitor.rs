use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::test_policy::VIOLATION_THRESHOLD;
use crate::models::domain::{ViolationKind, ViolationLedger};

/// One observed integrity signal, as reported by the client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IntegrityEvent {
    pub event_id: String,
    pub kind: ViolationKind,
    pub observed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProctoringWarning {
    pub kind: ViolationKind,
    pub total: u32,
    pub threshold: u32,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MonitorOutcome {
    /// Duplicate, absorbed into an earlier event, or the session already forced.
    Ignored,
    Warned(ProctoringWarning),
    ForceSubmit(ProctoringWarning),
}

impl MonitorOutcome {
    pub fn warning(&self) -> Option<&ProctoringWarning> {
        match self {
            MonitorOutcome::Ignored => None,
            MonitorOutcome::Warned(w) | MonitorOutcome::ForceSubmit(w) => Some(w),
        }
    }
}

/// Turns integrity signals into ledger increments and warnings.
///
/// Each physical event is counted at most once: repeated `event_id`s are
/// dropped, and focus-loss signals (tab switch, suspected notification) that
/// land inside `focus_loss_window` of the last counted focus loss are absorbed
/// into it. Once the combined total reaches the threshold the monitor requests
/// a single forced submission and ignores everything after.
#[derive(Debug, Clone)]
pub struct ProctoringMonitor {
    focus_loss_window: Duration,
    seen_events: HashSet<String>,
    last_focus_loss: Option<DateTime<Utc>>,
    force_submit_requested: bool,
}

impl ProctoringMonitor {
    pub fn new(focus_loss_window_ms: i64) -> Self {
        Self {
            focus_loss_window: Duration::milliseconds(focus_loss_window_ms.max(0)),
            seen_events: HashSet::new(),
            last_focus_loss: None,
            force_submit_requested: false,
        }
    }

    pub fn force_submit_requested(&self) -> bool {
        self.force_submit_requested
    }

    pub fn observe(
        &mut self,
        ledger: ViolationLedger,
        event: &IntegrityEvent,
    ) -> (ViolationLedger, MonitorOutcome) {
        if self.force_submit_requested {
            return (ledger, MonitorOutcome::Ignored);
        }

        if !self.seen_events.insert(event.event_id.clone()) {
            log::debug!("Dropping duplicate integrity event {}", event.event_id);
            return (ledger, MonitorOutcome::Ignored);
        }

        // observed_at is client-reported, bounded to receipt time by the request layer.
        if event.kind.is_focus_loss() {
            if let Some(last) = self.last_focus_loss {
                if (event.observed_at - last).abs() <= self.focus_loss_window {
                    log::debug!(
                        "Absorbing {} event {} into focus loss at {}",
                        event.kind,
                        event.event_id,
                        last
                    );
                    return (ledger, MonitorOutcome::Ignored);
                }
            }
            self.last_focus_loss = Some(event.observed_at);
        }

        let ledger = ledger.record(event.kind);
        let total = ledger.total();

        if ledger.threshold_reached() {
            self.force_submit_requested = true;
            let warning = ProctoringWarning {
                kind: event.kind,
                total,
                threshold: VIOLATION_THRESHOLD,
                message: format!(
                    "Violation limit reached ({}/{}): {} detected. Your test is being submitted automatically and your results may be affected.",
                    total, VIOLATION_THRESHOLD, describe(event.kind)
                ),
            };
            return (ledger, MonitorOutcome::ForceSubmit(warning));
        }

        let warning = ProctoringWarning {
            kind: event.kind,
            total,
            threshold: VIOLATION_THRESHOLD,
            message: format!(
                "Warning {}/{}: {} detected. The test is submitted automatically after {} violations and your results may be affected.",
                total, VIOLATION_THRESHOLD, describe(event.kind), VIOLATION_THRESHOLD
            ),
        };
        (ledger, MonitorOutcome::Warned(warning))
    }
}

fn describe(kind: ViolationKind) -> &'static str {
    match kind {
        ViolationKind::FullscreenExit => "Leaving fullscreen",
        ViolationKind::TabSwitch => "Switching tabs or windows",
        ViolationKind::ExternalNotification => "An external notification interrupting the test",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn event(id: &str, kind: ViolationKind, seconds: i64) -> IntegrityEvent {
        IntegrityEvent {
            event_id: id.to_string(),
            kind,
            observed_at: at(seconds),
        }
    }

    #[test]
    fn every_counted_event_produces_its_own_warning() {
        let mut monitor = ProctoringMonitor::new(1_000);
        let ledger = ViolationLedger::default();

        let (ledger, first) =
            monitor.observe(ledger, &event("e1", ViolationKind::FullscreenExit, 0));
        let (_, second) = monitor.observe(ledger, &event("e2", ViolationKind::TabSwitch, 10));

        let first = first.warning().expect("first event warns").clone();
        let second = second.warning().expect("second event warns").clone();
        assert_eq!(first.total, 1);
        assert_eq!(second.total, 2);
        assert_ne!(first.message, second.message);
        assert!(first.message.contains("1/3"));
        assert!(second.message.contains("2/3"));
    }

    #[test]
    fn duplicate_event_ids_are_counted_once() {
        let mut monitor = ProctoringMonitor::new(0);
        let ledger = ViolationLedger::default();
        let e = event("same", ViolationKind::FullscreenExit, 0);

        let (ledger, _) = monitor.observe(ledger, &e);
        let (ledger, outcome) = monitor.observe(ledger, &e);

        assert_eq!(outcome, MonitorOutcome::Ignored);
        assert_eq!(ledger.fullscreen_exits, 1);
    }

    #[test]
    fn tab_switch_is_not_also_counted_as_notification() {
        let mut monitor = ProctoringMonitor::new(1_000);
        let ledger = ViolationLedger::default();

        let (ledger, _) = monitor.observe(ledger, &event("blur", ViolationKind::TabSwitch, 0));
        let mut echo = event("notif", ViolationKind::ExternalNotification, 0);
        echo.observed_at = at(0) + Duration::milliseconds(300);
        let (ledger, outcome) = monitor.observe(ledger, &echo);

        assert_eq!(outcome, MonitorOutcome::Ignored);
        assert_eq!(ledger.tab_switches, 1);
        assert_eq!(ledger.external_notifications, 0);
    }

    #[test]
    fn fullscreen_exit_is_never_absorbed_by_focus_window() {
        let mut monitor = ProctoringMonitor::new(1_000);
        let ledger = ViolationLedger::default();

        let (ledger, _) = monitor.observe(ledger, &event("tab", ViolationKind::TabSwitch, 0));
        let (ledger, outcome) =
            monitor.observe(ledger, &event("fs", ViolationKind::FullscreenExit, 0));

        assert!(matches!(outcome, MonitorOutcome::Warned(_)));
        assert_eq!(ledger.total(), 2);
    }

    #[test]
    fn threshold_forces_submit_exactly_once() {
        let mut monitor = ProctoringMonitor::new(1_000);
        let mut ledger = ViolationLedger::default();
        let mut forced = 0;

        let events = [
            event("a", ViolationKind::ExternalNotification, 0),
            event("b", ViolationKind::FullscreenExit, 5),
            event("c", ViolationKind::TabSwitch, 10),
            event("d", ViolationKind::TabSwitch, 20),
            event("e", ViolationKind::FullscreenExit, 30),
        ];
        for e in &events {
            let (next, outcome) = monitor.observe(ledger, e);
            ledger = next;
            if matches!(outcome, MonitorOutcome::ForceSubmit(_)) {
                forced += 1;
            }
        }

        assert_eq!(forced, 1);
        assert_eq!(ledger.total(), 3);
        assert!(monitor.force_submit_requested());
    }
}
