use std::fmt;

use async_graphql::{Enum, SimpleObject};
use serde::{Deserialize, Serialize};

use crate::constants::test_policy::VIOLATION_THRESHOLD;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    FullscreenExit,
    TabSwitch,
    ExternalNotification,
}

impl ViolationKind {
    /// Tab switches and suspected notifications both surface as a loss of focus.
    pub fn is_focus_loss(&self) -> bool {
        matches!(
            self,
            ViolationKind::TabSwitch | ViolationKind::ExternalNotification
        )
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::FullscreenExit => write!(f, "fullscreen exit"),
            ViolationKind::TabSwitch => write!(f, "tab switch"),
            ViolationKind::ExternalNotification => write!(f, "external notification"),
        }
    }
}

/// Integrity counters for one session. Updates return a new ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct ViolationLedger {
    pub fullscreen_exits: u32,
    pub tab_switches: u32,
    pub external_notifications: u32,
}

/// The ledger as reported alongside a result.
pub type ViolationSummary = ViolationLedger;

impl ViolationLedger {
    pub fn record(self, kind: ViolationKind) -> Self {
        let mut next = self;
        match kind {
            ViolationKind::FullscreenExit => next.fullscreen_exits += 1,
            ViolationKind::TabSwitch => next.tab_switches += 1,
            ViolationKind::ExternalNotification => next.external_notifications += 1,
        }
        next
    }

    pub fn count(&self, kind: ViolationKind) -> u32 {
        match kind {
            ViolationKind::FullscreenExit => self.fullscreen_exits,
            ViolationKind::TabSwitch => self.tab_switches,
            ViolationKind::ExternalNotification => self.external_notifications,
        }
    }

    pub fn total(&self) -> u32 {
        self.fullscreen_exits + self.tab_switches + self.external_notifications
    }

    pub fn threshold_reached(&self) -> bool {
        self.total() >= VIOLATION_THRESHOLD
    }
}
