//! # Decision — the Kernel's Output Verdict
//!
//! Three-valued, totally ordered by severity: `PASS(0) < NEED_ONE_BIT(1) <
//! HOLD_HUMAN(2)` (spec §8). The ordering underlies both the
//! monotone-in-amount and recent-activity-escalation invariants.

use serde::{Deserialize, Serialize};

/// The kernel's verdict for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// No further checks required.
    Pass,
    /// Resolvable by consulting the one-bit oracle (spec §4.D). Never
    /// appears in a committed bundle — the engine resolves it before
    /// signing (spec §9).
    NeedOneBit,
    /// Requires human review; the engine signs and records this directly.
    HoldHuman,
}

impl Decision {
    /// Numeric severity used by the monotonicity invariants: `PASS(0) <
    /// NEED_ONE_BIT(1) < HOLD_HUMAN(2)`.
    pub fn severity(self) -> u8 {
        match self {
            Decision::Pass => 0,
            Decision::NeedOneBit => 1,
            Decision::HoldHuman => 2,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Pass => "PASS",
            Decision::NeedOneBit => "NEED_ONE_BIT",
            Decision::HoldHuman => "HOLD_HUMAN",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_matches_spec() {
        assert!(Decision::Pass < Decision::NeedOneBit);
        assert!(Decision::NeedOneBit < Decision::HoldHuman);
        assert_eq!(Decision::Pass.severity(), 0);
        assert_eq!(Decision::NeedOneBit.severity(), 1);
        assert_eq!(Decision::HoldHuman.severity(), 2);
    }

    #[test]
    fn serializes_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&Decision::NeedOneBit).unwrap(), "\"NEED_ONE_BIT\"");
        assert_eq!(serde_json::to_string(&Decision::HoldHuman).unwrap(), "\"HOLD_HUMAN\"");
    }
}
