//! # The Kernel — `decide()`
//!
//! A pure function: the same `(Request, Parameters)` pair always produces
//! a byte-identical `KernelOutput` (spec §4.B, "Determinism"). No I/O, no
//! clock reads beyond the caller-supplied timestamp, no randomness.
//!
//! ## Rule Composition
//!
//! Two severity tiers compose into the final decision:
//!
//! - **Hard fail** (country not allowlisted, or `recent` at/above the
//!   escalation threshold): decision is `HOLD_HUMAN` outright — not
//!   recoverable by the one-bit oracle.
//! - **Soft fail** (amount above ceiling, or weekend): decision is
//!   `NEED_ONE_BIT` — the engine may resolve it via the oracle (spec
//!   §4.C step 4).
//! - Neither: `PASS`.
//!
//! This composition satisfies every contractually tested rule in spec
//! §4.B: hard fail dominates regardless of amount (monotone in amount
//! holds trivially on that branch), weekend only ever weakens an
//! otherwise-`PASS` outcome, and `recent` crossing the escalation
//! threshold can only move severity up, never down.

use crate::decision::Decision;
use crate::parameters::{Parameters, KEY_AMOUNT_MAX, KEY_RECENT_ESCALATION};
use decision_core::{Amount, CountryCode, Timestamp};
use serde::{Deserialize, Serialize};

/// The kernel's identifier, embedded in every bundle (spec §3). Fixed for
/// this kernel implementation; a future, differently-behaved kernel would
/// ship under a new id so old certificates remain attributable to the
/// rules that actually produced them.
pub const KERNEL_ID: &str = "refund-kernel-v1";

/// Obligation tag appended once the oracle is actually consulted (spec
/// §4.C step 4).
pub const OBLIGATION_WORLDCHECK_QUERIED: &str = "worldcheck_queried";

/// The kernel's inputs for a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub amount: Amount,
    pub country: CountryCode,
    pub ts: Timestamp,
    pub recent: u32,
}

/// The kernel's full output: verdict, obligations, and the identifiers
/// that tie this evaluation to a specific kernel version and parameter
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelOutput {
    pub decision: Decision,
    pub obligations: Vec<String>,
    pub kernel_id: String,
    pub param_hash: String,
}

/// Evaluate the policy kernel. Pure: depends only on its arguments.
pub fn decide(request: &Request, params: &Parameters) -> KernelOutput {
    let param_hash = params.param_hash();
    let mut obligations = Vec::new();

    let country_disallowed = !params.allows_country(&request.country);
    let recent_escalated = params
        .threshold(KEY_RECENT_ESCALATION)
        .map(|bound| rust_decimal::Decimal::from(request.recent) >= bound)
        .unwrap_or(false);
    let hard_fail = country_disallowed || recent_escalated;

    let amount_over_ceiling = params
        .threshold(KEY_AMOUNT_MAX)
        .map(|max| request.amount.value() > max)
        .unwrap_or(false);
    let is_weekend = request.ts.is_weekend_utc();
    let soft_fail = amount_over_ceiling || is_weekend;

    let decision = if hard_fail {
        Decision::HoldHuman
    } else if soft_fail {
        Decision::NeedOneBit
    } else {
        Decision::Pass
    };

    if country_disallowed {
        obligations.push("country_not_allowlisted".to_string());
    }
    if recent_escalated {
        obligations.push("recent_activity_escalated".to_string());
    }
    if amount_over_ceiling {
        obligations.push("amount_over_ceiling".to_string());
    }
    if is_weekend && decision != Decision::HoldHuman {
        obligations.push("weekend_guard".to_string());
    }

    KernelOutput {
        decision,
        obligations,
        kernel_id: KERNEL_ID.to_string(),
        param_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn weekday_ts() -> Timestamp {
        Timestamp::parse("2025-09-16T12:00:00Z").unwrap()
    }

    fn weekend_ts() -> Timestamp {
        Timestamp::parse("2025-09-14T13:00:00Z").unwrap()
    }

    fn req(amount: &str, country: &str, ts: Timestamp, recent: u32) -> Request {
        Request {
            amount: Amount::from_str(amount).unwrap(),
            country: CountryCode::new(country).unwrap(),
            ts,
            recent,
        }
    }

    #[test]
    fn scenario_1_small_amount_us_weekday_passes() {
        let out = decide(&req("100.00", "US", weekday_ts(), 0), &Parameters::defaults());
        assert_eq!(out.decision, Decision::Pass);
        assert_eq!(out.kernel_id, KERNEL_ID);
    }

    #[test]
    fn scenario_2_large_amount_disallowed_country_holds() {
        let out = decide(&req("5000.00", "RU", weekday_ts(), 0), &Parameters::defaults());
        assert_eq!(out.decision, Decision::HoldHuman);
    }

    #[test]
    fn scenario_3_over_ceiling_weekend_needs_one_bit() {
        let out = decide(&req("2800.00", "US", weekend_ts(), 3), &Parameters::defaults());
        assert_eq!(out.decision, Decision::NeedOneBit);
    }

    #[test]
    fn weekend_weakens_an_otherwise_passing_request() {
        let params = Parameters::defaults();
        let weekday = decide(&req("100.00", "US", weekday_ts(), 0), &params);
        let weekend = decide(&req("100.00", "US", weekend_ts(), 0), &params);
        assert_eq!(weekday.decision, Decision::Pass);
        assert_ne!(weekend.decision, Decision::Pass);
    }

    #[test]
    fn determinism_same_inputs_same_output() {
        let params = Parameters::defaults();
        let request = req("2800.00", "US", weekend_ts(), 3);
        let a = decide(&request, &params);
        let b = decide(&request, &params);
        assert_eq!(a.decision, b.decision);
        assert_eq!(a.obligations, b.obligations);
        assert_eq!(a.param_hash, b.param_hash);
    }

    #[test]
    fn recent_escalation_never_improves_decision() {
        let params = Parameters::defaults();
        let low = decide(&req("100.00", "US", weekday_ts(), 0), &params);
        let high = decide(&req("100.00", "US", weekday_ts(), 10), &params);
        assert!(high.decision.severity() >= low.decision.severity());
    }

    #[test]
    fn smaller_amount_never_yields_worse_decision() {
        let params = Parameters::defaults();
        let small = decide(&req("100.00", "US", weekday_ts(), 0), &params);
        let large = decide(&req("5000.00", "US", weekday_ts(), 0), &params);
        assert!(small.decision.severity() <= large.decision.severity());
    }

    #[test]
    fn need_one_bit_never_mixes_with_hard_fail_obligations() {
        let out = decide(&req("5000.00", "RU", weekend_ts(), 0), &Parameters::defaults());
        assert_eq!(out.decision, Decision::HoldHuman);
        assert!(!out.obligations.contains(&"weekend_guard".to_string()));
    }

    #[test]
    fn param_hash_reflects_active_snapshot() {
        let mut params = Parameters::defaults();
        let before = decide(&req("100.00", "US", weekday_ts(), 0), &params).param_hash;
        params.set_threshold(KEY_AMOUNT_MAX.to_string(), Decimal::from_str("1.00").unwrap());
        let after = decide(&req("100.00", "US", weekday_ts(), 0), &params).param_hash;
        assert_ne!(before, after);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn amount_strategy() -> impl Strategy<Value = String> {
            (0u32..1_000_000u32).prop_map(|cents| format!("{}.{:02}", cents / 100, cents % 100))
        }

        proptest! {
            #[test]
            fn monotone_in_amount(a1_cents in 0u32..1_000_000, a2_cents in 0u32..1_000_000, recent in 0u32..10) {
                let params = Parameters::defaults();
                let (lo_cents, hi_cents) = if a1_cents <= a2_cents { (a1_cents, a2_cents) } else { (a2_cents, a1_cents) };
                let lo = format!("{}.{:02}", lo_cents / 100, lo_cents % 100);
                let hi = format!("{}.{:02}", hi_cents / 100, hi_cents % 100);
                let lo_out = decide(&req(&lo, "US", weekday_ts(), recent), &params);
                let hi_out = decide(&req(&hi, "US", weekday_ts(), recent), &params);
                prop_assert!(lo_out.decision.severity() <= hi_out.decision.severity());
            }

            #[test]
            fn recent_never_improves(recent1 in 0u32..20, recent2 in 0u32..20, amount in amount_strategy()) {
                let params = Parameters::defaults();
                let (lo, hi) = if recent1 <= recent2 { (recent1, recent2) } else { (recent2, recent1) };
                let lo_out = decide(&req(&amount, "US", weekday_ts(), lo), &params);
                let hi_out = decide(&req(&amount, "US", weekday_ts(), hi), &params);
                prop_assert!(lo_out.decision.severity() <= hi_out.decision.severity());
            }

            #[test]
            fn deterministic_across_repeated_calls(amount in amount_strategy(), recent in 0u32..10) {
                let params = Parameters::defaults();
                let request = req(&amount, "US", weekday_ts(), recent);
                let a = decide(&request, &params);
                let b = decide(&request, &params);
                prop_assert_eq!(a.decision, b.decision);
                prop_assert_eq!(a.obligations, b.obligations);
            }

            #[test]
            fn weekend_never_strengthens_a_non_pass_result(amount in amount_strategy(), recent in 0u32..10) {
                let params = Parameters::defaults();
                let weekday_out = decide(&req(&amount, "US", weekday_ts(), recent), &params);
                let weekend_out = decide(&req(&amount, "US", weekend_ts(), recent), &params);
                if weekday_out.decision != Decision::Pass {
                    prop_assert_eq!(weekday_out.decision, weekend_out.decision);
                }
            }
        }
    }
}
