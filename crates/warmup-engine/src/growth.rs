// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Growth curves: how many emails a campaign may send on a given day.
//!
//! Every mode except an explicit plan entry is capped by
//! `ceil(total_contacts / duration_days)`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use warmup_core::types::{GrowthMode, GrowthParams, GrowthPlan};

/// Upper bound on any computed daily quota.
pub fn daily_cap(params: &GrowthParams) -> u32 {
    if params.duration_days == 0 {
        return 0;
    }
    params.total_contacts.div_ceil(params.duration_days)
}

/// Emails allowed on campaign `day` (1-based).
///
/// Days before the start, campaigns with no contacts, and campaigns with no
/// duration all yield 0.
pub fn daily_quota(day: i64, plan: &GrowthPlan) -> u32 {
    let params = &plan.params;
    if day <= 0 || params.duration_days == 0 || params.total_contacts == 0 {
        return 0;
    }

    if let GrowthMode::ExplicitPlan { entries } = &plan.mode {
        if let Some(entry) = entries.iter().find(|e| e.day == day) {
            return entry.email_count;
        }
    }

    let cap = daily_cap(params);
    let raw = raw_volume(day, plan, cap);
    raw.min(u64::from(cap)) as u32
}

/// Uncapped volume of the growth mode.
fn raw_volume(day: i64, plan: &GrowthPlan, cap: u32) -> u64 {
    let params = &plan.params;
    let start = u64::from(params.start_volume);
    let elapsed = (day - 1) as u64;

    match &plan.mode {
        GrowthMode::Arithmetic | GrowthMode::ExplicitPlan { .. } => arithmetic(params, elapsed),
        GrowthMode::Flat => start,
        GrowthMode::Geometric { multiplier } => {
            let exponent = i32::try_from(elapsed).unwrap_or(i32::MAX);
            // `as` saturates for out-of-range and infinite floats.
            (start as f64 * multiplier.powi(exponent)).floor() as u64
        }
        GrowthMode::Progressive => {
            let cap = u64::from(cap);
            let last = u64::from(params.duration_days).saturating_sub(1);
            if last == 0 || elapsed >= last || cap <= start {
                return cap;
            }
            start + (cap - start) * elapsed / last
        }
        GrowthMode::Randomized {
            jitter_percent,
            seed,
        } => {
            let base = arithmetic(params, elapsed);
            let spread = i64::from(*jitter_percent);
            let mut rng =
                StdRng::seed_from_u64(seed ^ (day as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let pct = rng.gen_range(-spread..=spread);
            let scaled = i128::from(base) * i128::from(100 + pct) / 100;
            scaled.clamp(0, i128::from(u64::MAX)) as u64
        }
    }
}

fn arithmetic(params: &GrowthParams, elapsed: u64) -> u64 {
    u64::from(params.start_volume)
        .saturating_add(elapsed.saturating_mul(u64::from(params.daily_increment)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use warmup_core::types::PlanEntry;

    fn plan(start: u32, duration: u32, increment: u32, total: u32, mode: GrowthMode) -> GrowthPlan {
        GrowthPlan {
            params: GrowthParams {
                start_volume: start,
                duration_days: duration,
                daily_increment: increment,
                total_contacts: total,
            },
            mode,
        }
    }

    #[test]
    fn arithmetic_day_three_is_thirty() {
        let p = plan(20, 10, 5, 500, GrowthMode::Arithmetic);
        assert_eq!(daily_quota(3, &p), 30);
    }

    #[test]
    fn arithmetic_table() {
        let p = plan(20, 10, 5, 500, GrowthMode::Arithmetic);
        let cases = [(1, 20), (2, 25), (6, 45), (7, 50), (8, 50), (30, 50)];
        for (day, expected) in cases {
            assert_eq!(daily_quota(day, &p), expected, "day {day}");
        }
    }

    #[test]
    fn not_started_yields_zero() {
        let p = plan(20, 10, 5, 500, GrowthMode::Flat);
        assert_eq!(daily_quota(0, &p), 0);
        assert_eq!(daily_quota(-4, &p), 0);
    }

    #[test]
    fn zero_contacts_or_duration_yields_zero() {
        assert_eq!(daily_quota(1, &plan(20, 10, 5, 0, GrowthMode::Arithmetic)), 0);
        assert_eq!(daily_quota(1, &plan(20, 0, 5, 500, GrowthMode::Arithmetic)), 0);
        let explicit = GrowthMode::ExplicitPlan {
            entries: vec![PlanEntry { day: 1, email_count: 9 }],
        };
        assert_eq!(daily_quota(1, &plan(20, 0, 5, 500, explicit)), 0);
    }

    #[test]
    fn explicit_plan_overrides_formula_and_cap() {
        let mode = GrowthMode::ExplicitPlan {
            entries: vec![
                PlanEntry { day: 1, email_count: 5 },
                PlanEntry { day: 2, email_count: 400 },
            ],
        };
        let p = plan(20, 10, 5, 500, mode);
        assert_eq!(daily_quota(1, &p), 5);
        assert_eq!(daily_quota(2, &p), 400);
        // Day 3 has no entry: arithmetic fallback.
        assert_eq!(daily_quota(3, &p), 30);
    }

    #[test]
    fn explicit_plan_entries_match_by_day_not_position() {
        let mode = GrowthMode::ExplicitPlan {
            entries: vec![
                PlanEntry { day: 3, email_count: 7 },
                PlanEntry { day: 1, email_count: 2 },
            ],
        };
        let p = plan(20, 10, 5, 500, mode);
        assert_eq!(daily_quota(1, &p), 2);
        assert_eq!(daily_quota(2, &p), 25);
        assert_eq!(daily_quota(3, &p), 7);
    }

    #[test]
    fn geometric_doubles_until_cap() {
        let p = plan(10, 10, 0, 1000, GrowthMode::Geometric { multiplier: 2.0 });
        assert_eq!(daily_quota(1, &p), 10);
        assert_eq!(daily_quota(2, &p), 20);
        assert_eq!(daily_quota(4, &p), 80);
        assert_eq!(daily_quota(5, &p), 100);
        assert_eq!(daily_quota(500, &p), 100);
    }

    #[test]
    fn progressive_ramps_linearly_to_cap() {
        let p = plan(10, 5, 0, 500, GrowthMode::Progressive);
        // cap = 100, ramp 10 -> 100 over days 1..=5
        let got: Vec<u32> = (1..=6).map(|d| daily_quota(d, &p)).collect();
        assert_eq!(got, vec![10, 32, 55, 77, 100, 100]);
    }

    #[test]
    fn progressive_with_single_day_is_cap() {
        let p = plan(10, 1, 0, 40, GrowthMode::Progressive);
        assert_eq!(daily_quota(1, &p), 40);
    }

    #[test]
    fn flat_ignores_increment() {
        let p = plan(15, 10, 99, 500, GrowthMode::Flat);
        assert_eq!(daily_quota(1, &p), 15);
        assert_eq!(daily_quota(9, &p), 15);
    }

    #[test]
    fn randomized_is_deterministic_and_bounded() {
        let mode = GrowthMode::Randomized {
            jitter_percent: 20,
            seed: 42,
        };
        let p = plan(100, 100, 0, 100_000, mode);
        for day in 1..50 {
            let q = daily_quota(day, &p);
            assert_eq!(q, daily_quota(day, &p));
            assert!((80..=120).contains(&q), "day {day} gave {q}");
        }
    }

    fn any_mode() -> impl Strategy<Value = GrowthMode> {
        prop_oneof![
            Just(GrowthMode::Arithmetic),
            Just(GrowthMode::Flat),
            Just(GrowthMode::Progressive),
            (1.0f64..4.0).prop_map(|multiplier| GrowthMode::Geometric { multiplier }),
            (0u8..=100, any::<u64>())
                .prop_map(|(jitter_percent, seed)| GrowthMode::Randomized { jitter_percent, seed }),
        ]
    }

    proptest! {
        #[test]
        fn quota_never_exceeds_cap(
            start in 0u32..10_000,
            duration in 1u32..365,
            increment in 0u32..1_000,
            total in 0u32..1_000_000,
            day in 1i64..1_000,
            mode in any_mode(),
        ) {
            let p = plan(start, duration, increment, total, mode);
            prop_assert!(daily_quota(day, &p) <= daily_cap(&p.params));
        }

        #[test]
        fn quota_is_zero_before_start(day in i64::MIN / 2..=0, mode in any_mode()) {
            let p = plan(20, 10, 5, 500, mode);
            prop_assert_eq!(daily_quota(day, &p), 0);
        }
    }
}
