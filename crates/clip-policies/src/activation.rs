//! Gate de activación por clip.
//!
//! Un clip está activado sólo si cumple los cuatro umbrales a la vez; no hay
//! crédito parcial. Se reevalúa en freeze y en review con las métricas del
//! momento, por lo que un clip puede perder la activación entre ambas.

use clip_domain::{ClipEvaluation, ClipSubmission, EngagementMetrics, WeekKey};

use crate::constants::{ACTIVATION_MIN_CTR, ACTIVATION_MIN_DAY1_POST_RATE, ACTIVATION_MIN_NET_VIEWS, ACTIVATION_MIN_REG_RATE};

pub fn is_activated(net_views: i64, metrics: &EngagementMetrics) -> bool {
    net_views >= ACTIVATION_MIN_NET_VIEWS
    && metrics.ctr >= ACTIVATION_MIN_CTR
    && metrics.reg_rate >= ACTIVATION_MIN_REG_RATE
    && metrics.day1_post_rate >= ACTIVATION_MIN_DAY1_POST_RATE
}

/// Evalúa un clip para la semana dada. Los clips no activados se registran
/// igual (net_views incluido) para analítica.
pub fn evaluate_clip(clip: &ClipSubmission, week: &WeekKey) -> ClipEvaluation {
    let net_views = clip.net_view_delta();
    ClipEvaluation { clip_id: clip.id,
                     is_activated: is_activated(net_views, &clip.metrics()),
                     net_views,
                     payout_week: week.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing() -> EngagementMetrics {
        EngagementMetrics { ctr: 0.01,
                            reg_rate: 0.15,
                            day1_post_rate: 0.25 }
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert!(is_activated(1_000, &passing()));
    }

    #[test]
    fn any_single_failing_gate_deactivates() {
        assert!(!is_activated(999, &passing()));
        assert!(!is_activated(5_000, &EngagementMetrics { ctr: 0.0099, ..passing() }));
        assert!(!is_activated(5_000, &EngagementMetrics { reg_rate: 0.149, ..passing() }));
        assert!(!is_activated(5_000, &EngagementMetrics { day1_post_rate: 0.2499, ..passing() }));
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let m = EngagementMetrics { ctr: 0.03,
                                    reg_rate: 0.4,
                                    day1_post_rate: 0.5 };
        for views in [0, 999, 1_000, 250_000] {
            assert_eq!(is_activated(views, &m), is_activated(views, &m));
        }
    }
}
