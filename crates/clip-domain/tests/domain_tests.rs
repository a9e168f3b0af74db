use chrono::{NaiveDate, TimeZone, Utc};
use clip_domain::{BonusTier, ClipStatus, ClipSubmission, CycleStatus, PayoutRecord, PayoutStatus, PayoutTotals, WeekKey};
use uuid::Uuid;

fn clip(view_count: i64, baseline: i64) -> ClipSubmission {
    ClipSubmission { id: Uuid::new_v4(),
                     user_id: Uuid::new_v4(),
                     view_count,
                     baseline_view_count: baseline,
                     ctr: 0.02,
                     reg_rate: 0.2,
                     day1_post_rate: 0.3,
                     status: ClipStatus::Verified,
                     is_activated: false,
                     net_views: 0,
                     payout_week: None,
                     submitted_at: Utc.with_ymd_and_hms(2026, 10, 6, 12, 0, 0).unwrap() }
}

#[test]
fn net_view_delta_never_negative() {
    assert_eq!(clip(1_500, 500).net_view_delta(), 1_000);
    // un recuento de vistas que baja por debajo del baseline no resta
    assert_eq!(clip(300, 500).net_view_delta(), 0);
}

#[test]
fn status_text_matches_database_contract() {
    for s in [PayoutStatus::Frozen, PayoutStatus::Reviewing, PayoutStatus::Approved, PayoutStatus::Held] {
        let parsed: PayoutStatus = s.as_str().parse().unwrap();
        assert_eq!(parsed, s);
    }
    assert_eq!(CycleStatus::Killed.to_string(), "killed");
    assert!("paused".parse::<CycleStatus>().is_err());
    assert_eq!("super".parse::<BonusTier>().unwrap(), BonusTier::Super);
}

#[test]
fn bonus_tiers_are_ordered_by_rank() {
    assert!(BonusTier::Super > BonusTier::Proven);
    assert!(BonusTier::Proven > BonusTier::Verified);
    assert!(BonusTier::Verified > BonusTier::None);
}

#[test]
fn frozen_record_carries_base_as_total() {
    let week = WeekKey::for_date(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap());
    let totals = PayoutTotals { clips_count: 3,
                                total_net_views: 50_000,
                                base_earnings_cents: 1_100 };
    let rec = PayoutRecord::frozen(Uuid::new_v4(), week, totals, Utc::now());
    assert_eq!(rec.status, PayoutStatus::Frozen);
    assert_eq!(rec.total_cents, 1_100);
    assert_eq!(rec.bonus_cents, 0);
    assert!(rec.status.is_open());
    assert_eq!(rec.totals(), totals);
}
