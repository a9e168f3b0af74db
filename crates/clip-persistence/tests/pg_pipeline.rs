//! Corrida completa freeze -> payout sobre Postgres.

mod test_support;

use chrono::{NaiveDate, TimeZone, Utc};
use clip_core::{Action, PayoutPipeline, StageReport};
use clip_domain::{BudgetCycle, ClipStatus, ClipSubmission, CycleStatus, PayoutStatus, WeekKey};
use clip_persistence::{PgPayoutStore, PoolProvider};
use test_support::with_pool;
use uuid::Uuid;

#[test]
fn freeze_then_payout_on_postgres() {
    let ran = with_pool(|pool| {
        let store = PgPayoutStore::new(PoolProvider { pool: pool.clone() });
        let user = Uuid::new_v4();
        // semana 2031-W20: lunes 12 de mayo
        let clip = ClipSubmission { id: Uuid::new_v4(),
                                    user_id: user,
                                    view_count: 50_500,
                                    baseline_view_count: 500,
                                    ctr: 0.05,
                                    reg_rate: 0.25,
                                    day1_post_rate: 0.35,
                                    status: ClipStatus::Verified,
                                    is_activated: false,
                                    net_views: 0,
                                    payout_week: None,
                                    submitted_at: Utc.with_ymd_and_hms(2031, 5, 14, 8, 0, 0).unwrap() };
        store.insert_clips(&[clip]).unwrap();
        store.insert_budget_cycle(&BudgetCycle { id: Uuid::new_v4(),
                                                 start_date: NaiveDate::from_ymd_opt(2031, 5, 12).unwrap(),
                                                 end_date: NaiveDate::from_ymd_opt(2031, 5, 18).unwrap(),
                                                 status: CycleStatus::Approved,
                                                 global_weekly_limit_cents: 100_000_000,
                                                 global_monthly_limit_cents: 400_000_000,
                                                 max_payout_per_clipper_week_cents: 50_000,
                                                 max_payout_per_clip_cents: 50_000 })
             .unwrap();

        let mut pipeline = PayoutPipeline::new(store);
        let monday = Utc.with_ymd_and_hms(2031, 5, 19, 6, 0, 0).unwrap();
        let friday = Utc.with_ymd_and_hms(2031, 5, 23, 6, 0, 0).unwrap();
        assert!(matches!(pipeline.run(Action::Freeze, monday).unwrap(), StageReport::Freeze(_)));
        let report = pipeline.run(Action::Payout, friday).unwrap();
        assert!(matches!(report, StageReport::Payout(ref r) if r.paid >= 1));

        let week = WeekKey::parse("2031-W20").unwrap();
        let rec = pipeline.store().payout(user, &week).unwrap().unwrap();
        // el throttle compartido puede estar activo: 50k vistas pagan 1100 o 900
        assert_eq!(rec.status, PayoutStatus::Approved);
        assert!(rec.total_cents == 1_100 || rec.total_cents == 900);
    });
    if ran.is_none() {
        eprintln!("skip freeze_then_payout_on_postgres: DATABASE_URL no definido");
    }
}
