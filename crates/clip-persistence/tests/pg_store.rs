//! Pruebas del store Postgres (requieren DATABASE_URL; se omiten si no existe).

mod test_support;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clip_core::{Action, PayoutStore};
use clip_domain::{BonusTier, BudgetCycle, BudgetSegment, BudgetSegmentCycle, ClipStatus, ClipSubmission, CycleStatus,
                  MonthKey, MonthlyBonus, PayoutRecord, PayoutStatus, PayoutTotals, WeekKey};
use clip_policies::ApprovedPayout;
use clip_persistence::{PgPayoutStore, PoolProvider};
use test_support::with_pool;
use uuid::Uuid;

fn store(pool: &clip_persistence::PgPool) -> PgPayoutStore<PoolProvider> {
    PgPayoutStore::new(PoolProvider { pool: pool.clone() })
}

fn totals(base: i64) -> PayoutTotals {
    PayoutTotals { clips_count: 1,
                   total_net_views: base * 1000 / 22,
                   base_earnings_cents: base }
}

fn approved(user_id: Uuid, cents: i64, segment_cycle_id: Option<Uuid>) -> ApprovedPayout {
    ApprovedPayout { user_id,
                     base_earnings_cents: cents,
                     bonus_cents: 0,
                     total_cents: cents,
                     bonus_tier: BonusTier::None,
                     monthly_views: 0,
                     segment_cycle_id }
}

fn no_bonus(user_id: Uuid) -> MonthlyBonus {
    MonthlyBonus { user_id,
                   month_key: MonthKey::for_date(NaiveDate::from_ymd_opt(2030, 3, 8).unwrap()),
                   monthly_views: 0,
                   bonus_tier: BonusTier::None,
                   bonus_cents: 0,
                   paid: false,
                   updated_at: Utc::now() }
}

#[test]
fn frozen_upsert_only_rewrites_open_rows() {
    let ran = with_pool(|pool| {
        let mut s = store(pool);
        let user = Uuid::new_v4();
        let week = WeekKey::parse("2030-W10").unwrap();
        let first_at = Utc::now();
        assert!(s.upsert_frozen_payout(&PayoutRecord::frozen(user, week.clone(), totals(1_100), first_at)).unwrap());
        assert!(s.upsert_frozen_payout(&PayoutRecord::frozen(user, week.clone(), totals(2_200), first_at + Duration::hours(1)))
                 .unwrap());
        let rec = s.payout(user, &week).unwrap().unwrap();
        assert_eq!(rec.base_earnings_cents, 2_200);
        assert_eq!(rec.frozen_at.timestamp(), first_at.timestamp());

        assert!(s.hold_payout(user, &week, "manual hold").unwrap());
        // fila finalizada: ni upsert ni nueva retención la tocan
        assert!(!s.upsert_frozen_payout(&PayoutRecord::frozen(user, week.clone(), totals(5_000), Utc::now())).unwrap());
        assert!(!s.hold_payout(user, &week, "again").unwrap());
        let rec = s.payout(user, &week).unwrap().unwrap();
        assert_eq!(rec.status, PayoutStatus::Held);
        assert_eq!(rec.total_cents, 2_200);
        assert_eq!(rec.notes.as_deref(), Some("manual hold"));
    });
    if ran.is_none() {
        eprintln!("skip frozen_upsert_only_rewrites_open_rows: DATABASE_URL no definido");
    }
}

#[test]
fn advisory_stage_lock_is_exclusive() {
    let ran = with_pool(|pool| {
        let s = store(pool);
        let scope = format!("test-{}", Uuid::new_v4());
        let guard = s.try_lock_stage(Action::Payout, &scope).unwrap();
        assert!(guard.is_some());
        assert!(s.try_lock_stage(Action::Payout, &scope).unwrap().is_none());
        drop(guard);
        assert!(s.try_lock_stage(Action::Payout, &scope).unwrap().is_some());
    });
    if ran.is_none() {
        eprintln!("skip advisory_stage_lock_is_exclusive: DATABASE_URL no definido");
    }
}

#[test]
fn throttle_save_is_optimistic() {
    let ran = with_pool(|pool| {
        let mut s = store(pool);
        let read = s.load_throttle().unwrap();
        assert!(s.save_throttle(&read).unwrap());
        assert!(!s.save_throttle(&read).unwrap());
        assert_eq!(s.load_throttle().unwrap().version, read.version + 1);
    });
    if ran.is_none() {
        eprintln!("skip throttle_save_is_optimistic: DATABASE_URL no definido");
    }
}

#[test]
fn approval_charges_segment_ledger_in_same_transaction() {
    let ran = with_pool(|pool| {
        let mut s = store(pool);
        let cycle = BudgetCycle { id: Uuid::new_v4(),
                                  start_date: NaiveDate::from_ymd_opt(2030, 3, 4).unwrap(),
                                  end_date: NaiveDate::from_ymd_opt(2030, 3, 10).unwrap(),
                                  status: CycleStatus::Approved,
                                  global_weekly_limit_cents: 1_000_000,
                                  global_monthly_limit_cents: 4_000_000,
                                  max_payout_per_clipper_week_cents: 50_000,
                                  max_payout_per_clip_cents: 50_000 };
        s.insert_budget_cycle(&cycle).unwrap();
        let segment = BudgetSegment { id: Uuid::new_v4(),
                                      name: format!("segment {}", Uuid::new_v4()),
                                      weekly_limit_cents: 10_000,
                                      monthly_limit_cents: 40_000 };
        let ledger = BudgetSegmentCycle { id: Uuid::new_v4(),
                                          segment_id: segment.id,
                                          cycle_id: cycle.id,
                                          status: CycleStatus::Approved,
                                          spent_cents: 0,
                                          remaining_cents: 10_000 };
        let users = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        s.insert_segment(&segment, &ledger, &users, Utc::now()).unwrap();
        assert_eq!(s.segment_for_user(users[0]).unwrap().map(|seg| seg.id), Some(segment.id));

        let week = WeekKey::parse("2030-W10").unwrap();
        for (user, cents) in users.iter().zip([1_100, 900, 500]) {
            assert!(s.upsert_frozen_payout(&PayoutRecord::frozen(*user, week.clone(), totals(cents), Utc::now())).unwrap());
        }
        let approve = |s: &mut PgPayoutStore<PoolProvider>, user: Uuid, cents: i64, ledger_id: Uuid| {
            s.approve_payout(&week, &approved(user, cents, Some(ledger_id)), &no_bonus(user), Utc::now())
        };
        assert!(approve(&mut s, users[0], 1_100, ledger.id).unwrap());
        assert!(approve(&mut s, users[1], 900, ledger.id).unwrap());
        let sc = s.segment_cycle(segment.id, cycle.id).unwrap().unwrap();
        assert_eq!((sc.spent_cents, sc.remaining_cents), (2_000, 8_000));

        // ya aprobado: ni transición ni segundo cargo
        assert!(!approve(&mut s, users[0], 1_100, ledger.id).unwrap());
        // ledger inexistente: la transacción entera se revierte
        assert!(approve(&mut s, users[2], 500, Uuid::new_v4()).is_err());
        assert_eq!(s.payout(users[2], &week).unwrap().unwrap().status, PayoutStatus::Frozen);
        let sc = s.segment_cycle(segment.id, cycle.id).unwrap().unwrap();
        assert_eq!(sc.spent_cents, 2_000);
    });
    if ran.is_none() {
        eprintln!("skip approval_charges_segment_ledger_in_same_transaction: DATABASE_URL no definido");
    }
}

#[test]
fn clip_evaluations_round_trip_through_postgres() {
    let ran = with_pool(|pool| {
        let mut s = store(pool);
        let user = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2030, 3, 5, 10, 0, 0).unwrap();
        let clip = ClipSubmission { id: Uuid::new_v4(),
                                    user_id: user,
                                    view_count: 51_000,
                                    baseline_view_count: 1_000,
                                    ctr: 0.03,
                                    reg_rate: 0.2,
                                    day1_post_rate: 0.3,
                                    status: ClipStatus::Verified,
                                    is_activated: false,
                                    net_views: 0,
                                    payout_week: None,
                                    submitted_at: at };
        s.insert_clips(std::slice::from_ref(&clip)).unwrap();
        let week = WeekKey::for_date(at.date_naive());
        let eval = clip_policies::evaluate_clip(&clip, &week);
        s.record_clip_evaluations(&[eval]).unwrap();

        let loaded = s.clips_for_payout_week(user, &week).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].is_activated);
        assert_eq!(loaded[0].net_views, 50_000);
        assert_eq!(s.clips_for_user_since(user, at - Duration::days(1)).unwrap().len(), 1);
    });
    if ran.is_none() {
        eprintln!("skip clip_evaluations_round_trip_through_postgres: DATABASE_URL no definido");
    }
}
