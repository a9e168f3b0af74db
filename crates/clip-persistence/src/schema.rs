//! Esquema Diesel (escrito a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    clip_submissions (id) {
        id -> Uuid,
        user_id -> Uuid,
        view_count -> BigInt,
        baseline_view_count -> BigInt,
        ctr -> Double,
        reg_rate -> Double,
        day1_post_rate -> Double,
        status -> Text,
        is_activated -> Bool,
        net_views -> BigInt,
        payout_week -> Nullable<Text>,
        submitted_at -> Timestamptz,
    }
}

diesel::table! {
    clipper_payouts (user_id, week_key) {
        user_id -> Uuid,
        week_key -> Text,
        clips_count -> Integer,
        total_net_views -> BigInt,
        base_earnings_cents -> BigInt,
        bonus_cents -> BigInt,
        total_cents -> BigInt,
        status -> Text,
        notes -> Nullable<Text>,
        frozen_at -> Timestamptz,
        reviewed_at -> Nullable<Timestamptz>,
        paid_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    clipper_monthly_bonuses (user_id, month_key) {
        user_id -> Uuid,
        month_key -> Text,
        monthly_views -> BigInt,
        bonus_tier -> Text,
        bonus_cents -> BigInt,
        paid -> Bool,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    clipper_risk_throttle (id) {
        id -> Integer,
        is_active -> Bool,
        current_avg_ctr -> Double,
        current_avg_reg_rate -> Double,
        current_avg_day1_post_rate -> Double,
        consecutive_low_days -> Integer,
        consecutive_recovery_days -> Integer,
        rpm_override -> Nullable<Double>,
        activated_at -> Nullable<Timestamptz>,
        deactivated_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
        version -> BigInt,
    }
}

diesel::table! {
    budget_cycles (id) {
        id -> Uuid,
        start_date -> Date,
        end_date -> Date,
        status -> Text,
        global_weekly_limit_cents -> BigInt,
        global_monthly_limit_cents -> BigInt,
        max_payout_per_clipper_week_cents -> BigInt,
        max_payout_per_clip_cents -> BigInt,
    }
}

diesel::table! {
    budget_segments (id) {
        id -> Uuid,
        name -> Text,
        weekly_limit_cents -> BigInt,
        monthly_limit_cents -> BigInt,
    }
}

diesel::table! {
    budget_segment_cycles (id) {
        id -> Uuid,
        segment_id -> Uuid,
        cycle_id -> Uuid,
        status -> Text,
        spent_cents -> BigInt,
        remaining_cents -> BigInt,
    }
}

diesel::table! {
    clipper_segment_membership (user_id) {
        user_id -> Uuid,
        segment_id -> Uuid,
        assigned_at -> Timestamptz,
    }
}

diesel::joinable!(budget_segment_cycles -> budget_segments (segment_id));
diesel::joinable!(budget_segment_cycles -> budget_cycles (cycle_id));
diesel::joinable!(clipper_segment_membership -> budget_segments (segment_id));

diesel::allow_tables_to_appear_in_same_query!(
    clip_submissions,
    clipper_payouts,
    clipper_monthly_bonuses,
    clipper_risk_throttle,
    budget_cycles,
    budget_segments,
    budget_segment_cycles,
    clipper_segment_membership,
);
