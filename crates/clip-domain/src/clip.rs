//! Clip enviado por un creador y su evaluación semanal.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::WeekKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipStatus {
    Pending,
    Verified,
    Rejected,
}

text_enum!(ClipStatus {
    Pending => "pending",
    Verified => "verified",
    Rejected => "rejected",
});

/// Ratios de engagement de un clip (o promedios de una muestra), en [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub ctr: f64,
    pub reg_rate: f64,
    pub day1_post_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSubmission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub view_count: i64,
    /// Vistas al momento del envío; base para el delta.
    pub baseline_view_count: i64,
    pub ctr: f64,
    pub reg_rate: f64,
    pub day1_post_rate: f64,
    pub status: ClipStatus,
    pub is_activated: bool,
    pub net_views: i64,
    pub payout_week: Option<WeekKey>,
    pub submitted_at: DateTime<Utc>,
}

impl ClipSubmission {
    /// `max(0, view_count - baseline_view_count)`.
    pub fn net_view_delta(&self) -> i64 {
        (self.view_count - self.baseline_view_count).max(0)
    }

    pub fn metrics(&self) -> EngagementMetrics {
        EngagementMetrics { ctr: self.ctr,
                            reg_rate: self.reg_rate,
                            day1_post_rate: self.day1_post_rate }
    }

    pub fn apply_evaluation(&mut self, eval: &ClipEvaluation) {
        self.is_activated = eval.is_activated;
        self.net_views = eval.net_views;
        self.payout_week = Some(eval.payout_week.clone());
    }
}

/// Campos derivados que freeze/review escriben sobre cada clip tocado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipEvaluation {
    pub clip_id: Uuid,
    pub is_activated: bool,
    pub net_views: i64,
    pub payout_week: WeekKey,
}
