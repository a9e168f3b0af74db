use chrono::{DateTime, Utc};
use clip_domain::{PayoutStatus, WeekWindow};
use clip_policies::{aggregate_user_week, Rpm};
use log::{debug, info};

use super::{PayoutPipeline, ReviewReport};
use crate::action::Action;
use crate::errors::PipelineError;
use crate::store::PayoutStore;

impl<S> PayoutPipeline<S> where S: PayoutStore
{
    /// Reevalúa la activación de los clips de cada registro `frozen` con las
    /// métricas actuales y lo pasa a `reviewing`. Sin chequeos de presupuesto.
    pub fn review(&mut self, now: DateTime<Utc>) -> Result<ReviewReport, PipelineError> {
        let window = WeekWindow::previous(now.date_naive())?;
        let _guard = self.lock_stage(Action::Review, window.key.as_str())?;

        let records = self.store.payouts_for_week(&window.key, &[PayoutStatus::Frozen])?;
        let mut report = ReviewReport { action: Action::Review,
                                        week_key: window.key.clone(),
                                        reviewed: 0,
                                        message: String::new() };
        if records.is_empty() {
            report.message = format!("no frozen payout records for week {}", window.key);
            return Ok(report);
        }

        let rpm = Rpm::for_protection(self.store.load_throttle()?.is_active);
        for record in records {
            let clips = self.store.clips_for_payout_week(record.user_id, &window.key)?;
            let week = aggregate_user_week(&clips, &window.key, rpm);
            if week.totals != record.totals() {
                debug!("review {}: {} drifted {:?} -> {:?}",
                       window.key,
                       record.user_id,
                       record.totals(),
                       week.totals);
            }
            if !self.store.mark_reviewing(record.user_id, &window.key, week.totals, now)? {
                debug!("review {}: {} finalized concurrently, skipped", window.key, record.user_id);
                continue;
            }
            self.store.record_clip_evaluations(&week.evaluations)?;
            report.reviewed += 1;
        }

        info!("review {}: {} records moved to reviewing", window.key, report.reviewed);
        report.message = format!("reviewed {} payout records for week {}", report.reviewed, window.key);
        Ok(report)
    }
}
