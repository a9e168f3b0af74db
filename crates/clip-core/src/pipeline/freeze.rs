use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use clip_domain::{ClipSubmission, PayoutRecord, WeekWindow};
use clip_policies::{aggregate_user_week, Rpm};
use log::{debug, info};
use uuid::Uuid;

use super::{FreezeReport, PayoutPipeline};
use crate::action::Action;
use crate::errors::PipelineError;
use crate::store::PayoutStore;

impl<S> PayoutPipeline<S> where S: PayoutStore
{
    /// Congela la semana ISO anterior a `now`: un registro `frozen` por
    /// usuario con clips en `[lunes, lunes siguiente)`. Recalcula desde cero
    /// en cada corrida; los registros ya finalizados no se tocan.
    pub fn freeze(&mut self, now: DateTime<Utc>) -> Result<FreezeReport, PipelineError> {
        let window = WeekWindow::previous(now.date_naive())?;
        let _guard = self.lock_stage(Action::Freeze, window.key.as_str())?;

        let rpm = Rpm::for_protection(self.store.load_throttle()?.is_active);
        let clips = self.store.clips_submitted_between(window.start, window.end)?;
        let mut report = FreezeReport { action: Action::Freeze,
                                        week_key: window.key.clone(),
                                        users: 0,
                                        clips: clips.len(),
                                        skipped_finalized: 0,
                                        message: String::new() };
        if clips.is_empty() {
            report.message = format!("no clip submissions for week {}", window.key);
            return Ok(report);
        }

        let mut by_user: BTreeMap<Uuid, Vec<ClipSubmission>> = BTreeMap::new();
        for clip in clips {
            by_user.entry(clip.user_id).or_default().push(clip);
        }

        for (user_id, user_clips) in by_user {
            let week = aggregate_user_week(&user_clips, &window.key, rpm);
            let record = PayoutRecord::frozen(user_id, window.key.clone(), week.totals, now);
            if !self.store.upsert_frozen_payout(&record)? {
                debug!("freeze: payout for {user_id} in {} already finalized", window.key);
                report.skipped_finalized += 1;
                continue;
            }
            self.store.record_clip_evaluations(&week.evaluations)?;
            report.users += 1;
        }

        info!("freeze {}: {} users frozen at rpm {}c/mille, {} finalized skipped",
              window.key,
              report.users,
              rpm.cents_per_mille(),
              report.skipped_finalized);
        report.message = format!("froze {} payout records for week {}", report.users, window.key);
        Ok(report)
    }
}
