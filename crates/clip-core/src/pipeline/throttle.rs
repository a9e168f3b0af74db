use chrono::{DateTime, Duration, Utc};
use clip_domain::ClipSubmission;
use clip_policies::constants::{THROTTLE_LOOKBACK_HOURS, THROTTLE_MIN_SAMPLES};
use clip_policies::{average_metrics, ThrottleStep, ThrottleTransition};
use log::{info, warn};

use super::{PayoutPipeline, ThrottleReport, THROTTLE_LOCK_SCOPE};
use crate::action::Action;
use crate::errors::PipelineError;
use crate::store::PayoutStore;

impl<S> PayoutPipeline<S> where S: PayoutStore
{
    /// Un paso diario del monitor de salud. Con menos de
    /// `THROTTLE_MIN_SAMPLES` clips verificados en las últimas 24h no evalúa
    /// ni escribe nada.
    pub fn check_throttle(&mut self, now: DateTime<Utc>) -> Result<ThrottleReport, PipelineError> {
        let _guard = self.lock_stage(Action::CheckThrottle, THROTTLE_LOCK_SCOPE)?;

        let prev = self.store.load_throttle()?;
        let since = now - Duration::hours(THROTTLE_LOOKBACK_HOURS);
        let samples: Vec<_> = self.store
                                  .verified_clips_between(since, now)?
                                  .iter()
                                  .map(ClipSubmission::metrics)
                                  .collect();

        let avg = match average_metrics(&samples) {
            Some(avg) if samples.len() >= THROTTLE_MIN_SAMPLES => avg,
            _ => {
                info!("check_throttle: {} samples in last {THROTTLE_LOOKBACK_HOURS}h, skipping", samples.len());
                return Ok(ThrottleReport { action: Action::CheckThrottle,
                                           skipped: true,
                                           samples: samples.len(),
                                           is_active: prev.is_active,
                                           metrics_low: false,
                                           consecutive_low_days: prev.consecutive_low_days,
                                           consecutive_recovery_days: prev.consecutive_recovery_days,
                                           transition: None,
                                           rpm_override: prev.rpm_override,
                                           averages: None,
                                           message: format!("insufficient data: {} samples, need {}",
                                                            samples.len(),
                                                            THROTTLE_MIN_SAMPLES) });
            }
        };

        let step = ThrottleStep::apply(&prev, avg, now);
        if !self.store.save_throttle(&step.state)? {
            return Err(PipelineError::ThrottleConflict { expected: prev.version });
        }

        let message = match step.transition {
            Some(ThrottleTransition::Activated) => {
                warn!("protection mode activated after {} low days", step.state.consecutive_low_days);
                "protection mode activated".to_string()
            }
            Some(ThrottleTransition::Deactivated) => {
                info!("protection mode deactivated");
                "protection mode deactivated".to_string()
            }
            None => format!("protection mode {}",
                            if step.state.is_active { "remains active" } else { "remains inactive" }),
        };
        Ok(ThrottleReport { action: Action::CheckThrottle,
                            skipped: false,
                            samples: samples.len(),
                            is_active: step.state.is_active,
                            metrics_low: step.metrics_low,
                            consecutive_low_days: step.state.consecutive_low_days,
                            consecutive_recovery_days: step.state.consecutive_recovery_days,
                            transition: step.transition,
                            rpm_override: step.state.rpm_override,
                            averages: Some(avg),
                            message })
    }
}
