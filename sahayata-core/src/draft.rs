//! Timer-driven draft auto-save

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::forms::{FormKind, FormValues};
use crate::local::LocalState;

/// How often an in-progress form is snapshotted
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Form values shared between the form and its auto-save task
pub type SharedValues = Arc<RwLock<FormValues>>;

/// A running auto-save task; dropping it stops further saves
pub struct AutoSave {
    task: JoinHandle<()>,
}

impl AutoSave {
    /// Snapshot `values` into the form's draft slot every `period`, skipping
    /// ticks where every field is still empty. The first save happens one
    /// full period after spawning.
    pub fn spawn(local: LocalState, form: FormKind, values: SharedValues, period: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                save_if_dirty(&local, form, &values);
            }
        });
        Self { task }
    }

    pub fn cancel(self) {
        // Drop aborts the task.
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AutoSave {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn save_if_dirty(local: &LocalState, form: FormKind, values: &SharedValues) {
    let snapshot = match values.read() {
        Ok(values) => values.clone(),
        Err(e) => {
            tracing::error!(%form, error = %e, "Form values unavailable for auto-save");
            return;
        }
    };
    if !snapshot.is_dirty() {
        return;
    }
    match local.save_draft(form, &snapshot) {
        Ok(()) => tracing::debug!(%form, "Draft saved automatically"),
        Err(e) => tracing::warn!(%form, error = %e, "Auto-save failed"),
    }
}
