use vetter_core::types::ChangeInfo;
use vetter_core::Transition;

/// A committed abandon or restore.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub transition: Transition,
    pub change: ChangeInfo,
    pub actor: String,
    pub reason: Option<String>,
}

/// Observer notified after a transition commits. Never called for aborted work.
pub trait ChangeListener: Send + Sync {
    fn on_event(&self, event: &ChangeEvent);
}

/// Writes each event to the `tracing` log.
pub struct LogListener;

impl ChangeListener for LogListener {
    fn on_event(&self, event: &ChangeEvent) {
        tracing::info!(
            change = %event.change.change.id,
            project = %event.change.change.project,
            actor = %event.actor,
            transition = %event.transition,
            "change event"
        );
    }
}
