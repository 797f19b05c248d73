use crate::config::ThreadConfig;
use tracing::error;

/// Start `f` on a fresh, detached thread.
///
/// If the OS refuses the thread, `f` is dropped unrun; anything it owned is
/// released on this thread (an unresolved cell becomes `Abandoned`).
pub(crate) fn detached<F>(config: &ThreadConfig, role: &str, f: F)
where
    F: FnOnce() + Send + 'static,
{
    if let Err(e) = config.builder(role).spawn(f) {
        error!(error = %e, role, "failed to spawn thread");
    }
}
