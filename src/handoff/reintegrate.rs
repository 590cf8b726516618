//! Reloading an entity after the editor exits.

use crate::models::Task;
use crate::storage::EntityStore;

/// Result of re-reading an edited entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Reintegration {
    /// Fresh copy read from storage
    Refreshed(Task),
    /// The entity is gone or no longer readable
    NotFound,
}

/// Re-read `id` from `store`.
///
/// A missing, unreadable or unparsable file all count as `NotFound`; the
/// caller keeps whatever copy it had before the edit. The identifier of a
/// refreshed entity is always `id`, whatever the file now claims.
pub fn reintegrate<S: EntityStore + ?Sized>(store: &S, id: &str) -> Reintegration {
    match store.load_entity(id) {
        Ok(Some(mut task)) => {
            if task.id != id {
                tracing::warn!(
                    requested = %id,
                    found = %task.id,
                    "edited file changed the task id; keeping the original"
                );
                task.id = id.to_string();
            }
            tracing::debug!(id = %id, "reloaded task after edit");
            Reintegration::Refreshed(task)
        }
        Ok(None) => {
            tracing::warn!(id = %id, "task disappeared during edit");
            Reintegration::NotFound
        }
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "could not reload task after edit");
            Reintegration::NotFound
        }
    }
}
