use crate::db::KomikStorage;
use tracing::debug;

/// Bump manga counters in the background. Failures are logged and dropped,
/// so the counters are approximate under load.
pub fn record_manga_view(storage: &KomikStorage, manga_id: String) {
    let storage = storage.clone();
    tokio::spawn(async move {
        if let Err(e) = storage.increment_manga_views(&manga_id).await {
            debug!(manga_id = %manga_id, error = %e, "manga view increment dropped");
        }
    });
}

pub fn record_chapter_view(storage: &KomikStorage, chapter_id: String) {
    let storage = storage.clone();
    tokio::spawn(async move {
        if let Err(e) = storage.increment_chapter_views(&chapter_id).await {
            debug!(chapter_id = %chapter_id, error = %e, "chapter view increment dropped");
        }
    });
}
