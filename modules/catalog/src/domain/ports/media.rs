use std::time::Duration;

use async_trait::async_trait;

/// Port for the media file store backing `movie_file_path`.
///
/// Uploads land in a temp area first (handled by the upload collaborator);
/// creating a movie promotes the file to the permanent area. A filesystem
/// adapter renames; an object-storage adapter copies and deletes. The
/// contract is the same either way: after `promote` returns Ok, the file is
/// reachable at the permanent path.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Move a previously-uploaded file from the temp area to the permanent
    /// area. Failures surface as storage errors; the caller must not commit
    /// its transaction when this fails.
    async fn promote(&self, file_name: &str) -> anyhow::Result<()>;

    /// The path a promoted file is stored under, as persisted on the movie
    /// row. Computable before the file has been promoted.
    fn permanent_path(&self, file_name: &str) -> String;

    /// Delete temp files older than `older_than`, returning how many were
    /// removed. Invoked by the external housekeeping scheduler; stray temp
    /// files can remain when a create rolls back after promotion.
    async fn sweep_temp(&self, older_than: Duration) -> anyhow::Result<usize>;
}
