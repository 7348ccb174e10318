//! JSON backup endpoints
//!
//! Relays the client's full data snapshot to the storage provider as an
//! uninterpreted object, and finds the most recent backup on request.

use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;
use crate::error::AppError;
use crate::metrics::{BACKUPS_TOTAL, HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::storage::StoredObject;

/// Folder prefix for backup objects
const BACKUP_PREFIX: &str = "backups";
/// Entries requested per provider listing page
const BACKUP_PAGE_SIZE: i32 = 50;

/// Backup upload response
#[derive(Debug, Serialize)]
pub struct BackupResponse {
    pub message: String,
    pub url: String,
}

/// Most recent backup response
#[derive(Debug, Serialize)]
pub struct LatestBackupResponse {
    pub message: String,
    pub public_id: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

/// Derive the backup object name from an epoch-milliseconds timestamp.
///
/// Two backups completing within the same millisecond collide on the same
/// name; the provider keeps whichever write lands last.
fn backup_object_name(epoch_ms: i64) -> String {
    format!("backup-{}", epoch_ms)
}

/// Select the most recent entry from one listing page.
///
/// Provider ordering is never trusted; the client-side sort here is the
/// authoritative one.
fn most_recent(mut objects: Vec<StoredObject>) -> Option<StoredObject> {
    objects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    objects.into_iter().next()
}

/// Fold one listing page into the running most-recent entry.
///
/// The provider lists keys in lexicographic order, so the newest backup
/// can sit on any page; every page must pass through this fold.
fn fold_latest(
    current: Option<StoredObject>,
    page: Vec<StoredObject>,
) -> Option<StoredObject> {
    match (current, most_recent(page)) {
        (Some(current), Some(candidate)) => {
            if candidate.created_at > current.created_at {
                Some(candidate)
            } else {
                Some(current)
            }
        }
        (current, candidate) => candidate.or(current),
    }
}

/// POST /backup-json
///
/// Serializes the request body to indented JSON and writes it to the
/// backups folder as a single object. No retry on provider failure.
pub async fn backup_json(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<BackupResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/backup-json"])
        .start_timer();

    let data = serde_json::to_string_pretty(&body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize backup: {}", e)))?;

    let name = backup_object_name(Utc::now().timestamp_millis());
    let key = format!("{}/{}", BACKUP_PREFIX, name);

    // Stored as uninterpreted bytes; the provider must not transform it.
    let result = state
        .storage
        .upload(&key, data.into_bytes(), "application/octet-stream")
        .await;

    let url = match result {
        Ok(url) => url,
        Err(error) => {
            BACKUPS_TOTAL.with_label_values(&["error"]).inc();
            tracing::error!(%error, key = %key, "Backup relay failed");
            return Err(error);
        }
    };

    BACKUPS_TOTAL.with_label_values(&["ok"]).inc();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/backup-json", "200"])
        .inc();

    tracing::info!(key = %key, "Backup relayed to storage provider");

    Ok(Json(BackupResponse {
        message: "Backup enviado com sucesso!".to_string(),
        url,
    }))
}

/// GET /listar-backups
///
/// Walks the backup folder in pages of up to 50 entries and returns only
/// the most recent object. Paging is required: the provider has no
/// newest-first listing, and the timestamped key scheme means a single
/// ascending page would hold the oldest backups once the folder grows
/// past one page.
pub async fn latest_backup(
    State(state): State<AppState>,
) -> Result<Json<LatestBackupResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/listar-backups"])
        .start_timer();

    let prefix = format!("{}/", BACKUP_PREFIX);
    let mut latest: Option<StoredObject> = None;
    let mut continuation: Option<String> = None;

    loop {
        let page = state
            .storage
            .list_page(&prefix, BACKUP_PAGE_SIZE, continuation)
            .await?;

        latest = fold_latest(latest, page.objects);

        match page.next {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    let latest =
        latest.ok_or_else(|| AppError::NotFound("Nenhum backup encontrado.".to_string()))?;

    let url = state.storage.get_public_url(&latest.key);

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/listar-backups", "200"])
        .inc();

    Ok(Json(LatestBackupResponse {
        message: "Backup mais recente encontrado".to_string(),
        public_id: latest.key,
        created_at: latest.created_at,
        url,
    }))
}

#[cfg(test)]
mod tests {
    use super::{backup_object_name, fold_latest, most_recent};
    use crate::storage::StoredObject;
    use chrono::{DateTime, Duration, Utc};

    fn object(key: &str, age_secs: i64) -> StoredObject {
        StoredObject {
            key: key.to_string(),
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    fn object_at_millis(epoch_ms: i64) -> StoredObject {
        StoredObject {
            key: format!("backups/{}", backup_object_name(epoch_ms)),
            created_at: DateTime::from_timestamp_millis(epoch_ms).unwrap(),
        }
    }

    #[test]
    fn backup_object_name_embeds_epoch_millis() {
        assert_eq!(
            backup_object_name(1_700_000_000_000),
            "backup-1700000000000"
        );
    }

    #[test]
    fn most_recent_picks_newest_regardless_of_order() {
        let objects = vec![
            object("backups/backup-2", 60),
            object("backups/backup-3", 10),
            object("backups/backup-1", 3600),
        ];

        let latest = most_recent(objects).expect("non-empty listing");
        assert_eq!(latest.key, "backups/backup-3");
    }

    #[test]
    fn most_recent_handles_already_sorted_input() {
        let objects = vec![
            object("backups/backup-3", 10),
            object("backups/backup-2", 60),
            object("backups/backup-1", 3600),
        ];

        let latest = most_recent(objects).expect("non-empty listing");
        assert_eq!(latest.key, "backups/backup-3");
    }

    #[test]
    fn most_recent_returns_none_for_empty_listing() {
        assert!(most_recent(Vec::new()).is_none());
    }

    #[test]
    fn fold_latest_finds_newest_past_the_first_page() {
        // 51 timestamped keys list in ascending order, so a 50-entry first
        // page holds only the oldest backups and the newest one arrives on
        // the second page.
        let first_page: Vec<StoredObject> = (0..50)
            .map(|i| object_at_millis(1_700_000_000_000 + i))
            .collect();
        let second_page = vec![object_at_millis(1_700_000_000_050)];

        let latest = fold_latest(None, first_page);
        let latest = fold_latest(latest, second_page);

        let latest = latest.expect("non-empty listing");
        assert_eq!(latest.key, "backups/backup-1700000000050");
    }

    #[test]
    fn fold_latest_keeps_running_maximum_across_pages() {
        let newest_first = fold_latest(
            Some(object_at_millis(1_700_000_000_099)),
            (0..50).map(|i| object_at_millis(1_700_000_000_000 + i)).collect(),
        );
        assert_eq!(
            newest_first.expect("non-empty").key,
            "backups/backup-1700000000099"
        );
    }

    #[test]
    fn fold_latest_handles_empty_pages() {
        assert!(fold_latest(None, Vec::new()).is_none());

        let carried = fold_latest(Some(object_at_millis(1_700_000_000_000)), Vec::new());
        assert_eq!(
            carried.expect("running latest survives an empty page").key,
            "backups/backup-1700000000000"
        );
    }
}
