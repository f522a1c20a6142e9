//! Conflict surface: holds detected conflicts until the caller resolves them.

use tokio::sync::RwLock;

use tether_core::models::{ConflictPreview, ConflictRecord};
use tether_core::mutation::MutationId;

/// In-memory list of unresolved conflicts.
///
/// A conflicted mutation stays in the outbox, so the surface never has to
/// survive a restart: the next sync pass re-detects and re-reports it.
/// Each queued mutation appears at most once here; re-detection updates
/// the existing record instead of stacking duplicates.
pub struct ConflictSurface {
    records: RwLock<Vec<ConflictRecord>>,
    preview_limit: usize,
}

impl ConflictSurface {
    pub fn new(preview_limit: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            preview_limit,
        }
    }

    /// Add or refresh the conflict for a queued mutation.
    pub async fn report(&self, record: ConflictRecord) {
        let mut records = self.records.write().await;
        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.mutation_id == record.mutation_id)
        {
            tracing::debug!(
                id = %record.mutation_id,
                "sync: refreshed existing conflict"
            );
            *existing = record;
        } else {
            tracing::info!(
                id = %record.mutation_id,
                target = %record.target_id,
                "sync: conflict detected"
            );
            records.push(record);
        }
    }

    /// Every unresolved conflict, oldest detection first.
    pub async fn all(&self) -> Vec<ConflictRecord> {
        self.records.read().await.clone()
    }

    /// Number of unresolved conflicts.
    pub async fn unresolved_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// The first few conflicts plus a remainder count, sized for display.
    pub async fn preview(&self) -> ConflictPreview {
        let records = self.records.read().await;
        let visible: Vec<ConflictRecord> =
            records.iter().take(self.preview_limit).cloned().collect();
        ConflictPreview {
            remainder: records.len().saturating_sub(visible.len()),
            visible,
        }
    }

    /// Remove and return the conflict for `id`, if any.
    pub async fn take(&self, id: &MutationId) -> Option<ConflictRecord> {
        let mut records = self.records.write().await;
        let index = records.iter().position(|r| &r.mutation_id == id)?;
        Some(records.remove(index))
    }

    /// Drop the conflict for `id` without touching the queued mutation.
    pub async fn dismiss(&self, id: &MutationId) -> bool {
        self.take(id).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(n: u64, name: &str) -> ConflictRecord {
        ConflictRecord::new(
            "inventory",
            "warehouse",
            format!("w{n}"),
            MutationId::from(format!("{n:013}-aaaaaaaa")),
            json!({ "name": name }),
            json!({ "name": "remote" }),
        )
    }

    #[tokio::test]
    async fn reporting_twice_keeps_one_entry() {
        let surface = ConflictSurface::new(3);
        surface.report(record(1, "first")).await;
        surface.report(record(1, "second")).await;

        let all = surface.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].local, json!({ "name": "second" }));
    }

    #[tokio::test]
    async fn preview_caps_visible_and_counts_the_rest() {
        let surface = ConflictSurface::new(3);
        for n in 0..5 {
            surface.report(record(n, "x")).await;
        }

        let preview = surface.preview().await;
        assert_eq!(preview.visible.len(), 3);
        assert_eq!(preview.remainder, 2);
        assert_eq!(preview.visible[0].target_id, "w0");
        assert_eq!(surface.unresolved_count().await, 5);
    }

    #[tokio::test]
    async fn short_lists_have_no_remainder() {
        let surface = ConflictSurface::new(3);
        surface.report(record(1, "x")).await;
        let preview = surface.preview().await;
        assert_eq!(preview.visible.len(), 1);
        assert_eq!(preview.remainder, 0);
    }

    #[tokio::test]
    async fn take_removes_exactly_one() {
        let surface = ConflictSurface::new(3);
        surface.report(record(1, "x")).await;
        surface.report(record(2, "y")).await;

        let taken = surface
            .take(&MutationId::from(format!("{:013}-aaaaaaaa", 1)))
            .await
            .unwrap();
        assert_eq!(taken.target_id, "w1");
        assert_eq!(surface.unresolved_count().await, 1);
        assert!(surface
            .take(&MutationId::from("0000000000099-ffffffff"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn dismiss_reports_whether_anything_was_dropped() {
        let surface = ConflictSurface::new(3);
        surface.report(record(1, "x")).await;
        assert!(surface.dismiss(&MutationId::from(format!("{:013}-aaaaaaaa", 1))).await);
        assert!(!surface.dismiss(&MutationId::from(format!("{:013}-aaaaaaaa", 1))).await);
    }
}
