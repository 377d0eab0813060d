//! Directory-backed event store: one `<id>.toml` file per event.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{CampcalError, CampcalResult};
use crate::event::{Event, EventId, EventPatch, NewEvent, UserId};
use crate::range::DateRange;
use crate::store::{ChangeNotifier, EventStore, Subscription, overlaps};

const EVENT_EXTENSION: &str = "toml";

/// Events stored as TOML files in a single directory.
///
/// Change notices only cover writes made through this handle; edits made to
/// the directory by other processes show up on the next fetch.
#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
    notifier: ChangeNotifier,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStore {
            dir: dir.into(),
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &EventId) -> CampcalResult<PathBuf> {
        let raw = id.as_str();
        let is_plain = !raw.is_empty()
            && !raw.starts_with('.')
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !is_plain {
            return Err(CampcalError::NotFound(raw.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", raw, EVENT_EXTENSION)))
    }

    async fn read_event(path: &Path) -> CampcalResult<Event> {
        let content = tokio::fs::read_to_string(path).await?;
        toml::from_str(&content).map_err(|e| {
            CampcalError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    async fn load(&self, id: &EventId) -> CampcalResult<Event> {
        let path = self.path_for(id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(CampcalError::NotFound(id.to_string()));
        }
        Self::read_event(&path).await
    }

    /// Write through a temp file and rename, so readers never see a partial event.
    async fn save(&self, event: &Event) -> CampcalResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&event.id)?;
        let temp = self.dir.join(format!(".{}.{}.tmp", event.id, EVENT_EXTENSION));

        let content =
            toml::to_string_pretty(event).map_err(|e| CampcalError::Serialization(e.to_string()))?;

        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &path).await?;
        Ok(())
    }

    /// Every readable event in the directory. Unparseable files are skipped.
    async fn all_events(&self) -> CampcalResult<Vec<Event>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_event_file = path.extension().is_some_and(|e| e == EVENT_EXTENSION)
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if !is_event_file {
                continue;
            }

            match Self::read_event(&path).await {
                Ok(event) => events.push(event),
                Err(e) => warn!("skipping unreadable event file: {e}"),
            }
        }

        Ok(events)
    }
}

#[async_trait]
impl EventStore for LocalStore {
    async fn list_by_range(&self, range: DateRange) -> CampcalResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .all_events()
            .await?
            .into_iter()
            .filter(|e| overlaps(e, &range))
            .collect();
        events.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn get_by_id(&self, id: &EventId) -> CampcalResult<Event> {
        self.load(id).await
    }

    async fn create(&self, new_event: NewEvent) -> CampcalResult<Event> {
        new_event.fields.validate()?;

        let event = Event::from_new(EventId::generate(), new_event);
        self.save(&event).await?;

        info!(id = %event.id, owner = %event.owner_id, dir = %self.dir.display(), "created event");
        self.notifier.notify();
        Ok(event)
    }

    async fn update(
        &self,
        id: &EventId,
        patch: EventPatch,
        actor: &UserId,
    ) -> CampcalResult<Event> {
        let current = self.load(id).await?;
        let updated = current.apply_patch(&patch)?;
        self.save(&updated).await?;

        info!(%id, %actor, "updated event");
        self.notifier.notify();
        Ok(updated)
    }

    async fn delete(&self, id: &EventId, actor: &UserId) -> CampcalResult<()> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CampcalError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        info!(%id, %actor, "deleted event");
        self.notifier.notify();
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Category, EventFields, Status};
    use chrono::{Duration, TimeZone, Utc};

    fn new_event(title: &str) -> NewEvent {
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let mut fields = EventFields::new(title, start, start + Duration::hours(1));
        fields.category = Category::Social;
        fields.status = Status::InProgress;
        fields.budget = Some(1250.5);
        fields.description = Some("Carousel posts".into());
        NewEvent {
            owner_id: UserId::new("alice"),
            fields,
        }
    }

    fn march() -> DateRange {
        DateRange {
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("events"));
        let actor = UserId::new("alice");

        let created = store.create(new_event("Spring teaser")).await.unwrap();
        assert!(dir.path().join("events").join(format!("{}.toml", created.id)).exists());
        assert_eq!(store.get_by_id(&created.id).await.unwrap(), created);

        let moved = store
            .update(
                &created.id,
                EventPatch::times(
                    created.start_at + Duration::days(1),
                    created.end_at + Duration::days(1),
                ),
                &actor,
            )
            .await
            .unwrap();
        assert_eq!(store.get_by_id(&created.id).await.unwrap(), moved);

        store.delete(&created.id, &actor).await.unwrap();
        assert!(store.get_by_id(&created.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("never-created"));
        assert!(store.list_by_range(march()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.create(new_event("Spring teaser")).await.unwrap();
        std::fs::write(dir.path().join("garbage.toml"), "not = [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let listed = store.list_by_range(march()).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_path_like_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let id = EventId::from("../outside");
        assert!(store.get_by_id(&id).await.unwrap_err().is_not_found());
        assert!(
            store
                .delete(&id, &UserId::new("alice"))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}
