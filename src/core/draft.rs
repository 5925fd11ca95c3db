use std::{fmt::Display, fs, io::ErrorKind, path::PathBuf};

use super::participant::ParticipantInput;

/// Identifies one draft slot. Registration and each edited participant get their own.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum DraftKey {
    Registration,
    Edit(i64),
}

impl Display for DraftKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftKey::Registration => write!(f, "registration"),
            DraftKey::Edit(id) => write!(f, "edit-{}", id),
        }
    }
}

/// Keyed storage for serialized drafts.
pub trait DraftStore {
    fn read(&self, key: DraftKey) -> anyhow::Result<Option<String>>;
    fn write(&self, key: DraftKey, contents: &str) -> anyhow::Result<()>;
    fn remove(&self, key: DraftKey) -> anyhow::Result<()>;
}

/// Stores each draft as `<dir>/draft-<key>.json`.
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileDraftStore { dir: dir.into() }
    }

    fn path(&self, key: DraftKey) -> PathBuf {
        self.dir.join(format!("draft-{}.json", key))
    }
}

impl DraftStore for FileDraftStore {
    fn read(&self, key: DraftKey) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: DraftKey, contents: &str) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), contents)?;
        Ok(())
    }

    fn remove(&self, key: DraftKey) -> anyhow::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Best-effort failure recovery for unsaved form input.
///
/// Storage errors are logged and swallowed; a draft never blocks a submission.
pub struct Drafts<S: DraftStore> {
    store: S,
}

impl<S: DraftStore> Drafts<S> {
    pub fn new(store: S) -> Self {
        Drafts { store }
    }

    /// Saves `values`, replacing any previous draft under `key`.
    pub fn stash(&self, key: DraftKey, values: &ParticipantInput) {
        let result = serde_json::to_string(values)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.write(key, &json));

        match result {
            Ok(_) => log::info!("Saved {} draft for {}", key, values.name),
            Err(e) => log::warn!("Failed to save {} draft: {}", key, e),
        }
    }

    /// Takes the draft under `key`, if any. A draft is only ever returned once.
    ///
    /// Unparseable drafts and drafts without a name are dropped.
    pub fn restore(&self, key: DraftKey) -> Option<ParticipantInput> {
        let contents = match self.store.read(key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read {} draft: {}", key, e);
                return None;
            }
        };

        self.clear(key);

        match serde_json::from_str::<ParticipantInput>(&contents) {
            Ok(values) if !values.name.trim().is_empty() => Some(values),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Dropping corrupt {} draft: {}", key, e);
                None
            }
        }
    }

    pub fn clear(&self, key: DraftKey) {
        if let Err(e) = self.store.remove(key) {
            log::warn!("Failed to remove {} draft: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    #[derive(Default)]
    struct MemoryDraftStore {
        drafts: Mutex<HashMap<DraftKey, String>>,
    }

    impl DraftStore for MemoryDraftStore {
        fn read(&self, key: DraftKey) -> anyhow::Result<Option<String>> {
            Ok(self.drafts.lock().unwrap().get(&key).cloned())
        }

        fn write(&self, key: DraftKey, contents: &str) -> anyhow::Result<()> {
            self.drafts
                .lock()
                .unwrap()
                .insert(key, contents.to_owned());
            Ok(())
        }

        fn remove(&self, key: DraftKey) -> anyhow::Result<()> {
            self.drafts.lock().unwrap().remove(&key);
            Ok(())
        }
    }

    fn values(name: &str) -> ParticipantInput {
        ParticipantInput {
            name: name.to_owned(),
            phone: Some("(11) 98765".to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_restore_once() {
        let drafts = Drafts::new(MemoryDraftStore::default());
        drafts.stash(DraftKey::Registration, &values("Maria"));

        let restored = drafts.restore(DraftKey::Registration).unwrap();
        assert_eq!(restored.name, "Maria");
        assert_eq!(restored.phone.as_deref(), Some("(11) 98765"));

        assert_eq!(drafts.restore(DraftKey::Registration), None);
    }

    #[test]
    fn test_stash_overwrites() {
        let drafts = Drafts::new(MemoryDraftStore::default());
        drafts.stash(DraftKey::Registration, &values("First"));
        drafts.stash(DraftKey::Registration, &values("Second"));

        assert_eq!(drafts.restore(DraftKey::Registration).unwrap().name, "Second");
    }

    #[test]
    fn test_keys_do_not_collide() {
        let drafts = Drafts::new(MemoryDraftStore::default());
        drafts.stash(DraftKey::Registration, &values("New"));
        drafts.stash(DraftKey::Edit(4), &values("Edited"));

        assert_eq!(drafts.restore(DraftKey::Edit(4)).unwrap().name, "Edited");
        assert_eq!(drafts.restore(DraftKey::Registration).unwrap().name, "New");
    }

    #[test]
    fn test_corrupt_and_nameless_drafts_are_dropped() {
        let store = MemoryDraftStore::default();
        store.write(DraftKey::Registration, "{not json").unwrap();
        store.write(DraftKey::Edit(1), r#"{"name": "  "}"#).unwrap();

        let drafts = Drafts::new(store);
        assert_eq!(drafts.restore(DraftKey::Registration), None);
        assert_eq!(drafts.restore(DraftKey::Edit(1)), None);
        assert_eq!(drafts.store.read(DraftKey::Registration).unwrap(), None);
        assert_eq!(drafts.store.read(DraftKey::Edit(1)).unwrap(), None);
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let drafts = Drafts::new(FileDraftStore::new(dir.path().join("drafts")));

        assert_eq!(drafts.restore(DraftKey::Registration), None);
        drafts.stash(DraftKey::Registration, &values("Maria"));
        assert!(dir.path().join("drafts/draft-registration.json").exists());

        assert_eq!(drafts.restore(DraftKey::Registration).unwrap().name, "Maria");
        assert!(!dir.path().join("drafts/draft-registration.json").exists());

        drafts.clear(DraftKey::Registration);
    }
}
