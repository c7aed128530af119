use thiserror::Error;
use tracing::debug;

/// What is being liked. Each kind has its own record set; the toggle
/// semantics are identical for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngagementKind {
    ToolFavorite,
    ReviewVote,
    PostLike,
    CommentLike,
}

impl EngagementKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ToolFavorite => "tool favorite",
            Self::ReviewVote => "review vote",
            Self::PostLike => "post like",
            Self::CommentLike => "comment like",
        }
    }
}

/// "Actor likes subject". At most one exists per (subject, actor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementRecord {
    pub subject_id: String,
    pub actor_id: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The (subject, actor) pair already has a record.
    #[error("engagement record already exists")]
    Conflict,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Storage for engagement records. Implementations must reject a second
/// record for the same pair with [`StoreError::Conflict`] rather than rely
/// on callers checking first.
pub trait EngagementStore {
    fn find_one(
        &self,
        kind: EngagementKind,
        subject_id: &str,
        actor_id: &str,
    ) -> Result<Option<EngagementRecord>, StoreError>;

    fn insert(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<(), StoreError>;

    /// Removing a record that is already gone is not an error.
    fn delete(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub liked: bool,
}

/// Flip the engagement state of `actor_id` on `subject_id`.
///
/// An existing record is deleted (`liked: false`), otherwise one is
/// inserted (`liked: true`). If the insert hits a uniqueness conflict, a
/// concurrent request already liked it and the result is still
/// `liked: true`. Cached counters are left to the caller.
pub fn toggle<S: EngagementStore + ?Sized>(
    store: &S,
    kind: EngagementKind,
    subject_id: &str,
    actor_id: &str,
) -> Result<ToggleOutcome, StoreError> {
    if store.find_one(kind, subject_id, actor_id)?.is_some() {
        store.delete(kind, subject_id, actor_id)?;
        debug!("Removed {} on {} by {}", kind.label(), subject_id, actor_id);
        return Ok(ToggleOutcome { liked: false });
    }

    match store.insert(kind, subject_id, actor_id) {
        Ok(()) => {
            debug!("Added {} on {} by {}", kind.label(), subject_id, actor_id);
            Ok(ToggleOutcome { liked: true })
        }
        Err(StoreError::Conflict) => {
            debug!(
                "Concurrent {} on {} by {}, already liked",
                kind.label(),
                subject_id,
                actor_id
            );
            Ok(ToggleOutcome { liked: true })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;

    #[derive(Default)]
    struct MemoryStore {
        records: RefCell<HashSet<(EngagementKind, String, String)>>,
    }

    impl MemoryStore {
        fn has(&self, kind: EngagementKind, subject: &str, actor: &str) -> bool {
            self.records
                .borrow()
                .contains(&(kind, subject.to_string(), actor.to_string()))
        }
    }

    impl EngagementStore for MemoryStore {
        fn find_one(
            &self,
            kind: EngagementKind,
            subject_id: &str,
            actor_id: &str,
        ) -> Result<Option<EngagementRecord>, StoreError> {
            Ok(self.has(kind, subject_id, actor_id).then(|| EngagementRecord {
                subject_id: subject_id.to_string(),
                actor_id: actor_id.to_string(),
            }))
        }

        fn insert(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<(), StoreError> {
            let inserted = self.records.borrow_mut().insert((
                kind,
                subject_id.to_string(),
                actor_id.to_string(),
            ));
            if inserted { Ok(()) } else { Err(StoreError::Conflict) }
        }

        fn delete(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<(), StoreError> {
            self.records
                .borrow_mut()
                .remove(&(kind, subject_id.to_string(), actor_id.to_string()));
            Ok(())
        }
    }

    /// Simulates another request inserting between our read and our write.
    #[derive(Default)]
    struct RacingStore {
        inner: MemoryStore,
        raced: Cell<bool>,
    }

    impl EngagementStore for RacingStore {
        fn find_one(
            &self,
            kind: EngagementKind,
            subject_id: &str,
            actor_id: &str,
        ) -> Result<Option<EngagementRecord>, StoreError> {
            let found = self.inner.find_one(kind, subject_id, actor_id)?;
            if !self.raced.replace(true) {
                self.inner.insert(kind, subject_id, actor_id)?;
            }
            Ok(found)
        }

        fn insert(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<(), StoreError> {
            self.inner.insert(kind, subject_id, actor_id)
        }

        fn delete(&self, kind: EngagementKind, subject_id: &str, actor_id: &str) -> Result<(), StoreError> {
            self.inner.delete(kind, subject_id, actor_id)
        }
    }

    struct BrokenStore;

    impl EngagementStore for BrokenStore {
        fn find_one(
            &self,
            _kind: EngagementKind,
            _subject_id: &str,
            _actor_id: &str,
        ) -> Result<Option<EngagementRecord>, StoreError> {
            Ok(None)
        }

        fn insert(&self, _kind: EngagementKind, _subject_id: &str, _actor_id: &str) -> Result<(), StoreError> {
            Err(anyhow::anyhow!("database is locked").into())
        }

        fn delete(&self, _kind: EngagementKind, _subject_id: &str, _actor_id: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    const KIND: EngagementKind = EngagementKind::PostLike;

    #[test]
    fn toggle_round_trip() {
        let store = MemoryStore::default();

        let first = toggle(&store, KIND, "s", "a").unwrap();
        assert!(first.liked);
        assert!(store.has(KIND, "s", "a"));

        let second = toggle(&store, KIND, "s", "a").unwrap();
        assert!(!second.liked);
        assert!(!store.has(KIND, "s", "a"));

        assert!(toggle(&store, KIND, "s", "a").unwrap().liked);
    }

    #[test]
    fn toggles_are_independent_per_pair() {
        let store = MemoryStore::default();
        toggle(&store, KIND, "s", "b").unwrap();
        toggle(&store, KIND, "t", "a").unwrap();

        toggle(&store, KIND, "s", "a").unwrap();
        toggle(&store, KIND, "s", "a").unwrap();

        assert!(store.has(KIND, "s", "b"));
        assert!(store.has(KIND, "t", "a"));
        assert!(!store.has(KIND, "s", "a"));
    }

    #[test]
    fn kinds_do_not_share_records() {
        let store = MemoryStore::default();
        toggle(&store, EngagementKind::PostLike, "x", "a").unwrap();
        assert!(!store.has(EngagementKind::CommentLike, "x", "a"));
        assert!(toggle(&store, EngagementKind::CommentLike, "x", "a").unwrap().liked);
    }

    #[test]
    fn concurrent_insert_counts_as_liked() {
        let store = RacingStore::default();
        let outcome = toggle(&store, KIND, "s", "a").unwrap();
        assert!(outcome.liked);
        assert!(store.inner.has(KIND, "s", "a"));
    }

    #[test]
    fn backend_errors_propagate() {
        let result = toggle(&BrokenStore, KIND, "s", "a");
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}
