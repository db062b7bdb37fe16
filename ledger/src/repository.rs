//! Event persistence with optimistic concurrency.
//!
//! Every save names the version the caller loaded. The repository rejects
//! the save if the stored version has moved on, so two writers that
//! bypass the per-event store (for example two processes sharing a
//! database) cannot silently overwrite each other.

use crate::types::{Event, EventId};
use futures::future::BoxFuture;
use petal_core::Version;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Repository errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No event with this id is stored
    #[error("Event {0} not found")]
    NotFound(EventId),

    /// An insert collided with an existing event
    #[error("Event {0} already exists")]
    AlreadyExists(EventId),

    /// The stored version differs from the one the writer loaded
    #[error("Event {id} was modified concurrently (expected {expected}, found {actual})")]
    VersionConflict {
        /// Event being saved
        id: EventId,
        /// Version the writer loaded
        expected: Version,
        /// Version currently stored
        actual: Version,
    },

    /// Storage backend failure
    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Storage for events
pub trait EventRepository: Send + Sync {
    /// Loads an event by id
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Backend`] on storage failure.
    fn load(&self, id: EventId) -> BoxFuture<'_, Result<Option<Event>, RepositoryError>>;

    /// Saves an event that was loaded at `expected`, returning its new version.
    ///
    /// `expected == Version::INITIAL` inserts a new event.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::AlreadyExists`] when inserting over an existing id
    /// - [`RepositoryError::NotFound`] when updating a missing event
    /// - [`RepositoryError::VersionConflict`] when the stored version moved on
    fn save(
        &self,
        event: Event,
        expected: Version,
    ) -> BoxFuture<'_, Result<Version, RepositoryError>>;

    /// Removes an event
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if there is nothing to remove.
    fn delete(&self, id: EventId) -> BoxFuture<'_, Result<(), RepositoryError>>;

    /// All stored events, in no particular order
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Backend`] on storage failure.
    fn list(&self) -> BoxFuture<'_, Result<Vec<Event>, RepositoryError>>;
}

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<EventId, Event>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Backend("event map lock poisoned".to_string())
    }

    fn save_sync(&self, mut event: Event, expected: Version) -> Result<Version, RepositoryError> {
        let mut events = self.events.write().map_err(|_| Self::poisoned())?;
        let actual = events.get(&event.id).map(|stored| stored.version);
        match actual {
            None if expected.is_initial() => {},
            None => return Err(RepositoryError::NotFound(event.id)),
            Some(_) if expected.is_initial() => {
                return Err(RepositoryError::AlreadyExists(event.id));
            },
            Some(actual) if actual != expected => {
                return Err(RepositoryError::VersionConflict {
                    id: event.id,
                    expected,
                    actual,
                });
            },
            Some(_) => {},
        }
        let version = expected.next();
        event.version = version;
        events.insert(event.id, event);
        Ok(version)
    }
}

impl EventRepository for InMemoryEventRepository {
    fn load(&self, id: EventId) -> BoxFuture<'_, Result<Option<Event>, RepositoryError>> {
        Box::pin(async move {
            let events = self.events.read().map_err(|_| Self::poisoned())?;
            Ok(events.get(&id).cloned())
        })
    }

    fn save(
        &self,
        event: Event,
        expected: Version,
    ) -> BoxFuture<'_, Result<Version, RepositoryError>> {
        Box::pin(async move { self.save_sync(event, expected) })
    }

    fn delete(&self, id: EventId) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            let mut events = self.events.write().map_err(|_| Self::poisoned())?;
            events
                .remove(&id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound(id))
        })
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<Event>, RepositoryError>> {
        Box::pin(async move {
            let events = self.events.read().map_err(|_| Self::poisoned())?;
            Ok(events.values().cloned().collect())
        })
    }
}
