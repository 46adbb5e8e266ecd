//! Persistence ports and their implementations.
//!
//! Handlers only see the [`EventRepository`] and [`UserRepository`] traits.
//! [`PgStore`] backs them with Postgres in production, while [`MemoryStore`]
//! keeps everything in process for tests and local experiments.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, EventWithOrganizer, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness or referential constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// All events ordered by start time, then id.
    async fn list_events(&self) -> Result<Vec<EventWithOrganizer>, StoreError>;

    async fn find_event(&self, id: Uuid) -> Result<Option<EventWithOrganizer>, StoreError>;

    async fn events_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, StoreError>;

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Overwrites the row with `event.id`. Returns false if no such row exists.
    async fn update_event(&self, event: &Event) -> Result<bool, StoreError>;

    /// Returns the removed row, if there was one.
    async fn delete_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users ordered by creation time.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Fails with [`StoreError::Conflict`] when the new email is taken.
    async fn update_user(&self, user: &User) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Conflict`] while the user still organizes events.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

pub(crate) const EMAIL_TAKEN: &str = "Email already exists";
pub(crate) const USER_HAS_EVENTS: &str = "User still organizes events";
