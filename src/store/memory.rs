use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventRepository, StoreError, UserRepository, EMAIL_TAKEN, USER_HAS_EVENTS};
use crate::models::{Event, EventWithOrganizer, OrganizerSummary, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
}

impl Tables {
    fn with_organizer(&self, event: &Event) -> Option<EventWithOrganizer> {
        let organizer = self.users.get(&event.organizer_id)?;
        Some(EventWithOrganizer {
            event: event.clone(),
            organizer: OrganizerSummary {
                id: organizer.id,
                name: organizer.name.clone(),
            },
        })
    }

    fn email_taken_by_other(&self, email: &str, id: Uuid) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && u.id != id)
    }
}

/// In-process store with the same constraints as the Postgres schema:
/// unique emails and a restricting organizer foreign key.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_start(a: &Event, b: &Event) -> std::cmp::Ordering {
    a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id))
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn list_events(&self) -> Result<Vec<EventWithOrganizer>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<&Event> = tables.events.values().collect();
        events.sort_by(|a, b| by_start(a, b));
        Ok(events
            .into_iter()
            .filter_map(|e| tables.with_organizer(e))
            .collect())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<EventWithOrganizer>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .get(&id)
            .and_then(|e| tables.with_organizer(e)))
    }

    async fn events_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.organizer_id == organizer_id)
            .cloned()
            .collect();
        events.sort_by(by_start);
        Ok(events)
    }

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&event.organizer_id) {
            return Err(StoreError::Conflict("Organizer does not exist".into()));
        }
        tables.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.events.get_mut(&event.id) {
            Some(slot) => {
                *slot = event.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.tables.write().await.events.remove(&id))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken_by_other(&user.email, user.id) {
            return Err(StoreError::Conflict(EMAIL_TAKEN.into()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Ok(false);
        }
        if tables.email_taken_by_other(&user.email, user.id) {
            return Err(StoreError::Conflict(EMAIL_TAKEN.into()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.events.values().any(|e| e.organizer_id == id) {
            return Err(StoreError::Conflict(USER_HAS_EVENTS.into()));
        }
        Ok(tables.users.remove(&id).is_some())
    }
}
