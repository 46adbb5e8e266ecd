use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{EventRepository, StoreError, UserRepository, EMAIL_TAKEN, USER_HAS_EVENTS};
use crate::models::{Event, EventWithOrganizer, OrganizerSummary, User};

const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.start_at, e.end_at, e.city, \
     e.country_code, e.address, e.cover_image, e.price, e.currency, e.status, \
     e.organizer_id, e.created_at, e.updated_at";

const USER_COLUMNS: &str =
    "id, name, email, image, password_hash, favorite_event_ids, role, created_at, updated_at";

#[derive(FromRow)]
struct EventRow {
    #[sqlx(flatten)]
    event: Event,
    organizer_name: String,
}

impl From<EventRow> for EventWithOrganizer {
    fn from(row: EventRow) -> Self {
        Self {
            organizer: OrganizerSummary {
                id: row.event.organizer_id,
                name: row.organizer_name,
            },
            event: row.event,
        }
    }
}

/// Postgres-backed repositories sharing one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn classify(err: sqlx::Error, conflict: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return StoreError::Conflict(conflict.to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl EventRepository for PgStore {
    async fn list_events(&self) -> Result<Vec<EventWithOrganizer>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS}, u.name AS organizer_name \
             FROM events e JOIN users u ON u.id = e.organizer_id \
             ORDER BY e.start_at ASC, e.id ASC"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<EventWithOrganizer>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS}, u.name AS organizer_name \
             FROM events e JOIN users u ON u.id = e.organizer_id \
             WHERE e.id = $1"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn events_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events e \
             WHERE e.organizer_id = $1 ORDER BY e.start_at ASC, e.id ASC"
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(organizer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events
                (id, title, description, start_at, end_at, city, country_code, address,
                 cover_image, price, currency, status, organizer_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(&event.city)
        .bind(&event.country_code)
        .bind(&event.address)
        .bind(&event.cover_image)
        .bind(event.price)
        .bind(&event.currency)
        .bind(event.status)
        .bind(event.organizer_id)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Organizer does not exist"))?;
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $2, description = $3, start_at = $4, end_at = $5, city = $6,
                country_code = $7, address = $8, cover_image = $9, price = $10,
                currency = $11, status = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(&event.city)
        .bind(&event.country_code)
        .bind(&event.address)
        .bind(&event.cover_image)
        .bind(event.price)
        .bind(&event.currency)
        .bind(event.status)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let sql = format!("DELETE FROM events e WHERE e.id = $1 RETURNING {EVENT_COLUMNS}");
        let deleted = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(deleted)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, name, email, image, password_hash, favorite_event_ids, role,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(&user.password_hash)
        .bind(&user.favorite_event_ids)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, EMAIL_TAKEN))?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, image = $4, password_hash = $5,
                favorite_event_ids = $6, role = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(&user.password_hash)
        .bind(&user.favorite_event_ids)
        .bind(user.role)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, EMAIL_TAKEN))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, USER_HAS_EVENTS))?;
        Ok(result.rows_affected() > 0)
    }
}
