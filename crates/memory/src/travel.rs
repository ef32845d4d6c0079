//! Travel store: friends and points of interest, keyed by unique name.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use umbra_core::error::MemoryError;
use crate::pool::{like_pattern, open_pool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub name: String,
    pub location: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub kind: String,
    pub location: String,
    pub notes: String,
}

pub struct TravelStore {
    pool: SqlitePool,
}

impl TravelStore {
    /// Open the travel database, creating tables as needed.
    pub async fn open(path: &str) -> Result<Self, MemoryError> {
        let pool = open_pool(path).await?;
        let store = Self::from_pool(pool).await?;
        info!("Travel store initialized at {path}");
        Ok(store)
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS friends (
                id        INTEGER PRIMARY KEY,
                name      TEXT NOT NULL UNIQUE,
                location  TEXT,
                notes     TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("friends table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS points_of_interest (
                id        INTEGER PRIMARY KEY,
                name      TEXT NOT NULL UNIQUE,
                type      TEXT,
                location  TEXT,
                notes     TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("points_of_interest table: {e}")))?;

        debug!("Travel migrations complete");
        Ok(())
    }

    pub async fn add_friend(&self, friend: &Friend) -> Result<(), MemoryError> {
        sqlx::query("INSERT INTO friends (name, location, notes) VALUES (?1, ?2, ?3)")
            .bind(&friend.name)
            .bind(&friend.location)
            .bind(&friend.notes)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, format!("a friend named '{}'", friend.name)))?;
        debug!(name = %friend.name, "Added friend");
        Ok(())
    }

    pub async fn add_poi(&self, poi: &PointOfInterest) -> Result<(), MemoryError> {
        sqlx::query(
            "INSERT INTO points_of_interest (name, type, location, notes) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&poi.name)
        .bind(&poi.kind)
        .bind(&poi.location)
        .bind(&poi.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("a POI named '{}'", poi.name)))?;
        debug!(name = %poi.name, "Added point of interest");
        Ok(())
    }

    /// Move the first friend whose name contains `name` (case-insensitive).
    ///
    /// Returns the stored name of the friend that was updated.
    pub async fn update_friend_location(
        &self,
        name: &str,
        new_location: &str,
    ) -> Result<String, MemoryError> {
        let row = sqlx::query(
            "SELECT id, name FROM friends WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT 1",
        )
        .bind(like_pattern(name))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("friend lookup: {e}")))?
        .ok_or_else(|| MemoryError::NotFound(format!("a friend named '{name}'")))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| MemoryError::QueryFailed(format!("id column: {e}")))?;
        let stored: String = row
            .try_get("name")
            .map_err(|e| MemoryError::QueryFailed(format!("name column: {e}")))?;

        sqlx::query("UPDATE friends SET location = ?1 WHERE id = ?2")
            .bind(new_location)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("UPDATE failed: {e}")))?;

        debug!(name = %stored, location = %new_location, "Updated friend location");
        Ok(stored)
    }

    /// All friends in the order they were added.
    pub async fn list_friends(&self) -> Result<Vec<Friend>, MemoryError> {
        let rows = sqlx::query("SELECT name, location, notes FROM friends ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("list friends: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(Friend {
                    name: row
                        .try_get("name")
                        .map_err(|e| MemoryError::QueryFailed(format!("name column: {e}")))?,
                    location: optional_text(row, "location")?,
                    notes: optional_text(row, "notes")?,
                })
            })
            .collect()
    }

    /// All points of interest in the order they were added.
    pub async fn list_pois(&self) -> Result<Vec<PointOfInterest>, MemoryError> {
        let rows = sqlx::query(
            "SELECT name, type, location, notes FROM points_of_interest ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("list POIs: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(PointOfInterest {
                    name: row
                        .try_get("name")
                        .map_err(|e| MemoryError::QueryFailed(format!("name column: {e}")))?,
                    kind: optional_text(row, "type")?,
                    location: optional_text(row, "location")?,
                    notes: optional_text(row, "notes")?,
                })
            })
            .collect()
    }
}

fn optional_text(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<String, MemoryError> {
    let value: Option<String> = row
        .try_get(column)
        .map_err(|e| MemoryError::QueryFailed(format!("{column} column: {e}")))?;
    Ok(value.unwrap_or_default())
}

fn insert_error(e: sqlx::Error, what: String) -> MemoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => MemoryError::Duplicate(what),
        _ => MemoryError::Storage(format!("INSERT failed: {e}")),
    }
}
