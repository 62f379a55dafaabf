// SQLite-backed stores behind the `database` feature. Uuids and timestamps
// are stored as TEXT, location and metrics as JSON columns; the natural-key
// upsert rides on the UNIQUE(vendor_id, external_id) index.

use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::models::{Plant, PlantKey, PlantUpsert, WorkOrder, WorkOrderPlant};
use crate::priority::Priority;
use crate::store::{PlantStore, StoreError, WorkOrderStore};
use crate::workorder::WorkOrderStatus;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Constraint(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Connection manager owning the pool; hands out per-entity store handles
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect, creating the database file and running migrations if asked
    pub async fn new(database_url: &str, auto_migrate: bool) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|err| StoreError::Backend(err.to_string()))?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn plants(&self) -> SqlitePlantStore {
        SqlitePlantStore {
            pool: self.pool.clone(),
        }
    }

    pub fn work_orders(&self) -> SqliteWorkOrderStore {
        SqliteWorkOrderStore {
            pool: self.pool.clone(),
        }
    }

    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}

#[derive(Clone)]
pub struct SqlitePlantStore {
    pool: SqlitePool,
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::from_str(value).map_err(|err| StoreError::Backend(format!("bad uuid {value}: {err}")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| StoreError::Backend(format!("bad timestamp {value}: {err}")))
}

fn parse_json<T: serde::de::DeserializeOwned>(value: &str) -> Result<T, StoreError> {
    serde_json::from_str(value).map_err(|err| StoreError::Backend(err.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|err| StoreError::Backend(err.to_string()))
}

fn validate_upsert(row: &PlantUpsert) -> Result<(), StoreError> {
    if row.external_id.trim().is_empty() {
        return Err(StoreError::Constraint(
            "plant row is missing its vendor external id".to_string(),
        ));
    }
    Ok(())
}

fn plant_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Plant, StoreError> {
    let id: String = row.get("id");
    let org_id: String = row.get("org_id");
    let vendor_id: String = row.get("vendor_id");
    let location: Option<String> = row.get("location");
    let metrics: String = row.get("metrics");
    let last_synced_at: Option<String> = row.get("last_synced_at");

    Ok(Plant {
        id: parse_uuid(&id)?,
        org_id: parse_uuid(&org_id)?,
        vendor_id: parse_uuid(&vendor_id)?,
        external_id: row.get("external_id"),
        name: row.get("name"),
        capacity_kw: row.get("capacity_kw"),
        location: location.as_deref().map(parse_json).transpose()?,
        metrics: parse_json(&metrics)?,
        last_synced_at: last_synced_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

const PLANT_UPSERT_SQL: &str = r#"
    INSERT INTO plants (id, org_id, vendor_id, external_id, name, capacity_kw, location, metrics, last_synced_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(vendor_id, external_id) DO UPDATE SET
        org_id = excluded.org_id,
        name = excluded.name,
        capacity_kw = excluded.capacity_kw,
        location = excluded.location,
        metrics = excluded.metrics,
        last_synced_at = excluded.last_synced_at
"#;

impl SqlitePlantStore {
    async fn execute_upsert<'e, E>(executor: E, row: &PlantUpsert) -> Result<(), StoreError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(PLANT_UPSERT_SQL)
            .bind(Uuid::new_v4().to_string())
            .bind(row.org_id.to_string())
            .bind(row.vendor_id.to_string())
            .bind(&row.external_id)
            .bind(&row.name)
            .bind(row.capacity_kw)
            .bind(row.location.as_ref().map(to_json).transpose()?)
            .bind(to_json(&row.metrics)?)
            .bind(row.synced_at.to_rfc3339())
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PlantStore for SqlitePlantStore {
    async fn existing_external_ids(
        &self,
        vendor_id: Uuid,
        external_ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        // Fleets are small enough that pulling the vendor's ids and
        // intersecting beats building a dynamic IN clause
        let rows = sqlx::query("SELECT external_id FROM plants WHERE vendor_id = ?1")
            .bind(vendor_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        let stored: HashSet<String> = rows
            .into_iter()
            .map(|row| row.get::<String, _>("external_id"))
            .collect();
        Ok(external_ids
            .iter()
            .filter(|id| stored.contains(*id))
            .cloned()
            .collect())
    }

    async fn upsert_batch(&self, batch: &[PlantUpsert]) -> Result<(), StoreError> {
        for row in batch {
            validate_upsert(row)?;
        }

        let mut tx = self.pool.begin().await?;
        for row in batch {
            Self::execute_upsert(&mut *tx, row).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn upsert_one(&self, plant: &PlantUpsert) -> Result<(), StoreError> {
        validate_upsert(plant)?;
        Self::execute_upsert(&self.pool, plant).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Plant>, StoreError> {
        let row = sqlx::query("SELECT * FROM plants WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(plant_from_row).transpose()
    }

    async fn get_by_key(&self, key: &PlantKey) -> Result<Option<Plant>, StoreError> {
        let row = sqlx::query("SELECT * FROM plants WHERE vendor_id = ?1 AND external_id = ?2")
            .bind(key.vendor_id.to_string())
            .bind(&key.external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(plant_from_row).transpose()
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> Result<Vec<Plant>, StoreError> {
        let rows = sqlx::query("SELECT * FROM plants WHERE vendor_id = ?1 ORDER BY external_id")
            .bind(vendor_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(plant_from_row).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM plants WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("plant {id}")));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteWorkOrderStore {
    pool: SqlitePool,
}

fn work_order_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<WorkOrder, StoreError> {
    let id: String = row.get("id");
    let org_id: String = row.get("org_id");
    let created_by: String = row.get("created_by");
    let status: String = row.get("status");
    let priority: String = row.get("priority");
    let created_at: String = row.get("created_at");

    Ok(WorkOrder {
        id: parse_uuid(&id)?,
        org_id: parse_uuid(&org_id)?,
        title: row.get("title"),
        description: row.get("description"),
        priority: Priority::from_label(&priority),
        status: status
            .parse::<WorkOrderStatus>()
            .map_err(|err| StoreError::Backend(err.to_string()))?,
        created_by: parse_uuid(&created_by)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn binding_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<WorkOrderPlant, StoreError> {
    let work_order_id: String = row.get("work_order_id");
    let plant_id: String = row.get("plant_id");
    let attached_at: String = row.get("attached_at");

    Ok(WorkOrderPlant {
        work_order_id: parse_uuid(&work_order_id)?,
        plant_id: parse_uuid(&plant_id)?,
        is_active: row.get::<i64, _>("is_active") != 0,
        attached_at: parse_timestamp(&attached_at)?,
    })
}

#[async_trait]
impl WorkOrderStore for SqliteWorkOrderStore {
    async fn insert(&self, order: &WorkOrder) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO work_orders (id, org_id, title, description, priority, status, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(order.id.to_string())
        .bind(order.org_id.to_string())
        .bind(&order.title)
        .bind(&order.description)
        .bind(order.priority.to_string())
        .bind(order.status.as_str())
        .bind(order.created_by.to_string())
        .bind(order.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkOrder>, StoreError> {
        let row = sqlx::query("SELECT * FROM work_orders WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(work_order_from_row).transpose()
    }

    async fn update_status(&self, id: Uuid, status: WorkOrderStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE work_orders SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("work order {id}")));
        }
        Ok(())
    }

    async fn attach_plant(&self, binding: &WorkOrderPlant) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO work_order_plants (work_order_id, plant_id, is_active, attached_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(work_order_id, plant_id) DO UPDATE SET
                is_active = excluded.is_active,
                attached_at = excluded.attached_at
            "#,
        )
        .bind(binding.work_order_id.to_string())
        .bind(binding.plant_id.to_string())
        .bind(binding.is_active as i64)
        .bind(binding.attached_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn deactivate_plant_bindings(&self, plant_id: Uuid) -> Result<u32, StoreError> {
        let result = sqlx::query(
            "UPDATE work_order_plants SET is_active = 0 WHERE plant_id = ?1 AND is_active = 1",
        )
        .bind(plant_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() as u32)
    }

    async fn deactivate_binding(
        &self,
        work_order_id: Uuid,
        plant_id: Uuid,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE work_order_plants SET is_active = 0 WHERE work_order_id = ?1 AND plant_id = ?2",
        )
        .bind(work_order_id.to_string())
        .bind(plant_id.to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "binding of plant {plant_id} to work order {work_order_id}"
            )));
        }
        Ok(())
    }

    async fn active_bindings(
        &self,
        work_order_id: Uuid,
    ) -> Result<Vec<WorkOrderPlant>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM work_order_plants WHERE work_order_id = ?1 AND is_active = 1",
        )
        .bind(work_order_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(binding_from_row).collect()
    }

    async fn has_active_binding(&self, plant_id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM work_order_plants WHERE plant_id = ?1 AND is_active = 1",
        )
        .bind(plant_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") > 0)
    }
}
