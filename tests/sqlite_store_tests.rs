// SQLite store behavior behind the `database` feature: natural-key upserts,
// atomic batch rejection, and work-order binding persistence.

#![cfg(feature = "database")]

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use sungrid::models::{PlantKey, PlantMetrics, PlantUpsert, WorkOrder, WorkOrderPlant};
use sungrid::priority::Priority;
use sungrid::store::{PlantStore, SqliteStore, WorkOrderStore};
use sungrid::workorder::WorkOrderStatus;

async fn open_store(dir: &TempDir) -> SqliteStore {
    let path = dir.path().join("sungrid-test.db");
    SqliteStore::new(path.to_str().unwrap(), true).await.unwrap()
}

fn row(org_id: Uuid, vendor_id: Uuid, external_id: &str, name: &str) -> PlantUpsert {
    PlantUpsert {
        org_id,
        vendor_id,
        external_id: external_id.to_string(),
        name: name.to_string(),
        capacity_kw: 75.0,
        location: None,
        metrics: PlantMetrics {
            current_power_kw: Some(40.0),
            ..PlantMetrics::default()
        },
        synced_at: Utc::now(),
    }
}

#[tokio::test]
async fn upsert_is_idempotent_by_natural_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let plants = store.plants();

    let org = Uuid::new_v4();
    let vendor = Uuid::new_v4();
    let batch = vec![
        row(org, vendor, "st-1", "Station One"),
        row(org, vendor, "st-2", "Station Two"),
    ];
    plants.upsert_batch(&batch).await.unwrap();

    let first: Vec<Uuid> = plants
        .list_by_vendor(vendor)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(first.len(), 2);

    // Re-upserting the same natural keys updates in place
    let renamed = vec![
        row(org, vendor, "st-1", "Station One (renamed)"),
        row(org, vendor, "st-2", "Station Two"),
    ];
    plants.upsert_batch(&renamed).await.unwrap();

    let after = plants.list_by_vendor(vendor).await.unwrap();
    assert_eq!(after.len(), 2);
    let second: Vec<Uuid> = after.iter().map(|p| p.id).collect();
    assert_eq!(first, second);
    assert_eq!(after[0].name, "Station One (renamed)");

    let existing = plants
        .existing_external_ids(
            vendor,
            &["st-1".to_string(), "st-2".to_string(), "st-9".to_string()],
        )
        .await
        .unwrap();
    assert!(existing.contains("st-1"));
    assert!(existing.contains("st-2"));
    assert!(!existing.contains("st-9"));

    let by_key = plants
        .get_by_key(&PlantKey::new(vendor, "st-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_key.metrics.current_power_kw, Some(40.0));
}

#[tokio::test]
async fn batch_with_blank_external_id_is_rejected_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let plants = store.plants();

    let org = Uuid::new_v4();
    let vendor = Uuid::new_v4();
    let batch = vec![row(org, vendor, "st-1", "Valid"), row(org, vendor, "", "Ghost")];

    assert!(plants.upsert_batch(&batch).await.is_err());
    // The valid row must not have been written either
    assert!(plants.list_by_vendor(vendor).await.unwrap().is_empty());
}

#[tokio::test]
async fn work_orders_and_bindings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let orders = store.work_orders();

    let order = WorkOrder {
        id: Uuid::new_v4(),
        org_id: Uuid::new_v4(),
        title: "Panel cleaning".to_string(),
        description: "Row 4 soiling".to_string(),
        priority: Priority::Medium,
        status: WorkOrderStatus::Open,
        created_by: Uuid::new_v4(),
        created_at: Utc::now(),
    };
    orders.insert(&order).await.unwrap();

    let loaded = orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.title, order.title);
    assert_eq!(loaded.priority, Priority::Medium);
    assert_eq!(loaded.status, WorkOrderStatus::Open);

    orders
        .update_status(order.id, WorkOrderStatus::Assigned)
        .await
        .unwrap();
    assert_eq!(
        orders.get(order.id).await.unwrap().unwrap().status,
        WorkOrderStatus::Assigned
    );

    let plant_id = Uuid::new_v4();
    orders
        .attach_plant(&WorkOrderPlant {
            work_order_id: order.id,
            plant_id,
            is_active: true,
            attached_at: Utc::now(),
        })
        .await
        .unwrap();

    assert!(orders.has_active_binding(plant_id).await.unwrap());
    assert_eq!(orders.active_bindings(order.id).await.unwrap().len(), 1);

    assert_eq!(orders.deactivate_plant_bindings(plant_id).await.unwrap(), 1);
    assert!(!orders.has_active_binding(plant_id).await.unwrap());
    assert!(orders.active_bindings(order.id).await.unwrap().is_empty());
}
