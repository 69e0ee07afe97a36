#![allow(dead_code)]

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, PatchFile, SelectionStrategy};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_with_strategy(SelectionStrategy::LowestId).await
}

pub async fn engine_with_strategy(strategy: SelectionStrategy) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .strategy(strategy)
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub fn files(ids: &[i64]) -> Vec<PatchFile> {
    ids.iter()
        .map(|&base_id| PatchFile {
            base_id,
            version: 0,
        })
        .collect()
}

pub fn versioned(ids: &[(i64, i32)]) -> Vec<PatchFile> {
    ids.iter()
        .map(|&(base_id, version)| PatchFile { base_id, version })
        .collect()
}

/// Insert a verdict with a fixed timestamp, bypassing the engine clock.
pub async fn insert_classification(
    db: &DatabaseConnection,
    user_id: i32,
    real_patch_id: i64,
    fake_patch_id: i64,
    timestamp: DateTime<Utc>,
    classification: bool,
) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO classifications (real_patch_id, fake_patch_id, user_id, timestamp, classification) VALUES (?, ?, ?, ?, ?)",
        vec![
            real_patch_id.into(),
            fake_patch_id.into(),
            user_id.into(),
            timestamp.into(),
            classification.into(),
        ],
    ))
    .await
    .unwrap();
}
