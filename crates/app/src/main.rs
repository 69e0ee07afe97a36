use std::path::Path;

use engine::{Engine, PatchKind, scan_patch_dir};
use migration::{Migrator, MigratorTrait};
use server::ServerState;
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "patchpair={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let engine = Engine::builder()
        .database(db)
        .strategy(settings.selection.strategy)
        .build()
        .await?;
    tracing::info!("pair selection strategy: {:?}", engine.strategy());

    if settings.patches.load_on_start {
        load_pool(&engine, &settings.patches.dir, settings.patches.force).await?;
    }

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(ServerState::new(engine, settings.patches.dir), listener).await?;
    Ok(())
}

async fn load_pool(
    engine: &Engine,
    dir: &Path,
    force: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let real = scan_patch_dir(&dir.join(PatchKind::Real.dir()))?;
    let fake = scan_patch_dir(&dir.join(PatchKind::Fake.dir()))?;
    for name in real.rejected.iter().chain(&fake.rejected) {
        tracing::warn!("skipping unrecognised patch file {name}");
    }

    let summary = engine.load_patches(&real.files, &fake.files, force).await?;
    tracing::info!(
        "loaded patches from {}: {} inserted, {} already present",
        dir.display(),
        summary.inserted,
        summary.skipped
    );
    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
