use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};
use sqlx::SqlitePool;

use exposure_export::config::{ExportConfig, StorageConfig};
use exposure_export::db_migration;
use exposure_export::domains::core::object_storage::{
    HttpObjectStorage, LocalObjectStorage, ObjectStorage,
};
use exposure_export::domains::export::repository::SqliteExposureExportRepository;
use exposure_export::domains::export::service::{ExposureExportService, ExposureExportServiceImpl};
use exposure_export::domains::export::signer::ExportSigner;

// One-shot export job. The scheduler invokes this on a fixed period with a
// non-overlap guarantee; the exit status is the only signal back.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    match run().await {
        Ok(outcome) => {
            println!("{}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("export run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<String, Box<dyn std::error::Error>> {
    let config = ExportConfig::from_env()?;

    let pool = SqlitePool::connect(&config.database_url).await?;
    db_migration::initialize_database(&pool).await?;

    let storage: Arc<dyn ObjectStorage> = match &config.storage {
        StorageConfig::Local { base_path } => Arc::new(LocalObjectStorage::new(base_path)?),
        StorageConfig::Api { base_url, api_token } => {
            Arc::new(HttpObjectStorage::new(base_url, api_token.clone()))
        }
    };

    let signer = ExportSigner::new(
        &config.exposures.private_key_pem,
        &config.exposures.signature_algorithm,
    )?;

    let repo = Arc::new(SqliteExposureExportRepository::new(pool.clone()));
    let service = ExposureExportServiceImpl::new(
        repo,
        storage,
        signer,
        config.exposures.descriptor(),
        config.assets_bucket.clone(),
        config.region.clone(),
        config.retention_days,
    );

    let outcome = service.run_export().await?;
    info!("export run complete");
    Ok(serde_json::to_string(&outcome)?)
}
