use std::env;

use crate::domains::export::types::SignatureDescriptor;
use crate::errors::{ServiceError, ServiceResult};

/// Signing configuration, sourced from the signing key provider (environment
/// variables outside production). The private key is used transiently by the
/// signer and is never persisted or encoded into the export.
#[derive(Debug, Clone)]
pub struct ExposuresConfig {
    pub private_key_pem: String,
    pub signature_algorithm: String,
    pub verification_key_id: String,
    pub verification_key_version: String,
    pub app_bundle_id: String,
}

impl ExposuresConfig {
    /// The public half of this configuration, embedded in every export.
    pub fn descriptor(&self) -> SignatureDescriptor {
        SignatureDescriptor {
            app_bundle_id: self.app_bundle_id.clone(),
            verification_key_id: self.verification_key_id.clone(),
            verification_key_version: self.verification_key_version.clone(),
            signature_algorithm: self.signature_algorithm.clone(),
        }
    }
}

/// Where produced archives are stored and expired ones deleted.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Local filesystem root, for development and tests.
    Local { base_path: String },
    /// HTTP storage gateway with optional bearer token.
    Api { base_url: String, api_token: Option<String> },
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub database_url: String,
    pub assets_bucket: String,
    pub region: String,
    pub retention_days: i64,
    pub storage: StorageConfig,
    pub exposures: ExposuresConfig,
}

fn require(name: &str) -> ServiceResult<String> {
    env::var(name)
        .map_err(|_| ServiceError::Configuration(format!("missing environment variable {}", name)))
}

impl ExportConfig {
    /// Read the full job configuration from the environment. Any missing or
    /// invalid value is fatal; the job must not run half-configured.
    pub fn from_env() -> ServiceResult<Self> {
        let storage = match env::var("LOCAL_STORAGE_PATH") {
            Ok(base_path) => StorageConfig::Local { base_path },
            Err(_) => StorageConfig::Api {
                base_url: require("STORAGE_API_URL")?,
                api_token: env::var("STORAGE_API_TOKEN").ok(),
            },
        };

        let retention_days = match env::var("RETENTION_DAYS") {
            Ok(value) => value.parse::<i64>().ok().filter(|days| *days > 0).ok_or_else(|| {
                ServiceError::Configuration(format!("RETENTION_DAYS must be a positive integer, got {}", value))
            })?,
            Err(_) => 14,
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            assets_bucket: require("ASSETS_BUCKET")?,
            region: env::var("EXPORT_REGION").unwrap_or_else(|_| "IE".to_string()),
            retention_days,
            storage,
            exposures: ExposuresConfig {
                private_key_pem: require("EXPOSURES_PRIVATE_KEY")?,
                signature_algorithm: require("EXPOSURES_SIGNATURE_ALGORITHM")?,
                verification_key_id: require("EXPOSURES_KEY_ID")?,
                verification_key_version: require("EXPOSURES_KEY_VERSION")?,
                app_bundle_id: require("APP_BUNDLE_ID")?,
            },
        })
    }
}
