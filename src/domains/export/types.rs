use chrono::{DateTime, Utc};
use serde::Serialize;

use super::proto;

/// One reported Temporary Exposure Key as stored in the key store. Rows are
/// immutable once inserted; only retention cleanup removes them.
#[derive(Debug, Clone)]
pub struct Exposure {
    /// Store-assigned monotonic id, used as the watermark key. Not the TEK
    /// identity.
    pub id: i64,
    pub created_at: DateTime<Utc>,
    /// The TEK bytes, treated as opaque.
    pub key_data: Vec<u8>,
    /// 10-minute interval index at which the key became active.
    pub rolling_start_number: i32,
    /// Number of 10-minute intervals the key is valid for.
    pub rolling_period: i32,
    pub transmission_risk_level: i32,
}

/// Insert payload for `exposure_export_files`; one row per produced archive.
#[derive(Debug, Clone)]
pub struct NewExportFile {
    pub path: String,
    pub exposure_count: i64,
    pub last_exposure_id: i64,
}

/// Public half of the signing configuration. Everything here is embedded in
/// the export payload so verifiers can locate the verification key; the
/// private key itself never leaves the signer.
#[derive(Debug, Clone)]
pub struct SignatureDescriptor {
    pub app_bundle_id: String,
    pub verification_key_id: String,
    pub verification_key_version: String,
    pub signature_algorithm: String,
}

impl SignatureDescriptor {
    pub fn to_proto(&self) -> proto::SignatureInfo {
        proto::SignatureInfo {
            app_bundle_id: Some(self.app_bundle_id.clone()),
            verification_key_version: Some(self.verification_key_version.clone()),
            verification_key_id: Some(self.verification_key_id.clone()),
            signature_algorithm: Some(self.signature_algorithm.clone()),
        }
    }
}

/// Summary of the archive produced by one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub path: String,
    pub exposure_count: i64,
    pub last_exposure_id: i64,
}

/// Result of one job invocation, reported back to the scheduler.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    /// `None` when no new exposures were available (no-op run).
    pub export: Option<ExportSummary>,
    pub purged_exposures: u64,
    pub purged_files: u64,
    pub failed_object_deletes: u64,
}
