pub mod encoder;
pub mod packager;
pub mod proto;
pub mod repository;
pub mod service;
pub mod signer;
pub mod types;

pub use repository::{ExposureExportRepository, SqliteExposureExportRepository};
pub use service::{ExposureExportService, ExposureExportServiceImpl};
pub use signer::ExportSigner;
pub use types::{Exposure, ExportOutcome, ExportSummary, NewExportFile, SignatureDescriptor};
