use prost::Message;

use crate::errors::{DomainError, DomainResult};

use super::proto;
use super::types::{Exposure, SignatureDescriptor};

/// Magic marker opening `export.bin`: the ASCII string "EK Export v1" padded
/// with spaces to exactly 16 bytes. Verifiers strip it before parsing the
/// protobuf body, but the signature covers it.
pub const EXPORT_MAGIC: &[u8; 16] = b"EK Export v1    ";

/// Build the `export.bin` payload: magic marker followed by the protobuf
/// encoding of the batch. The batch must already be in key-data order.
pub fn build_export_payload(
    exposures: &[Exposure],
    batch_num: i32,
    batch_size: i32,
    region: &str,
    descriptor: &SignatureDescriptor,
) -> DomainResult<Vec<u8>> {
    if exposures.is_empty() {
        return Err(DomainError::Encoding("cannot encode an empty exposure batch".to_string()));
    }

    let start_timestamp = exposures
        .iter()
        .map(|e| e.created_at.timestamp())
        .min()
        .unwrap_or_default();
    let end_timestamp = exposures
        .iter()
        .map(|e| e.created_at.timestamp())
        .max()
        .unwrap_or_default();

    let export = proto::TemporaryExposureKeyExport {
        start_timestamp: Some(start_timestamp as u64),
        end_timestamp: Some(end_timestamp as u64),
        region: Some(region.to_string()),
        batch_num: Some(batch_num),
        batch_size: Some(batch_size),
        signature_infos: vec![descriptor.to_proto()],
        keys: exposures
            .iter()
            .map(|exposure| proto::TemporaryExposureKey {
                key_data: Some(exposure.key_data.clone()),
                transmission_risk_level: Some(exposure.transmission_risk_level),
                rolling_start_interval_number: Some(exposure.rolling_start_number),
                rolling_period: Some(exposure.rolling_period),
            })
            .collect(),
    };

    let mut payload = Vec::with_capacity(EXPORT_MAGIC.len() + export.encoded_len());
    payload.extend_from_slice(EXPORT_MAGIC);
    export
        .encode(&mut payload)
        .map_err(|e| DomainError::Encoding(e.to_string()))?;
    Ok(payload)
}

/// Build the `export.sig` payload: a signature list with a single entry
/// covering the whole archive.
pub fn build_signature_list(
    descriptor: &SignatureDescriptor,
    batch_num: i32,
    batch_size: i32,
    signature: Vec<u8>,
) -> Vec<u8> {
    let list = proto::TekSignatureList {
        signatures: vec![proto::TekSignature {
            signature_info: Some(descriptor.to_proto()),
            batch_num: Some(batch_num),
            batch_size: Some(batch_size),
            signature: Some(signature),
        }],
    };
    list.encode_to_vec()
}
