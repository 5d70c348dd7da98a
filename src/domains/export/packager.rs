use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{DomainError, DomainResult};

/// Archive member holding the magic-prefixed protobuf export.
pub const EXPORT_BIN_NAME: &str = "export.bin";
/// Archive member holding the encoded signature list.
pub const EXPORT_SIG_NAME: &str = "export.sig";

/// Package the export payload and its signature list into a zip archive with
/// exactly two members. Consumers identify members by name, but the order is
/// kept fixed anyway.
pub fn pack(export_payload: &[u8], signature_list: &[u8]) -> DomainResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(EXPORT_BIN_NAME, options)
        .map_err(|e| DomainError::Packaging(e.to_string()))?;
    zip.write_all(export_payload)
        .map_err(|e| DomainError::Packaging(e.to_string()))?;

    zip.start_file(EXPORT_SIG_NAME, options)
        .map_err(|e| DomainError::Packaging(e.to_string()))?;
    zip.write_all(signature_list)
        .map_err(|e| DomainError::Packaging(e.to_string()))?;

    let cursor = zip
        .finish()
        .map_err(|e| DomainError::Packaging(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn member_bytes(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
        let mut member = archive.by_name(name).expect(name);
        let mut bytes = Vec::new();
        member.read_to_end(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_archive_has_exactly_two_named_members() {
        let archive_bytes = pack(b"export payload", b"signature list").unwrap();
        let mut archive = ZipArchive::new(Cursor::new(archive_bytes)).unwrap();

        assert_eq!(archive.len(), 2);
        assert_eq!(member_bytes(&mut archive, EXPORT_BIN_NAME), b"export payload");
        assert_eq!(member_bytes(&mut archive, EXPORT_SIG_NAME), b"signature list");
    }

    #[test]
    fn test_member_order_is_fixed() {
        let archive_bytes = pack(b"a", b"b").unwrap();
        let mut archive = ZipArchive::new(Cursor::new(archive_bytes)).unwrap();

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec![EXPORT_BIN_NAME, EXPORT_SIG_NAME]);
    }
}
