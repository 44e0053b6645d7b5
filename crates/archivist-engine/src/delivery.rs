//! Writes the encoded archive and copies attachment payloads next to it.

use archivist_storage::{FileBackend, join_path, try_write_file_without_deadline};
use archivist_types::{AttachmentInfo, TranscriptDocument};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::error::ExportError;

pub const EXPORT_FILENAME: &str = "actiance_export.xml";
pub const WARNING_FILENAME: &str = "warning.txt";
pub const MISSING_FILE_MESSAGE: &str = "File missing for post; cannot copy file to archive";

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Outcome of a delivery that wrote the archive document.
#[derive(Debug)]
pub struct DeliveryReport {
    /// Attachments that could not be read from the source backend.
    pub warning_count: u64,
    /// Hex SHA-256 of the document as written.
    pub document_sha256: String,
    /// Set when the warning manifest itself could not be written.
    pub manifest_error: Option<ExportError>,
}

/// Encode the document as indented XML with a declaration.
pub fn encode_document(document: &TranscriptDocument) -> Result<Vec<u8>, ExportError> {
    let mut xml = String::from(XML_HEADER);
    let mut serializer = quick_xml::se::Serializer::new(&mut xml);
    serializer.indent(' ', 2);
    document
        .serialize(serializer)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    xml.push('\n');
    Ok(replace_invalid_xml_chars(&xml).into_bytes())
}

/// Whether `c` matches the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Swap characters XML cannot carry for U+FFFD so strict parsers accept the file.
fn replace_invalid_xml_chars(xml: &str) -> String {
    xml.chars()
        .map(|c| if is_xml_char(c) { c } else { '\u{FFFD}' })
        .collect()
}

/// Write the document, then copy every uploaded file into `export_dir`.
///
/// Unreadable attachments are collected into a warning manifest instead of
/// failing the export. Every other failure aborts.
pub fn deliver(
    document: &TranscriptDocument,
    uploaded_files: &[AttachmentInfo],
    export_backend: &dyn FileBackend,
    attachment_backend: &dyn FileBackend,
    export_dir: &str,
) -> Result<DeliveryReport, ExportError> {
    let encoded = encode_document(document)?;
    let document_sha256 = hex::encode(Sha256::digest(&encoded));

    let document_path = join_path(export_dir, EXPORT_FILENAME);
    try_write_file_without_deadline(export_backend, &mut encoded.as_slice(), &document_path)
        .map_err(|source| ExportError::WriteDocument {
            path: document_path.clone(),
            source,
        })?;
    info!(
        path = %document_path,
        bytes = encoded.len(),
        sha256 = %document_sha256,
        "wrote export document"
    );

    let mut missing_files = Vec::new();
    for file in uploaded_files {
        let mut reader = match attachment_backend.reader(&file.path) {
            Ok(reader) => reader,
            Err(e) => {
                warn!(file_name = %file.path, error = %e, "{}", MISSING_FILE_MESSAGE);
                missing_files.push(format!("Warning:{} - {}", MISSING_FILE_MESSAGE, file.path));
                continue;
            }
        };

        let dest_path = join_path(export_dir, &file.path);
        export_backend
            .write_file(&mut reader, &dest_path)
            .map_err(|source| ExportError::CopyAttachment {
                path: dest_path.clone(),
                source,
            })?;
    }

    let warning_count = missing_files.len() as u64;
    let mut manifest_error = None;
    if warning_count > 0 {
        let manifest_path = join_path(export_dir, WARNING_FILENAME);
        let manifest = missing_files.join("\n");
        if let Err(source) =
            try_write_file_without_deadline(export_backend, &mut manifest.as_bytes(), &manifest_path)
        {
            let err = ExportError::WriteWarnings {
                path: manifest_path,
                source,
            };
            error!("{}", err);
            manifest_error = Some(err);
        }
    }

    Ok(DeliveryReport {
        warning_count,
        document_sha256,
        manifest_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::attachment;
    use archivist_storage::MemoryBackend;
    use archivist_types::{ChannelTranscript, Participant, PostEntry, TranscriptEvent, UserType};

    fn document() -> TranscriptDocument {
        TranscriptDocument::new(vec![ChannelTranscript {
            perspective: "Town Square".into(),
            channel_id: "c1".into(),
            room_id: "public - town-square - c1".into(),
            start_time: 1000,
            joins: vec![Participant::new("a@example.com", UserType::User, 1000)],
            events: vec![],
            leaves: vec![Participant::new("a@example.com", UserType::User, 2000)],
            end_time: 2000,
        }])
    }

    #[test]
    fn test_encoded_document_has_header() {
        let xml = String::from_utf8(encode_document(&document()).unwrap()).unwrap();
        assert!(xml.starts_with(XML_HEADER));
        assert!(xml.contains("<FileDump"));
        assert!(xml.contains("<StartTimeUTC>1000</StartTimeUTC>"));
        assert!(xml.contains("<EndTimeUTC>2000</EndTimeUTC>"));
    }

    #[test]
    fn test_control_characters_replaced() {
        let mut doc = document();
        doc.channels[0].events.push(TranscriptEvent::Post(PostEntry {
            email: "a@example.com".into(),
            user_type: UserType::User,
            timestamp: 1200,
            message: "bell\u{7}vt\u{b}nul\u{0}end\u{FFFE}".into(),
            previews_post: String::new(),
        }));

        let encoded = encode_document(&doc).unwrap();
        assert!(!encoded.iter().any(|b| matches!(b, 0x00 | 0x07 | 0x0B)));
        let xml = String::from_utf8(encoded).unwrap();
        assert!(!xml.contains('\u{FFFE}'));
        assert!(xml.contains("<Content>bell\u{FFFD}vt\u{FFFD}nul\u{FFFD}end\u{FFFD}</Content>"));
        // Line breaks and tabs survive
        assert!(xml.contains('\n'));
    }

    #[test]
    fn test_copies_attachments() {
        let source = MemoryBackend::new();
        source.insert("data/a.txt", "payload");
        let dest = MemoryBackend::new();

        let files = vec![attachment("f1", "p1", "data/a.txt", None)];
        let report = deliver(&document(), &files, &dest, &source, "out").unwrap();

        assert_eq!(report.warning_count, 0);
        assert!(report.manifest_error.is_none());
        assert_eq!(report.document_sha256.len(), 64);
        assert_eq!(dest.get_string("out/data/a.txt").as_deref(), Some("payload"));
        assert!(dest.get("out/actiance_export.xml").is_some());
        assert!(dest.get("out/warning.txt").is_none());
        // document went through the deadline-free path
        assert_eq!(dest.deadline_free_writes(), 1);
    }

    #[test]
    fn test_missing_attachment_is_a_warning() {
        let source = MemoryBackend::new();
        source.insert("data/b.txt", "b");
        let dest = MemoryBackend::new();

        let files = vec![
            attachment("f1", "p1", "data/a.txt", None),
            attachment("f2", "p1", "data/b.txt", None),
        ];
        let report = deliver(&document(), &files, &dest, &source, "out").unwrap();

        assert_eq!(report.warning_count, 1);
        assert!(dest.get("out/actiance_export.xml").is_some());
        assert_eq!(dest.get_string("out/data/b.txt").as_deref(), Some("b"));
        assert_eq!(
            dest.get_string("out/warning.txt").as_deref(),
            Some("Warning:File missing for post; cannot copy file to archive - data/a.txt")
        );
    }

    #[test]
    fn test_document_write_failure_is_fatal() {
        let dest = MemoryBackend::new();
        dest.fail_writes_to("out/actiance_export.xml");
        let err = deliver(&document(), &[], &dest, &MemoryBackend::new(), "out").unwrap_err();
        assert!(matches!(err, ExportError::WriteDocument { .. }));
    }

    #[test]
    fn test_copy_failure_is_fatal() {
        let source = MemoryBackend::new();
        source.insert("data/a.txt", "payload");
        let dest = MemoryBackend::new();
        dest.fail_writes_to("out/data/a.txt");

        let files = vec![attachment("f1", "p1", "data/a.txt", None)];
        let err = deliver(&document(), &files, &dest, &source, "out").unwrap_err();
        assert!(matches!(err, ExportError::CopyAttachment { ref path, .. } if path == "out/data/a.txt"));
    }

    #[test]
    fn test_manifest_failure_keeps_outcome() {
        let dest = MemoryBackend::new();
        dest.fail_writes_to("out/warning.txt");

        let files = vec![attachment("f1", "p1", "data/a.txt", None)];
        let report = deliver(&document(), &files, &dest, &MemoryBackend::new(), "out").unwrap();

        assert_eq!(report.warning_count, 1);
        assert!(matches!(report.manifest_error, Some(ExportError::WriteWarnings { .. })));
        assert!(dest.get("out/actiance_export.xml").is_some());
    }
}
