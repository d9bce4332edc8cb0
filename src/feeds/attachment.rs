//! CSV stored as a platform attachment or file resource.

use crate::collaborators::AttachmentService;
use crate::config::{FeedConfig, InputMode};
use crate::error::{FeedError, FeedResult};
use crate::payload::FeedRequest;
use crate::types::{Record, RequestParams};

use super::csv::{CsvReadOptions, read_csv_from_path};
use super::format::format_result;
use super::sniff::{HeaderSniffer, read_sample};

/// Path prefix of attachment IRIs.
pub const ATTACHMENT_PREFIX: &str = "/api/3/attachments/";
/// Path prefix of file IRIs.
pub const FILE_PREFIX: &str = "/api/3/files/";

/// Resolve `params.value`, download the file into a temporary directory, sniff for a header
/// and parse it.
///
/// The temporary directory is removed when this function returns, on success or failure.
pub fn fetch_and_parse(
    config: &FeedConfig,
    params: &RequestParams,
    service: &dyn AttachmentService,
    sniffer: &dyn HeaderSniffer,
) -> FeedResult<Vec<Record>> {
    let request = FeedRequest::from_params(params)?;
    let value = request.value.clone().unwrap_or_default();
    let file_iri = resolve_file_iri(config.input_mode, &value, service)?;

    let workdir = tempfile::Builder::new().prefix("csv-feed-").tempdir()?;
    let path = service.download(&file_iri, workdir.path())?;
    tracing::debug!(%file_iri, path = %path.display(), "downloaded file");

    let sample = read_sample(&path)?;
    let has_header = sniffer.has_header(&sample, request.delimiter);

    let columns = if request.expected_columns.is_empty() {
        tracing::info!(has_header, "parsing all columns");
        None
    } else {
        tracing::info!(has_header, columns = ?request.expected_columns, "parsing expected columns");
        Some(request.expected_columns.clone())
    };
    let opts = CsvReadOptions {
        delimiter: request.delimiter,
        has_header,
        n_rows: request.n_rows,
        columns,
    };
    let table = read_csv_from_path(&path, &opts)?;
    Ok(format_result(table))
}

/// Turn the caller's reference into a file IRI.
///
/// Attachment references are prefixed with [`ATTACHMENT_PREFIX`] when bare and resolved
/// through `service`; any resolution failure is reported as [`FeedError::ResourceNotFound`].
/// File references must already start with [`FILE_PREFIX`].
pub fn resolve_file_iri(
    input_mode: InputMode,
    value: &str,
    service: &dyn AttachmentService,
) -> FeedResult<String> {
    match input_mode {
        InputMode::AttachmentIri => {
            let iri = attachment_iri(value);
            let meta = service.resolve(&iri).map_err(|err| {
                tracing::info!(%iri, error = %err, "attachment resolution failed");
                not_found(input_mode, value)
            })?;
            if meta.file.id.is_empty() {
                return Err(not_found(input_mode, value));
            }
            tracing::info!(
                file_id = %meta.file.id,
                file_name = meta.file.filename.as_deref().unwrap_or_default(),
                "resolved attachment"
            );
            Ok(meta.file.id)
        }
        InputMode::FileIri => {
            if value.starts_with(FILE_PREFIX) {
                Ok(value.to_string())
            } else {
                Err(FeedError::InvalidReference(value.to_string()))
            }
        }
        InputMode::ServerUrl => Err(FeedError::Configuration(
            "Attachment/File IRI not provided in Configuration".to_string(),
        )),
    }
}

/// Prefix a bare attachment id with [`ATTACHMENT_PREFIX`], exactly once.
pub fn attachment_iri(value: &str) -> String {
    if value.starts_with(ATTACHMENT_PREFIX) {
        value.to_string()
    } else {
        format!("{ATTACHMENT_PREFIX}{value}")
    }
}

fn not_found(input_mode: InputMode, value: &str) -> FeedError {
    FeedError::ResourceNotFound {
        input_mode: input_mode.label().to_string(),
        value: value.replace(ATTACHMENT_PREFIX, ""),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use super::*;
    use crate::collaborators::{AttachmentMetadata, CollaboratorError, FileMetadata};

    #[derive(Default)]
    struct RecordingService {
        resolved: Mutex<Vec<String>>,
    }

    impl AttachmentService for RecordingService {
        fn resolve(&self, iri: &str) -> Result<AttachmentMetadata, CollaboratorError> {
            self.resolved.lock().unwrap().push(iri.to_string());
            if iri.ends_with("missing") {
                return Err(CollaboratorError::NotFound(iri.to_string()));
            }
            Ok(AttachmentMetadata {
                file: FileMetadata {
                    id: "/api/3/files/f1".to_string(),
                    filename: Some("feed.csv".to_string()),
                },
            })
        }

        fn download(&self, _file_iri: &str, _dest_dir: &Path) -> Result<PathBuf, CollaboratorError> {
            Err(CollaboratorError::Failed("not used".to_string()))
        }
    }

    #[test]
    fn bare_attachment_id_is_prefixed_once() {
        assert_eq!(attachment_iri("abc"), "/api/3/attachments/abc");
        assert_eq!(attachment_iri("/api/3/attachments/abc"), "/api/3/attachments/abc");
    }

    #[test]
    fn attachment_resolves_to_file_iri() {
        let service = RecordingService::default();
        let iri = resolve_file_iri(InputMode::AttachmentIri, "abc", &service).unwrap();
        assert_eq!(iri, "/api/3/files/f1");
        assert_eq!(*service.resolved.lock().unwrap(), vec!["/api/3/attachments/abc"]);
    }

    #[test]
    fn attachment_failure_is_redacted_not_found() {
        let service = RecordingService::default();
        let err =
            resolve_file_iri(InputMode::AttachmentIri, "/api/3/attachments/missing", &service).unwrap_err();
        match err {
            FeedError::ResourceNotFound { input_mode, value } => {
                assert_eq!(input_mode, "Attachment IRI");
                assert_eq!(value, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn file_iri_must_carry_prefix() {
        let service = RecordingService::default();
        assert_eq!(
            resolve_file_iri(InputMode::FileIri, "/api/3/files/x", &service).unwrap(),
            "/api/3/files/x"
        );
        let err = resolve_file_iri(InputMode::FileIri, "x", &service).unwrap_err();
        assert!(matches!(err, FeedError::InvalidReference(ref v) if v == "x"));
        assert!(service.resolved.lock().unwrap().is_empty());
    }
}
