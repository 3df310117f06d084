//! Object-storage error mapping.

use super::client::ObjectStoreError;
use crate::{ErrorKind, FsError};

/// Translate an object-store failure into the shared taxonomy.
///
/// | Provider signal | Kind |
/// |-----------------|------|
/// | `NoSuchKey`, `NotFound`, HTTP 404 | [`ErrorKind::FileNotFound`] |
/// | `AccessDenied`, `Forbidden`, HTTP 403 | [`ErrorKind::Permission`] |
/// | `NoSuchBucket` | [`ErrorKind::Storage`] |
/// | `RequestTimeout`, timeouts, connection failures, HTTP 408/504 | [`ErrorKind::Network`] |
/// | anything else | [`ErrorKind::Other`] |
///
/// Never fails; the original error is kept as the source.
pub fn map_s3_error(operation: &'static str, path: &str, error: ObjectStoreError) -> FsError {
    let kind = classify(&error);
    let message = error.to_string();
    FsError::from_kind(kind, operation, path, message, Some(Box::new(error)))
}

fn classify(error: &ObjectStoreError) -> ErrorKind {
    match error.code.as_deref() {
        Some("NoSuchKey" | "NotFound") => return ErrorKind::FileNotFound,
        Some("AccessDenied" | "Forbidden") => return ErrorKind::Permission,
        Some("NoSuchBucket") => return ErrorKind::Storage,
        Some("RequestTimeout" | "RequestTimeoutException") => return ErrorKind::Network,
        Some(_) => return ErrorKind::Other,
        None => {}
    }
    if error.transport.is_some() {
        return ErrorKind::Network;
    }
    match error.status {
        Some(404) => ErrorKind::FileNotFound,
        Some(403) => ErrorKind::Permission,
        Some(408 | 504) => ErrorKind::Network,
        _ => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::client::TransportFailure;
    use std::error::Error;

    fn service(code: &str, status: u16) -> ObjectStoreError {
        ObjectStoreError::service(code, status, format!("{code} from service"))
    }

    fn status_only(status: u16) -> ObjectStoreError {
        ObjectStoreError {
            code: None,
            status: Some(status),
            transport: None,
            source: "bare response".into(),
        }
    }

    #[test]
    fn provider_codes_map_to_kinds() {
        let cases = [
            ("NoSuchKey", 404, ErrorKind::FileNotFound),
            ("NotFound", 404, ErrorKind::FileNotFound),
            ("AccessDenied", 403, ErrorKind::Permission),
            ("Forbidden", 403, ErrorKind::Permission),
            ("NoSuchBucket", 404, ErrorKind::Storage),
            ("RequestTimeout", 400, ErrorKind::Network),
            ("InternalError", 500, ErrorKind::Other),
        ];
        for (code, status, kind) in cases {
            let err = map_s3_error("read_file", "a.txt", service(code, status));
            assert_eq!(err.kind(), kind, "code {code}");
        }
    }

    #[test]
    fn transport_failures_are_network() {
        for failure in [TransportFailure::Timeout, TransportFailure::Connectivity] {
            let err = map_s3_error(
                "stat",
                "a",
                ObjectStoreError::transport(failure, "connection refused"),
            );
            assert_eq!(err.kind(), ErrorKind::Network);
        }
    }

    #[test]
    fn bare_statuses_fall_back() {
        assert_eq!(
            map_s3_error("stat", "a", status_only(404)).kind(),
            ErrorKind::FileNotFound
        );
        assert_eq!(
            map_s3_error("stat", "a", status_only(403)).kind(),
            ErrorKind::Permission
        );
        assert_eq!(
            map_s3_error("stat", "a", status_only(504)).kind(),
            ErrorKind::Network
        );
        assert_eq!(
            map_s3_error("stat", "a", status_only(500)).kind(),
            ErrorKind::Other
        );
    }

    #[test]
    fn original_error_is_recoverable() {
        let err = map_s3_error("write_file", "docs/a", service("NoSuchBucket", 404));
        assert_eq!(err.path(), Some("docs/a"));
        assert_eq!(err.operation(), "write_file");
        let cause = err
            .source()
            .and_then(|s| s.downcast_ref::<ObjectStoreError>())
            .expect("object store error kept as source");
        assert_eq!(cause.code.as_deref(), Some("NoSuchBucket"));
    }
}
