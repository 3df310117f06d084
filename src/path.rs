//! # Path and Key Resolution
//!
//! Turns caller-supplied logical paths into local filesystem paths or object
//! keys.
//!
//! ## Responsibility
//! - Collapse `.`, `..` and repeated separators into a canonical relative path
//! - Reject any path that climbs above the adapter root
//! - Derive object keys, including the optional key prefix
//!
//! Normalization always happens before containment checks, and containment is
//! checked component-wise (`/base-evil` is not inside `/base`).

use std::path::{Component, Path, PathBuf};

use crate::FsError;

/// Normalize a logical path into a canonical relative path.
///
/// Leading, trailing and repeated `/` are dropped, `.` segments are removed
/// and `..` pops the previous segment. The root (`""`, `"/"`) normalizes to
/// the empty string.
///
/// # Errors
///
/// - [`FsError::PermissionDenied`] if `..` climbs above the root
/// - [`FsError::Validation`] if the path contains a NUL byte
///
/// # Example
///
/// ```rust
/// use anyfs_adapters::path::normalize;
///
/// assert_eq!(normalize("/a/./b//c/../d/").unwrap(), "a/b/d");
/// assert_eq!(normalize("/").unwrap(), "");
/// assert!(normalize("../etc/passwd").is_err());
/// ```
pub fn normalize(path: &str) -> Result<String, FsError> {
    if path.contains('\0') {
        return Err(FsError::validation("resolve", "path contains a NUL byte"));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(escapes_root(path));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// Resolve a logical path against a local base directory.
///
/// `base` must already be absolute and normalized (see [`absolute_base`]).
///
/// # Errors
///
/// - [`FsError::PermissionDenied`] if the result would leave `base`
pub fn resolve_local(base: &Path, path: &str) -> Result<PathBuf, FsError> {
    let relative = normalize(path)?;
    let resolved = if relative.is_empty() {
        base.to_path_buf()
    } else {
        base.join(&relative)
    };

    if !resolved.starts_with(base) {
        return Err(escapes_root(path));
    }
    Ok(resolved)
}

/// Derive the object key for a logical path.
///
/// With a prefix configured the key is `prefix/path`; the root maps to the
/// bare prefix. Without one the key is the normalized path. The prefix goes
/// through [`normalize`] too, so `./tenant` and `a/../tenant` name the same
/// namespace as `tenant`.
///
/// # Errors
///
/// - the errors of [`normalize`], for either the prefix or the path
///
/// # Example
///
/// ```rust
/// use anyfs_adapters::path::to_object_key;
///
/// assert_eq!(to_object_key(Some("tenant-a"), "/docs/a.txt").unwrap(), "tenant-a/docs/a.txt");
/// assert_eq!(to_object_key(None, "/docs/a.txt").unwrap(), "docs/a.txt");
/// ```
pub fn to_object_key(prefix: Option<&str>, path: &str) -> Result<String, FsError> {
    let key = normalize(path)?;
    let prefix = prefix.map(normalize).transpose()?.filter(|p| !p.is_empty());
    Ok(match prefix {
        Some(p) if key.is_empty() => p,
        Some(p) => format!("{p}/{key}"),
        None => key,
    })
}

/// The listing prefix for the simulated directory at `key`.
///
/// Returns `None` for the bucket root, where the `Prefix` parameter must be
/// omitted rather than sent empty.
pub fn dir_prefix(key: &str) -> Option<String> {
    if key.is_empty() {
        None
    } else {
        Some(format!("{key}/"))
    }
}

/// The parent of a normalized relative path (`""` for top-level entries).
pub fn parent(relative: &str) -> &str {
    relative.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Make `path` absolute and lexically normalized, without touching the disk.
///
/// # Errors
///
/// - [`FsError::Validation`] if `path` is empty or cannot be made absolute
pub fn absolute_base(path: &Path) -> Result<PathBuf, FsError> {
    if path.as_os_str().is_empty() {
        return Err(FsError::validation("create_adapter", "basePath is required"));
    }
    let absolute = std::path::absolute(path).map_err(|e| {
        FsError::validation("create_adapter", format!("cannot resolve basePath: {e}"))
    })?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// Express `absolute` relative to `base` with `/` separators.
///
/// Returns `None` if `absolute` is not inside `base`.
pub fn relative_to(base: &Path, absolute: &Path) -> Option<String> {
    let rest = absolute.strip_prefix(base).ok()?;
    let segments: Vec<String> = rest
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(segments.join("/"))
}

fn escapes_root(path: &str) -> FsError {
    FsError::PermissionDenied {
        path: path.to_owned(),
        operation: "resolve",
        source: None,
    }
}
