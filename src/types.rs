//! Core types for the storage adapters.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::FsError;

/// Type of a storage entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file (or object).
    File,
    /// Directory (real or simulated).
    Directory,
    /// Symbolic link. Only the local adapter produces these.
    Symlink,
    /// Block device.
    BlockDevice,
    /// Character device.
    CharDevice,
    /// Named pipe.
    Fifo,
    /// Unix domain socket.
    Socket,
}

impl FileType {
    /// The `S_IFMT` bits for this type.
    const fn type_bits(self) -> u32 {
        match self {
            FileType::File => 0o100000,
            FileType::Directory => 0o040000,
            FileType::Symlink => 0o120000,
            FileType::BlockDevice => 0o060000,
            FileType::CharDevice => 0o020000,
            FileType::Fifo => 0o010000,
            FileType::Socket => 0o140000,
        }
    }
}

impl From<std::fs::FileType> for FileType {
    fn from(ft: std::fs::FileType) -> Self {
        if ft.is_symlink() {
            return FileType::Symlink;
        }
        if ft.is_dir() {
            return FileType::Directory;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return FileType::BlockDevice;
            }
            if ft.is_char_device() {
                return FileType::CharDevice;
            }
            if ft.is_fifo() {
                return FileType::Fifo;
            }
            if ft.is_socket() {
                return FileType::Socket;
            }
        }
        FileType::File
    }
}

/// Result of `stat`/`lstat`.
///
/// Timestamps are stored once as [`SystemTime`]; the `*_ms` accessors are
/// derived from them, so the two views can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
    /// Permission bits (best-effort on object storage).
    pub permissions: Permissions,
    /// Last access time.
    #[serde(with = "system_time_serde")]
    pub accessed: SystemTime,
    /// Last modification time.
    #[serde(with = "system_time_serde")]
    pub modified: SystemTime,
    /// Last status change time.
    #[serde(with = "system_time_serde")]
    pub changed: SystemTime,
    /// Creation time, `UNIX_EPOCH` when the backend cannot supply one.
    #[serde(with = "system_time_serde")]
    pub created: SystemTime,
}

impl FileStats {
    /// Stats for an object-store file last modified at `modified`.
    pub fn file(size: u64, modified: SystemTime) -> Self {
        Self {
            file_type: FileType::File,
            size,
            permissions: Permissions::default_file(),
            accessed: modified,
            modified,
            changed: modified,
            created: UNIX_EPOCH,
        }
    }

    /// Stats for a simulated directory.
    pub fn directory(modified: SystemTime) -> Self {
        Self {
            file_type: FileType::Directory,
            size: 0,
            permissions: Permissions::default_dir(),
            accessed: modified,
            modified,
            changed: modified,
            created: UNIX_EPOCH,
        }
    }

    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Returns `true` if this is a symbolic link.
    #[inline]
    pub fn is_symbolic_link(&self) -> bool {
        self.file_type == FileType::Symlink
    }

    /// Returns `true` if this is a block device.
    #[inline]
    pub fn is_block_device(&self) -> bool {
        self.file_type == FileType::BlockDevice
    }

    /// Returns `true` if this is a character device.
    #[inline]
    pub fn is_character_device(&self) -> bool {
        self.file_type == FileType::CharDevice
    }

    /// Returns `true` if this is a named pipe.
    #[inline]
    pub fn is_fifo(&self) -> bool {
        self.file_type == FileType::Fifo
    }

    /// Returns `true` if this is a socket.
    #[inline]
    pub fn is_socket(&self) -> bool {
        self.file_type == FileType::Socket
    }

    /// Full mode: type bits plus permission bits.
    pub fn mode(&self) -> u32 {
        self.file_type.type_bits() | self.permissions.mode()
    }

    /// Last access time in milliseconds since the Unix epoch.
    pub fn atime_ms(&self) -> f64 {
        epoch_millis(self.accessed)
    }

    /// Last modification time in milliseconds since the Unix epoch.
    pub fn mtime_ms(&self) -> f64 {
        epoch_millis(self.modified)
    }

    /// Last status change time in milliseconds since the Unix epoch.
    pub fn ctime_ms(&self) -> f64 {
        epoch_millis(self.changed)
    }

    /// Creation time in milliseconds since the Unix epoch (0 when unknown).
    pub fn birthtime_ms(&self) -> f64 {
        epoch_millis(self.created)
    }
}

impl From<std::fs::Metadata> for FileStats {
    fn from(meta: std::fs::Metadata) -> Self {
        let modified = meta.modified().unwrap_or(UNIX_EPOCH);
        let accessed = meta.accessed().unwrap_or(modified);
        let created = meta.created().unwrap_or(UNIX_EPOCH);

        #[cfg(unix)]
        let (permissions, changed) = {
            use std::os::unix::fs::MetadataExt;
            let changed = if meta.ctime() >= 0 {
                UNIX_EPOCH + Duration::new(meta.ctime() as u64, meta.ctime_nsec() as u32)
            } else {
                modified
            };
            (Permissions::from_mode(meta.mode()), changed)
        };

        #[cfg(not(unix))]
        let (permissions, changed) = {
            let base = if meta.is_dir() { 0o777 } else { 0o666 };
            let mode = if meta.permissions().readonly() {
                base & !0o222
            } else {
                base
            };
            (Permissions::from_mode(mode), modified)
        };

        Self {
            file_type: meta.file_type().into(),
            size: meta.len(),
            permissions,
            accessed,
            modified,
            changed,
            created,
        }
    }
}

fn epoch_millis(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64() * 1000.0,
        Err(e) => -(e.duration().as_secs_f64() * 1000.0),
    }
}

/// Unix-style permissions stored as a mode bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Returns `true` if these permissions deny writing.
    #[inline]
    pub const fn readonly(&self) -> bool {
        (self.0 & 0o222) == 0
    }

    /// Default permissions for a file (0o644 = rw-r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o644)
    }

    /// Default permissions for a directory (0o755 = rwxr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o755)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

/// Accessibility checks for `access`, combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessMode(u8);

impl AccessMode {
    /// Only check that the path exists.
    pub const EXISTS: Self = Self(0);
    /// Check that the path is executable.
    pub const EXECUTE: Self = Self(1);
    /// Check that the path is writable.
    pub const WRITE: Self = Self(2);
    /// Check that the path is readable.
    pub const READ: Self = Self(4);

    /// Returns `true` if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for AccessMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Options for `mkdir` and `rmdir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirOptions {
    /// Create missing parents / remove contents too.
    pub recursive: bool,
}

impl DirOptions {
    /// Non-recursive (the default).
    pub const SINGLE: Self = Self { recursive: false };

    /// Recursive.
    pub const RECURSIVE: Self = Self { recursive: true };
}

/// Text encodings understood by `read_file_encoded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Strict UTF-8.
    #[default]
    Utf8,
    /// ISO-8859-1, one char per byte.
    Latin1,
    /// Standard base64 of the raw bytes.
    Base64,
}

impl Encoding {
    /// Decode file contents read from `path`.
    pub fn decode(self, path: &str, bytes: Vec<u8>) -> Result<String, FsError> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|e| FsError::Other {
                message: "file is not valid UTF-8".into(),
                path: path.to_owned(),
                operation: "read_file",
                source: Some(Box::new(e)),
            }),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Base64 => Ok(base64::engine::general_purpose::STANDARD.encode(bytes)),
        }
    }
}

/// Serde support for SystemTime.
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_kind_predicate_is_true() {
        let file = FileStats::file(3, UNIX_EPOCH);
        assert!(file.is_file());
        assert!(!file.is_directory());
        assert!(!file.is_symbolic_link());

        let dir = FileStats::directory(UNIX_EPOCH);
        assert!(!dir.is_file());
        assert!(dir.is_directory());
        assert!(!dir.is_fifo());
        assert!(!dir.is_socket());
    }

    #[test]
    fn millisecond_view_matches_system_time() {
        let modified = UNIX_EPOCH + Duration::from_micros(1_700_000_000_123_456);
        let stats = FileStats::file(0, modified);
        let expected = modified.duration_since(UNIX_EPOCH).unwrap().as_millis() as f64;
        assert!((stats.mtime_ms() - expected).abs() < 1.0);
        assert_eq!(stats.mtime_ms(), stats.atime_ms());
        assert_eq!(stats.birthtime_ms(), 0.0);
    }

    #[test]
    fn mode_includes_type_bits() {
        assert_eq!(FileStats::file(0, UNIX_EPOCH).mode(), 0o100644);
        assert_eq!(FileStats::directory(UNIX_EPOCH).mode(), 0o040755);
    }

    #[test]
    fn permissions_from_mode_masks_extra_bits() {
        let p = Permissions::from_mode(0o100755);
        assert_eq!(p.mode(), 0o755);
    }

    #[test]
    fn permissions_readonly() {
        assert!(Permissions::from_mode(0o444).readonly());
        assert!(!Permissions::from_mode(0o644).readonly());
    }

    #[test]
    fn access_mode_flags_combine() {
        let rw = AccessMode::READ | AccessMode::WRITE;
        assert!(rw.contains(AccessMode::READ));
        assert!(rw.contains(AccessMode::WRITE));
        assert!(!rw.contains(AccessMode::EXECUTE));
        assert!(rw.contains(AccessMode::EXISTS));
    }

    #[test]
    fn dir_options_constants() {
        assert!(DirOptions::RECURSIVE.recursive);
        assert!(!DirOptions::SINGLE.recursive);
        assert_eq!(DirOptions::default(), DirOptions::SINGLE);
    }

    #[test]
    fn encodings_decode() {
        assert_eq!(Encoding::Utf8.decode("p", b"hi".to_vec()).unwrap(), "hi");
        assert_eq!(Encoding::Latin1.decode("p", vec![0x63, 0xe9]).unwrap(), "cé");
        assert_eq!(Encoding::Base64.decode("p", b"abc".to_vec()).unwrap(), "YWJj");
    }

    #[test]
    fn invalid_utf8_is_reported_with_path() {
        let err = Encoding::Utf8.decode("bin.dat", vec![0xff, 0xfe]).unwrap_err();
        assert_eq!(err.path(), Some("bin.dat"));
        assert_eq!(err.kind(), crate::ErrorKind::Other);
    }

    #[test]
    fn file_stats_serde_roundtrip_keeps_timestamps() {
        let stats = FileStats::file(12, UNIX_EPOCH + Duration::new(1_600_000_000, 5));
        let json = serde_json::to_string(&stats).unwrap();
        let back: FileStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileType>();
        assert_send_sync::<FileStats>();
        assert_send_sync::<Permissions>();
        assert_send_sync::<AccessMode>();
        assert_send_sync::<DirOptions>();
        assert_send_sync::<Encoding>();
    }
}
