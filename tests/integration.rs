//! Integration tests running the same scenarios against both adapters.
//!
//! These tests verify that:
//! 1. Both backends honor the same observable contract through [`Fs`]
//! 2. The same failure maps to the same [`ErrorKind`] on both backends
//! 3. Simulated directories on object storage behave like real ones
//! 4. The factory builds working adapters from JSON configuration

use std::sync::Arc;

use anyfs_adapters::*;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

// =============================================================================
// Fixtures
// =============================================================================

/// One adapter of each kind over fresh, empty storage.
struct Backends {
    _dir: TempDir,
    adapters: Vec<Adapter>,
}

fn backends() -> Backends {
    let dir = TempDir::new().unwrap();
    let local = LocalAdapter::new(LocalConfig::new(dir.path()).with_create_missing_dirs(true))
        .unwrap();
    let s3 = S3Adapter::with_client(
        S3Config::new("integration", "us-east-1"),
        Arc::new(MemoryObjectClient::new().with_page_size(2)),
    )
    .unwrap();
    Backends {
        _dir: dir,
        adapters: vec![local.into(), s3.into()],
    }
}

// =============================================================================
// Behavioral Properties
// =============================================================================

#[tokio::test]
async fn write_then_read_round_trips() {
    let fixture = backends();
    for fs in &fixture.adapters {
        let data = b"\x00binary\xffpayload";
        fs.write_file("data/blob.bin", data).await.unwrap();
        assert_eq!(fs.read_file("data/blob.bin").await.unwrap(), data, "{}", fs.backend());
    }
}

#[tokio::test]
async fn unlink_removes_and_second_unlink_fails() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.write_file("gone.txt", b"x").await.unwrap();
        fs.unlink("gone.txt").await.unwrap();
        assert!(!fs.exists("gone.txt").await.unwrap());

        let err = fs.unlink("gone.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound, "{}", fs.backend());
    }
}

#[tokio::test]
async fn non_empty_directory_guard() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.write_file("p/child", b"x").await.unwrap();

        let err = fs.rmdir("p", DirOptions::SINGLE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other, "{}", fs.backend());
        assert!(fs.exists("p/child").await.unwrap());

        fs.rmdir("p", DirOptions::RECURSIVE).await.unwrap();
        assert!(!fs.exists("p").await.unwrap(), "{}", fs.backend());
        assert!(!fs.exists("p/child").await.unwrap(), "{}", fs.backend());
    }
}

#[tokio::test]
async fn traversal_is_rejected_on_every_backend() {
    let fixture = backends();
    for fs in &fixture.adapters {
        for path in ["../../etc/passwd", "a/../../b", "/../x"] {
            let err = fs.read_file(path).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Permission, "{} {path}", fs.backend());
        }
    }
}

#[tokio::test]
async fn scripted_sequence_lists_same_entries() {
    let fixture = backends();
    let mut listings = Vec::new();
    for fs in &fixture.adapters {
        for name in ["one.txt", "two.txt", "three.txt"] {
            fs.write_file(name, name.as_bytes()).await.unwrap();
        }
        fs.mkdir("sub", DirOptions::SINGLE).await.unwrap();
        fs.write_file("sub/inner.txt", b"inner").await.unwrap();

        let mut names = fs.readdir("/").await.unwrap();
        names.sort();
        listings.push(names);
    }
    assert_eq!(listings[0], ["one.txt", "sub", "three.txt", "two.txt"]);
    assert_eq!(listings[0], listings[1]);
}

#[tokio::test]
async fn append_creates_missing_files() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.append_file("logs/app.log", b"first\n").await.unwrap();
        fs.append_file("logs/app.log", b"second\n").await.unwrap();
        assert_eq!(
            fs.read_to_string("logs/app.log").await.unwrap(),
            "first\nsecond\n"
        );
    }
}

#[tokio::test]
async fn stat_size_and_times_agree() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.write_file("sized.bin", &[7u8; 1234]).await.unwrap();
        let stats = fs.stat("sized.bin").await.unwrap();
        assert!(stats.is_file());
        assert!(!stats.is_directory());
        assert_eq!(stats.size, 1234);
        assert_eq!(fs.file_size("sized.bin").await.unwrap(), 1234);

        let modified_ms = stats
            .modified
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs_f64()
            * 1000.0;
        assert!((stats.mtime_ms() - modified_ms).abs() < 1.0, "{}", fs.backend());

        fs.mkdir("folder", DirOptions::RECURSIVE).await.unwrap();
        assert!(fs.stat("folder").await.unwrap().is_directory());
        assert!(fs.is_dir("folder").await.unwrap());
        assert!(!fs.is_file("folder").await.unwrap());
    }
}

#[tokio::test]
async fn same_failure_same_kind() {
    let fixture = backends();
    for fs in &fixture.adapters {
        let err = fs.read_file("missing.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "read_file");
        assert_eq!(err.path(), Some("missing.txt"));

        let err = fs.stat("missing.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);

        let err = fs.readdir("missing-dir").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound, "{}", fs.backend());

        let err = fs.rmdir("/", DirOptions::RECURSIVE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission, "{}", fs.backend());
    }
}

#[tokio::test]
async fn mkdir_existing_directory() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.mkdir("made", DirOptions::SINGLE).await.unwrap();
        let err = fs.mkdir("made", DirOptions::SINGLE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other, "{}", fs.backend());
        fs.mkdir("made", DirOptions::RECURSIVE).await.unwrap();
        assert!(fs.readdir("made").await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn mkdir_over_existing_file_or_implied_dir_fails() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.write_file("plain", b"p").await.unwrap();
        fs.write_file("implied/x", b"x").await.unwrap();

        let err = fs.mkdir("plain", DirOptions::SINGLE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other, "{}", fs.backend());
        let err = fs.mkdir("plain", DirOptions::RECURSIVE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other, "{}", fs.backend());
        let err = fs.mkdir("implied", DirOptions::SINGLE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other, "{}", fs.backend());

        assert!(fs.stat("plain").await.unwrap().is_file());
        assert_eq!(fs.readdir("implied").await.unwrap(), ["x"]);
    }
}

#[tokio::test]
async fn root_cannot_be_written_as_a_file() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.write_file("a.txt", b"a").await.unwrap();

        let errors = [
            fs.write_file("/", b"x").await.unwrap_err(),
            fs.append_file("/", b"x").await.unwrap_err(),
            fs.copy_file("a.txt", "/").await.unwrap_err(),
            fs.rename("a.txt", "/").await.unwrap_err(),
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::Other, "{}: {err}", fs.backend());
        }
        assert_eq!(fs.readdir("/").await.unwrap(), ["a.txt"], "{}", fs.backend());
        assert!(fs.stat("/").await.unwrap().is_directory());
    }
}

#[tokio::test]
async fn copy_and_rename_move_content() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.write_file("src.txt", b"content").await.unwrap();
        fs.copy_file("src.txt", "copies/dst.txt").await.unwrap();
        assert_eq!(fs.read_file("copies/dst.txt").await.unwrap(), b"content");
        assert!(fs.exists("src.txt").await.unwrap());

        fs.rename("src.txt", "moved/renamed.txt").await.unwrap();
        assert!(!fs.exists("src.txt").await.unwrap());
        assert_eq!(fs.read_file("moved/renamed.txt").await.unwrap(), b"content");
    }
}

#[tokio::test]
async fn realpath_is_normalized_relative_path() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.write_file("a/b/c.txt", b"c").await.unwrap();
        assert_eq!(fs.realpath("/a/./b//c.txt").await.unwrap(), "a/b/c.txt");
        assert_eq!(fs.realpath("a/x/../b/c.txt").await.unwrap(), "a/b/c.txt");
        assert_eq!(fs.realpath("/").await.unwrap(), "");
    }
}

#[tokio::test]
async fn encoded_reads() {
    let fixture = backends();
    for fs in &fixture.adapters {
        fs.write_file("latin1.txt", &[0x63, 0x61, 0x66, 0xE9]).await.unwrap();
        assert_eq!(
            fs.read_file_encoded("latin1.txt", Encoding::Latin1).await.unwrap(),
            "café"
        );
        assert_eq!(
            fs.read_file_encoded("latin1.txt", Encoding::Base64).await.unwrap(),
            "Y2Fm6Q=="
        );
        let err = fs.read_to_string("latin1.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}

#[tokio::test]
async fn streams_round_trip() {
    let fixture = backends();
    for fs in &fixture.adapters {
        let mut writer = fs.create_write_stream("streams/out.txt").await.unwrap();
        for chunk in ["alpha ", "beta ", "gamma"] {
            writer.write_all(chunk.as_bytes()).await.unwrap();
        }
        writer.shutdown().await.unwrap();

        let mut reader = fs.create_read_stream("streams/out.txt").await.unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "alpha beta gamma", "{}", fs.backend());
    }
}

#[tokio::test]
async fn json_helpers_work_on_both_backends() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Settings {
        name: String,
        retries: u32,
    }

    let fixture = backends();
    for fs in &fixture.adapters {
        let settings = Settings {
            name: "primary".into(),
            retries: 3,
        };
        fs.write_json("conf/settings.json", &settings).await.unwrap();
        let loaded: Settings = fs.read_json("conf/settings.json").await.unwrap();
        assert_eq!(loaded, settings);

        fs.write_file("conf/broken.json", b"{ nope").await.unwrap();
        let err = fs
            .read_json::<Settings>("conf/broken.json")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_share_one_adapter() {
    let fixture = backends();
    for fs in &fixture.adapters {
        let fs = Arc::new(fs.clone());
        let mut tasks = Vec::new();
        for i in 0..16 {
            let fs = Arc::clone(&fs);
            tasks.push(tokio::spawn(async move {
                fs.write_file(&format!("par/{i:02}.txt"), i.to_string().as_bytes())
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(fs.readdir("par").await.unwrap().len(), 16, "{}", fs.backend());
    }
}

// =============================================================================
// Object Storage Specifics
// =============================================================================

#[tokio::test]
async fn root_listing_omits_prefix_parameter() {
    // The in-memory client rejects an explicit empty prefix.
    let fs = S3Adapter::with_client(
        S3Config::new("fresh", "us-east-1"),
        Arc::new(MemoryObjectClient::new()),
    )
    .unwrap();
    assert!(fs.readdir("/").await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_does_not_roll_back_copy() {
    let client = Arc::new(MemoryObjectClient::new());
    let fs = S3Adapter::with_client(S3Config::new("b", "us-east-1"), client.clone()).unwrap();
    fs.write_file("keep.txt", b"v1").await.unwrap();

    client.fail_deletes(true);
    let err = fs.rename("keep.txt", "new.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert!(fs.exists("keep.txt").await.unwrap());
    assert!(fs.exists("new.txt").await.unwrap());
}

#[tokio::test]
async fn recursive_rmdir_spans_many_pages() {
    let client = Arc::new(MemoryObjectClient::new().with_page_size(4));
    let fs = S3Adapter::with_client(S3Config::new("b", "us-east-1"), client.clone()).unwrap();
    for i in 0..25 {
        fs.write_file(&format!("bulk/{}/{i}.dat", i % 3), b"")
            .await
            .unwrap();
    }
    fs.write_file("bulky.txt", b"neighbor").await.unwrap();

    fs.rmdir("bulk", DirOptions::RECURSIVE).await.unwrap();
    assert_eq!(client.keys(), ["bulky.txt"]);
}

#[tokio::test]
async fn shared_bucket_prefixes_are_isolated() {
    let client = Arc::new(MemoryObjectClient::new());
    let tenant_a = S3Adapter::with_client(
        S3Config::new("shared", "us-east-1").with_prefix("tenant-a"),
        client.clone(),
    )
    .unwrap();
    let tenant_b = S3Adapter::with_client(
        S3Config::new("shared", "us-east-1").with_prefix("tenant-b"),
        client.clone(),
    )
    .unwrap();

    tenant_a.write_file("notes.txt", b"a").await.unwrap();
    tenant_b.write_file("notes.txt", b"b").await.unwrap();

    assert_eq!(tenant_a.read_file("notes.txt").await.unwrap(), b"a");
    assert_eq!(tenant_b.readdir("/").await.unwrap(), ["notes.txt"]);
    assert_eq!(
        client.keys(),
        ["tenant-a/notes.txt", "tenant-b/notes.txt"]
    );
}

// =============================================================================
// Factory
// =============================================================================

#[tokio::test]
async fn factory_local_adapter_is_usable() {
    let dir = TempDir::new().unwrap();
    let fs = create_adapter_from_json(serde_json::json!({
        "type": "local",
        "basePath": dir.path(),
        "createMissingDirs": true,
    }))
    .unwrap();

    fs.write_file("nested/file.txt", b"factory").await.unwrap();
    assert_eq!(fs.read_to_string("nested/file.txt").await.unwrap(), "factory");
    assert!(dir.path().join("nested/file.txt").is_file());
}

#[test]
fn factory_rejects_bad_configuration() {
    for config in [
        serde_json::json!({ "type": "gcs", "bucket": "b" }),
        serde_json::json!({ "type": "s3", "bucket": "", "region": "us-east-1" }),
        serde_json::json!({ "type": "local", "basePath": 42 }),
    ] {
        let err = create_adapter_from_json(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(err, FsError::Validation { .. }));
    }
}
