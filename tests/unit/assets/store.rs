use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "collage_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn memory_store_read_write_and_fail_switch() {
    let store = MemoryAssetStore::new();
    assert!(!store.exists("a.png"));
    store.write("a.png", &[1, 2, 3]).unwrap();
    assert!(store.exists("./a.png"));
    assert_eq!(store.read("a.png").unwrap(), vec![1, 2, 3]);

    store.set_fail_writes(true);
    let err = store.write("b.png", &[9]).unwrap_err();
    assert!(matches!(err, CollageError::Persist(_)));
    assert!(!store.exists("b.png"));

    assert!(matches!(store.read("b.png"), Err(CollageError::Asset(_))));
    assert!(matches!(store.delete("a.png"), Err(CollageError::Persist(_))));
    store.set_fail_writes(false);
    store.delete("a.png").unwrap();
    store.delete("a.png").unwrap();
    assert!(store.names().is_empty());
}

#[test]
fn fs_store_round_trips_under_project_dir() {
    let base = temp_dir("fs_store");
    let store = FsAssetStore::for_project(&base, "proj-1").unwrap();
    store.write("layers/x.png", b"hello").unwrap();
    assert!(store.exists("layers/x.png"));
    assert!(base.join("proj-1").join("layers").join("x.png").is_file());
    assert_eq!(store.read("layers\\x.png").unwrap(), b"hello");
    assert!(store.read("missing.png").is_err());
    store.delete("layers/x.png").unwrap();
    assert!(!store.exists("layers/x.png"));
    store.delete("layers/x.png").unwrap();
    assert!(FsAssetStore::for_project(&base, "../escape").is_err());
    std::fs::remove_dir_all(&base).ok();
}
