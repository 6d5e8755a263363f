use super::dir::DirStore;
use super::memory::MemoryStore;
use super::*;

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "kitcard_{name}_{}_{}",
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
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn local_signer_is_deterministic_and_verifiable() {
    let signer = LocalSigner::new(42);
    let a = signer.sign("cards/exports").unwrap();
    let b = signer.sign("cards//exports/").unwrap();
    assert_eq!(a, b);
    assert!(signer.verify(&a));
    assert!(!LocalSigner::new(43).verify(&a));
    assert!(signer.sign("../escape").is_err());
}

#[test]
fn memory_store_put_is_content_addressed() {
    let store = MemoryStore::new();
    let sig = LocalSigner::new(1).sign("sources").unwrap();
    let r1 = store.put(&sig, b"abc", "image/png").unwrap();
    let r2 = store.put(&sig, b"abc", "image/png").unwrap();
    assert_eq!(r1, r2);
    assert!(r1.starts_with("sources/") && r1.ends_with(".png"));
    assert_eq!(store.len(), 1);

    let fetched = store.fetch(&r1).unwrap();
    assert_eq!(fetched.bytes, b"abc");
    assert_eq!(fetched.content_type, "image/png");
}

#[test]
fn memory_store_missing_object_is_fetch_error() {
    let store = MemoryStore::new();
    store.insert("a/b.png", vec![1], "image/png").unwrap();
    assert!(store.remove("a/b.png").unwrap());
    assert!(matches!(store.fetch("a/b.png"), Err(KitcardError::Fetch(_))));
}

#[test]
fn dir_store_round_trips_through_filesystem() {
    let tmp = temp_dir("dir_store");
    let store = DirStore::new(&tmp);
    let sig = LocalSigner::new(7).sign("exports").unwrap();
    let storage_ref = store.put(&sig, b"\x89PNG fake", "image/png").unwrap();
    let fetched = store.fetch(&storage_ref).unwrap();
    assert_eq!(fetched.bytes, b"\x89PNG fake");
    assert_eq!(fetched.content_type, "image/png");
    assert!(store.fetch("exports/missing.png").is_err());
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn content_types_map_by_extension() {
    assert_eq!(content_type_for_ref("x/y.JPG"), "image/jpeg");
    assert_eq!(content_type_for_ref("x/y.svg"), "image/svg+xml");
    assert_eq!(content_type_for_ref("x/noext"), "application/octet-stream");
    assert_eq!(extension_for_content_type("image/webp"), "webp");
}
