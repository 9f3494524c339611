use super::support::tar_of;
use std::io::Cursor;
use std::sync::Arc;
use taskfs::archive::decode_all;
use taskfs::error::StorageError;
use taskfs::store::{CollectionStore, FsCollectionStore};
use tempfile::TempDir;
use uuid::Uuid;

#[test]
fn test_blobs_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let id = Uuid::new_v4();
    let bytes = tar_of(&[("a.txt", "a")]);
    {
        let store = FsCollectionStore::new(temp.path()).unwrap();
        store.write(&id, &mut Cursor::new(bytes.clone())).unwrap();
    }

    let store = FsCollectionStore::new(temp.path()).unwrap();
    assert!(store.exists(&id).unwrap());
    let files = decode_all(store.read(&id).unwrap()).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "a.txt");
}

#[test]
fn test_missing_collection_is_not_found() {
    let temp = TempDir::new().unwrap();
    let store = FsCollectionStore::new(temp.path()).unwrap();
    let id = Uuid::new_v4();
    assert!(!store.exists(&id).unwrap());
    assert!(matches!(
        store.read(&id),
        Err(StorageError::CollectionNotFound(missing)) if missing == id
    ));
}

#[test]
fn test_digest_follows_bytes() {
    let temp = TempDir::new().unwrap();
    let store = FsCollectionStore::new(temp.path()).unwrap();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    store
        .write(&a, &mut Cursor::new(tar_of(&[("x", "1")])))
        .unwrap();
    store.copy(&a, &b).unwrap();
    assert_eq!(store.digest(&a).unwrap(), store.digest(&b).unwrap());

    store
        .write(&b, &mut Cursor::new(tar_of(&[("x", "2")])))
        .unwrap();
    assert_ne!(store.digest(&a).unwrap(), store.digest(&b).unwrap());
    assert_eq!(store.digest(&a).unwrap().len(), 64);
}

#[test]
fn test_readers_see_whole_versions_during_writes() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FsCollectionStore::new(temp.path()).unwrap());
    let id = Uuid::new_v4();
    let v1 = tar_of(&[("main.py", "one")]);
    let v2 = tar_of(&[("main.py", "two"), ("extra.py", "two")]);
    store.write(&id, &mut Cursor::new(v1.clone())).unwrap();

    std::thread::scope(|scope| {
        let writer = {
            let store = Arc::clone(&store);
            let (v1, v2) = (v1.clone(), v2.clone());
            scope.spawn(move || {
                for round in 0..20 {
                    let next = if round % 2 == 0 { &v2 } else { &v1 };
                    store.write(&id, &mut Cursor::new(next.clone())).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for _ in 0..20 {
                        let files = decode_all(store.read(&id).unwrap()).unwrap();
                        assert!(files.len() == 1 || files.len() == 2);
                        let version = std::str::from_utf8(files[0].content.as_deref().unwrap())
                            .unwrap()
                            .to_string();
                        assert!(files
                            .iter()
                            .all(|f| f.content.as_deref() == Some(version.as_bytes())));
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    });

    let leftovers: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| !name.ends_with(".tar"))
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}
