use chrono::{DateTime, Utc};
use std::sync::Arc;
use taskfs::archive;
use taskfs::config::UploadConfig;
use taskfs::service::FileService;
use taskfs::store::{CollectionStore, FsCollectionStore, MemoryCollectionStore};
use taskfs::task::OwnerOnly;
use taskfs::types::VirtualFile;
use tempfile::TempDir;

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

/// Plain tar bytes holding the given files, in order.
pub fn tar_of(files: &[(&str, &str)]) -> Vec<u8> {
    let records: Vec<VirtualFile> = files
        .iter()
        .map(|(p, c)| VirtualFile::file(*p, at(1_700_000_000), c.as_bytes().to_vec()))
        .collect();
    archive::encode(&records, Vec::new()).unwrap()
}

pub fn text(file: &VirtualFile) -> &str {
    std::str::from_utf8(file.content.as_deref().unwrap()).unwrap()
}

/// (path, content) pairs of a listing; directories and links carry no content.
pub fn summarize(files: &[VirtualFile]) -> Vec<(String, Option<String>)> {
    files
        .iter()
        .map(|f| {
            (
                f.path.clone(),
                f.content
                    .as_ref()
                    .map(|c| String::from_utf8_lossy(c).into_owned()),
            )
        })
        .collect()
}

pub fn memory_service() -> FileService {
    FileService::new(
        Arc::new(MemoryCollectionStore::new()),
        Arc::new(OwnerOnly),
        UploadConfig::default(),
    )
}

pub fn fs_service(temp: &TempDir) -> FileService {
    let store: Arc<dyn CollectionStore> =
        Arc::new(FsCollectionStore::new(temp.path().join("collections")).unwrap());
    FileService::new(store, Arc::new(OwnerOnly), UploadConfig::default())
}
