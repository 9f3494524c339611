use super::support::{memory_service, summarize, tar_of, text};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use taskfs::archive::UploadFormat;
use taskfs::error::{ApiError, ArchiveError};
use taskfs::types::VirtualFileType;
use tempfile::TempDir;
use uuid::Uuid;
use zip::write::FileOptions;

const FILES: [(&str, &str); 3] = [
    ("README.md", "# Task"),
    ("src/main.rs", "fn main() {}"),
    ("tests/basic.rs", "#[test] fn ok() {}"),
];

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in files {
        writer.start_file(*path, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_upload_formats_yield_identical_listings() {
    let service = memory_service();
    let tar = tar_of(&FILES);
    let uploads = [
        (UploadFormat::Tar, tar.clone()),
        (UploadFormat::TarGz, gzip(&tar)),
        (UploadFormat::Zip, zip_of(&FILES)),
    ];

    let mut listings = Vec::new();
    for (format, bytes) in uploads {
        let id = Uuid::new_v4();
        let summary = service
            .write_archive(&id, &mut Cursor::new(bytes))
            .unwrap();
        assert_eq!(summary.format, format);
        assert_eq!(summary.entries, FILES.len());
        listings.push(summarize(&service.list_files(&id).unwrap()));
    }

    assert_eq!(listings[0], listings[1]);
    assert_eq!(listings[0], listings[2]);
}

#[test]
fn test_zip_directories_and_lookup() {
    let service = memory_service();
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.add_directory("src/", FileOptions::default()).unwrap();
    writer.start_file("src/lib.rs", FileOptions::default()).unwrap();
    writer.write_all(b"pub fn f() {}").unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let id = Uuid::new_v4();
    service.write_archive(&id, &mut Cursor::new(bytes)).unwrap();

    let dir = service.get_file(&id, "src").unwrap().unwrap();
    assert_eq!(dir.file_type, VirtualFileType::Directory);
    let lib = service.get_file(&id, "/src/lib.rs").unwrap().unwrap();
    assert_eq!(text(&lib), "pub fn f() {}");
}

#[test]
fn test_truncated_gzip_is_rejected() {
    let service = memory_service();
    let id = Uuid::new_v4();
    service
        .write_archive(&id, &mut Cursor::new(tar_of(&FILES)))
        .unwrap();

    let gz = gzip(&tar_of(&[("other.txt", "x")]));
    let truncated = gz[..gz.len() / 2].to_vec();
    let err = service
        .write_archive(&id, &mut Cursor::new(truncated))
        .unwrap_err();
    assert!(err.is_validation_failure(), "unexpected error: {err}");

    // previous version untouched
    assert_eq!(service.list_files(&id).unwrap().len(), FILES.len());
}

#[test]
fn test_garbage_upload_is_corrupt() {
    let service = memory_service();
    let id = Uuid::new_v4();
    let err = service
        .write_archive(&id, &mut Cursor::new(vec![0x42u8; 1024]))
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::ArchiveError(ArchiveError::Corrupt(_))
    ));
    assert!(!service.store().exists(&id).unwrap());
}

#[test]
fn test_directory_import_is_sorted() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("task");
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
    std::fs::write(root.join("Cargo.toml"), "[package]").unwrap();

    let service = memory_service();
    let id = Uuid::new_v4();
    let summary = service.import_directory(&id, &root).unwrap();
    assert_eq!(summary.entries, 3);

    let paths: Vec<String> = service
        .list_files(&id)
        .unwrap()
        .into_iter()
        .map(|f| f.path)
        .collect();
    assert_eq!(paths, vec!["Cargo.toml", "src", "src/main.rs"]);
}
