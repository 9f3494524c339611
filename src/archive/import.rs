//! Upload normalization: tar, tar.gz, and zip payloads become plain tar.
//!
//! Gzip payloads are decompressed byte-for-byte; zip payloads are re-encoded
//! entry by entry. Directory trees on disk are encoded sorted by path.

use super::codec::ArchiveEncoder;
use crate::error::{ApiError, ArchiveError};
use crate::path;
use crate::types::VirtualFile;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_LOCAL_HEADER: [u8; 4] = *b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: [u8; 4] = *b"PK\x05\x06";
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;
const TAR_BLOCK: u64 = 512;

/// Bytes needed to sniff the payload format.
pub const SNIFF_LEN: usize = 4;

/// Formats accepted on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadFormat {
    Tar,
    TarGz,
    Zip,
}

impl UploadFormat {
    /// Sniff the format from the first bytes of a payload. Anything that is
    /// neither gzip nor zip is handed to the tar decoder, which rejects garbage.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            UploadFormat::TarGz
        } else if head.starts_with(&ZIP_LOCAL_HEADER) || head.starts_with(&ZIP_EMPTY_ARCHIVE) {
            UploadFormat::Zip
        } else {
            UploadFormat::Tar
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UploadFormat::Tar => "tar",
            UploadFormat::TarGz => "tar.gz",
            UploadFormat::Zip => "zip",
        }
    }
}

/// Convert an uploaded payload into a plain tar stream written to `output`.
///
/// At most `limit` bytes of tar are produced; a payload that expands past it
/// fails with [`ApiError::UploadTooLarge`].
pub fn normalize_to_tar<R, W>(
    format: UploadFormat,
    input: R,
    mut output: W,
    limit: u64,
) -> Result<W, ApiError>
where
    R: Read + Seek,
    W: Write,
{
    debug!("Normalizing {} upload to tar", format.name());
    let copied = match format {
        UploadFormat::Tar => copy_stream(input.take(limit.saturating_add(1)), &mut output)?,
        UploadFormat::TarGz => copy_stream(
            GzDecoder::new(input).take(limit.saturating_add(1)),
            &mut output,
        )?,
        UploadFormat::Zip => return zip_to_tar(input, output, limit),
    };
    if copied > limit {
        warn!(limit, "Rejected upload expanding past size limit");
        return Err(ApiError::UploadTooLarge { limit });
    }
    Ok(output)
}

fn copy_stream<R: Read, W: Write>(mut input: R, output: &mut W) -> Result<u64, ApiError> {
    io::copy(&mut input, output).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ApiError::ArchiveError(ArchiveError::UnexpectedEnd),
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => {
            ApiError::ArchiveError(ArchiveError::Corrupt(e.to_string()))
        }
        _ => ApiError::IoError(e),
    })
}

/// Bytes a record occupies in the tar stream: one header block plus padded data.
fn tar_footprint(content_len: u64) -> u64 {
    TAR_BLOCK + content_len.div_ceil(TAR_BLOCK) * TAR_BLOCK
}

fn zip_to_tar<R: Read + Seek, W: Write>(input: R, output: W, limit: u64) -> Result<W, ApiError> {
    let mut archive = zip::ZipArchive::new(input).map_err(zip_error)?;
    let mut encoder = ArchiveEncoder::new(output);
    // end-of-archive marker
    let mut produced = 2 * TAR_BLOCK;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;
        let entry_path = path::normalize(entry.name());
        if entry_path.is_empty() {
            continue;
        }
        if path::has_parent_segment(&entry_path) {
            return Err(ArchiveError::Corrupt(format!(
                "zip entry escapes the collection root: {}",
                entry.name()
            ))
            .into());
        }
        let last_modified = zip_timestamp(entry.last_modified());
        let is_symlink = entry
            .unix_mode()
            .map(|mode| mode & S_IFMT == S_IFLNK)
            .unwrap_or(false);

        let record = if entry.is_dir() {
            produced += TAR_BLOCK;
            VirtualFile::directory(entry_path, last_modified)
        } else {
            let remaining = limit.saturating_sub(produced);
            let mut content = Vec::with_capacity(entry.size().min(remaining).min(1 << 20) as usize);
            let inflated = (&mut entry)
                .take(remaining.saturating_add(1))
                .read_to_end(&mut content);
            inflated.map_err(|e| {
                ApiError::ArchiveError(ArchiveError::Corrupt(format!(
                    "failed to inflate zip entry {}: {}",
                    entry.name(),
                    e
                )))
            })?;
            produced += tar_footprint(content.len() as u64);
            if is_symlink {
                let target = String::from_utf8_lossy(&content).into_owned();
                VirtualFile::symlink(entry_path, last_modified, target)
            } else {
                VirtualFile::file(entry_path, last_modified, content)
            }
        };
        if produced > limit {
            warn!(limit, "Rejected zip upload expanding past size limit");
            return Err(ApiError::UploadTooLarge { limit });
        }
        encoder.append(&record)?;
    }

    Ok(encoder.finish()?)
}

fn zip_error(err: zip::result::ZipError) -> ApiError {
    use zip::result::ZipError;
    match err {
        ZipError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            ApiError::ArchiveError(ArchiveError::UnexpectedEnd)
        }
        ZipError::Io(e) => ApiError::IoError(e),
        ZipError::InvalidArchive(msg) => ApiError::ArchiveError(ArchiveError::Corrupt(msg.to_string())),
        ZipError::UnsupportedArchive(msg) => ApiError::UnsupportedFormat(msg.to_string()),
        ZipError::FileNotFound => {
            ApiError::ArchiveError(ArchiveError::Corrupt("zip entry vanished".to_string()))
        }
        other => ApiError::UnsupportedFormat(other.to_string()),
    }
}

fn zip_timestamp(dt: zip::DateTime) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)
        .and_then(|date| date.and_hms_opt(dt.hour() as u32, dt.minute() as u32, dt.second() as u32))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_default()
}

/// Encode a directory tree on disk as a collection archive.
///
/// Symlinks are recorded, never followed. Entries whose names are not UTF-8
/// are skipped with a warning.
pub fn encode_directory<W: Write>(root: &Path, output: W) -> Result<W, ApiError> {
    let mut encoder = ArchiveEncoder::new(output);

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1);
    for entry in walker {
        let entry = entry.map_err(|e| {
            ApiError::IoError(io::Error::new(io::ErrorKind::Other, e.to_string()))
        })?;
        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let relative = match relative.to_str() {
            Some(rel) => path::normalize(rel),
            None => {
                warn!("Skipping non UTF-8 path: {:?}", entry.path());
                continue;
            }
        };

        let metadata = entry.metadata().map_err(|e| {
            ApiError::IoError(io::Error::new(io::ErrorKind::Other, e.to_string()))
        })?;
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();

        let file_type = entry.file_type();
        let record = if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path())?;
            VirtualFile::symlink(relative, last_modified, target.to_string_lossy())
        } else if file_type.is_dir() {
            VirtualFile::directory(relative, last_modified)
        } else if file_type.is_file() {
            VirtualFile::file(relative, last_modified, std::fs::read(entry.path())?)
        } else {
            debug!("Skipping special file {}", entry.path().display());
            continue;
        };
        encoder.append(&record)?;
    }

    debug!("Encoded {} entries from {}", encoder.len(), root.display());
    Ok(encoder.finish()?)
}
