//! Streaming tar codec for collection archives.
//!
//! Decoding is forward-only: [`ArchiveDecoder::files`] yields records in stored
//! order and never buffers more than the entry it is returning. Encoding writes
//! GNU headers through [`tar::Builder`] and always terminates the archive.

use crate::error::ArchiveError;
use crate::path;
use crate::types::{VirtualFile, VirtualFileType};
use chrono::{DateTime, Utc};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tar::EntryType;
use tracing::{debug, trace};

const FILE_MODE: u32 = 0o644;
const DIRECTORY_MODE: u32 = 0o755;
const SYMLINK_MODE: u32 = 0o777;

/// Observations about the raw stream underneath the tar reader.
#[derive(Debug, Default)]
struct StreamState {
    /// The stream returned EOF for a non-empty read.
    hit_end: AtomicBool,
    /// The stream itself failed, as opposed to the bytes being malformed.
    failed: AtomicBool,
}

/// Reader shim that records why the tar reader stopped.
///
/// A well-formed archive stops at its zero-block end marker without exhausting
/// the stream; reaching EOF first means the archive was cut short.
struct Tracked<R> {
    inner: R,
    state: Arc<StreamState>,
}

impl<R: Read> Read for Tracked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.state.hit_end.store(true, Ordering::Relaxed);
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                if e.kind() != io::ErrorKind::Interrupted {
                    self.state.failed.store(true, Ordering::Relaxed);
                }
                Err(e)
            }
        }
    }
}

/// Decoder over a collection archive stream.
pub struct ArchiveDecoder<R: Read> {
    archive: tar::Archive<Tracked<R>>,
    state: Arc<StreamState>,
}

impl<R: Read> ArchiveDecoder<R> {
    pub fn new(reader: R) -> Self {
        let state = Arc::new(StreamState::default());
        let archive = tar::Archive::new(Tracked {
            inner: reader,
            state: Arc::clone(&state),
        });
        Self { archive, state }
    }

    /// Start the single forward pass over the archive.
    ///
    /// The underlying stream cannot be rewound; decode again by reopening it.
    pub fn files(&mut self) -> Result<VirtualFiles<'_, R>, ArchiveError> {
        let entries = self.archive.entries()?;
        Ok(VirtualFiles {
            entries,
            state: Arc::clone(&self.state),
            finished: false,
        })
    }
}

/// Lazy sequence of decoded records; ends at the first error.
pub struct VirtualFiles<'a, R: 'a + Read> {
    entries: tar::Entries<'a, Tracked<R>>,
    state: Arc<StreamState>,
    finished: bool,
}

impl<'a, R: Read> VirtualFiles<'a, R> {
    /// Advance to the first record at `path` and return it.
    ///
    /// Content of entries before the match is skipped, never read into memory,
    /// and entries after the match are not touched at all.
    pub fn find_path(&mut self, wanted: &str) -> Result<Option<VirtualFile>, ArchiveError> {
        let wanted = path::normalize(wanted);
        match self.next_matching(|candidate| candidate == wanted) {
            Some(result) => result.map(Some),
            None => Ok(None),
        }
    }

    fn next_matching<F>(&mut self, mut accept: F) -> Option<Result<VirtualFile, ArchiveError>>
    where
        F: FnMut(&str) -> bool,
    {
        if self.finished {
            return None;
        }
        let result = loop {
            let mut entry = match self.entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => break Some(Err(self.classify(e))),
                None => {
                    if self.state.hit_end.load(Ordering::Relaxed) {
                        break Some(Err(ArchiveError::UnexpectedEnd));
                    }
                    break None;
                }
            };

            let file_type = match entry_kind(entry.header().entry_type()) {
                Some(kind) => kind,
                None => {
                    debug!(
                        "Skipping unsupported tar entry type {:?}",
                        entry.header().entry_type()
                    );
                    continue;
                }
            };

            let raw_path = entry.path_bytes();
            // pre-POSIX archivers mark directories only by the trailing slash
            let file_type = if file_type == VirtualFileType::File && raw_path.ends_with(b"/") {
                VirtualFileType::Directory
            } else {
                file_type
            };
            let decoded = decode_path(&raw_path);
            drop(raw_path);
            let entry_path = match decoded {
                Ok(p) => p,
                Err(e) => break Some(Err(e)),
            };
            // "./" is the archive root marker written by directory-based tar tools
            if entry_path.is_empty() {
                continue;
            }
            if !accept(&entry_path) {
                trace!("Skipping entry {}", entry_path);
                continue;
            }

            break Some(self.read_record(&mut entry, entry_path, file_type));
        };

        if !matches!(result, Some(Ok(_))) {
            self.finished = true;
        }
        result
    }

    fn read_record(
        &self,
        entry: &mut tar::Entry<'a, Tracked<R>>,
        entry_path: String,
        file_type: VirtualFileType,
    ) -> Result<VirtualFile, ArchiveError> {
        let mtime = entry.header().mtime().map_err(|e| self.classify(e))?;
        let last_modified = timestamp(mtime)?;

        match file_type {
            VirtualFileType::File => {
                let expected = entry.size();
                let mut content = Vec::with_capacity(expected.min(1 << 20) as usize);
                entry
                    .read_to_end(&mut content)
                    .map_err(|e| self.classify(e))?;
                if (content.len() as u64) < expected {
                    return Err(ArchiveError::UnexpectedEnd);
                }
                Ok(VirtualFile::file(entry_path, last_modified, content))
            }
            VirtualFileType::Directory => Ok(VirtualFile::directory(entry_path, last_modified)),
            VirtualFileType::Symlink => {
                let target = entry
                    .link_name_bytes()
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                    .unwrap_or_default();
                Ok(VirtualFile::symlink(entry_path, last_modified, target))
            }
        }
    }

    fn classify(&self, err: io::Error) -> ArchiveError {
        if self.state.hit_end.load(Ordering::Relaxed)
            || err.kind() == io::ErrorKind::UnexpectedEof
        {
            ArchiveError::UnexpectedEnd
        } else if self.state.failed.load(Ordering::Relaxed) {
            ArchiveError::IoError(err)
        } else {
            ArchiveError::Corrupt(err.to_string())
        }
    }
}

impl<'a, R: Read> Iterator for VirtualFiles<'a, R> {
    type Item = Result<VirtualFile, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_matching(|_| true)
    }
}

fn entry_kind(entry_type: EntryType) -> Option<VirtualFileType> {
    match entry_type {
        EntryType::Regular | EntryType::Continuous => Some(VirtualFileType::File),
        EntryType::Directory => Some(VirtualFileType::Directory),
        EntryType::Symlink | EntryType::Link => Some(VirtualFileType::Symlink),
        _ => None,
    }
}

fn decode_path(raw: &[u8]) -> Result<String, ArchiveError> {
    let raw = std::str::from_utf8(raw)
        .map_err(|_| ArchiveError::Corrupt("entry path is not valid UTF-8".to_string()))?;
    let normalized = path::normalize(raw);
    if path::has_parent_segment(&normalized) {
        return Err(ArchiveError::Corrupt(format!(
            "entry path escapes the collection root: {}",
            raw
        )));
    }
    Ok(normalized)
}

fn timestamp(secs: u64) -> Result<DateTime<Utc>, ArchiveError> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| ArchiveError::Corrupt(format!("modification time out of range: {}", secs)))
}

/// Incremental archive writer; [`ArchiveEncoder::finish`] writes the end marker.
pub struct ArchiveEncoder<W: Write> {
    builder: tar::Builder<W>,
    count: usize,
}

impl<W: Write> ArchiveEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            builder: tar::Builder::new(writer),
            count: 0,
        }
    }

    /// Append one record. The path must already be normalized and non-empty.
    pub fn append(&mut self, file: &VirtualFile) -> Result<(), ArchiveError> {
        if file.path.is_empty()
            || path::normalize(&file.path) != file.path
            || path::has_parent_segment(&file.path)
        {
            return Err(ArchiveError::InvalidRecord(format!(
                "path is not a normalized relative path: '{}'",
                file.path
            )));
        }

        let mut header = tar::Header::new_gnu();
        header.set_mtime(file.last_modified.timestamp().max(0) as u64);

        match file.file_type {
            VirtualFileType::File => {
                let content = file.content.as_deref().ok_or_else(|| {
                    ArchiveError::InvalidRecord(format!("file without content: {}", file.path))
                })?;
                header.set_entry_type(EntryType::Regular);
                header.set_mode(FILE_MODE);
                header.set_size(content.len() as u64);
                self.builder.append_data(&mut header, &file.path, content)?;
            }
            VirtualFileType::Directory => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(DIRECTORY_MODE);
                header.set_size(0);
                self.builder
                    .append_data(&mut header, format!("{}/", file.path), io::empty())?;
            }
            VirtualFileType::Symlink => {
                let target = file
                    .link_target
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        ArchiveError::InvalidRecord(format!("symlink without target: {}", file.path))
                    })?;
                header.set_entry_type(EntryType::Symlink);
                header.set_mode(SYMLINK_MODE);
                header.set_size(0);
                self.builder.append_link(&mut header, &file.path, target)?;
            }
        }
        self.count += 1;
        Ok(())
    }

    /// Number of records appended so far
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Write the end-of-archive marker and hand back the writer.
    pub fn finish(self) -> Result<W, ArchiveError> {
        Ok(self.builder.into_inner()?)
    }
}

/// Encode a sequence of records into `writer` as one complete archive.
pub fn encode<'a, I, W>(files: I, writer: W) -> Result<W, ArchiveError>
where
    I: IntoIterator<Item = &'a VirtualFile>,
    W: Write,
{
    let mut encoder = ArchiveEncoder::new(writer);
    for file in files {
        encoder.append(file)?;
    }
    encoder.finish()
}

/// Decode every record of an archive stream.
pub fn decode_all<R: Read>(reader: R) -> Result<Vec<VirtualFile>, ArchiveError> {
    let mut decoder = ArchiveDecoder::new(reader);
    let files = decoder.files()?;
    files.collect()
}
