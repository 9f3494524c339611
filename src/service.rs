//! File Service
//!
//! The operations the rest of the platform calls: archive download and upload,
//! single-file fetch, directory browsing, the task/answer collection lifecycle,
//! pattern configuration, and the evaluation view.

use crate::archive::{self, import::SNIFF_LEN, ArchiveDecoder, UploadFormat, CONTENT_TYPE_TAR};
use crate::config::UploadConfig;
use crate::error::ApiError;
use crate::index::VirtualFileIndex;
use crate::pattern::PatternList;
use crate::store::{CollectionStore, CollectionStream};
use crate::task::{AnswerFiles, Authorizer, FilePatterns, TaskFiles};
use crate::tree::{DirectoryListing, DirectoryTree};
use crate::types::{CollectionId, UserId, VirtualFile};
use crate::view::{self, EffectiveFileView};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::SpooledTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tar stream of a stored collection
pub struct ArchiveDownload {
    pub content_type: &'static str,
    pub stream: CollectionStream,
}

/// Outcome of a validated upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub format: UploadFormat,
    pub entries: usize,
    pub bytes: u64,
}

pub struct FileService {
    store: Arc<dyn CollectionStore>,
    index: VirtualFileIndex,
    authorizer: Arc<dyn Authorizer>,
    upload: UploadConfig,
}

impl FileService {
    pub fn new(
        store: Arc<dyn CollectionStore>,
        authorizer: Arc<dyn Authorizer>,
        upload: UploadConfig,
    ) -> Self {
        Self {
            index: VirtualFileIndex::new(Arc::clone(&store)),
            store,
            authorizer,
            upload,
        }
    }

    pub fn store(&self) -> &Arc<dyn CollectionStore> {
        &self.store
    }

    pub fn index(&self) -> &VirtualFileIndex {
        &self.index
    }

    /// Open the stored tar stream for download or container mounts.
    pub fn read_archive(&self, id: &CollectionId) -> Result<ArchiveDownload, ApiError> {
        Ok(ArchiveDownload {
            content_type: CONTENT_TYPE_TAR,
            stream: self.store.read(id)?,
        })
    }

    /// Replace a collection with an uploaded tar, tar.gz, or zip payload.
    ///
    /// The payload is size-checked, normalized to tar, and fully decoded
    /// before anything reaches the store. A rejected upload leaves the
    /// collection untouched.
    pub fn write_archive(
        &self,
        id: &CollectionId,
        upload: &mut dyn Read,
    ) -> Result<UploadSummary, ApiError> {
        let mut payload = self.spool_upload(upload)?;

        let mut head = [0u8; SNIFF_LEN];
        let sniffed = read_head(&mut payload, &mut head)?;
        let format = UploadFormat::detect(&head[..sniffed]);
        payload.seek(SeekFrom::Start(0))?;

        let normalized = SpooledTempFile::new(self.upload.spool_bytes);
        let mut normalized =
            archive::normalize_to_tar(format, payload, normalized, self.upload.max_bytes)?;
        let summary = self.commit_tar(id, &mut normalized, format)?;
        info!(
            collection = %id,
            format = format.name(),
            entries = summary.entries,
            bytes = summary.bytes,
            "Collection upload committed"
        );
        Ok(summary)
    }

    /// Replace a collection with the contents of a directory on disk.
    pub fn import_directory(&self, id: &CollectionId, dir: &Path) -> Result<UploadSummary, ApiError> {
        let spool = SpooledTempFile::new(self.upload.spool_bytes);
        let mut encoded = archive::encode_directory(dir, spool)?;
        let summary = self.commit_tar(id, &mut encoded, UploadFormat::Tar)?;
        info!(
            collection = %id,
            dir = %dir.display(),
            entries = summary.entries,
            "Directory imported"
        );
        Ok(summary)
    }

    fn spool_upload(&self, upload: &mut dyn Read) -> Result<SpooledTempFile, ApiError> {
        let limit = self.upload.max_bytes;
        let mut spool = SpooledTempFile::new(self.upload.spool_bytes);
        let copied = io::copy(&mut upload.take(limit.saturating_add(1)), &mut spool)?;
        if copied > limit {
            warn!(limit, "Rejected upload over size limit");
            return Err(ApiError::UploadTooLarge { limit });
        }
        spool.seek(SeekFrom::Start(0))?;
        Ok(spool)
    }

    /// Validate a complete tar stream, then hand it to the store.
    fn commit_tar(
        &self,
        id: &CollectionId,
        tar: &mut SpooledTempFile,
        format: UploadFormat,
    ) -> Result<UploadSummary, ApiError> {
        tar.seek(SeekFrom::Start(0))?;
        let entries = {
            let mut decoder = ArchiveDecoder::new(&mut *tar);
            let mut count = 0usize;
            for file in decoder.files()? {
                file?;
                count += 1;
            }
            count
        };
        tar.seek(SeekFrom::Start(0))?;
        let bytes = self.store.write(id, tar)?;
        Ok(UploadSummary {
            format,
            entries,
            bytes,
        })
    }

    /// Fetch one file. `None` is the normal not-found outcome.
    pub fn get_file(
        &self,
        id: &CollectionId,
        file_path: &str,
    ) -> Result<Option<VirtualFile>, ApiError> {
        self.index.find_by_path(id, file_path)
    }

    pub fn list_files(&self, id: &CollectionId) -> Result<Vec<VirtualFile>, ApiError> {
        self.index.list_all(id)
    }

    /// One-level listing of `dir`; `None` when it is not a directory of the collection.
    pub fn browse(
        &self,
        id: &CollectionId,
        dir: &str,
    ) -> Result<Option<DirectoryListing>, ApiError> {
        let files = self.index.list_all(id)?;
        Ok(DirectoryTree::from_entries(&files).list(dir))
    }

    /// Store a new task's initial files from an upload.
    pub fn create_task_files(
        &self,
        task_id: Uuid,
        owner: impl Into<UserId>,
        initial: &mut dyn Read,
    ) -> Result<TaskFiles, ApiError> {
        let task = TaskFiles::new(task_id, owner);
        self.write_archive(&task.initial_files, initial)?;
        info!(task = %task_id, collection = %task.initial_files, "Task files created");
        Ok(task)
    }

    /// Start an answer as a byte copy of the task's initial files.
    pub fn create_answer_files(
        &self,
        task: &TaskFiles,
        answer_id: Uuid,
        student: impl Into<UserId>,
    ) -> Result<AnswerFiles, ApiError> {
        let answer = AnswerFiles {
            answer_id,
            task_id: task.task_id,
            student: student.into(),
            current_files: Uuid::new_v4(),
        };
        self.store.copy(&task.initial_files, &answer.current_files)?;
        info!(
            task = %task.task_id,
            answer = %answer_id,
            collection = %answer.current_files,
            "Answer files created"
        );
        Ok(answer)
    }

    /// Discard the student's work and copy the initial files again.
    pub fn reset_answer(&self, task: &TaskFiles, answer: &AnswerFiles) -> Result<(), ApiError> {
        ensure_same_task(task, answer)?;
        self.store.copy(&task.initial_files, &answer.current_files)?;
        info!(answer = %answer.answer_id, "Answer reset to initial files");
        Ok(())
    }

    pub fn delete_collection(&self, id: &CollectionId) -> Result<(), ApiError> {
        Ok(self.store.delete(id)?)
    }

    /// Replace the task's hidden and protected patterns.
    ///
    /// Both lists are validated before either is applied.
    pub fn configure_patterns<H, P>(
        &self,
        task: &mut TaskFiles,
        caller: &UserId,
        hidden: H,
        protected: P,
    ) -> Result<(), ApiError>
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        if !self.authorizer.may_edit_task(caller, task) {
            return Err(ApiError::PermissionDenied(format!(
                "{} may not edit task {}",
                caller, task.task_id
            )));
        }
        let hidden = PatternList::new(hidden)?;
        let protected = PatternList::new(protected)?;
        task.hidden_files = hidden;
        task.protected_files = protected;
        info!(
            task = %task.task_id,
            hidden = task.hidden_files.len(),
            protected = task.protected_files.len(),
            "File patterns configured"
        );
        Ok(())
    }

    /// Pattern lists for an editor of the task; `None` for everyone else.
    pub fn file_policy_for(&self, task: &TaskFiles, caller: &UserId) -> Option<FilePatterns> {
        if !self.authorizer.may_edit_task(caller, task) {
            return None;
        }
        Some(FilePatterns {
            hidden_files: task.hidden_files.clone(),
            protected_files: task.protected_files.clone(),
        })
    }

    /// File set a grader or IDE sees for this answer.
    ///
    /// The initial collection is only read when the task protects something.
    pub fn effective_view(
        &self,
        task: &TaskFiles,
        answer: &AnswerFiles,
    ) -> Result<EffectiveFileView, ApiError> {
        ensure_same_task(task, answer)?;
        let policy = task.policy();
        let current = self.index.list_all(&answer.current_files)?;
        let initial = if policy.has_protected() {
            self.index.list_all(&task.initial_files)?
        } else {
            Vec::new()
        };
        debug!(
            answer = %answer.answer_id,
            current = current.len(),
            initial = initial.len(),
            "Building effective view"
        );
        Ok(view::build_effective_view(current, initial, &policy))
    }

    /// Encode the effective view as a tar stream.
    pub fn export_effective_view<W: Write>(
        &self,
        task: &TaskFiles,
        answer: &AnswerFiles,
        writer: W,
    ) -> Result<W, ApiError> {
        let files = self.effective_view(task, answer)?;
        Ok(archive::encode(&files, writer)?)
    }
}

fn ensure_same_task(task: &TaskFiles, answer: &AnswerFiles) -> Result<(), ApiError> {
    if answer.task_id != task.task_id {
        return Err(ApiError::PermissionDenied(format!(
            "answer {} does not belong to task {}",
            answer.answer_id, task.task_id
        )));
    }
    Ok(())
}

/// Fill `buf` from the start of `reader`, stopping early at EOF.
fn read_head<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
