//! Archive Codec
//!
//! Collections are stored as tar archives of flat records. This module owns the
//! binary format: streaming decode, encode, and normalization of uploads.

pub mod codec;
pub mod import;

pub use codec::{decode_all, encode, ArchiveDecoder, ArchiveEncoder, VirtualFiles};
pub use import::{encode_directory, normalize_to_tar, UploadFormat};

/// Content type served for collection downloads and container mounts.
pub const CONTENT_TYPE_TAR: &str = "application/x-tar";
