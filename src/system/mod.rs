// System Layer
pub mod archive;
pub mod storage;

pub use archive::{
    list_archive_entries, pack_stream, unpack, ArchiveStream, UnpackSummary,
    ARCHIVE_CONTENT_TYPE, ARCHIVE_EXTENSION,
};
pub use storage::{check_storage, FileSystemStorage, StorageBackend};
