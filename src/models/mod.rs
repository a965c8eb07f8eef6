// Data Models
pub mod archive_entry;
pub mod selection;
pub mod storage_entry;

pub use archive_entry::{ArchiveEntry, ArchiveEntryKind};
pub use selection::{Choice, ExpandedFileList, Selection};
pub use storage_entry::{StorageEntry, StorageFile};
