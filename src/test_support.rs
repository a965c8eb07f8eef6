//! 테스트 공용 스토리지 트리
//!
//! ```text
//! files/uploaded_file.txt      (4 bytes)
//! files/uploaded_file_2.txt    (6 bytes)
//! uploads/uploaded_file.txt    (6 bytes)
//! uploads/sub/uploaded_file.txt (9 bytes)
//! uploaded_file.txt            (3 bytes)
//! ```

use crate::system::storage::FileSystemStorage;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub fn write_file(base: &Path, rel: &str, content: &[u8]) {
    let path = base.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write fixture file");
}

pub fn sample_tree() -> TempDir {
    let temp = TempDir::new().expect("create tempdir");
    let base = temp.path();
    write_file(base, "files/uploaded_file.txt", b"file");
    write_file(base, "files/uploaded_file_2.txt", b"file 2");
    write_file(base, "uploads/uploaded_file.txt", b"upload");
    write_file(base, "uploads/sub/uploaded_file.txt", b"sub file!");
    write_file(base, "uploaded_file.txt", b"top");
    temp
}

pub fn sample_storage() -> (TempDir, FileSystemStorage) {
    let temp = sample_tree();
    let storage = FileSystemStorage::new(temp.path()).expect("create storage");
    (temp, storage)
}
