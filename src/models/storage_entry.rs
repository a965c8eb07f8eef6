use std::path::PathBuf;

/// 디렉토리 안의 파일 하나 (이름 + 크기)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFile {
    /// 디렉토리 기준 파일 이름
    pub name: String,
    /// 절대 경로
    pub abs_path: PathBuf,
    /// 바이트 단위 크기
    pub size: u64,
}

/// 스토리지 엔트리 (파일 또는 디렉토리)
///
/// 디렉토리 자식은 한 단계만 담는다. 하위 디렉토리는 이름만 보관하고,
/// 필요할 때 다시 읽는다 (요청 사이에 스토리지가 바뀔 수 있으므로 캐시하지 않음).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEntry {
    File {
        /// 스토리지 루트 기준 경로
        path: String,
        abs_path: PathBuf,
        size: u64,
    },
    Directory {
        path: String,
        abs_path: PathBuf,
        /// 직속 파일들
        files: Vec<StorageFile>,
        /// 직속 하위 디렉토리 이름들
        dirs: Vec<String>,
    },
}

impl StorageEntry {
    pub fn path(&self) -> &str {
        match self {
            StorageEntry::File { path, .. } | StorageEntry::Directory { path, .. } => path,
        }
    }

    pub fn abs_path(&self) -> &PathBuf {
        match self {
            StorageEntry::File { abs_path, .. } | StorageEntry::Directory { abs_path, .. } => {
                abs_path
            }
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, StorageEntry::Directory { .. })
    }

    /// 파일이면 자신의 크기, 디렉토리면 직속 파일 크기 합계
    pub fn total_size(&self) -> u64 {
        match self {
            StorageEntry::File { size, .. } => *size,
            StorageEntry::Directory { files, .. } => files.iter().map(|f| f.size).sum(),
        }
    }

    /// 직속 파일 수 (파일 엔트리는 0)
    pub fn file_count(&self) -> usize {
        match self {
            StorageEntry::File { .. } => 0,
            StorageEntry::Directory { files, .. } => files.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dir() -> StorageEntry {
        StorageEntry::Directory {
            path: "files".to_string(),
            abs_path: PathBuf::from("/srv/media/files"),
            files: vec![
                StorageFile {
                    name: "a.txt".to_string(),
                    abs_path: PathBuf::from("/srv/media/files/a.txt"),
                    size: 4,
                },
                StorageFile {
                    name: "b.txt".to_string(),
                    abs_path: PathBuf::from("/srv/media/files/b.txt"),
                    size: 6,
                },
            ],
            dirs: vec!["nested".to_string()],
        }
    }

    #[test]
    fn test_directory_totals_only_direct_files() {
        let dir = sample_dir();
        assert!(dir.is_directory());
        assert_eq!(dir.file_count(), 2);
        assert_eq!(dir.total_size(), 10);
        assert_eq!(dir.path(), "files");
    }

    #[test]
    fn test_file_entry() {
        let file = StorageEntry::File {
            path: "uploaded_file.txt".to_string(),
            abs_path: PathBuf::from("/srv/media/uploaded_file.txt"),
            size: 3,
        };
        assert!(!file.is_directory());
        assert_eq!(file.file_count(), 0);
        assert_eq!(file.total_size(), 3);
        assert_eq!(file.abs_path(), &PathBuf::from("/srv/media/uploaded_file.txt"));
    }
}
