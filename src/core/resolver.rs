//! 선택 해석기 (Selection Resolver)
//!
//! 스토리지 트리를 한 단계씩 읽어서
//! - 화면용 선택지 목록 (하위 디렉토리까지 끝까지 재귀, 개수/크기 표시)
//! - 아카이브용 절대 경로 목록 (선택한 디렉토리는 직속 파일만, 재귀 없음)
//!
//! 을 만든다. 두 경로의 재귀 깊이가 다른 것은 의도된 동작이다.

use crate::models::{Choice, ExpandedFileList, Selection, StorageEntry, StorageFile};
use crate::system::storage::{check_storage, StorageBackend};
use crate::utils::error::{Result, StowageError};
use crate::utils::formatter::{format_file_size, pluralize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 선택 필드 이름 (검증 에러에 사용)
pub const SELECTION_FIELD: &str = "files";

pub struct SelectionResolver<S> {
    storage: S,
    base_dir: PathBuf,
}

impl<S: StorageBackend> SelectionResolver<S> {
    /// 스토리지 기능을 즉시 검사하고 베이스 디렉토리를 확정한다 (fail-fast)
    pub fn new(storage: S) -> Result<Self> {
        check_storage(&storage)?;
        let base_dir = storage.path(".")?;
        Ok(Self { storage, base_dir })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn help_text(&self) -> String {
        format!("Contents of {}", self.base_dir.display())
    }

    /// 경로 하나를 파일/디렉토리 엔트리로 읽기 (디렉토리는 한 단계만)
    pub fn read_entry(&self, path: &str) -> Result<StorageEntry> {
        let abs_path = self.storage.path(path)?;
        let metadata = metadata_of(&abs_path)?;
        if !metadata.is_dir() {
            return Ok(StorageEntry::File {
                path: path.to_string(),
                abs_path,
                size: metadata.len(),
            });
        }

        let (dirs, names) = self.storage.listdir(path)?;
        let files = names
            .into_iter()
            .map(|name| {
                let file_path = abs_path.join(&name);
                let size = metadata_of(&file_path)?.len();
                Ok(StorageFile {
                    name,
                    abs_path: file_path,
                    size,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(StorageEntry::Directory {
            path: path.to_string(),
            abs_path,
            files,
            dirs,
        })
    }

    /// 선택지 목록
    ///
    /// 루트의 각 디렉토리를 내보내고 바로 그 하위로 깊이 우선 재귀한 뒤,
    /// 마지막으로 루트의 파일들을 내보낸다. 하위 디렉토리의 파일은 선택지가 아니다.
    pub fn list_choices(&self) -> Result<Vec<Choice>> {
        let mut choices = Vec::new();
        let (dirs, files) = self.storage.listdir(".")?;
        for name in dirs {
            self.collect_dir_choices(name, &mut choices)?;
        }
        for name in files {
            let size = metadata_of(&self.base_dir.join(&name))?.len();
            choices.push(file_choice(&name, size));
        }
        Ok(choices)
    }

    fn collect_dir_choices(&self, path: String, out: &mut Vec<Choice>) -> Result<()> {
        let entry = self.read_entry(&path)?;
        out.push(dir_choice(&path, entry.file_count(), entry.total_size()));
        if let StorageEntry::Directory { dirs, .. } = entry {
            for name in dirs {
                self.collect_dir_choices(format!("{}/{}", path, name), out)?;
            }
        }
        Ok(())
    }

    /// 제출된 경로 목록 검증 (비어 있으면 안 되고, 모두 선택지에 있어야 함)
    pub fn validate_selection(&self, paths: &[String]) -> Result<Selection> {
        if paths.is_empty() {
            return Err(StowageError::validation(
                SELECTION_FIELD,
                "This field is required.",
            ));
        }

        let choices = self.list_choices()?;
        let valid: HashSet<&str> = choices.iter().map(|c| c.path.as_str()).collect();
        if let Some(invalid) = paths.iter().find(|p| !valid.contains(p.as_str())) {
            return Err(StowageError::validation(
                SELECTION_FIELD,
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    invalid
                ),
            ));
        }
        Ok(Selection::new(paths.to_vec()))
    }

    /// 선택을 아카이브용 절대 경로 목록으로 펼치기
    ///
    /// 파일은 자기 자신, 디렉토리는 직속 파일들 다음에 디렉토리 자신.
    /// 선택 순서와 중복은 그대로 유지한다.
    pub fn expand_selection(&self, selection: &Selection) -> Result<ExpandedFileList> {
        let mut list = ExpandedFileList::new();
        for path in selection.paths() {
            match self.read_entry(path)? {
                StorageEntry::Directory {
                    abs_path, files, ..
                } => {
                    list.extend(files.into_iter().map(|f| f.abs_path));
                    list.push(abs_path);
                }
                StorageEntry::File { abs_path, .. } => list.push(abs_path),
            }
        }
        debug!(
            selected = selection.len(),
            expanded = list.len(),
            "expanded selection"
        );
        Ok(list)
    }
}

fn metadata_of(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            StowageError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StowageError::Io(e)
        }
    })
}

fn dir_choice(path: &str, num_files: usize, size: u64) -> Choice {
    Choice {
        path: path.to_string(),
        label: format!(
            "/{}/ ({}, {})",
            path,
            pluralize(num_files, "file", "files"),
            format_file_size(size)
        ),
    }
}

fn file_choice(path: &str, size: u64) -> Choice {
    Choice {
        path: path.to_string(),
        label: format!("/{} ({})", path, format_file_size(size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_storage, write_file};
    use std::io::Read;

    fn selection(paths: &[&str]) -> Selection {
        Selection::new(paths.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_new_rejects_storage_without_listing() {
        struct WriteOnly;
        impl StorageBackend for WriteOnly {
            fn exists(&self, _name: &str) -> Result<bool> {
                Ok(false)
            }
            fn save(&self, name: &str, _content: &mut dyn Read) -> Result<String> {
                Ok(name.to_string())
            }
        }

        assert!(matches!(
            SelectionResolver::new(WriteOnly),
            Err(StowageError::Config(_))
        ));
    }

    #[test]
    fn test_list_choices_labels_and_order() {
        let (_temp, storage) = sample_storage();
        let resolver = SelectionResolver::new(storage).expect("create resolver");
        let choices = resolver.list_choices().expect("list choices");

        let pairs: Vec<(&str, &str)> = choices
            .iter()
            .map(|c| (c.path.as_str(), c.label.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("files", "/files/ (2 files, 10 B)"),
                ("uploads", "/uploads/ (1 file, 6 B)"),
                ("uploads/sub", "/uploads/sub/ (1 file, 9 B)"),
                ("uploaded_file.txt", "/uploaded_file.txt (3 B)"),
            ]
        );
    }

    #[test]
    fn test_empty_directory_uses_plural() {
        let (temp, storage) = sample_storage();
        fs::create_dir_all(temp.path().join("empty")).expect("create empty dir");
        let resolver = SelectionResolver::new(storage).expect("create resolver");
        let choices = resolver.list_choices().expect("list choices");
        assert!(choices
            .iter()
            .any(|c| c.path == "empty" && c.label == "/empty/ (0 files, 0 B)"));
    }

    #[test]
    fn test_deep_directories_listed_but_not_expanded() {
        let (temp, storage) = sample_storage();
        write_file(temp.path(), "uploads/sub/deeper/deep.txt", b"deep");
        let resolver = SelectionResolver::new(storage).expect("create resolver");

        let choices = resolver.list_choices().expect("list choices");
        assert!(choices
            .iter()
            .any(|c| c.path == "uploads/sub/deeper" && c.label == "/uploads/sub/deeper/ (1 file, 4 B)"));

        let expanded = resolver
            .expand_selection(&selection(&["uploads"]))
            .expect("expand");
        let deep = resolver
            .base_dir()
            .join("uploads/sub/deeper/deep.txt");
        assert!(!expanded.contains(&deep));
    }

    #[test]
    fn test_expand_directory_children_then_self() {
        let (_temp, storage) = sample_storage();
        let resolver = SelectionResolver::new(storage).expect("create resolver");
        let base = resolver.base_dir().to_path_buf();

        let expanded = resolver
            .expand_selection(&selection(&["files", "uploads", "uploaded_file.txt"]))
            .expect("expand");
        assert_eq!(
            expanded,
            vec![
                base.join("files").join("uploaded_file.txt"),
                base.join("files").join("uploaded_file_2.txt"),
                base.join("files"),
                base.join("uploads").join("uploaded_file.txt"),
                base.join("uploads"),
                base.join("uploaded_file.txt"),
            ]
        );
    }

    #[test]
    fn test_expand_keeps_duplicates() {
        let (_temp, storage) = sample_storage();
        let resolver = SelectionResolver::new(storage).expect("create resolver");
        let expanded = resolver
            .expand_selection(&selection(&["uploaded_file.txt", "uploaded_file.txt"]))
            .expect("expand");
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0], expanded[1]);
    }

    #[test]
    fn test_read_entry_variants() {
        let (_temp, storage) = sample_storage();
        let resolver = SelectionResolver::new(storage).expect("create resolver");

        let entry = resolver.read_entry("uploads").expect("read uploads");
        match entry {
            StorageEntry::Directory { files, dirs, .. } => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].name, "uploaded_file.txt");
                assert_eq!(dirs, vec!["sub".to_string()]);
            }
            other => panic!("expected directory, got {:?}", other),
        }

        let entry = resolver.read_entry("uploaded_file.txt").expect("read file");
        assert!(matches!(entry, StorageEntry::File { size: 3, .. }));

        assert!(matches!(
            resolver.read_entry("missing.txt"),
            Err(StowageError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_selection() {
        let (_temp, storage) = sample_storage();
        let resolver = SelectionResolver::new(storage).expect("create resolver");

        let empty = resolver.validate_selection(&[]);
        assert!(matches!(
            empty,
            Err(StowageError::Validation { ref field, ref message })
                if field == "files" && message == "This field is required."
        ));

        let invalid = resolver.validate_selection(&["files".to_string(), "nope".to_string()]);
        assert!(matches!(
            invalid,
            Err(StowageError::Validation { ref message, .. })
                if message == "Select a valid choice. nope is not one of the available choices."
        ));

        // 하위 디렉토리 안의 파일은 선택지가 아니다
        let nested_file = resolver.validate_selection(&["files/uploaded_file.txt".to_string()]);
        assert!(matches!(nested_file, Err(StowageError::Validation { .. })));

        let ok = resolver
            .validate_selection(&["uploads/sub".to_string(), "files".to_string()])
            .expect("valid selection");
        assert_eq!(ok.paths(), &["uploads/sub".to_string(), "files".to_string()]);
    }

    #[test]
    fn test_help_text_names_base_dir() {
        let (_temp, storage) = sample_storage();
        let resolver = SelectionResolver::new(storage).expect("create resolver");
        assert_eq!(
            resolver.help_text(),
            format!("Contents of {}", resolver.base_dir().display())
        );
    }
}
