//! 스토리지 백엔드
//!
//! 계층형 바이트 저장소 추상화 (`listdir`, `path`, `exists`, `save`)와
//! 로컬 파일 시스템 구현

use crate::utils::error::{Result, StowageError};
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// 스토리지 백엔드 trait
///
/// `listdir`/`path`는 기본 구현이 `Unsupported`를 반환한다.
/// 두 기능이 없는 백엔드(예: 원격 blob 저장소)는 [`check_storage`]에서 거부된다.
pub trait StorageBackend {
    /// 경로 안의 (디렉토리 이름들, 파일 이름들)
    fn listdir(&self, _path: &str) -> Result<(Vec<String>, Vec<String>)> {
        Err(StowageError::Unsupported {
            capability: "listdir",
        })
    }

    /// 스토리지 이름 → 절대 파일 시스템 경로
    fn path(&self, _name: &str) -> Result<PathBuf> {
        Err(StowageError::Unsupported { capability: "path" })
    }

    fn exists(&self, name: &str) -> Result<bool>;

    /// 내용을 저장하고 실제 저장된 이름을 반환
    fn save(&self, name: &str, content: &mut dyn Read) -> Result<String>;
}

/// 설정 시점 기능 검사 (fail-fast)
///
/// `listdir(".")`, `path(".")`가 동작하지 않으면 `Config` 에러.
pub fn check_storage<S: StorageBackend + ?Sized>(storage: &S) -> Result<()> {
    let probe = storage
        .listdir(".")
        .and_then(|_| storage.path(".").map(|_| ()));
    match probe {
        Err(StowageError::Unsupported { capability }) => Err(StowageError::Config(format!(
            "Storage backend must implement `listdir` and `path` (missing `{}`).",
            capability
        ))),
        other => other,
    }
}

/// 로컬 디렉토리에 뿌리를 둔 스토리지
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    /// 루트 디렉토리로 스토리지 생성 (루트는 존재해야 함)
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(StowageError::PathNotFound {
                path: root.to_path_buf(),
            });
        }
        Ok(Self {
            root: fs::canonicalize(root)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 루트 밖으로 나가는 이름(`..`, 절대 경로)은 거부
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let mut clean = PathBuf::new();
        for comp in Path::new(name).components() {
            match comp {
                Component::Normal(v) => clean.push(v),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StowageError::UnsafePath {
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(self.root.join(clean))
    }
}

impl StorageBackend for FileSystemStorage {
    fn listdir(&self, path: &str) -> Result<(Vec<String>, Vec<String>)> {
        let dir = self.resolve(path)?;
        let read_dir = fs::read_dir(&dir).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StowageError::PathNotFound { path: dir.clone() }
            } else {
                StowageError::Io(e)
            }
        })?;

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            // 심볼릭 링크는 대상 기준으로 분류, 대상이 없으면 목록에서 제외
            let metadata = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(
                        entry = %entry.path().display(),
                        error = %e,
                        "skipping unreadable storage entry"
                    );
                    continue;
                }
            };
            if metadata.is_dir() {
                dirs.push(name);
            } else {
                files.push(name);
            }
        }
        dirs.sort();
        files.sort();
        Ok((dirs, files))
    }

    fn path(&self, name: &str) -> Result<PathBuf> {
        self.resolve(name)
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.resolve(name)?.exists())
    }

    fn save(&self, name: &str, content: &mut dyn Read) -> Result<String> {
        let dest = self.resolve(name)?;
        let Some(parent) = dest.parent().filter(|_| dest != self.root) else {
            return Err(StowageError::UnsafePath {
                name: name.to_string(),
            });
        };
        fs::create_dir_all(parent)?;

        // 같은 디렉토리의 임시 파일에 쓴 뒤 원자적으로 이동 (실패 시 임시 파일은 drop에서 삭제)
        let mut tmp = NamedTempFile::new_in(parent)?;
        let written = io::copy(content, tmp.as_file_mut())?;
        tmp.persist_noclobber(&dest).map_err(|e| e.error)?;
        debug!(name, bytes = written, "saved storage file");

        Ok(dest
            .strip_prefix(&self.root)
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| name.to_string()))
    }
}
