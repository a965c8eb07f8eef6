//! 설정
//!
//! `<config_dir>/stowage/config.toml` 또는 지정한 TOML 파일에서 읽는다.
//! 전역 상태 없이 생성자에 명시적으로 넘긴다.

use crate::utils::error::{Result, StowageError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 기본 설정 파일 이름
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StowageConfig {
    /// 파일 시스템 스토리지 루트
    pub storage_root: PathBuf,
    /// 픽스처 디렉토리 (있으면 업로드 저장/디렉토리 선택 옵션 활성화)
    pub fixture_dir: Option<PathBuf>,
    /// 덤프 포맷 (직렬화기 포맷 이름)
    pub fixture_format: String,
    /// 전체/앱 단위 덤프에서 제외할 라벨
    pub exclude: Vec<String>,
}

impl Default for StowageConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            fixture_dir: None,
            fixture_format: "json".to_string(),
            exclude: Vec::new(),
        }
    }
}

impl StowageConfig {
    /// TOML 파일에서 로드
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| StowageError::Config(format!("{}: {}", path.display(), e)))
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 기본 위치에서 로드, 파일이 없으면 기본값
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stowage").join(CONFIG_FILE_NAME))
    }

    /// TOML 파일로 저장
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StowageError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}
