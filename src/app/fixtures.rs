//! 픽스처 가져오기/내보내기 흐름
//!
//! 레코드 직렬화/역직렬화는 외부 [`Serializer`]가 맡고,
//! 여기서는 업로드 검증, 임시 파일 관리, 파일명 규칙만 다룬다.

use crate::config::StowageConfig;
use crate::utils::error::{Result, StowageError};
use crate::utils::formatter::{format_timestamp, pluralize};
use chrono::NaiveDateTime;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const UPLOADS_FIELD: &str = "uploads";
pub const PICKED_FILES_FIELD: &str = "picked_files";
/// 폼 전체 에러 키
pub const NON_FIELD_ERRORS: &str = "__all__";

/// 외부 직렬화 서비스
pub trait Serializer {
    /// 지원 포맷 이름 (파일 확장자와 같음, 예: "json")
    fn formats(&self) -> Vec<String>;

    /// 라벨("app" 또는 "app.model")에 해당하는 레코드를 `out`에 쓴다
    fn dump(&self, labels: &[String], exclude: &[String], out: &mut dyn Write) -> Result<()>;

    /// 픽스처 파일들을 데이터 저장소에 로드하고 객체 수를 반환
    fn load(&self, fixtures: &[PathBuf]) -> Result<usize>;
}

/// 업로드된 픽스처 파일
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// 가져오기 요청
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub uploads: Vec<Upload>,
    /// 업로드를 픽스처 디렉토리에 보관 (픽스처 디렉토리가 설정된 경우만)
    pub store: bool,
    /// 픽스처 디렉토리에서 고른 파일들
    pub picked_files: Vec<PathBuf>,
}

impl ImportRequest {
    pub fn validate(&self, config: &StowageConfig, formats: &[String]) -> Result<()> {
        for upload in &self.uploads {
            validate_upload_name(&upload.name, formats)?;
        }

        if config.fixture_dir.is_none() {
            if self.uploads.is_empty() {
                return Err(StowageError::validation(
                    UPLOADS_FIELD,
                    "This field is required.",
                ));
            }
            return Ok(());
        }

        let choices = fixture_choices(config, formats)?;
        if let Some(invalid) = self.picked_files.iter().find(|p| !choices.contains(p)) {
            return Err(StowageError::validation(
                PICKED_FILES_FIELD,
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    invalid.display()
                ),
            ));
        }
        if self.uploads.is_empty() && self.picked_files.is_empty() {
            return Err(StowageError::validation(
                NON_FIELD_ERRORS,
                "At least one fixture file needs to be uploaded or selected.",
            ));
        }
        Ok(())
    }
}

/// 가져오기 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub objects: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!(
            "Successfully imported {}. Loaded {}.",
            pluralize(self.files, "file", "files"),
            pluralize(self.objects, "object", "objects")
        )
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// 업로드 파일 확장자 검사 (대소문자 무시)
pub fn validate_upload_name(name: &str, formats: &[String]) -> Result<()> {
    let ext = extension_of(name);
    if !ext.is_empty() && formats.iter().any(|f| f.eq_ignore_ascii_case(&ext)) {
        Ok(())
    } else {
        Err(StowageError::validation(
            UPLOADS_FIELD,
            format!("Invalid file extension: .{}.", ext),
        ))
    }
}

/// 확장자 앞에 이름이 한 글자 이상 있고, 확장자가 지원 포맷인 파일
fn is_fixture_name(name: &str, formats: &[String]) -> bool {
    let lower = name.to_lowercase();
    formats.iter().any(|f| {
        let suffix = format!(".{}", f.to_lowercase());
        lower.len() > suffix.len() && lower.ends_with(&suffix)
    })
}

/// 픽스처 디렉토리의 선택 가능한 파일 (직속 파일만, 이름순)
pub fn fixture_choices(config: &StowageConfig, formats: &[String]) -> Result<Vec<PathBuf>> {
    let Some(dir) = config.fixture_dir.as_deref() else {
        return Ok(Vec::new());
    };
    let mut choices = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_fixture_name(&name, formats) {
            choices.push(entry.path());
        }
    }
    choices.sort();
    Ok(choices)
}

/// 업로드를 디스크에 내려놓는다
///
/// `store`면 픽스처 디렉토리에 원래 이름으로, 아니면 `<이름>_XXXX.<확장자>` 임시 파일로.
/// 임시 파일은 반환된 핸들이 drop될 때 삭제된다.
fn stage_upload(
    upload: &Upload,
    store_dir: Option<&Path>,
) -> Result<(PathBuf, Option<NamedTempFile>)> {
    let file_name = Path::new(&upload.name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            StowageError::validation(UPLOADS_FIELD, format!("Invalid file name: {}", upload.name))
        })?;

    if let Some(dir) = store_dir {
        let dest = dir.join(&file_name);
        fs::write(&dest, &upload.content)?;
        debug!(path = %dest.display(), "stored upload in fixture directory");
        return Ok((dest, None));
    }

    let path = Path::new(&file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{}_", stem))
        .suffix(&suffix)
        .tempfile()?;
    tmp.write_all(&upload.content)?;
    tmp.flush()?;
    Ok((tmp.path().to_path_buf(), Some(tmp)))
}

/// 업로드/선택한 픽스처를 로드
///
/// 업로드가 먼저, 선택한 파일이 그 뒤에 온다.
/// 임시 파일은 성공/실패와 관계없이 함수가 끝날 때 삭제된다.
pub fn import_fixtures<Z: Serializer + ?Sized>(
    config: &StowageConfig,
    serializer: &Z,
    request: &ImportRequest,
) -> Result<ImportSummary> {
    let formats = serializer.formats();
    request.validate(config, &formats)?;

    let store_dir = config.fixture_dir.as_deref().filter(|_| request.store);
    let mut fixtures = Vec::with_capacity(request.uploads.len() + request.picked_files.len());
    let mut staged = Vec::new();
    for upload in &request.uploads {
        let (path, tmp) = stage_upload(upload, store_dir)?;
        fixtures.push(path);
        staged.extend(tmp);
    }
    fixtures.extend(request.picked_files.iter().cloned());

    let objects = serializer.load(&fixtures)?;
    drop(staged);

    let summary = ImportSummary {
        files: fixtures.len(),
        objects,
    };
    info!(files = summary.files, objects, "fixtures imported");
    Ok(summary)
}

/// 덤프 범위
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpScope {
    /// 프로젝트 전체 또는 지정한 앱들
    Project(Vec<String>),
    App(String),
    Model { app: String, model: String },
}

impl DumpScope {
    /// "a,b" 형태의 앱 라벨 목록 (빈 문자열이면 전체)
    pub fn from_app_labels(query: &str) -> Self {
        DumpScope::Project(
            query
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    fn labels(&self) -> Vec<String> {
        match self {
            DumpScope::Project(labels) => labels.clone(),
            DumpScope::App(app) => vec![app.clone()],
            DumpScope::Model { app, model } => vec![format!("{}.{}", app, model)],
        }
    }

    fn filename_prefix(&self) -> Option<String> {
        match self {
            DumpScope::Project(_) => None,
            DumpScope::App(app) => Some(app.clone()),
            DumpScope::Model { app, model } => Some(format!("{}-{}", app, model)),
        }
    }

    /// 모델 단위 덤프는 제외 목록을 적용하지 않는다
    fn exclude<'a>(&self, config: &'a StowageConfig) -> &'a [String] {
        match self {
            DumpScope::Model { .. } => &[],
            _ => &config.exclude,
        }
    }
}

/// 내보낸 픽스처
#[derive(Debug, Clone)]
pub struct FixtureDump {
    pub filename: String,
    pub content: Vec<u8>,
}

impl FixtureDump {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

pub fn dump_fixtures<Z: Serializer + ?Sized>(
    config: &StowageConfig,
    serializer: &Z,
    scope: &DumpScope,
    now: NaiveDateTime,
) -> Result<FixtureDump> {
    let format = &config.fixture_format;
    if !serializer
        .formats()
        .iter()
        .any(|f| f.eq_ignore_ascii_case(format))
    {
        return Err(StowageError::Config(format!(
            "Unknown fixture format: {}",
            format
        )));
    }

    let mut content = Vec::new();
    serializer.dump(&scope.labels(), scope.exclude(config), &mut content)?;

    let mut filename = format!("{}.{}", format_timestamp(now), format);
    if let Some(prefix) = scope.filename_prefix() {
        filename = format!("{}_{}", prefix, filename);
    }
    info!(filename = %filename, bytes = content.len(), "fixtures dumped");
    Ok(FixtureDump { filename, content })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> Vec<String> {
        vec!["json".to_string(), "xml".to_string()]
    }

    #[test]
    fn test_validate_upload_name() {
        assert!(validate_upload_name("valid.json", &formats()).is_ok());
        assert!(validate_upload_name("valid.JSON", &formats()).is_ok());
        assert!(matches!(
            validate_upload_name("invalid.txt", &formats()),
            Err(StowageError::Validation { ref field, ref message })
                if field == "uploads" && message == "Invalid file extension: .txt."
        ));
        assert!(matches!(
            validate_upload_name("noext", &formats()),
            Err(StowageError::Validation { ref message, .. })
                if message == "Invalid file extension: ."
        ));
    }

    #[test]
    fn test_is_fixture_name() {
        assert!(is_fixture_name("users.json", &formats()));
        assert!(is_fixture_name("Users.XML", &formats()));
        assert!(!is_fixture_name(".json", &formats()));
        assert!(!is_fixture_name("notes.txt", &formats()));
    }

    #[test]
    fn test_import_summary_message() {
        let summary = ImportSummary {
            files: 1,
            objects: 2,
        };
        assert_eq!(
            summary.message(),
            "Successfully imported 1 file. Loaded 2 objects."
        );
    }

    #[test]
    fn test_dump_scope_labels_and_prefix() {
        let scope = DumpScope::from_app_labels("sites, auth,");
        assert_eq!(scope.labels(), vec!["sites", "auth"]);
        assert_eq!(scope.filename_prefix(), None);
        assert_eq!(DumpScope::from_app_labels(""), DumpScope::Project(Vec::new()));

        let model = DumpScope::Model {
            app: "sites".to_string(),
            model: "site".to_string(),
        };
        assert_eq!(model.labels(), vec!["sites.site"]);
        assert_eq!(model.filename_prefix().as_deref(), Some("sites-site"));

        let config = StowageConfig {
            exclude: vec!["sessions".to_string()],
            ..StowageConfig::default()
        };
        assert!(model.exclude(&config).is_empty());
        assert_eq!(
            DumpScope::App("sites".to_string()).exclude(&config),
            &["sessions".to_string()]
        );
    }
}
