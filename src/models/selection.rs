//! 선택 모델
//!
//! 운영자가 고른 경로 목록과, 화면에 보여줄 선택지 정의

use std::path::PathBuf;

/// 선택지 하나 (값, 표시 문자열)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// 스토리지 루트 기준 경로 (제출 값)
    pub path: String,
    /// 예: "/files/ (2 files, 10 B)"
    pub label: String,
}

/// 검증을 통과한 선택 (입력 순서 유지, 중복 허용)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    paths: Vec<String>,
}

impl Selection {
    pub(crate) fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// 아카이브에 담을 절대 경로 목록 (선택 순서, 디렉토리는 자식 다음에 자신)
pub type ExpandedFileList = Vec<PathBuf>;
