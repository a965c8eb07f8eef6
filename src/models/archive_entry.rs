/// tar 엔트리 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveEntryKind {
    /// 일반 파일
    File,
    /// 디렉토리 마커 (페이로드 없음)
    Directory,
    /// 링크, 장치 파일 등 (추출하지 않음)
    Other,
}

/// 아카이브 엔트리 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// 베이스 디렉토리 기준 이름 (POSIX 구분자)
    pub name: String,
    pub kind: ArchiveEntryKind,
    /// 페이로드 크기 (디렉토리는 0)
    pub size: u64,
}

impl ArchiveEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == ArchiveEntryKind::Directory
    }
}
