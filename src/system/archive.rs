//! tar.gz 아카이브 엔진
//!
//! - 패킹: 파일 목록을 엔트리 단위로 압축하며 청크를 하나씩 내보내는 pull 방식 스트림.
//!   아카이브 전체를 메모리에 올리지 않는다.
//! - 언패킹: 업로드된 tar.gz를 스토리지에 풀고, 이미 존재하는 파일은 건너뛴다.
//!   중간에 실패해도 이미 쓴 파일은 되돌리지 않는다 (원자성 없음, 최대 1회 기록).

use crate::models::{ArchiveEntry, ArchiveEntryKind, ExpandedFileList};
use crate::system::storage::StorageBackend;
use crate::utils::error::{Result, StowageError};
use crate::utils::formatter::pluralize;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive as TarArchive, Builder as TarBuilder, EntryType};
use tracing::{debug, info, warn};

/// 스트리밍 응답의 Content-Type
pub const ARCHIVE_CONTENT_TYPE: &str = "application/x-compressed";
/// 다운로드 파일 확장자
pub const ARCHIVE_EXTENSION: &str = "tgz";

/// 언패킹 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpackSummary {
    pub extracted: usize,
    pub skipped: usize,
}

impl UnpackSummary {
    /// 사용자 메시지 ("Extracted 1 file. Skipped 2 files.")
    pub fn message(&self) -> String {
        format!(
            "Extracted {}. Skipped {}.",
            pluralize(self.extracted, "file", "files"),
            pluralize(self.skipped, "file", "files")
        )
    }
}

/// 한 번만 소비 가능한 tar.gz 청크 스트림
///
/// `next()`마다 엔트리 하나를 추가하고 그때까지 압축된 바이트를 비워서 반환한다.
/// 소스 파일은 엔트리 하나를 만드는 동안만 열려 있으므로, 소비자가 중간에
/// 스트림을 버려도 열린 파일 핸들이 남지 않는다.
pub struct ArchiveStream {
    base_dir: PathBuf,
    pending: std::vec::IntoIter<PathBuf>,
    builder: Option<TarBuilder<GzEncoder<Vec<u8>>>>,
    entries_written: usize,
    bytes_emitted: u64,
}

/// `file_list`의 각 경로를 `base_dir` 기준 이름의 엔트리로 담는 스트림 생성
pub fn pack_stream(base_dir: &Path, file_list: ExpandedFileList) -> ArchiveStream {
    debug!(
        base_dir = %base_dir.display(),
        entries = file_list.len(),
        "starting archive stream"
    );
    ArchiveStream {
        base_dir: base_dir.to_path_buf(),
        pending: file_list.into_iter(),
        builder: Some(TarBuilder::new(GzEncoder::new(
            Vec::new(),
            Compression::default(),
        ))),
        entries_written: 0,
        bytes_emitted: 0,
    }
}

impl ArchiveStream {
    /// 지금까지 추가된 엔트리 수
    pub fn entries_written(&self) -> usize {
        self.entries_written
    }

    fn emit(&mut self, chunk: Vec<u8>) -> Option<Result<Vec<u8>>> {
        self.bytes_emitted += chunk.len() as u64;
        Some(Ok(chunk))
    }

    fn fail(&mut self, error: StowageError) -> Option<Result<Vec<u8>>> {
        self.builder = None;
        warn!(
            entries = self.entries_written,
            error = %error,
            "archive stream aborted"
        );
        Some(Err(error))
    }
}

impl Iterator for ArchiveStream {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let builder = self.builder.as_mut()?;
            match self.pending.next() {
                Some(path) => {
                    if let Err(e) = append_entry(builder, &self.base_dir, &path) {
                        return self.fail(e);
                    }
                    self.entries_written += 1;
                    let chunk = std::mem::take(builder.get_mut().get_mut());
                    if !chunk.is_empty() {
                        return self.emit(chunk);
                    }
                }
                None => {
                    let builder = self.builder.take()?;
                    let tail = builder
                        .into_inner()
                        .and_then(|encoder| encoder.finish())
                        .map_err(StowageError::Io);
                    return match tail {
                        Ok(tail) => {
                            info!(
                                entries = self.entries_written,
                                bytes = self.bytes_emitted + tail.len() as u64,
                                "archive stream finished"
                            );
                            self.emit(tail)
                        }
                        Err(e) => self.fail(e),
                    };
                }
            }
        }
    }
}

impl std::iter::FusedIterator for ArchiveStream {}

/// 비재귀 엔트리 하나 추가 (디렉토리는 마커만)
fn append_entry<W: Write>(builder: &mut TarBuilder<W>, base_dir: &Path, path: &Path) -> Result<()> {
    let name = path
        .strip_prefix(base_dir)
        .map(archive_display_path)
        .unwrap_or_default();
    if name.is_empty() {
        return Err(StowageError::UnsafePath {
            name: path.display().to_string(),
        });
    }
    debug!(entry = %name, "appending archive entry");
    builder.append_path_with_name(path, &name)?;
    Ok(())
}

/// 경로를 POSIX 구분자의 상대 이름으로 변환
fn archive_display_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(v) => Some(v.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// 엔트리 경로를 스토리지 이름으로 변환
///
/// `..`, 루트, 접두사 컴포넌트가 있으면 이름을 고치지 않고 거부한다.
fn storage_name(raw_path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in raw_path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(StowageError::UnsafePath {
                    name: raw_path.display().to_string(),
                });
            }
        }
    }
    if parts.is_empty() {
        return Err(StowageError::UnsafePath {
            name: raw_path.display().to_string(),
        });
    }
    Ok(parts.join("/"))
}

fn entry_kind(entry_type: EntryType) -> ArchiveEntryKind {
    if entry_type.is_dir() {
        ArchiveEntryKind::Directory
    } else if entry_type.is_file() || entry_type.is_contiguous() {
        ArchiveEntryKind::File
    } else {
        ArchiveEntryKind::Other
    }
}

fn format_error(error: io::Error) -> StowageError {
    StowageError::ArchiveFormat {
        reason: error.to_string(),
    }
}

/// 엔트리 페이로드 읽기 실패를 기록하는 reader
///
/// 저장 실패가 아카이브 손상 때문인지 스토리지 쓰기 때문인지 구분하는 데 쓴다.
/// 헤더 크기보다 먼저 EOF가 나면 잘린 스트림으로 간주한다.
struct TrackedReader<R> {
    inner: R,
    expected: u64,
    read: u64,
    error: Option<String>,
}

impl<R: Read> TrackedReader<R> {
    fn new(inner: R, expected: u64) -> Self {
        Self {
            inner,
            expected,
            read: 0,
            error: None,
        }
    }
}

impl<R: Read> Read for TrackedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() && self.read < self.expected => {
                let reason = format!(
                    "unexpected end of archive ({} of {} bytes)",
                    self.read, self.expected
                );
                self.error = Some(reason.clone());
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, reason))
            }
            Ok(n) => {
                self.read += n as u64;
                Ok(n)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

/// tar.gz 스트림을 스토리지에 풀기
///
/// 디렉토리 마커와 일반 파일이 아닌 엔트리는 세지 않고 넘긴다.
/// 같은 이름이 이미 있으면 덮어쓰지 않고 `skipped`를 올린다.
/// 손상된 스트림은 `ArchiveFormat` 에러로 중단되며, 그 전에 쓴 파일은 그대로 남는다.
pub fn unpack<R: Read, S: StorageBackend + ?Sized>(reader: R, storage: &S) -> Result<UnpackSummary> {
    let mut archive = TarArchive::new(GzDecoder::new(reader));
    let mut summary = UnpackSummary::default();

    let result = unpack_entries(&mut archive, storage, &mut summary);
    match &result {
        Ok(()) => info!(
            extracted = summary.extracted,
            skipped = summary.skipped,
            "archive extracted"
        ),
        Err(e) => warn!(
            extracted = summary.extracted,
            skipped = summary.skipped,
            error = %e,
            "archive extraction aborted; files already written are kept"
        ),
    }
    result.map(|_| summary)
}

fn unpack_entries<R: Read, S: StorageBackend + ?Sized>(
    archive: &mut TarArchive<R>,
    storage: &S,
    summary: &mut UnpackSummary,
) -> Result<()> {
    for entry_result in archive.entries().map_err(format_error)? {
        let entry = entry_result.map_err(format_error)?;
        let raw_path = entry.path().map_err(format_error)?.into_owned();

        match entry_kind(entry.header().entry_type()) {
            ArchiveEntryKind::File => {}
            kind => {
                debug!(entry = %raw_path.display(), ?kind, "skipping non-file entry");
                continue;
            }
        }
        let name = storage_name(&raw_path)?;

        if storage.exists(&name)? {
            debug!(entry = %name, "already exists, skipping");
            summary.skipped += 1;
            continue;
        }

        let size = entry.size();
        let mut content = TrackedReader::new(entry, size);
        match storage.save(&name, &mut content) {
            Ok(saved) => {
                debug!(entry = %name, saved = %saved, bytes = size, "extracted");
                summary.extracted += 1;
            }
            Err(e) => {
                return Err(match content.error.take() {
                    Some(reason) => StowageError::ArchiveFormat { reason },
                    None => e,
                });
            }
        }
    }
    Ok(())
}

/// tar.gz 스트림의 엔트리 목록 (아무것도 쓰지 않음)
pub fn list_archive_entries<R: Read>(reader: R) -> Result<Vec<ArchiveEntry>> {
    let mut archive = TarArchive::new(GzDecoder::new(reader));
    let mut entries = Vec::new();
    for entry_result in archive.entries().map_err(format_error)? {
        let entry = entry_result.map_err(format_error)?;
        let path = entry.path().map_err(format_error)?;
        let kind = entry_kind(entry.header().entry_type());
        entries.push(ArchiveEntry {
            name: archive_display_path(&path),
            kind,
            size: if kind == ArchiveEntryKind::Directory {
                0
            } else {
                entry.size()
            },
        });
    }
    Ok(entries)
}
