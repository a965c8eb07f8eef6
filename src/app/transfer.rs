//! 스토리지 덤프/로드 흐름
//!
//! 선택 검증 → 펼치기 → 스트림 응답 (덤프), 업로드 → 언패킹 (로드)

use crate::core::SelectionResolver;
use crate::system::archive::{
    pack_stream, unpack, ArchiveStream, UnpackSummary, ARCHIVE_CONTENT_TYPE, ARCHIVE_EXTENSION,
};
use crate::system::storage::{check_storage, StorageBackend};
use crate::utils::error::Result;
use crate::utils::formatter::format_timestamp;
use chrono::NaiveDateTime;
use std::io::Read;
use tracing::info;

/// 스트리밍 다운로드 응답
pub struct StorageDump {
    /// "<타임스탬프>.tgz"
    pub filename: String,
    pub content_type: &'static str,
    /// 전송 계층이 하나씩 당겨 가는 청크 스트림
    pub body: ArchiveStream,
}

impl StorageDump {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

/// 선택한 경로들을 tar.gz 스트림 응답으로 만든다
///
/// 검증 실패는 아카이브를 만들기 전에 반환된다.
pub fn dump_storage<S: StorageBackend>(
    resolver: &SelectionResolver<S>,
    paths: &[String],
    now: NaiveDateTime,
) -> Result<StorageDump> {
    let selection = resolver.validate_selection(paths)?;
    let file_list = resolver.expand_selection(&selection)?;
    let filename = format!("{}.{}", format_timestamp(now), ARCHIVE_EXTENSION);
    info!(
        filename = %filename,
        selected = selection.len(),
        entries = file_list.len(),
        "dumping storage"
    );

    Ok(StorageDump {
        filename,
        content_type: ARCHIVE_CONTENT_TYPE,
        body: pack_stream(resolver.base_dir(), file_list),
    })
}

/// 업로드된 tar.gz를 스토리지에 푼다
///
/// 실패 시 그때까지 쓴 파일은 남아 있고, 집계는 반환되지 않는다.
pub fn load_storage<R: Read, S: StorageBackend + ?Sized>(
    upload: R,
    storage: &S,
) -> Result<UnpackSummary> {
    check_storage(storage)?;
    unpack(upload, storage)
}
