//! Application Layer
//!
//! 운영자 요청 단위의 흐름 (스토리지 덤프/로드, 픽스처 가져오기/내보내기).
//! 인증, 라우팅, 폼 렌더링은 상위 계층 몫이다.

pub mod fixtures;
pub mod transfer;


pub use fixtures::{
    dump_fixtures, fixture_choices, import_fixtures, validate_upload_name, DumpScope,
    FixtureDump, ImportRequest, ImportSummary, Serializer, Upload,
};
pub use transfer::{dump_storage, load_storage, StorageDump};
