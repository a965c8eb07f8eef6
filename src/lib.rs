//! stowage - 관리자용 데이터 이동 도구
//!
//! 데이터 픽스처 내보내기/가져오기와, 스토리지 파일(업로드, 미디어)을
//! tar.gz 아카이브로 묶고 되돌리는 엔진.

pub mod app;
pub mod config;
pub mod core;
pub mod models;
pub mod system;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::StowageConfig;
pub use utils::error::{Result, StowageError};
