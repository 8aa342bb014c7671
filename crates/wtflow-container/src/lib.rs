//! wtflow のコンテナランタイム
//!
//! `docker compose` CLI で環境の起動・停止を行い、
//! bollard でコンテナの状態（実行中・ヘルス・IP）を確認します。

pub mod compose;
pub mod error;
pub mod inspect;

pub use compose::*;
pub use error::*;
pub use inspect::*;
