//! モデル定義
//!
//! wtflow で使用されるデータモデルを定義します。

mod project;
mod service;

// Re-exports
pub use project::*;
pub use service::*;
