//! wtflow のコア
//!
//! ワークツリーごとにスロットを割り当て、衝突しないポート範囲と
//! Compose 定義を生成し、環境のライフサイクルを管理します。
//!
//! - **registry**: 環境名 → スロットの永続マップ
//! - **port**: スロットからホストポートを導出
//! - **generator**: カタログから環境ごとの定義を生成
//! - **context**: カレントディレクトリから対象環境を解決
//! - **lifecycle**: 作成・削除・起動・停止のオーケストレーション

pub mod compose;
pub mod context;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod hooks;
pub mod lifecycle;
pub mod links;
pub mod loader;
pub mod model;
pub mod parser;
pub mod port;
pub mod registry;
pub mod template;
pub mod waiter;

pub use compose::*;
pub use context::*;
pub use discovery::*;
pub use error::*;
pub use generator::*;
pub use hooks::*;
pub use lifecycle::*;
pub use links::*;
pub use loader::*;
pub use model::*;
pub use parser::*;
pub use port::*;
pub use registry::*;
pub use template::*;
pub use waiter::*;
