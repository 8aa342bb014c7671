//! wtflow の git 連携
//!
//! `git worktree` でワークツリーを作成・削除し、ブランチを管理します。

pub mod cli;
pub mod error;

pub use cli::*;
pub use error::*;
