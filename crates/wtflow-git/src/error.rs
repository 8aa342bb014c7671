use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("git の実行に失敗しました: {0}\nヒント: git がインストールされているか確認してください")]
    Spawn(#[from] std::io::Error),

    #[error("{command} が失敗しました\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("ベースブランチ '{0}' が見つかりません")]
    BaseNotFound(String),

    #[error("ワークツリー格納ディレクトリの外は削除できません: {}", .0.display())]
    OutsideWorktreeRoot(PathBuf),
}

pub type Result<T> = std::result::Result<T, GitError>;
