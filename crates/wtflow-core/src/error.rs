use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAMLエラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(
        "空きスロットがありません（最大 {max} 個）\nヒント: wtflow remove <name> で不要なワークツリーを削除してください"
    )]
    SlotsExhausted { max: u32 },

    #[error(
        "プロジェクトルートが見つかりません\n探索開始位置: {0}\nヒント: git リポジトリ内で実行してください"
    )]
    ProjectRootNotFound(PathBuf),

    #[error(
        "無効なワークツリー名: '{0}'\nヒント: 英小文字・数字・ハイフン・アンダースコアのみ使用できます（先頭は英小文字か数字、main は予約済み）"
    )]
    InvalidEnvironmentName(String),

    #[error("ワークツリーが見つかりません: {0}")]
    EnvironmentNotFound(String),

    #[error(
        "ワークツリー '{0}' にスロットが割り当てられていません\nヒント: wtflow create で作成されたワークツリーではない可能性があります"
    )]
    SlotNotAssigned(String),

    #[error("ワークツリー '{name}' は既に存在します: {path}\nヒント: --force で再作成できます")]
    AlreadyExists { name: String, path: PathBuf },

    #[error(
        "ワークツリー '{0}' に未コミットの変更があります\nヒント: コミットするか --force で強制削除してください"
    )]
    DirtyWorkingTree(String),

    #[error("コンテナランタイムが利用できません: {0}")]
    RuntimeUnavailable(String),

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EnvError>;
