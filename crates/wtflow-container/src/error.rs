use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "Dockerに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • OrbStackまたはDocker Desktopがインストールされているか確認してください"
    )]
    DockerConnectionFailed(String),

    #[error("Docker APIエラー: {0}")]
    DockerApiError(String),

    #[error("非同期ランタイムを初期化できません: {0}")]
    RuntimeInit(String),

    #[error("docker の実行に失敗しました: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{command} が失敗しました（終了コード {code}）\n{stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        let err_str = err.to_string();
        if err_str.contains("Connection refused") || err_str.contains("No such file or directory") {
            ContainerError::DockerConnectionFailed(err_str)
        } else {
            ContainerError::DockerApiError(err_str)
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
