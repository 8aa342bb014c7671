mod commands;
mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wtflow")]
#[command(
    about = "ワークツリーごとに、ぶつからないポートで開発環境を。",
    long_about = None,
    version
)]
struct Cli {
    /// 詳細ログを表示
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// wtflow.kdl の雛形を作成
    Init {
        /// 既存の wtflow.kdl を上書き
        #[arg(long)]
        force: bool,
    },
    /// ワークツリー環境を作成
    Create {
        /// 環境名
        name: String,
        /// ブランチ名（省略時は環境名）
        #[arg(short, long)]
        branch: Option<String>,
        /// 作成元のブランチ
        #[arg(long, default_value = "main")]
        base: String,
        /// 既存のワークツリーを削除して作り直す
        #[arg(short, long)]
        force: bool,
        /// post_create フックを実行しない
        #[arg(long)]
        skip_hooks: bool,
    },
    /// ワークツリー環境を削除
    Remove {
        /// 環境名
        name: String,
        /// ローカルブランチも削除
        #[arg(long)]
        delete_branch: bool,
        /// リモートブランチも削除（--delete-branch と併用）
        #[arg(long, requires = "delete_branch")]
        delete_remote: bool,
        /// ボリュームも削除
        #[arg(long)]
        volumes: bool,
        /// 未コミットの変更があっても削除
        #[arg(short, long)]
        force: bool,
    },
    /// ワークツリー環境の一覧
    List,
    /// すべてのワークツリー環境を削除
    Cleanup {
        /// 未コミットの変更があっても削除
        #[arg(short, long)]
        force: bool,
        /// ボリュームも削除
        #[arg(long)]
        volumes: bool,
    },
    /// 環境を起動
    Dev {
        /// 環境名（省略時はカレントディレクトリから判定）
        name: Option<String>,
        /// イメージをビルドしてから起動
        #[arg(long)]
        build: bool,
        /// 起動するサービス（省略時は全サービス）
        #[arg(short, long = "service")]
        services: Vec<String>,
    },
    /// 環境を停止
    Stop {
        /// 環境名（省略時はカレントディレクトリから判定）
        name: Option<String>,
        /// ボリュームも削除
        #[arg(long)]
        volumes: bool,
        /// ローカルパッケージリンクを削除
        #[arg(long)]
        clean_links: bool,
    },
    /// 環境の状態を表示
    Status {
        /// 環境名（省略時はカレントディレクトリから判定）
        name: Option<String>,
    },
    /// コンテナのログを表示
    Logs {
        /// 環境名（省略時はカレントディレクトリから判定）
        name: Option<String>,
        /// ログをリアルタイムで追跡
        #[arg(short, long)]
        follow: bool,
        /// 対象サービス（省略時は全サービス）
        #[arg(short, long = "service")]
        services: Vec<String>,
    },
    /// 環境変数を export 形式で出力
    Env {
        /// 環境名（省略時はカレントディレクトリから判定）
        name: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr へ（stdout は env の出力などに使う）
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { force } => commands::init::handle(&cwd, force),
        Commands::Create {
            name,
            branch,
            base,
            force,
            skip_hooks,
        } => commands::create::handle(&cwd, name, branch, base, force, skip_hooks),
        Commands::Remove {
            name,
            delete_branch,
            delete_remote,
            volumes,
            force,
        } => commands::remove::handle(
            &cwd,
            &name,
            wtflow_core::RemoveOptions {
                delete_branch,
                delete_remote,
                remove_volumes: volumes,
                force,
            },
        ),
        Commands::List => commands::list::handle(&cwd),
        Commands::Cleanup { force, volumes } => commands::cleanup::handle(&cwd, force, volumes),
        Commands::Dev {
            name,
            build,
            services,
        } => commands::dev::handle(&cwd, name.as_deref(), build, &services),
        Commands::Stop {
            name,
            volumes,
            clean_links,
        } => commands::stop::handle(&cwd, name.as_deref(), volumes, clean_links),
        Commands::Status { name } => commands::status::handle(&cwd, name.as_deref()),
        Commands::Logs {
            name,
            follow,
            services,
        } => commands::logs::handle(&cwd, name.as_deref(), follow, &services),
        Commands::Env { name } => commands::env::handle(&cwd, name.as_deref()),
    }
}
