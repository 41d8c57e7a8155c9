// パス: src/errors.rs
// 役割: コンソール全体で共有するエラー型と分類タグを定義する
// 意図: REPL ループとワンショット CLI が同じ失敗に対して別々に反応できるようにする
// 関連ファイル: src/repl/pipeline.rs, src/repl/cmd.rs, src/cli.rs
//! エラー型の定義（共通フォーマット: \[CODE\] メッセージ）。

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// 呼び出し側が分岐に用いるエラー分類。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// 行番号の書式不正や未知のフレームワーク指定など。
    UserInput,
    /// バックエンドが診断を返し、呼び出しまで到達しなかった。
    Compile,
    /// 生成コードの実行中に例外が発生した。
    Runtime,
    /// ツールチェーン起動失敗や I/O など、入力とは無関係な環境要因。
    Environment,
}

/// コンソール操作で発生しうるエラー種別。
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("[{code}] {message}")]
    UserInput { code: &'static str, message: String },
    #[error("compilation failed with {} diagnostic(s)", .diagnostics.len())]
    Compile { diagnostics: Vec<String> },
    #[error("{}", first_line(.cause))]
    Runtime { cause: String },
    #[error(
        "外部コマンド実行に失敗しました: {} (status: {:?}, command: {})",
        first_line(.stderr),
        .status,
        .command
    )]
    Toolchain {
        command: String,
        status: Option<ExitStatus>,
        stderr: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("実行結果を解釈できません: {0}")]
    Protocol(String),
}

impl ConsoleError {
    pub fn user_input(code: &'static str, message: impl Into<String>) -> Self {
        Self::UserInput {
            code,
            message: message.into(),
        }
    }

    pub fn compile(diagnostics: Vec<String>) -> Self {
        Self::Compile { diagnostics }
    }

    pub fn runtime(cause: impl Into<String>) -> Self {
        Self::Runtime {
            cause: cause.into(),
        }
    }

    pub fn toolchain(
        command: impl Into<String>,
        status: Option<ExitStatus>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Toolchain {
            command: command.into(),
            status,
            stderr: stderr.into(),
        }
    }

    /// 失敗の分類タグを返す。
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsoleError::UserInput { .. } => ErrorKind::UserInput,
            ConsoleError::Compile { .. } => ErrorKind::Compile,
            ConsoleError::Runtime { .. } => ErrorKind::Runtime,
            ConsoleError::Toolchain { .. } | ConsoleError::Io(_) | ConsoleError::Protocol(_) => {
                ErrorKind::Environment
            }
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Protocol(err.to_string())
    }
}

/// コンソール操作の結果を表す型。
pub type ConsoleResult<T> = Result<T, ConsoleError>;

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
