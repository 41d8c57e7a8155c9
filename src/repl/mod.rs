// パス: src/repl/mod.rs
// 役割: REPL モジュール群のファサードと再公開
// 意図: 対話エントリポイントと評価経路を公開し、内部ユーティリティは隠す
// 関連ファイル: src/repl/cmd.rs, src/repl/pipeline.rs, src/cli.rs
//! C# コンソールの対話環境を構成するモジュール群をまとめたファサード。
//!
//! - `cmd`: メインループ、行継続と行番号編集、コマンド解釈
//! - `pipeline`: スニペットのコンパイル単位化と実行
//! - `printer`: ヘルプと値の整形
//! - `util`: REPL 内部の軽量ユーティリティ

pub mod cmd;
pub mod pipeline;
pub mod printer;
mod util;

pub use cmd::{
    parse_repl_command, report_error, run_repl, run_repl_with, LineProcessor, ReadResult,
    ReplCommand, ReplLineSource, Session, StdinLineSource, PROMPT,
};
pub use pipeline::{evaluate, run_snippet, write_result, Evaluation};
pub use printer::format_value;
