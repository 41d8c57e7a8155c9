// パス: src/lib.rs
// 役割: クレートルート。モジュールの配線と公開 API の再エクスポート
// 意図: CLI バイナリと統合テストが同じ入口から設定・評価・REPL を扱えるようにする
// 関連ファイル: src/cli.rs, src/repl/mod.rs, src/backend/mod.rs
//! C# コンソール ルートモジュール
//!
//! 目的:
//! - C# のスニペットを対話的、または 1 回限りでコンパイル・実行し、結果の値を表示する。
//! - コンパイルと実行は外部ツールチェーン（`Backend` の実装）へ委譲する。
//!
//! 方針:
//! - コメント/ドキュメントは日本語、識別子は英語。
//! - セッション状態は `SessionConfig` と `ProgramBuffer` に明示的に持たせ、グローバルを置かない。

use std::sync::Once;

pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod program;
pub mod repl;
pub mod value;

pub use crate::backend::{Backend, CompilationUnit, Compiled, EntryPoint, ProcessBackend};
pub use crate::config::{Framework, FrameworkFamily, SessionConfig};
pub use crate::errors::*;
pub use crate::program::ProgramBuffer;
pub use crate::value::{Member, Reflect, Value};

static TRACING_INIT: Once = Once::new();

/// `RUST_LOG` が設定されているときだけ tracing の購読者を登録する。
///
/// 対話出力と混ざらないよう、ログは標準エラーへ書き出す。
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}
