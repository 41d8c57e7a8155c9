// パス: src/backend/mod.rs
// 役割: コンパイル・実行バックエンドの共通インタフェースとコンパイル単位を定義する
// 意図: 具体的なツールチェーンをパイプラインから切り離し、差し替え可能にする
// 関連ファイル: src/backend/process.rs, src/backend/harness.rs, src/repl/pipeline.rs

pub mod harness;
pub mod process;

use std::path::PathBuf;

use crate::config::Framework;
use crate::errors::ConsoleResult;
use crate::value::Value;

pub use process::{ProcessBackend, ToolchainSettings};

/// パイプラインが組み立てた 1 回分のコンパイル単位。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationUnit {
    /// using 句・名前空間・保持型・エントリ関数を含む完全なソース。
    pub source: String,
    pub namespace: String,
    pub class_name: String,
    pub function_name: String,
}

impl CompilationUnit {
    /// 名前空間付きの保持型名。
    pub fn qualified_class(&self) -> String {
        format!("{}.{}", self.namespace, self.class_name)
    }
}

/// コンパイル済みで呼び出し可能な引数なしエントリポイント。
pub trait EntryPoint {
    /// エントリ関数を呼び出し、戻り値を返す。
    ///
    /// 例外は根本原因まで剥がした説明を持つ `ConsoleError::Runtime` として返す。
    fn invoke(&self) -> ConsoleResult<Value>;
}

/// コンパイルに成功したときの成果物。
pub struct Compiled {
    pub entry: Box<dyn EntryPoint>,
    /// 成功時にもコンパイラが報告した警告。
    pub warnings: Vec<String>,
}

/// コンパイル + リンク + 実行の差し替え点。
pub trait Backend {
    /// ソースを参照一覧付きでコンパイルする。
    ///
    /// 診断がある場合は `ConsoleError::Compile` に全診断をそのまま載せて返す。
    /// 標準ライブラリの自動リンクは行わず、`references` だけを参照する。
    fn compile(
        &self,
        unit: &CompilationUnit,
        references: &[PathBuf],
        framework: Framework,
    ) -> ConsoleResult<Compiled>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn compile(
        &self,
        unit: &CompilationUnit,
        references: &[PathBuf],
        framework: Framework,
    ) -> ConsoleResult<Compiled> {
        (**self).compile(unit, references, framework)
    }
}
