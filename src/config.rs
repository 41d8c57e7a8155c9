// パス: src/config.rs
// 役割: セッション設定（対象フレームワーク・using 一覧・参照一覧・表示フラグ）を保持する
// 意図: プロセス全体の可変状態を明示的な値として受け渡し、版切替を一箇所に閉じ込める
// 関連ファイル: src/repl/cmd.rs, src/repl/pipeline.rs, src/cli.rs
//! セッション設定とフレームワーク版ごとの既定値。

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::errors::{ConsoleError, ConsoleResult};

/// 既定で選択されるフレームワーク版タグ。
pub const DEFAULT_FRAMEWORK_TAG: &str = "v4.0";
/// `clearusing` 後に残る唯一の名前空間。
pub const BASE_USING: &str = "System";
/// `clearref` 後に残る唯一の参照。
pub const BASE_REFERENCE: &str = "System.dll";
/// 常に明示的にリンクする基盤ランタイムライブラリ。
pub const RUNTIME_LIBRARY: &str = "mscorlib.dll";

const DEFAULT_USINGS: [&str; 4] = ["System", "System.IO", "System.Net", "System.Collections.Generic"];

/// サポートするフレームワーク版。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Framework {
    V2_0,
    V3_5,
    V4_0,
    V4_6,
}

/// 参照ルートを共有するフレームワーク版のまとまり。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameworkFamily {
    /// 2.0 / 3.5 は `v2.0.50727` 配下を共有する。
    Legacy,
    /// 4.x は `v4.0.30319` 配下を参照する。
    Modern,
}

static FRAMEWORK_ALIASES: Lazy<HashMap<&'static str, Framework>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tag in ["2", "2.0", "v2.0"] {
        map.insert(tag, Framework::V2_0);
    }
    for tag in ["3", "3.5", "v3.5"] {
        map.insert(tag, Framework::V3_5);
    }
    for tag in ["4", "4.0", "v4.0"] {
        map.insert(tag, Framework::V4_0);
    }
    for tag in ["4.6", "v4.6"] {
        map.insert(tag, Framework::V4_6);
    }
    map
});

impl Framework {
    /// ユーザーが入力した版タグを解釈する。未知のタグは `None`。
    pub fn from_tag(tag: &str) -> Option<Self> {
        FRAMEWORK_ALIASES.get(tag).copied()
    }

    pub fn family(self) -> FrameworkFamily {
        match self {
            Framework::V2_0 | Framework::V3_5 => FrameworkFamily::Legacy,
            Framework::V4_0 | Framework::V4_6 => FrameworkFamily::Modern,
        }
    }

    /// コンパイラへ渡す `-langversion` の値。
    pub fn language_version(self) -> &'static str {
        match self {
            Framework::V2_0 => "ISO-2",
            Framework::V3_5 => "3",
            Framework::V4_0 => "4",
            Framework::V4_6 => "6",
        }
    }

    /// 版切替時に設定される参照一覧。
    pub fn default_references(self) -> Vec<String> {
        match self.family() {
            FrameworkFamily::Legacy => vec![BASE_REFERENCE.to_string()],
            FrameworkFamily::Modern => vec![
                BASE_REFERENCE.to_string(),
                "System.Collections.dll".to_string(),
            ],
        }
    }

    /// 版切替時に設定される using 一覧。全版で共通。
    pub fn default_usings(self) -> Vec<String> {
        DEFAULT_USINGS.iter().map(|s| s.to_string()).collect()
    }
}

impl FrameworkFamily {
    fn directory_name(self) -> &'static str {
        if cfg!(windows) {
            match self {
                FrameworkFamily::Legacy => "v2.0.50727",
                FrameworkFamily::Modern => "v4.0.30319",
            }
        } else {
            match self {
                FrameworkFamily::Legacy => "2.0-api",
                FrameworkFamily::Modern => "4.5",
            }
        }
    }

    /// 参照ルートの親ディレクトリ。`CSCON_FRAMEWORK_DIR` で上書きできる。
    fn framework_dir() -> PathBuf {
        if let Some(dir) = env::var_os("CSCON_FRAMEWORK_DIR") {
            return PathBuf::from(dir);
        }
        if cfg!(windows) {
            let windows = env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
            PathBuf::from(windows)
                .join("Microsoft.NET")
                .join("Framework")
        } else {
            PathBuf::from("/usr/lib/mono")
        }
    }

    /// 基盤ランタイムライブラリと相対指定の参照を解決するルート。
    pub fn reference_root(self) -> PathBuf {
        Self::framework_dir().join(self.directory_name())
    }
}

/// 現在のコンパイル・実行環境。セッションの生存期間中ずっと保持される。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    version_tag: String,
    framework: Framework,
    pub usings: Vec<String>,
    pub references: Vec<String>,
    pub verbose: bool,
    pub show_type_info: bool,
}

impl SessionConfig {
    /// `v4.0` の既定値で構築する。
    pub fn with_defaults() -> Self {
        let framework = Framework::V4_0;
        Self {
            version_tag: DEFAULT_FRAMEWORK_TAG.to_string(),
            framework,
            usings: framework.default_usings(),
            references: framework.default_references(),
            verbose: false,
            show_type_info: false,
        }
    }

    /// ユーザーが指定したままの版タグ。
    pub fn version_tag(&self) -> &str {
        &self.version_tag
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    /// 版を切り替え、using 一覧と参照一覧をその版の既定値へ置き換える。
    ///
    /// 未知の版タグではエラーを返し、設定は一切変更しない。
    pub fn set_framework_version(&mut self, tag: &str) -> ConsoleResult<()> {
        let framework = Framework::from_tag(tag).ok_or_else(|| {
            ConsoleError::user_input("CFG001", format!("Framework version '{tag}' not known."))
        })?;
        self.version_tag = tag.to_string();
        self.framework = framework;
        self.usings = framework.default_usings();
        self.references = framework.default_references();
        Ok(())
    }

    pub fn reset_usings(&mut self) {
        self.usings = vec![BASE_USING.to_string()];
    }

    pub fn reset_references(&mut self) {
        self.references = vec![BASE_REFERENCE.to_string()];
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}
