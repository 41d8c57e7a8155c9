// パス: src/cli.rs
// 役割: コマンドライン引数の解釈と、ワンショット実行／対話モードへの振り分け
// 意図: 起動時の設定反映を REPL と同じ `SessionConfig` 経由で行い、終了コードを一箇所で決める
// 関連ファイル: src/bin/csconsole.rs, src/repl/cmd.rs, src/config.rs
//! コマンドラインの入口。
//!
//! 引数で渡したコードがあれば 1 回だけ実行して終了し、無ければ詳細モードで REPL を開始する。

use std::io::{self, Write};

use clap::Parser;
use tracing::debug;

use crate::backend::{Backend, ProcessBackend};
use crate::config::SessionConfig;
use crate::errors::ConsoleResult;
use crate::repl::{report_error, run_repl, ReplLineSource, Session, StdinLineSource};

/// Interactive C# console: evaluate snippets, keep a numbered program, run it.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "csconsole", version, about)]
pub struct Cli {
    /// Print compiler warnings for successful evaluations
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Print the concrete type name before each value
    #[arg(short = 't')]
    pub type_info: bool,

    /// Framework version to compile against (e.g. v2.0, v3.5, v4.0, v4.6)
    #[arg(short = 'F', long = "framework", value_name = "VERSION")]
    pub framework: Option<String>,

    /// Additional assembly reference (repeatable)
    #[arg(short = 'R', long = "ref", value_name = "ASSEMBLY")]
    pub references: Vec<String>,

    /// Additional using namespace (repeatable)
    #[arg(short = 'U', long = "using", value_name = "NAMESPACE")]
    pub usings: Vec<String>,

    /// Code to run once; words are joined with single spaces
    #[arg(value_name = "CODE", trailing_var_arg = true)]
    pub code: Vec<String>,
}

impl Cli {
    /// ワンショット実行するコード。位置引数が無ければ `None`。
    pub fn command(&self) -> Option<String> {
        if self.code.is_empty() {
            None
        } else {
            Some(self.code.join(" "))
        }
    }

    /// 起動オプションを設定へ反映する。
    ///
    /// 版指定は using / 参照を既定値へ戻すため、追加の using / 参照より先に適用する。
    pub fn apply(&self, config: &mut SessionConfig) -> ConsoleResult<()> {
        if let Some(version) = &self.framework {
            config.set_framework_version(version)?;
        }
        config.references.extend(self.references.iter().cloned());
        config.usings.extend(self.usings.iter().cloned());
        config.verbose = self.verbose;
        config.show_type_info = self.type_info;
        Ok(())
    }
}

/// バイナリの入口。プロセスの終了コードを返す。
pub fn main_entry() -> i32 {
    crate::init_tracing();
    run(Cli::parse())
}

/// 解釈済み引数で実行する。
pub fn run(cli: Cli) -> i32 {
    let mut stderr = io::stderr();
    let mut config = SessionConfig::with_defaults();
    if let Err(e) = cli.apply(&mut config) {
        let _ = report_error(&mut stderr, &e);
        return 1;
    }
    debug!(framework = config.version_tag(), usings = ?config.usings, references = ?config.references, "session configured");

    match cli.command() {
        Some(command) => {
            let mut input = StdinLineSource::new();
            let mut stdout = io::stdout();
            run_once(
                &command,
                config,
                ProcessBackend::default(),
                &mut input,
                &mut stdout,
                &mut stderr,
            )
        }
        None => {
            config.verbose = true;
            match run_repl(config) {
                Ok(()) => 0,
                Err(e) => {
                    let _ = writeln!(stderr, "Input error: {}", e);
                    1
                }
            }
        }
    }
}

/// コマンドを 1 回だけ実行する。成功なら 0、失敗なら内容を表示して 1。
pub fn run_once<B, S, W, E>(
    command: &str,
    config: SessionConfig,
    backend: B,
    input: &mut S,
    out: &mut W,
    err: &mut E,
) -> i32
where
    B: Backend,
    S: ReplLineSource,
    W: Write,
    E: Write,
{
    let mut session = Session::new(config, backend);
    let result = session.exec_line(command, input, out, err);
    let _ = out.flush();
    match result {
        Ok(()) => 0,
        Err(e) => {
            let _ = report_error(err, &e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;
    use crate::config::{Framework, SessionConfig};

    #[test]
    /// 短縮フラグと末尾のコードが正しく分離されるか確認する。
    fn flags_and_trailing_code() {
        let cli = Cli::try_parse_from([
            "csconsole", "-vt", "-R", "Custom.dll", "-U", "System.Text", "e", "1", "+", "-2",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.type_info);
        assert_eq!(cli.references, vec!["Custom.dll"]);
        assert_eq!(cli.usings, vec!["System.Text"]);
        assert_eq!(cli.command().as_deref(), Some("e 1 + -2"));
    }

    #[test]
    fn no_code_means_interactive() {
        let cli = Cli::try_parse_from(["csconsole", "--framework", "v3.5"]).unwrap();
        assert_eq!(cli.command(), None);
        assert_eq!(cli.framework.as_deref(), Some("v3.5"));
    }

    #[test]
    /// 版指定の後に追加参照が積まれるため、どちらも失われない。
    fn apply_switches_framework_before_extending() {
        let cli = Cli::try_parse_from([
            "csconsole", "-F", "v2.0", "--ref", "Custom.dll", "--using", "System.Text",
        ])
        .unwrap();
        let mut config = SessionConfig::with_defaults();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.framework(), Framework::V2_0);
        assert_eq!(config.references, vec!["System.dll", "Custom.dll"]);
        assert_eq!(config.usings.last().map(String::as_str), Some("System.Text"));
        assert!(!config.verbose);
    }

    #[test]
    fn apply_rejects_unknown_framework() {
        let cli = Cli::try_parse_from(["csconsole", "-F", "v9.9"]).unwrap();
        let mut config = SessionConfig::with_defaults();
        let before = config.clone();
        assert!(cli.apply(&mut config).is_err());
        assert_eq!(config, before);
    }
}
