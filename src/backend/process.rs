// パス: src/backend/process.rs
// 役割: 外部 C# コンパイラとマネージドランタイムを子プロセスとして駆動するバックエンド
// 意図: 一時ディレクトリ内でコンパイル・実行を完結させ、成果物を残さずに値を持ち帰る
// 関連ファイル: src/backend/mod.rs, src/backend/harness.rs, src/config.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::{debug, warn};

use super::harness::{decode_outcome, harness_source, HARNESS_FILE};
use super::{Backend, CompilationUnit, Compiled, EntryPoint};
use crate::config::Framework;
use crate::errors::{ConsoleError, ConsoleResult};
use crate::value::Value;

const UNIT_FILE: &str = "unit.cs";
const OUTCOME_FILE: &str = "outcome.json";

/// 使用するコンパイラと実行ランタイムの指定。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainSettings {
    /// C# コンパイラの実行ファイル。
    pub compiler: String,
    /// 生成された実行ファイルを起動するランタイム。`None` なら直接起動する。
    pub runtime: Option<String>,
}

impl ToolchainSettings {
    /// `CSCON_COMPILER` / `CSCON_RUNTIME` を読み、未設定ならプラットフォーム既定を使う。
    pub fn from_env() -> Self {
        let compiler = env::var("CSCON_COMPILER")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_compiler().to_string());
        let runtime = match env::var("CSCON_RUNTIME") {
            Ok(s) if s.is_empty() => None,
            Ok(s) => Some(s),
            Err(_) => default_runtime().map(str::to_string),
        };
        Self { compiler, runtime }
    }
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_compiler() -> &'static str {
    if cfg!(windows) {
        "csc"
    } else {
        "mcs"
    }
}

fn default_runtime() -> Option<&'static str> {
    if cfg!(windows) {
        None
    } else {
        Some("mono")
    }
}

/// 子プロセスでコンパイル・実行するバックエンド。
#[derive(Clone, Debug, Default)]
pub struct ProcessBackend {
    settings: ToolchainSettings,
}

impl ProcessBackend {
    pub fn new(settings: ToolchainSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ToolchainSettings {
        &self.settings
    }

    fn compiler_command(
        &self,
        dir: &Path,
        exe: &Path,
        references: &[PathBuf],
        framework: Framework,
    ) -> Command {
        let mut cmd = Command::new(&self.settings.compiler);
        cmd.arg("-nologo")
            .arg("-noconfig")
            .arg("-nostdlib")
            .arg("-target:exe")
            .arg("-debug")
            .arg(format!("-langversion:{}", framework.language_version()))
            .arg(format!("-out:{}", exe.display()));
        for reference in references {
            cmd.arg(format!("-r:{}", reference.display()));
        }
        cmd.arg(dir.join(UNIT_FILE))
            .arg(dir.join(HARNESS_FILE))
            .current_dir(dir);
        cmd
    }
}

impl Backend for ProcessBackend {
    fn compile(
        &self,
        unit: &CompilationUnit,
        references: &[PathBuf],
        framework: Framework,
    ) -> ConsoleResult<Compiled> {
        let dir = tempfile::Builder::new().prefix("cscon").tempdir()?;
        fs::write(dir.path().join(UNIT_FILE), &unit.source)?;
        fs::write(dir.path().join(HARNESS_FILE), harness_source(unit))?;
        let exe = dir.path().join(format!("{}.exe", unit.class_name));

        let mut cmd = self.compiler_command(dir.path(), &exe, references, framework);
        let rendered = render_command(&cmd);
        debug!(command = %rendered, "invoking C# compiler");
        let output = cmd.output().map_err(|err| {
            ConsoleError::toolchain(
                rendered.clone(),
                None,
                format!("failed to invoke {}: {err}", self.settings.compiler),
            )
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let report = CompilerReport::parse(&text, dir.path());

        if !output.status.success() || !report.errors.is_empty() {
            if !report.errors.is_empty() {
                return Err(ConsoleError::compile(report.errors));
            }
            if !report.other.is_empty() {
                warn!(command = %rendered, "compiler failed without recognisable diagnostics");
                return Err(ConsoleError::compile(report.other));
            }
            return Err(ConsoleError::toolchain(
                rendered,
                Some(output.status),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        Ok(Compiled {
            entry: Box::new(ProcessEntry {
                dir,
                exe,
                runtime: self.settings.runtime.clone(),
            }),
            warnings: report.warnings,
        })
    }
}

/// 一時ディレクトリ内の実行ファイル。破棄と同時にディレクトリごと削除される。
struct ProcessEntry {
    dir: TempDir,
    exe: PathBuf,
    runtime: Option<String>,
}

impl EntryPoint for ProcessEntry {
    fn invoke(&self) -> ConsoleResult<Value> {
        let outcome_path = self.dir.path().join(OUTCOME_FILE);
        if outcome_path.exists() {
            fs::remove_file(&outcome_path)?;
        }

        let mut cmd = match &self.runtime {
            Some(runtime) => {
                let mut cmd = Command::new(runtime);
                cmd.arg(&self.exe);
                cmd
            }
            None => Command::new(&self.exe),
        };
        // 対話的なスニペット（whileinput など）のために標準入出力を引き継ぐ
        cmd.arg(&outcome_path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        let rendered = render_command(&cmd);
        debug!(command = %rendered, "running compiled snippet");

        let status = cmd.status().map_err(|err| {
            ConsoleError::toolchain(rendered.clone(), None, format!("failed to start: {err}"))
        })?;
        match fs::read_to_string(&outcome_path) {
            Ok(json) => decode_outcome(&json),
            Err(_) => Err(ConsoleError::toolchain(
                rendered,
                Some(status),
                "program exited without reporting a result",
            )),
        }
    }
}

/// コンパイラ出力を診断種別ごとに振り分けた結果。
#[derive(Debug, Default, PartialEq, Eq)]
struct CompilerReport {
    errors: Vec<String>,
    warnings: Vec<String>,
    other: Vec<String>,
}

impl CompilerReport {
    /// 出力行を分類する。一時ディレクトリのパスは読みやすさのため取り除く。
    fn parse(text: &str, dir: &Path) -> Self {
        let prefix = format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR);
        let mut report = CompilerReport::default();
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let line = line.replace(&prefix, "");
            if line.contains(": error ") || line.starts_with("error ") {
                report.errors.push(line);
            } else if line.contains(": warning ") || line.starts_with("warning ") {
                report.warnings.push(line);
            } else {
                report.other.push(line);
            }
        }
        report
    }
}

fn render_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{render_command, CompilerReport, ProcessBackend, ToolchainSettings};
    use crate::config::Framework;

    fn backend() -> ProcessBackend {
        ProcessBackend::new(ToolchainSettings {
            compiler: "mcs".into(),
            runtime: Some("mono".into()),
        })
    }

    #[test]
    /// コンパイラ呼び出しが標準ライブラリを自動リンクしない設定になっているか確認する。
    fn compiler_command_links_only_explicit_references() {
        let dir = Path::new("/work");
        let refs = vec![
            PathBuf::from("/fw/mscorlib.dll"),
            PathBuf::from("/fw/System.dll"),
        ];
        let cmd = backend().compiler_command(dir, &dir.join("x.exe"), &refs, Framework::V3_5);
        let rendered = render_command(&cmd);
        assert!(rendered.starts_with("mcs "));
        assert!(rendered.contains("-nostdlib"));
        assert!(rendered.contains("-noconfig"));
        assert!(rendered.contains("-langversion:3"));
        assert!(rendered.contains("-r:/fw/mscorlib.dll -r:/fw/System.dll"));
        assert!(rendered.ends_with("/work/unit.cs /work/harness.cs"));
    }

    #[test]
    fn report_splits_errors_warnings_and_noise() {
        let dir = Path::new("/tmp/cscon1");
        let prefix = format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR);
        let text = format!(
            "{p}unit.cs(8,7): error CS1525: Unexpected symbol `}}'\n\
             {p}unit.cs(3,1): warning CS0105: duplicate using\n\
             error CS0006: Metadata file `Nope.dll' could not be found\n\
             \n\
             Compilation failed: 2 error(s), 1 warnings\n",
            p = prefix
        );
        let report = CompilerReport::parse(&text, dir);
        assert_eq!(
            report.errors,
            vec![
                "unit.cs(8,7): error CS1525: Unexpected symbol `}'".to_string(),
                "error CS0006: Metadata file `Nope.dll' could not be found".to_string(),
            ]
        );
        assert_eq!(
            report.warnings,
            vec!["unit.cs(3,1): warning CS0105: duplicate using".to_string()]
        );
        assert_eq!(
            report.other,
            vec!["Compilation failed: 2 error(s), 1 warnings".to_string()]
        );
    }
}
