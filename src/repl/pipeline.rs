// パス: src/repl/pipeline.rs
// 役割: スニペットをコンパイル単位へ包み、参照を解決してバックエンドで実行し、結果を分類・表示する
// 意図: コマンド処理とワンショット実行で同じ評価経路を共有して重複と不整合を防ぐ
// 関連ファイル: src/repl/cmd.rs, src/backend/mod.rs, src/repl/printer.rs
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use super::printer::format_value;
use crate::backend::{Backend, CompilationUnit};
use crate::config::{SessionConfig, RUNTIME_LIBRARY};
use crate::errors::{ConsoleError, ConsoleResult};
use crate::value::Value;

/// 生成コードを収める名前空間。
pub const GENERATED_NAMESPACE: &str = "cscongen";
/// 値を評価する省略記法の接頭辞。
pub const EVAL_SHORTHAND: &str = "e ";

/// 評価に成功したときの結果。
#[derive(Debug)]
pub struct Evaluation {
    pub value: Value,
    pub warnings: Vec<String>,
}

/// `e <expr>` を、式の値を返すスニペットへ書き換える。それ以外はそのまま返す。
pub fn prepare_snippet(text: &str) -> String {
    match text.strip_prefix(EVAL_SHORTHAND) {
        Some(expr) => format!("object __retobj = ({expr}); return __retobj;"),
        None => text.to_string(),
    }
}

/// 値を返す構文を含まないスニペットに `return null;` を補う。
pub fn ensure_return(text: &str) -> String {
    if text.contains("return ") {
        text.to_string()
    } else {
        format!("{text}; return null;")
    }
}

/// 呼び出しごとに新しいランダム UUID を、区切り無しの 32 桁 16 進で返す。
pub fn unique_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// using 句・名前空間・保持型・エントリ関数からなるコンパイル単位を組み立てる。
pub fn build_unit(snippet: &str, config: &SessionConfig, id: &str) -> CompilationUnit {
    let class_name = format!("class{id}");
    let function_name = format!("func{id}");
    let mut source = String::new();
    for using in &config.usings {
        source.push_str(&format!("using {using};\n"));
    }
    source.push_str(&format!(
        "\nnamespace {GENERATED_NAMESPACE} {{\n  public static class {class_name} {{\n    public static object {function_name}() {{\n      {snippet};\n    }}\n  }}\n}}\n"
    ));
    CompilationUnit {
        source,
        namespace: GENERATED_NAMESPACE.to_string(),
        class_name,
        function_name,
    }
}

/// 参照一覧を解決する。
///
/// 先頭は版ごとのルートにある基盤ランタイムライブラリ。続くユーザー指定の参照は、
/// 絶対パスならそのまま、相対ならルートからの相対として扱う。
pub fn resolve_references(config: &SessionConfig) -> Vec<PathBuf> {
    let root = config.framework().family().reference_root();
    let mut refs = vec![root.join(RUNTIME_LIBRARY)];
    for reference in &config.references {
        let path = Path::new(reference);
        if path.is_absolute() {
            refs.push(path.to_path_buf());
        } else {
            refs.push(root.join(path));
        }
    }
    refs
}

/// スニペットをコンパイル・実行して値を得る。
///
/// 診断があればエントリは呼び出さず `Compile` を返す。実行時例外は根本原因の説明を
/// 持つ `Runtime` になる。
pub fn evaluate<B: Backend + ?Sized>(
    snippet: &str,
    config: &SessionConfig,
    backend: &B,
) -> ConsoleResult<Evaluation> {
    let body = ensure_return(&prepare_snippet(snippet));
    let unit = build_unit(&body, config, &unique_id());
    let references = resolve_references(config);
    debug!(class = %unit.class_name, references = ?references, "compiling snippet");

    let compiled = backend.compile(&unit, &references, config.framework())?;
    let value = compiled.entry.invoke()?;
    Ok(Evaluation {
        value,
        warnings: compiled.warnings,
    })
}

/// スニペットを評価し、結果または失敗を出力したうえで呼び出し元へ返す。
pub fn run_snippet<B, W, E>(
    snippet: &str,
    config: &SessionConfig,
    backend: &B,
    out: &mut W,
    err: &mut E,
) -> ConsoleResult<()>
where
    B: Backend + ?Sized,
    W: Write,
    E: Write,
{
    // 子プロセスと出力先を共有するので、先に溜まった出力を吐き出しておく
    out.flush()?;
    match evaluate(snippet, config, backend) {
        Ok(evaluation) => {
            if config.verbose {
                for warning in &evaluation.warnings {
                    writeln!(err, "{warning}")?;
                }
            }
            write_result(out, &evaluation.value, config.show_type_info)?;
            Ok(())
        }
        Err(failure) => {
            report_failure(err, &failure)?;
            Err(failure)
        }
    }
}

/// 評価結果を表示する。型情報が有効なら具体型名を先に 1 行出す。
pub fn write_result<W: Write>(out: &mut W, value: &Value, show_type_info: bool) -> ConsoleResult<()> {
    match value.type_name() {
        Some(type_name) => {
            if show_type_info {
                writeln!(out, "{type_name}")?;
            }
            writeln!(out, "{}", format_value(value, 0))?;
        }
        None => writeln!(out, "null")?,
    }
    Ok(())
}

fn report_failure<E: Write>(err: &mut E, failure: &ConsoleError) -> ConsoleResult<()> {
    match failure {
        ConsoleError::Compile { diagnostics } => {
            writeln!(err, "COMPILE ERRORS")?;
            for diagnostic in diagnostics {
                writeln!(err, "{diagnostic}")?;
            }
        }
        ConsoleError::Runtime { cause } => writeln!(err, "{cause}")?,
        ConsoleError::Toolchain { stderr, .. } if !stderr.trim().is_empty() => {
            writeln!(err, "{}", stderr.trim_end())?
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{build_unit, ensure_return, prepare_snippet, resolve_references, unique_id};
    use crate::config::{FrameworkFamily, SessionConfig};

    #[test]
    fn shorthand_wraps_expression() {
        assert_eq!(
            prepare_snippet("e 2+2"),
            "object __retobj = (2+2); return __retobj;"
        );
        assert_eq!(prepare_snippet("Console.Write(1)"), "Console.Write(1)");
        assert_eq!(prepare_snippet("else"), "else");
    }

    #[test]
    fn ensure_return_appends_null_only_when_missing() {
        assert_eq!(
            ensure_return("Console.Write(1)"),
            "Console.Write(1); return null;"
        );
        assert_eq!(ensure_return("return 5;"), "return 5;");
        // `return;` だけでは値を返す構文とみなさない
        assert_eq!(ensure_return("return;"), "return;; return null;");
    }

    #[test]
    fn unique_ids_differ_between_calls() {
        let a = unique_id();
        let b = unique_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    /// 識別子はランダム生成の UUID (v4) として解釈できる。
    fn unique_id_is_random_uuid() {
        let id = unique_id();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.simple().to_string(), id);
    }

    #[test]
    /// コンパイル単位が using 句と一意な保持型・関数を含むか確認する。
    fn unit_contains_usings_and_unique_holder() {
        let mut cfg = SessionConfig::with_defaults();
        cfg.usings = vec!["System".into(), "System.Text".into()];
        let unit = build_unit("return 1;", &cfg, "abc");
        assert!(unit
            .source
            .starts_with("using System;\nusing System.Text;\n\nnamespace cscongen {"));
        assert!(unit.source.contains("public static class classabc {"));
        assert!(unit.source.contains("public static object funcabc() {"));
        assert!(unit.source.contains("      return 1;;\n"));
        assert_eq!(unit.class_name, "classabc");
        assert_eq!(unit.function_name, "funcabc");
        assert_eq!(unit.qualified_class(), "cscongen.classabc");
    }

    #[test]
    /// 相対参照はルート基準、絶対参照はそのまま解決されるか確認する。
    fn references_resolve_against_family_root() {
        let mut cfg = SessionConfig::with_defaults();
        let absolute = std::env::temp_dir().join("Custom.dll");
        cfg.references = vec!["System.dll".into(), absolute.display().to_string()];
        let root = FrameworkFamily::Modern.reference_root();
        let refs = resolve_references(&cfg);
        assert_eq!(
            refs,
            vec![root.join("mscorlib.dll"), root.join("System.dll"), absolute]
        );

        cfg.set_framework_version("v3.5").unwrap();
        let legacy = FrameworkFamily::Legacy.reference_root();
        let refs: Vec<PathBuf> = resolve_references(&cfg);
        assert_eq!(refs, vec![legacy.join("mscorlib.dll"), legacy.join("System.dll")]);
    }
}
