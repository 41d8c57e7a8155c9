// パス: src/repl/printer.rs
// 役割: ヘルプ表示と、任意の実行時値を構造的に文字列化する整形器
// 意図: 対話時の出力形式を一箇所にまとめ、未知の型でも読みやすく表示する
// 関連ファイル: src/repl/cmd.rs, src/repl/pipeline.rs, src/value.rs
//! REPL で用いるヘルプメッセージと値出力を集約したモジュール。
//!
//! 整形規則（上から順に判定）:
//! 1. `null` はそのまま `null`
//! 2. 配列は要素を 1 段深く整形して `[a, b]`
//! 3. 文字列は二重引用符で囲む。内部のエスケープは行わない
//! 4. 複合値は `型名(メンバー=値, ...)`。ただし深さ 1 以上で独自の文字列変換を持つ型は
//!    `型名(変換結果)`。最上位の値は常にメンバーを展開する
//! 5. それ以外（値型）は既定の文字列変換
//!
//! 循環検出は行わないため、自己参照する複合値では再帰が止まらない。

use std::io::{self, Write};

use crate::value::Value;

pub(crate) const HELP_TEXT: &str = concat!(
    "Evaluation;\n",
    "  e (code)           -- Evaluate statement and show output\n",
    "  (code)             -- Execute code as written\n",
    "  time (code)        -- Execute code and output run duration\n",
    "  whileinput (code)  -- Execute code in a while loop, taking input\n",
    "                        from the console to the variable 'input'\n",
    "                        until input is blank\n",
    "  verbose (on|off)   -- Enable/disable verbose mode\n",
    "  typeinfo (on|off)  -- Enable/disable show type info\n",
    "  exit               -- Leave the console\n",
    "\n",
    "Program;\n",
    "  (line-num) (line)  -- Set program line at line-num\n",
    "  (line-num)         -- Delete program line at line-num\n",
    "  list               -- List current program with line numbers\n",
    "  clear              -- Clear current program\n",
    "  run                -- Run current program\n",
    "\n",
    "Settings;\n",
    "  framework (version)  -- Compile using specified framework version (defaults to v4.0)\n",
    "  using (namespace)    -- Add namespace to using list\n",
    "  listusing            -- List currently used namespaces\n",
    "  clearusing           -- Clear current using list (resets to using System)\n",
    "  ref (assembly)       -- Add assembly reference\n",
    "  listref              -- List currently referenced assemblies\n",
    "  clearref             -- Clear current reference list (resets to referencing System.dll)\n",
    "\n",
    "Multi-line input: end a line with '\\' to continue it on the next line.\n",
);

/// ヘルプメッセージを任意のライターへ描画する。
pub(crate) fn render_help<W: Write>(out: &mut W) -> io::Result<()> {
    out.write_all(HELP_TEXT.as_bytes())
}

/// 値を再帰的に整形する。最初の呼び出しは `level = 0`。
pub fn format_value(value: &Value, level: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Sequence { items, .. } => {
            let parts: Vec<String> = items.iter().map(|v| format_value(v, level + 1)).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Text(s) => format!("\"{s}\""),
        Value::Composite(obj) => {
            let type_name = obj.type_name();
            let own_form = obj.display();
            if own_form == type_name || level == 0 {
                let parts: Vec<String> = obj
                    .members()
                    .iter()
                    .map(|m| format!("{}={}", m.name, format_value(&m.value, level + 1)))
                    .collect();
                format!("{}({})", type_name, parts.join(", "))
            } else {
                format!("{type_name}({own_form})")
            }
        }
        Value::Primitive { text, .. } => text.clone(),
    }
}
