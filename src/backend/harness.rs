// パス: src/backend/harness.rs
// 役割: 生成エントリを呼び出して戻り値をリフレクションで JSON スナップショット化する C# ハーネスと、その復号
// 意図: プロセス境界を越えて実行時値の型名・文字列変換・メンバー列を持ち帰る
// 関連ファイル: src/backend/process.rs, src/value.rs, src/repl/printer.rs
//! スナップショット・プロトコル。
//!
//! ハーネスは第 1 引数で渡されたパスへ次の JSON を 1 つだけ書き出す。
//!
//! ```text
//! {"status":"ok","value":<node>} | {"status":"fault","cause":"..."}
//! ```
//!
//! 複合値のメンバーは、整形側が実際に読む位置（深さ 0、または独自の文字列変換を
//! 持たない型）でのみ採取する。

use serde::Deserialize;

use super::CompilationUnit;
use crate::errors::{ConsoleError, ConsoleResult};
use crate::value::{Member, Reflect, Value};

/// ハーネスのソースファイル名。
pub const HARNESS_FILE: &str = "harness.cs";

const HARNESS_TEMPLATE: &str = r##"using System;
using System.IO;
using System.Reflection;
using System.Text;

namespace cscongen {
  public static class HarnessMain {
    public static int Main(string[] args) {
      string outcome;
      try {
        object result = @ENTRY@();
        outcome = "{\"status\":\"ok\",\"value\":" + Snap(result, 0) + "}";
      } catch (Exception ex) {
        outcome = "{\"status\":\"fault\",\"cause\":" + Quote(ex.GetBaseException().ToString()) + "}";
      }
      File.WriteAllText(args[0], outcome);
      return 0;
    }

    static string Snap(object val, int level) {
      if (val == null)
        return "{\"kind\":\"null\"}";

      Type type = val.GetType();
      StringBuilder sb = new StringBuilder();

      if (type.IsArray) {
        Array array = (Array)val;
        sb.Append("{\"kind\":\"sequence\",\"type\":").Append(Quote(type.ToString())).Append(",\"items\":[");
        for (int i = 0; i < array.Length; i++) {
          if (i > 0)
            sb.Append(',');
          sb.Append(Snap(array.GetValue(i), level + 1));
        }
        sb.Append("]}");
      } else if (type == typeof(string)) {
        sb.Append("{\"kind\":\"text\",\"value\":").Append(Quote((string)val)).Append('}');
      } else if (!type.IsValueType) {
        string display = val.ToString();
        sb.Append("{\"kind\":\"composite\",\"type\":").Append(Quote(type.ToString()));
        sb.Append(",\"display\":").Append(Quote(display)).Append(",\"members\":[");
        if (display == type.ToString() || level == 0) {
          bool first = true;
          foreach (PropertyInfo prop in type.GetProperties()) {
            MethodInfo getter = prop.GetGetMethod();
            if (getter == null || getter.GetParameters().Length != 0)
              continue;
            if (!first)
              sb.Append(',');
            first = false;
            sb.Append(MemberNode(prop.Name, getter.Invoke(val, new object[0]), level));
          }
          foreach (FieldInfo field in type.GetFields()) {
            if (!first)
              sb.Append(',');
            first = false;
            sb.Append(MemberNode(field.Name, field.GetValue(val), level));
          }
        }
        sb.Append("]}");
      } else {
        sb.Append("{\"kind\":\"primitive\",\"type\":").Append(Quote(type.ToString()));
        sb.Append(",\"text\":").Append(Quote(val.ToString())).Append('}');
      }

      return sb.ToString();
    }

    static string MemberNode(string name, object val, int level) {
      return "{\"name\":" + Quote(name) + ",\"value\":" + Snap(val, level + 1) + "}";
    }

    static string Quote(string s) {
      if (s == null)
        return "\"\"";
      StringBuilder sb = new StringBuilder("\"");
      foreach (char c in s) {
        switch (c) {
          case '"': sb.Append("\\\""); break;
          case '\\': sb.Append("\\\\"); break;
          default:
            if (c < ' ')
              sb.Append("\\u").Append(((int)c).ToString("x4"));
            else
              sb.Append(c);
            break;
        }
      }
      return sb.Append('"').ToString();
    }
  }
}
"##;

/// 指定したコンパイル単位のエントリを呼び出すハーネスのソースを生成する。
pub fn harness_source(unit: &CompilationUnit) -> String {
    let entry = format!("{}.{}", unit.qualified_class(), unit.function_name);
    HARNESS_TEMPLATE.replace("@ENTRY@", &entry)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome {
    Ok { value: Node },
    Fault { cause: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Null,
    Sequence {
        #[serde(rename = "type")]
        type_name: String,
        items: Vec<Node>,
    },
    Text {
        value: String,
    },
    Composite {
        #[serde(rename = "type")]
        type_name: String,
        display: String,
        #[serde(default)]
        members: Vec<MemberNode>,
    },
    Primitive {
        #[serde(rename = "type")]
        type_name: String,
        text: String,
    },
}

#[derive(Debug, Deserialize)]
struct MemberNode {
    name: String,
    value: Node,
}

/// ハーネスが採取した複合値。
#[derive(Debug)]
struct CapturedObject {
    type_name: String,
    display: String,
    members: Vec<Member>,
}

impl Reflect for CapturedObject {
    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn display(&self) -> String {
        self.display.clone()
    }

    fn members(&self) -> Vec<Member> {
        self.members.clone()
    }
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Sequence { type_name, items } => {
                Value::sequence(type_name, items.into_iter().map(Node::into_value).collect())
            }
            Node::Text { value } => Value::Text(value),
            Node::Composite {
                type_name,
                display,
                members,
            } => Value::composite(CapturedObject {
                type_name,
                display,
                members: members
                    .into_iter()
                    .map(|m| Member::new(m.name, m.value.into_value()))
                    .collect(),
            }),
            Node::Primitive { type_name, text } => Value::primitive(type_name, text),
        }
    }
}

/// ハーネスの出力を値へ復号する。例外の報告は `Runtime` エラーになる。
pub fn decode_outcome(json: &str) -> ConsoleResult<Value> {
    match serde_json::from_str::<Outcome>(json)? {
        Outcome::Ok { value } => Ok(value.into_value()),
        Outcome::Fault { cause } => Err(ConsoleError::runtime(cause)),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_outcome, harness_source};
    use crate::backend::CompilationUnit;
    use crate::errors::ErrorKind;
    use crate::value::{Reflect, Value};

    #[test]
    /// ハーネスが生成エントリを完全修飾名で呼び出すか確認する。
    fn harness_calls_generated_entry() {
        let unit = CompilationUnit {
            source: String::new(),
            namespace: "cscongen".into(),
            class_name: "classabc".into(),
            function_name: "funcabc".into(),
        };
        let src = harness_source(&unit);
        assert!(src.contains("object result = cscongen.classabc.funcabc();"));
        assert!(!src.contains("@ENTRY@"));
        assert!(src.contains("GetBaseException()"));
    }

    #[test]
    fn decodes_primitive_and_text() {
        let v = decode_outcome(
            r#"{"status":"ok","value":{"kind":"primitive","type":"System.Int32","text":"4"}}"#,
        )
        .unwrap();
        assert_eq!(v.type_name().as_deref(), Some("System.Int32"));

        let v = decode_outcome(r#"{"status":"ok","value":{"kind":"text","value":"a\"b"}}"#)
            .unwrap();
        match v {
            Value::Text(s) => assert_eq!(s, "a\"b"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    /// 入れ子の配列と複合値が構造を保ったまま復元されるか確認する。
    fn decodes_nested_composite() {
        let json = r#"{"status":"ok","value":{"kind":"composite","type":"Demo.Point","display":"Demo.Point","members":[
            {"name":"X","value":{"kind":"primitive","type":"System.Int32","text":"1"}},
            {"name":"Tags","value":{"kind":"sequence","type":"System.String[]","items":[{"kind":"text","value":"a"},{"kind":"null"}]}}
        ]}}"#;
        match decode_outcome(json).unwrap() {
            Value::Composite(obj) => {
                assert_eq!(obj.type_name(), "Demo.Point");
                let members = obj.members();
                assert_eq!(members.len(), 2);
                assert_eq!(members[0].name, "X");
                match &members[1].value {
                    Value::Sequence { items, .. } => {
                        assert_eq!(items.len(), 2);
                        assert!(items[1].is_null());
                    }
                    other => panic!("unexpected: {other:?}"),
                }
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn composite_members_default_to_empty() {
        let json = r#"{"status":"ok","value":{"kind":"composite","type":"Demo.T","display":"custom"}}"#;
        match decode_outcome(json).unwrap() {
            Value::Composite(obj) => {
                assert_eq!(obj.display(), "custom");
                assert!(obj.members().is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn fault_becomes_runtime_error() {
        let err = decode_outcome(
            r#"{"status":"fault","cause":"System.DivideByZeroException: Attempted to divide by zero."}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert!(err.to_string().contains("DivideByZeroException"));
    }

    #[test]
    fn malformed_output_is_protocol_error() {
        let err = decode_outcome("not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Environment);
    }
}
