// パス: src/value.rs
// 役割: バックエンドから返る実行時値の表現と、構造を覗くための能力インタフェースを定義する
// 意図: 型名とメンバー列だけを通じて未知の値を整形できるようにする
// 関連ファイル: src/repl/printer.rs, src/backend/harness.rs, src/repl/pipeline.rs
//! 実行時値のモデル。
//!
//! 複合値は `Reflect` を通して遅延的にメンバーを列挙する。自己参照を含むグラフも
//! 表現できるが、整形側は循環検出を行わない。

use std::fmt;
use std::rc::Rc;

/// 文字列値の実行時型名。
pub const TEXT_TYPE_NAME: &str = "System.String";

/// 複合値が公開する 1 メンバー（プロパティまたはフィールド）。
#[derive(Clone, Debug)]
pub struct Member {
    pub name: String,
    pub value: Value,
}

impl Member {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// 複合値の構造を外部へ見せる能力インタフェース。
pub trait Reflect {
    /// 実行時の完全な型名。
    fn type_name(&self) -> String;

    /// 値自身の既定の文字列変換。独自の変換を持たない型は型名をそのまま返す。
    fn display(&self) -> String;

    /// 読み取り可能な引数なしプロパティ、続いてフィールドを宣言順に返す。
    fn members(&self) -> Vec<Member>;
}

/// バックエンドが返す実行時値。
#[derive(Clone)]
pub enum Value {
    Null,
    Sequence { type_name: String, items: Vec<Value> },
    Text(String),
    Composite(Rc<dyn Reflect>),
    Primitive { type_name: String, text: String },
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn primitive(type_name: impl Into<String>, text: impl Into<String>) -> Self {
        Value::Primitive {
            type_name: type_name.into(),
            text: text.into(),
        }
    }

    pub fn int(n: i32) -> Self {
        Value::primitive("System.Int32", n.to_string())
    }

    pub fn boolean(b: bool) -> Self {
        Value::primitive("System.Boolean", if b { "True" } else { "False" })
    }

    pub fn sequence(type_name: impl Into<String>, items: Vec<Value>) -> Self {
        Value::Sequence {
            type_name: type_name.into(),
            items,
        }
    }

    pub fn composite<R: Reflect + 'static>(object: R) -> Self {
        Value::Composite(Rc::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 具体的な実行時型名。`null` には型がないため `None`。
    pub fn type_name(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Sequence { type_name, .. } | Value::Primitive { type_name, .. } => {
                Some(type_name.clone())
            }
            Value::Text(_) => Some(TEXT_TYPE_NAME.to_string()),
            Value::Composite(obj) => Some(obj.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Sequence { type_name, items } => f
                .debug_struct("Sequence")
                .field("type_name", type_name)
                .field("items", items)
                .finish(),
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            // メンバーは循環しうるので展開しない
            Value::Composite(obj) => f
                .debug_struct("Composite")
                .field("type_name", &obj.type_name())
                .finish_non_exhaustive(),
            Value::Primitive { type_name, text } => f
                .debug_struct("Primitive")
                .field("type_name", type_name)
                .field("text", text)
                .finish(),
        }
    }
}
