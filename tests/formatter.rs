// パス: tests/formatter.rs
// 役割: 値整形器の統合テスト
// 意図: ネストした複合値・配列・null に対する表示規則を公開 API 越しに固定する
// 関連ファイル: src/repl/printer.rs, src/value.rs, tests/test_support.rs
#[path = "test_support.rs"]
mod support;

use csconsole::repl::{format_value, write_result};
use csconsole::Value;
use pretty_assertions::assert_eq;
use support::{Money, Record, Wallet};

#[test]
/// 最上位の複合値はメンバーを展開し、内側の配列は 1 段深く整形される。
fn record_expands_members_and_sequences() {
    let v = Value::composite(Record {
        name: "abc",
        items: vec![1, 2],
    });
    assert_eq!(format_value(&v, 0), "Demo.Record(Name=\"abc\", Items=[1, 2])");
}

#[test]
/// 独自の文字列変換は深さ 1 以上でのみ採用される。
fn nested_custom_form_is_honoured_below_top_level() {
    let v = Value::composite(Wallet {
        owner: "kim",
        balance: 1234,
    });
    assert_eq!(
        format_value(&v, 0),
        "Demo.Wallet(Owner=\"kim\", Balance=Demo.Money($12.34), Note=null)"
    );
    let top = Value::composite(Money { cents: 5 });
    assert_eq!(format_value(&top, 0), "Demo.Money(Cents=5)");
}

#[test]
fn sequence_of_composites() {
    let v = Value::sequence(
        "Demo.Money[]",
        vec![
            Value::composite(Money { cents: 100 }),
            Value::composite(Money { cents: 250 }),
        ],
    );
    assert_eq!(format_value(&v, 0), "[Demo.Money($1.00), Demo.Money($2.50)]");
}

#[test]
fn text_is_quoted_without_escaping() {
    assert_eq!(format_value(&Value::text("line\nnext"), 0), "\"line\nnext\"");
    assert_eq!(format_value(&Value::text(""), 0), "\"\"");
}

#[test]
/// 型情報表示は null では型名を出さない。
fn type_info_is_skipped_for_null() {
    let mut out = Vec::new();
    write_result(&mut out, &Value::Null, true).unwrap();
    write_result(&mut out, &Value::text("hi"), true).unwrap();
    write_result(
        &mut out,
        &Value::sequence("System.Int32[]", vec![Value::int(3)]),
        true,
    )
    .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "null\nSystem.String\n\"hi\"\nSystem.Int32[]\n[3]\n"
    );
}
