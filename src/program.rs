// パス: src/program.rs
// 役割: 行番号付きプログラムバッファ（ラインエディタ方式）を提供する
// 意図: 複数行プログラムを少しずつ組み立て、一覧・実行できるようにする
// 関連ファイル: src/repl/cmd.rs, src/repl/util.rs
use std::collections::BTreeMap;

/// 行番号 → 行テキストの整列済みストア。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramBuffer {
    lines: BTreeMap<i32, String>,
}

impl ProgramBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定行を設定する。既存の行は上書きされる。
    pub fn set_line(&mut self, number: i32, text: impl Into<String>) {
        self.lines.insert(number, text.into());
    }

    /// 指定行を削除し、削除できたかどうかを返す。
    pub fn remove_line(&mut self, number: i32) -> bool {
        self.lines.remove(&number).is_some()
    }

    /// 行番号の昇順で走査する。
    pub fn lines(&self) -> impl Iterator<Item = (i32, &str)> {
        self.lines.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// 全行を昇順に連結したスニペット。各行の後ろに改行を付ける。
    pub fn source(&self) -> String {
        let mut out = String::new();
        for text in self.lines.values() {
            out.push_str(text);
            out.push('\n');
        }
        out
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
