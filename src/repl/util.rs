//! REPL 内部ユーティリティ

use crate::errors::{ConsoleError, ConsoleResult};

/// 行継続を示す末尾の記号。
pub(crate) const CONTINUATION_MARKER: char = '\\';

/// 有効化を意味する綴り（大文字小文字は区別しない）。
pub(crate) fn is_yes_string(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "true" | "on" | "1"
    )
}

/// 確認プロンプトへの応答が肯定かどうか。
pub(crate) fn is_affirmative(reply: &str) -> bool {
    reply.to_lowercase() == "y"
}

/// 行編集として扱うべき行か（最初の非空白文字が数字）。
pub(crate) fn is_line_edit(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

/// 行編集を行番号と本文に分解する。本文が無ければ `None`（その行の削除）。
pub(crate) fn parse_line_edit(line: &str) -> ConsoleResult<(i32, Option<String>)> {
    let line = line.trim_start();
    let (number, text) = match line.split_once(' ') {
        Some((number, text)) => (number, Some(text.to_string())),
        None => (line.trim_end(), None),
    };
    let number = number.parse::<i32>().map_err(|_| {
        ConsoleError::user_input("LINE001", format!("Invalid line number '{number}'"))
    })?;
    Ok((number, text))
}

/// 累積中のコマンド両端から継続記号を取り除く。
pub(crate) fn strip_continuation(buffer: &str) -> String {
    buffer.trim_matches(CONTINUATION_MARKER).to_string()
}

/// `whileinput` 用に、空行が入力されるまで `input` を読み続けるループを合成する。
pub(crate) fn while_input_snippet(code: &str) -> String {
    format!(
        "string input; Console.Write(\"while> \"); while ((input = Console.ReadLine()) != null && input != \"\") {{ {code}; Console.Write(\"while> \"); }}"
    )
}

/// 経過時間を `hh:mm:ss.fffffff` 形式で表す。
pub(crate) fn format_elapsed(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    let ticks = elapsed.subsec_nanos() / 100;
    format!(
        "{:02}:{:02}:{:02}.{:07}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        ticks
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        format_elapsed, is_affirmative, is_line_edit, is_yes_string, parse_line_edit,
        strip_continuation, while_input_snippet,
    };
    use crate::errors::ErrorKind;

    #[test]
    fn truthy_spellings() {
        for s in ["yes", "TRUE", " On ", "1"] {
            assert!(is_yes_string(s), "{s}");
        }
        for s in ["", "no", "off", "0", "y", "enable"] {
            assert!(!is_yes_string(s), "{s}");
        }
    }

    #[test]
    fn only_y_confirms() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("Y"));
        assert!(!is_affirmative("yes"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn line_edit_detection_uses_first_non_space_char() {
        assert!(is_line_edit("10 x"));
        assert!(is_line_edit("   7 y"));
        assert!(!is_line_edit("e 2+2"));
        assert!(!is_line_edit("   "));
    }

    #[test]
    /// 行番号と本文が最初の空白で分割されることを確認する。
    fn parse_line_edit_splits_at_first_space() {
        assert_eq!(
            parse_line_edit("10 Console.Write(1);").unwrap(),
            (10, Some("Console.Write(1);".to_string()))
        );
        assert_eq!(
            parse_line_edit("  20 int x = 1;").unwrap(),
            (20, Some("int x = 1;".to_string()))
        );
        assert_eq!(parse_line_edit("30").unwrap(), (30, None));
        let err = parse_line_edit("1x foo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserInput);
        assert!(err.to_string().contains("1x"));
    }

    #[test]
    fn continuation_marker_stripped_from_both_ends() {
        assert_eq!(strip_continuation("int x = 1;\\"), "int x = 1;");
        assert_eq!(strip_continuation("\\\\a\\b\\"), "a\\b");
    }

    #[test]
    fn while_input_reads_until_blank() {
        let src = while_input_snippet("Console.WriteLine(input)");
        assert!(src.starts_with("string input; Console.Write(\"while> \");"));
        assert!(src.contains("!= null && input != \"\")"));
        assert!(src.contains("{ Console.WriteLine(input); Console.Write(\"while> \"); }"));
    }

    #[test]
    fn elapsed_uses_timespan_layout() {
        assert_eq!(
            format_elapsed(Duration::from_millis(1_500)),
            "00:00:01.5000000"
        );
        assert_eq!(
            format_elapsed(Duration::new(3_725, 123_456_789)),
            "01:02:05.1234567"
        );
    }
}
