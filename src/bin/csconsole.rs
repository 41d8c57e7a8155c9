// パス: src/bin/csconsole.rs
// 役割: 引数を解釈してワンショット実行か REPL を起動するバイナリ入口
// 意図: 終了コードの決定をライブラリ側へ任せ、バイナリは薄く保つ
// 関連ファイル: src/cli.rs, src/lib.rs, src/repl/cmd.rs
fn main() {
    std::process::exit(csconsole::cli::main_entry());
}
