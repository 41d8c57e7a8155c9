// パス: src/repl/cmd.rs
// 役割: REPL のメインループ、行継続と行番号編集、コマンド解釈と実行
// 意図: 入力行をバッファ編集かコマンドに振り分け、設定・プログラムバッファ・評価パイプラインへ橋渡しする
// 関連ファイル: src/repl/pipeline.rs, src/repl/util.rs, src/config.rs, src/program.rs
//! C# コンソールにおけるコマンド処理と状態遷移を担当するモジュール。

use std::io::{self, BufRead, Write};
use std::time::Instant;

use super::pipeline::run_snippet;
use super::printer::render_help;
use super::util::{
    format_elapsed, is_affirmative, is_line_edit, is_yes_string, parse_line_edit,
    strip_continuation, while_input_snippet, CONTINUATION_MARKER,
};
use crate::backend::{Backend, ProcessBackend};
use crate::config::SessionConfig;
use crate::errors::{ConsoleError, ConsoleResult};
use crate::program::ProgramBuffer;

/// メインループのプロンプト。
pub const PROMPT: &str = "# ";

/// 行入力が返す結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    Line(String),
    Eof,
}

/// REPL が行を読み込むための入力源。
pub trait ReplLineSource {
    /// プロンプトを表示し、1 行を読み込む。
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult>;
}

/// 標準入力から行単位で読み込む実装。
pub struct StdinLineSource {
    stdin: io::Stdin,
}

impl StdinLineSource {
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for StdinLineSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplLineSource for StdinLineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        let bytes = self.stdin.lock().read_line(&mut line)?;
        if bytes == 0 {
            return Ok(ReadResult::Eof);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(ReadResult::Line(line))
    }
}

/// 標準入出力で対話セッションを開始し、`exit` か入力終端まで処理し続ける。
pub fn run_repl(config: SessionConfig) -> io::Result<()> {
    let mut session = Session::new(config, ProcessBackend::default());
    let mut input = StdinLineSource::new();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    run_repl_with(&mut session, &mut input, &mut stdout, &mut stderr)
}

/// 任意の入力源と出力先で REPL ループを回す。
///
/// ディスパッチ中のエラーはここで捕捉して表示し、累積中のコマンドを破棄して続行する。
pub fn run_repl_with<B, S, W, E>(
    session: &mut Session<B>,
    input: &mut S,
    out: &mut W,
    err: &mut E,
) -> io::Result<()>
where
    B: Backend,
    S: ReplLineSource,
    W: Write,
    E: Write,
{
    let mut processor = LineProcessor::new();
    while !session.exited() {
        let line = match input.read_line(PROMPT) {
            Ok(ReadResult::Line(line)) => line,
            Ok(ReadResult::Eof) => break,
            Err(e) => {
                writeln!(err, "Input error: {}", e)?;
                break;
            }
        };
        if let Err(e) = processor.feed(&line, session, input, out, err) {
            report_error(err, &e)?;
            processor.reset();
        }
    }
    out.flush()
}

/// ループや CLI で捕捉したエラーを 1 行で表示する。
pub fn report_error<E: Write>(err: &mut E, error: &ConsoleError) -> io::Result<()> {
    writeln!(err, "Error: {}", error)
}

/// 行継続と行番号編集を扱う入力行の状態機械。
#[derive(Debug, Default)]
pub struct LineProcessor {
    accumulator: String,
}

impl LineProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 継続中のコマンド。
    pub fn pending(&self) -> &str {
        &self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator.clear();
    }

    /// 1 行を処理する。
    ///
    /// - 空行（空白のみを含む）は無視する
    /// - 先頭が数字の行はプログラムバッファの編集。累積中のコマンドは破棄する
    /// - 末尾が継続記号なら累積を続け、そうでなければ累積したコマンドを実行する
    pub fn feed<B, S, W, E>(
        &mut self,
        line: &str,
        session: &mut Session<B>,
        input: &mut S,
        out: &mut W,
        err: &mut E,
    ) -> ConsoleResult<()>
    where
        B: Backend,
        S: ReplLineSource,
        W: Write,
        E: Write,
    {
        if line.trim().is_empty() {
            return Ok(());
        }
        self.accumulator.push_str(line);

        if is_line_edit(line) {
            self.accumulator.clear();
            let (number, text) = parse_line_edit(line)?;
            match text {
                Some(text) => session.program.set_line(number, text),
                None => {
                    session.program.remove_line(number);
                }
            }
            return Ok(());
        }

        if line.ends_with(CONTINUATION_MARKER) {
            self.accumulator = strip_continuation(&self.accumulator);
            return Ok(());
        }

        let command = std::mem::take(&mut self.accumulator);
        session.exec_line(&command, input, out, err)
    }
}

/// 対話セッションの状態。設定・プログラムバッファ・バックエンドを単独で所有する。
pub struct Session<B: Backend> {
    pub config: SessionConfig,
    pub program: ProgramBuffer,
    backend: B,
    exited: bool,
}

impl<B: Backend> Session<B> {
    pub fn new(config: SessionConfig, backend: B) -> Self {
        Self {
            config,
            program: ProgramBuffer::new(),
            backend,
            exited: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// `exit` が実行されたかどうか。
    pub fn exited(&self) -> bool {
        self.exited
    }

    /// コマンド文字列を解釈して実行する。
    pub fn exec_line<S, W, E>(
        &mut self,
        text: &str,
        input: &mut S,
        out: &mut W,
        err: &mut E,
    ) -> ConsoleResult<()>
    where
        S: ReplLineSource,
        W: Write,
        E: Write,
    {
        self.execute(parse_repl_command(text), input, out, err)
    }

    /// 解釈済みコマンドを実行する。確認が必要なコマンドは `input` から応答を読む。
    pub fn execute<S, W, E>(
        &mut self,
        cmd: ReplCommand,
        input: &mut S,
        out: &mut W,
        err: &mut E,
    ) -> ConsoleResult<()>
    where
        S: ReplLineSource,
        W: Write,
        E: Write,
    {
        use ReplCommand::*;
        match cmd {
            Help => render_help(out)?,
            Verbose(on) => self.config.verbose = on,
            TypeInfo(on) => self.config.show_type_info = on,
            List => {
                for (number, text) in self.program.lines() {
                    writeln!(out, "{}\t{}", number, text)?;
                }
            }
            Clear => {
                if confirm(input, "Clear program [yN]? ")? {
                    self.program.clear();
                    writeln!(out, "Program Cleared")?;
                }
            }
            Run => {
                let source = self.program.source();
                self.eval(&source, out, err)?;
            }
            Framework(version) => {
                let prompt =
                    format!("Reset compiler settings and switch to framework {version} [yN]? ");
                if confirm(input, &prompt)? {
                    self.config.set_framework_version(&version)?;
                    writeln!(out, "Compiling using .Net Framework {}", version)?;
                }
            }
            Using(namespace) => {
                writeln!(out, "Using {}", namespace)?;
                self.config.usings.push(namespace);
            }
            ListUsing => {
                for using in &self.config.usings {
                    writeln!(out, "{}", using)?;
                }
            }
            ClearUsing => {
                if confirm(input, "Clear using [yN]? ")? {
                    self.config.reset_usings();
                    writeln!(out, "Using Cleared")?;
                }
            }
            Ref(reference) => {
                writeln!(out, "Referenced {}", reference)?;
                self.config.references.push(reference);
            }
            ListRef => {
                for reference in &self.config.references {
                    writeln!(out, "{}", reference)?;
                }
            }
            ClearRef => {
                if confirm(input, "Clear ref [yN]? ")? {
                    self.config.reset_references();
                    writeln!(out, "References Cleared")?;
                }
            }
            Time(code) => {
                let start = Instant::now();
                self.eval(&code, out, err)?;
                writeln!(out, "Time {}", format_elapsed(start.elapsed()))?;
            }
            WhileInput(code) => self.eval(&while_input_snippet(&code), out, err)?,
            Exit => self.exited = true,
            Eval(code) => self.eval(&code, out, err)?,
        }
        Ok(())
    }

    fn eval<W: Write, E: Write>(&self, code: &str, out: &mut W, err: &mut E) -> ConsoleResult<()> {
        run_snippet(code, &self.config, &self.backend, out, err)
    }
}

/// 確認プロンプトを出し、`y` が入力されたときだけ `true` を返す。
fn confirm<S: ReplLineSource>(input: &mut S, prompt: &str) -> ConsoleResult<bool> {
    match input.read_line(prompt)? {
        ReadResult::Line(reply) => Ok(is_affirmative(&reply)),
        ReadResult::Eof => Ok(false),
    }
}

/// コンソールが解釈できるコマンドの集合。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `help` で使い方を表示する。
    Help,
    /// `verbose (on|off)`。
    Verbose(bool),
    /// `typeinfo (on|off)`。
    TypeInfo(bool),
    /// `list` でプログラムを行番号付きで表示する。
    List,
    /// `clear` で確認の上プログラムを消去する。
    Clear,
    /// `run` でプログラム全体を 1 スニペットとして実行する。
    Run,
    /// `framework (version)` で確認の上、版を切り替える。
    Framework(String),
    /// `using (namespace)`。
    Using(String),
    ListUsing,
    ClearUsing,
    /// `ref (assembly)`。
    Ref(String),
    ListRef,
    ClearRef,
    /// `time (code)` で実行時間を計測する。
    Time(String),
    /// `whileinput (code)` で入力が空になるまで繰り返し実行する。
    WhileInput(String),
    /// `exit` でセッションを終える。
    Exit,
    /// 既知のコマンドに該当しない入力はスニペットとして評価する。
    Eval(String),
}

/// 生の入力文字列を `ReplCommand` に解析する。判定は定義順に行う。
pub fn parse_repl_command(input: &str) -> ReplCommand {
    let s = input.trim();
    if s == "help" {
        return ReplCommand::Help;
    }
    if let Some(rest) = s.strip_prefix("verbose") {
        return ReplCommand::Verbose(is_yes_string(rest));
    }
    if let Some(rest) = s.strip_prefix("typeinfo") {
        return ReplCommand::TypeInfo(is_yes_string(rest));
    }
    match s {
        "list" => return ReplCommand::List,
        "clear" => return ReplCommand::Clear,
        "run" => return ReplCommand::Run,
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("framework ") {
        return ReplCommand::Framework(rest.trim().to_string());
    }
    if let Some(rest) = s.strip_prefix("using ") {
        return ReplCommand::Using(rest.trim().to_string());
    }
    match s {
        "listusing" => return ReplCommand::ListUsing,
        "clearusing" => return ReplCommand::ClearUsing,
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("ref ") {
        return ReplCommand::Ref(rest.trim().to_string());
    }
    match s {
        "listref" => return ReplCommand::ListRef,
        "clearref" => return ReplCommand::ClearRef,
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("time ") {
        return ReplCommand::Time(rest.to_string());
    }
    if let Some(rest) = s.strip_prefix("whileinput ") {
        return ReplCommand::WhileInput(rest.to_string());
    }
    if s == "exit" {
        return ReplCommand::Exit;
    }
    ReplCommand::Eval(s.to_string())
}
