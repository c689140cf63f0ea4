//! Session scripts: a line-oriented replay of user actions.
//!
//! A script drives an [`AnnotationSession`] the way a user would, one
//! command per line:
//!
//! ```text
//! # comment
//! tag class|attribute|method
//! relate association|generalization|composition
//! idle
//! click <offset>              # word under a character offset
//! click "<word>" [<nth>]      # nth whole-word occurrence, 1-based
//! select <start> <end>        # explicit character span
//! undo
//! redo
//! clear
//! preannotate
//! ```
//!
//! [`parse_script`] reports every malformed line in a single pass.
//! [`run_script`] replays parsed statements and stops at the first one that
//! cannot be applied to the text.

use std::{fmt, ops::Range};

use log::{debug, info, warn};
use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, eof, opt, preceded, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{take_till, take_while},
};

use classmark::{
    AnnotationSession, EntityTag, RelationshipKind, Span,
    preannotate::{CancelToken, LazyAnalyzer},
    text,
};

/// One action of a session script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tag(EntityTag),
    Relate(RelationshipKind),
    Idle,
    ClickOffset(usize),
    ClickWord { word: String, nth: usize },
    Select { start: usize, end: usize },
    Undo,
    Redo,
    Clear,
    PreAnnotate,
}

/// A command with the byte range it occupies in the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    command: Command,
    span: Range<usize>,
}

impl Statement {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// A problem at a byte range of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDiagnostic {
    message: String,
    help: Option<String>,
    span: Range<usize>,
}

impl ScriptDiagnostic {
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            message: message.into(),
            help: None,
            span,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

impl fmt::Display for ScriptDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

/// A script that failed to parse or replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    diagnostics: Vec<ScriptDiagnostic>,
}

impl ScriptError {
    pub fn new(diagnostics: Vec<ScriptDiagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[ScriptDiagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics.split_first() {
            Some((first, [])) => write!(f, "{first}"),
            Some((first, rest)) => write!(f, "{first} (+{} more)", rest.len()),
            None => write!(f, "invalid script"),
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<ScriptDiagnostic> for ScriptError {
    fn from(diagnostic: ScriptDiagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

/// What the parser expected when it failed.
///
/// Attached to winnow errors via `.context()`; the reported span runs from
/// `start` to the error position.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Expected {
    message: &'static str,
    help: Option<&'static str>,
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<Expected>>;

const COMMANDS: &str =
    "commands are tag, relate, idle, click, select, undo, redo, clear and preannotate";

/// Spaces and tabs (and the `\r` of CRLF line endings).
fn blank<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    take_while(0.., [' ', '\t', '\r']).void().parse_next(input)
}

fn separator<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    take_while(1.., [' ', '\t']).void().parse_next(input)
}

fn comment<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    preceded('#', take_till(0.., '\n')).void().parse_next(input)
}

fn word<'a>(input: &mut Input<'a>) -> IResult<'a, &'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '-').parse_next(input)
}

fn number<'a>(input: &mut Input<'a>) -> IResult<'a, usize> {
    digit1.try_map(str::parse::<usize>).parse_next(input)
}

fn entity_tag<'a>(input: &mut Input<'a>) -> IResult<'a, EntityTag> {
    word.verify_map(|name: &str| name.parse().ok())
        .parse_next(input)
}

fn relationship_kind<'a>(input: &mut Input<'a>) -> IResult<'a, RelationshipKind> {
    word.verify_map(|name: &str| name.parse().ok())
        .parse_next(input)
}

/// A double-quoted word. Commits after the opening quote.
fn quoted_word<'a>(input: &mut Input<'a>) -> IResult<'a, &'a str> {
    let start = input.current_token_start();
    preceded(
        '"',
        cut_err(terminated(take_till(1.., ['"', '\n']), '"')).context(Expected {
            message: "unterminated or empty word",
            help: Some("write the word between double quotes: `click \"Book\"`"),
            start,
        }),
    )
    .parse_next(input)
}

/// `<offset>` or `"<word>" [<nth>]`.
fn click_target<'a>(input: &mut Input<'a>) -> IResult<'a, Command> {
    alt((
        (
            quoted_word,
            opt(preceded(separator, number.verify(|nth: &usize| *nth > 0))),
        )
            .map(|(word, nth)| Command::ClickWord {
                word: word.to_string(),
                nth: nth.unwrap_or(1),
            }),
        number.map(Command::ClickOffset),
    ))
    .parse_next(input)
}

fn command<'a>(input: &mut Input<'a>) -> IResult<'a, Command> {
    let start = input.current_token_start();
    let name = word.parse_next(input)?;

    match name {
        "tag" => cut_err(preceded(separator, entity_tag))
            .context(Expected {
                message: "expected an entity tag",
                help: Some("use `tag class`, `tag attribute` or `tag method`"),
                start,
            })
            .map(Command::Tag)
            .parse_next(input),
        "relate" => cut_err(preceded(separator, relationship_kind))
            .context(Expected {
                message: "expected a relationship type",
                help: Some(
                    "use `relate association`, `relate generalization` or `relate composition`",
                ),
                start,
            })
            .map(Command::Relate)
            .parse_next(input),
        "click" => cut_err(preceded(separator, click_target))
            .context(Expected {
                message: "expected a character offset or a quoted word",
                help: Some("use `click 12` or `click \"Book\" 2`"),
                start,
            })
            .parse_next(input),
        "select" => cut_err(preceded(separator, (number, preceded(separator, number))))
            .context(Expected {
                message: "expected a start and an end offset",
                help: Some("use `select 2 6` to select characters 2 to 5"),
                start,
            })
            .map(|(from, to)| Command::Select {
                start: from,
                end: to,
            })
            .parse_next(input),
        "idle" => Ok(Command::Idle),
        "undo" => Ok(Command::Undo),
        "redo" => Ok(Command::Redo),
        "clear" => Ok(Command::Clear),
        "preannotate" => Ok(Command::PreAnnotate),
        _ => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            Expected {
                message: "unknown command",
                help: Some(COMMANDS),
                start,
            },
        ))),
    }
}

/// Trailing blanks, an optional comment, then a newline or the end.
fn line_end<'a>(input: &mut Input<'a>, message: &'static str) -> IResult<'a, ()> {
    let start = input.current_token_start();
    cut_err((blank, opt(comment), alt(('\n'.void(), eof.void()))))
        .void()
        .context(Expected {
            message,
            help: Some("write one command per line; comments start with `#`"),
            start,
        })
        .parse_next(input)
}

fn line<'a>(input: &mut Input<'a>) -> IResult<'a, Option<Statement>> {
    blank.parse_next(input)?;
    let start = input.current_token_start();
    let command = opt(command).parse_next(input)?;
    let end = input.current_token_start();

    let message = if command.is_some() {
        "unexpected input after command"
    } else {
        "expected a command"
    };
    line_end(input, message)?;

    Ok(command.map(|command| Statement {
        command,
        span: start..end,
    }))
}

fn skip_line(input: &mut Input<'_>) {
    while let Some(c) = input.next_token() {
        if c == '\n' {
            break;
        }
    }
}

/// Widen `start..end` to cover at least one character of `src`.
fn widen(src: &str, start: usize, end: usize) -> Range<usize> {
    let start = start.min(src.len());
    let end = end.min(src.len());
    if end > start {
        return start..end;
    }
    let next = src[start..].chars().next().map_or(0, char::len_utf8);
    start..start + next
}

fn convert_err_mode(err: ErrMode<ContextError<Expected>>, error_pos: usize, src: &str) -> ScriptDiagnostic {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(Expected {
        message,
        help,
        start,
    }) = context_error.context().next()
    {
        let mut diag = ScriptDiagnostic::new(*message, widen(src, *start, error_pos));
        if let Some(help) = help {
            diag = diag.with_help(*help);
        }
        return diag;
    }

    ScriptDiagnostic::new("unexpected input", widen(src, error_pos, error_pos))
}

/// Parse a session script, collecting an error for every malformed line.
///
/// # Errors
///
/// Returns a [`ScriptError`] holding one diagnostic per malformed line.
pub fn parse_script(src: &str) -> Result<Vec<Statement>, ScriptError> {
    let mut input = LocatingSlice::new(src);
    let mut statements = Vec::new();
    let mut diagnostics = Vec::new();

    while !input.is_empty() {
        match line(&mut input) {
            Ok(statement) => statements.extend(statement),
            Err(err) => {
                let error_pos = input.current_token_start();
                diagnostics.push(convert_err_mode(err, error_pos, src));
                skip_line(&mut input);
            }
        }
    }

    if diagnostics.is_empty() {
        debug!(statements = statements.len(); "Script parsed");
        Ok(statements)
    } else {
        Err(ScriptError::new(diagnostics))
    }
}

/// Replay `statements` against `session`.
///
/// Pre-annotation failures are logged and the replay continues, the same
/// way the feature is simply disabled when the analyzer is unavailable.
///
/// # Errors
///
/// Returns a [`ScriptError`] pointing at the first statement that does not
/// fit the loaded text.
pub fn run_script(
    session: &mut AnnotationSession,
    statements: &[Statement],
    analyzer: &mut LazyAnalyzer,
) -> Result<(), ScriptError> {
    for statement in statements {
        run_statement(session, statement, analyzer)?;
        debug!(command:? = statement.command(), status = session.status(); "Script step");
    }
    info!(statements = statements.len(); "Script replayed");
    Ok(())
}

fn run_statement(
    session: &mut AnnotationSession,
    statement: &Statement,
    analyzer: &mut LazyAnalyzer,
) -> Result<(), ScriptDiagnostic> {
    match statement.command() {
        Command::Tag(tag) => session.set_tag_mode(*tag),
        Command::Relate(kind) => session.set_relationship_mode(*kind),
        Command::Idle => session.reset_mode(),
        Command::ClickOffset(offset) => {
            let len = text::char_len(session.text());
            if *offset >= len {
                return Err(ScriptDiagnostic::new(
                    format!("offset {offset} is past the end of the text"),
                    statement.span(),
                )
                .with_help(format!("the text has {len} characters")));
            }
            session.select_word_at(*offset);
        }
        Command::ClickWord { word, nth } => {
            let Some((span, found)) = text::find_word(session.text(), word, *nth) else {
                return Err(ScriptDiagnostic::new(
                    format!("word `{word}` (occurrence {nth}) not found in the text"),
                    statement.span(),
                ));
            };
            let found = found.to_string();
            session.handle_word_selection(&found, span);
        }
        Command::Select { start, end } => {
            let Some(span) = Span::try_new(*start, *end) else {
                return Err(ScriptDiagnostic::new("empty selection", statement.span())
                    .with_help("the end offset must be greater than the start offset"));
            };
            let Some(selected) = text::slice(session.text(), span) else {
                return Err(ScriptDiagnostic::new(
                    format!("selection {span} is past the end of the text"),
                    statement.span(),
                ));
            };
            let selected = selected.to_string();
            session.handle_word_selection(&selected, span);
        }
        Command::Undo => {
            session.undo();
        }
        Command::Redo => {
            session.redo();
        }
        Command::Clear => session.clear_annotations(),
        Command::PreAnnotate => {
            if let Err(err) = session.pre_annotate(analyzer, &CancelToken::new()) {
                warn!(err:%; "Pre-annotation skipped");
            }
        }
    }
    Ok(())
}
