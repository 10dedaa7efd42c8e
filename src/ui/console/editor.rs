use crate::ui::command::parser::{
    BREAK_COMMAND, BREAK_COMMAND_SHORT, BREAK_DISABLE_SUBCOMMAND, BREAK_ENABLE_SUBCOMMAND,
    BREAK_TRACE_SUBCOMMAND, CLOSE_COMMAND, DUMP_COMMAND, GOTO_COMMAND, GO_COMMAND,
    GO_COMMAND_SHORT, HELP_COMMAND, HELP_COMMAND_SHORT, MESSAGE_COMMAND, MESSAGE_COMMAND_SHORT,
    QUIT_COMMAND, QUIT_COMMAND_SHORT, REMOTE_COMMAND, REMOTE_CONNECT_SUBCOMMAND,
    REMOTE_LIST_SUBCOMMAND, SESSION_COMMAND, SESSION_COMMAND_SHORT, SESSION_INFO_SUBCOMMAND,
    SESSION_NEW_SUBCOMMAND, SHOW_COMMAND, STAT_COMMAND, TARGET_ADD_SUBCOMMAND, TARGET_COMMAND,
    TARGET_REMOVE_SUBCOMMAND, TRACE_COMMAND, WATCH_COMMAND, WATCH_COMMAND_SHORT,
    WATCH_REMOVE_SUBCOMMAND,
};
use crate::ui::command::show::Aspect;
use crate::ui::config;
use chumsky::text::whitespace;
use chumsky::{extra, text, Parser};
use crossterm::style::{Color, Stylize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::line_buffer::LineBuffer;
use rustyline::{Changeset, CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::borrow::Cow::{Borrowed, Owned};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use strum::IntoEnumIterator;

struct CommandHint {
    short: Option<String>,
    long: String,
    subcommands: Vec<String>,
}

impl CommandHint {
    fn long(&self) -> String {
        self.long.clone()
    }

    fn display_with_short(&self) -> String {
        if let Some(ref short) = self.short {
            if self.long.starts_with(short) {
                format!(
                    "{}{}",
                    short.clone().bold().underlined(),
                    &self.long[short.len()..]
                )
            } else {
                format!("{}|{}", &self.long, short.clone().bold().underlined())
            }
        } else {
            self.long()
        }
    }

    fn with_subcommands(mut self, subcommands: &[&str]) -> Self {
        self.subcommands = subcommands.iter().map(ToString::to_string).collect();
        self
    }
}

impl From<&str> for CommandHint {
    fn from(value: &str) -> Self {
        CommandHint {
            short: None,
            long: value.to_string(),
            subcommands: vec![],
        }
    }
}

impl From<(&str, &str)> for CommandHint {
    fn from((short, long): (&str, &str)) -> Self {
        CommandHint {
            short: Some(short.to_string()),
            long: long.to_string(),
            subcommands: vec![],
        }
    }
}

pub struct CommandCompleter {
    commands: Vec<CommandHint>,
    subcommand_hints: HashMap<String, Vec<String>>,
}

impl CommandCompleter {
    fn new(commands: impl IntoIterator<Item = CommandHint>) -> Self {
        let commands: Vec<CommandHint> = commands.into_iter().collect();
        let subcommand_hints = commands
            .iter()
            .flat_map(|cmd| {
                let mut hints = vec![(cmd.long.clone(), cmd.subcommands.clone())];
                if let Some(ref short) = cmd.short {
                    hints.push((short.clone(), cmd.subcommands.clone()));
                }
                hints
            })
            .collect::<HashMap<String, Vec<String>>>();

        Self {
            commands,
            subcommand_hints,
        }
    }
}

fn command_line<'a>() -> impl Parser<'a, &'a str, (&'a str, Option<&'a str>), extra::Default> {
    text::ascii::ident()
        .then_ignore(whitespace().at_least(1))
        .then(text::ascii::ident().or_not())
        .padded()
}

/// Command word with a (maybe empty) beginning of subcommand.
fn recognize(line: &str) -> Option<(&str, Option<&str>)> {
    command_line().parse(line).into_result().ok()
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        if let Some((cmd, mb_subcmd_part)) = recognize(line) {
            if let Some(subcommands) = self.subcommand_hints.get(cmd) {
                let subcmd_part = mb_subcmd_part.unwrap_or_default();
                let pos = line.len() - subcmd_part.len();
                let subcommands = subcommands
                    .iter()
                    .filter(|&subcmd| subcmd.starts_with(subcmd_part))
                    .map(|subcmd| Pair {
                        display: subcmd.to_string(),
                        replacement: subcmd.to_string(),
                    })
                    .collect();

                return Ok((pos, subcommands));
            }
            return Ok((0, vec![]));
        }

        let pairs = self
            .commands
            .iter()
            .filter(|&cmd| cmd.long.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.display_with_short(),
                replacement: cmd.long(),
            })
            .collect();
        Ok((0, pairs))
    }
}

#[derive(Helper, Hinter, Validator)]
pub struct RLHelper {
    pub completer: Arc<Mutex<CommandCompleter>>,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        match self.completer.lock() {
            Ok(completer) => completer.complete(line, pos, ctx),
            Err(_) => Ok((0, vec![])),
        }
    }

    fn update(&self, line: &mut LineBuffer, start: usize, elected: &str, cl: &mut Changeset) {
        if let Ok(completer) = self.completer.lock() {
            completer.update(line, start, elected, cl)
        }
    }
}

impl Highlighter for RLHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default && config::colors_enabled() {
            Owned(format!("{}", prompt.with(Color::DarkGreen)))
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if config::colors_enabled() {
            Owned(format!("{}", hint.with(Color::Grey)))
        } else {
            Borrowed(hint)
        }
    }
}

pub type SmdbgEditor = Editor<RLHelper, DefaultHistory>;

pub fn create_editor() -> anyhow::Result<SmdbgEditor> {
    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .completion_type(CompletionType::List)
        .build();

    let aspects: Vec<String> = Aspect::iter().map(|a| a.to_string()).collect();
    let aspects: Vec<&str> = aspects.iter().map(String::as_str).collect();

    let commands = [
        CommandHint::from((SESSION_COMMAND_SHORT, SESSION_COMMAND))
            .with_subcommands(&[SESSION_NEW_SUBCOMMAND, SESSION_INFO_SUBCOMMAND]),
        CLOSE_COMMAND.into(),
        CommandHint::from(REMOTE_COMMAND)
            .with_subcommands(&[REMOTE_LIST_SUBCOMMAND, REMOTE_CONNECT_SUBCOMMAND]),
        CommandHint::from((BREAK_COMMAND_SHORT, BREAK_COMMAND)).with_subcommands(&[
            BREAK_TRACE_SUBCOMMAND,
            BREAK_ENABLE_SUBCOMMAND,
            BREAK_DISABLE_SUBCOMMAND,
        ]),
        CommandHint::from(TRACE_COMMAND).with_subcommands(&["on", "off"]),
        (GO_COMMAND_SHORT, GO_COMMAND).into(),
        GOTO_COMMAND.into(),
        CommandHint::from(TARGET_COMMAND)
            .with_subcommands(&[TARGET_ADD_SUBCOMMAND, TARGET_REMOVE_SUBCOMMAND]),
        DUMP_COMMAND.into(),
        CommandHint::from((WATCH_COMMAND_SHORT, WATCH_COMMAND))
            .with_subcommands(&[WATCH_REMOVE_SUBCOMMAND]),
        (MESSAGE_COMMAND_SHORT, MESSAGE_COMMAND).into(),
        CommandHint::from(SHOW_COMMAND).with_subcommands(&aspects),
        STAT_COMMAND.into(),
        (HELP_COMMAND_SHORT, HELP_COMMAND).into(),
        (QUIT_COMMAND_SHORT, QUIT_COMMAND).into(),
    ];

    let h = RLHelper {
        completer: Arc::new(Mutex::new(CommandCompleter::new(commands))),
        hinter: HistoryHinter {},
    };

    let mut editor = Editor::with_config(config)?;
    editor.set_helper(Some(h));
    Ok(editor)
}
