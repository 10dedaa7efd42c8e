use super::{map, r#break, remote, session, show, watch, Command, CommandError};
use super::CommandResult;
use crate::client::registry::LocalId;
use crate::client::NewBreakpoint;

pub const SESSION_COMMAND: &str = "session";
pub const SESSION_COMMAND_SHORT: &str = "s";
pub const SESSION_NEW_SUBCOMMAND: &str = "new";
pub const SESSION_INFO_SUBCOMMAND: &str = "info";
pub const CLOSE_COMMAND: &str = "close";
pub const REMOTE_COMMAND: &str = "remote";
pub const REMOTE_LIST_SUBCOMMAND: &str = "list";
pub const REMOTE_CONNECT_SUBCOMMAND: &str = "connect";
pub const BREAK_COMMAND: &str = "break";
pub const BREAK_COMMAND_SHORT: &str = "b";
pub const BREAK_TRACE_SUBCOMMAND: &str = "trace";
pub const BREAK_ENABLE_SUBCOMMAND: &str = "enable";
pub const BREAK_DISABLE_SUBCOMMAND: &str = "disable";
pub const BREAK_BEFORE_KEY: &str = "before";
pub const BREAK_AFTER_KEY: &str = "after";
pub const BREAK_BOTH_KEY: &str = "both";
pub const TRACE_COMMAND: &str = "trace";
pub const GO_COMMAND: &str = "go";
pub const GO_COMMAND_SHORT: &str = "g";
pub const GOTO_COMMAND: &str = "goto";
pub const TARGET_COMMAND: &str = "target";
pub const TARGET_ADD_SUBCOMMAND: &str = "add";
pub const TARGET_REMOVE_SUBCOMMAND: &str = "remove";
pub const DUMP_COMMAND: &str = "dump";
pub const WATCH_COMMAND: &str = "watch";
pub const WATCH_COMMAND_SHORT: &str = "w";
pub const WATCH_REMOVE_SUBCOMMAND: &str = "remove";
pub const MESSAGE_COMMAND: &str = "message";
pub const MESSAGE_COMMAND_SHORT: &str = "m";
pub const SHOW_COMMAND: &str = "show";
pub const STAT_COMMAND: &str = "stat";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";
pub const QUIT_COMMAND: &str = "quit";
pub const QUIT_COMMAND_SHORT: &str = "q";

use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, Boxed, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Decimal number, like session id or watch number.
pub fn number<'a>() -> impl chumsky::Parser<'a, &'a str, usize, Err<'a>> + Clone {
    text::int(10)
        .try_map(|s: &str, span| {
            s.parse::<usize>()
                .map_err(|e| Rich::custom(span, format!("invalid number `{s}`: {e}")))
        })
        .padded()
        .labelled("number")
}

/// 1-based map target position, parsed into a zero-based target index.
pub fn position<'a>() -> impl chumsky::Parser<'a, &'a str, u32, Err<'a>> + Clone {
    text::int(10)
        .try_map(|s: &str, span| match s.parse::<u32>() {
            Ok(pos) if pos > 0 => Ok(pos - 1),
            _ => Err(Rich::custom(
                span,
                format!("invalid target position `{s}`, positions start from 1"),
            )),
        })
        .labelled("target position")
}

fn rest<'a>() -> impl chumsky::Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    any()
        .repeated()
        .at_least(1)
        .to_slice()
        .map(str::trim)
        .labelled("expression")
}

fn break_name<'a>() -> impl chumsky::Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    text::ascii::ident()
        .try_map(|name: &str, span| match name {
            BREAK_BEFORE_KEY | BREAK_AFTER_KEY | BREAK_BOTH_KEY => {
                Err(Rich::custom(span, "breakpoint name expected"))
            }
            _ => Ok(name),
        })
        .padded()
        .labelled("breakpoint name")
}

/// Pair of `(break before, break after)` flags.
fn break_flags<'a>() -> impl chumsky::Parser<'a, &'a str, (bool, bool), Err<'a>> + Clone {
    let op = |sym| just(sym).padded();
    choice((
        op(BREAK_BEFORE_KEY).to((true, false)),
        op(BREAK_AFTER_KEY).to((false, true)),
        op(BREAK_BOTH_KEY).to((true, true)),
    ))
    .labelled("before|after|both")
}

fn breakpoint(base: NewBreakpoint, name: Option<&str>, flags: Option<(bool, bool)>) -> Command {
    let mut request = base;
    if let Some(name) = name {
        request = request.with_name(name);
    }
    if let Some((before, after)) = flags {
        request = request.with_flags(before, after);
    }
    Command::Breakpoint(r#break::Command::Add(request))
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: chumsky::Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse input string into command.
    pub fn parse(input: &str) -> CommandResult<Command> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Command::SkipInput);
        }

        Self::parser()
            .parse(input)
            .into_result()
            .map_err(|e| {
                CommandError::Parsing(
                    e.into_iter()
                        .next()
                        .map(|e| e.to_string())
                        .unwrap_or_default(),
                )
            })
    }

    fn parser<'a>() -> impl chumsky::Parser<'a, &'a str, Command, Err<'a>> {
        let op = |sym| just(sym).padded();
        let op2 = |full, short| op(full).or(op(short));

        let session = op2(SESSION_COMMAND, SESSION_COMMAND_SHORT)
            .ignore_then(
                choice((
                    op(SESSION_NEW_SUBCOMMAND).to(session::Command::New),
                    op(SESSION_INFO_SUBCOMMAND).to(session::Command::Info),
                    number().map(|id: LocalId| session::Command::Switch(id)),
                ))
                .or_not(),
            )
            .map(|cmd| Command::Session(cmd.unwrap_or(session::Command::New)))
            .boxed();

        let close = op(CLOSE_COMMAND)
            .ignore_then(number())
            .map(|id| Command::Session(session::Command::Close(id)))
            .boxed();

        let remote = op(REMOTE_COMMAND)
            .ignore_then(choice((
                op(REMOTE_LIST_SUBCOMMAND).to(remote::Command::List),
                op(REMOTE_CONNECT_SUBCOMMAND)
                    .ignore_then(number())
                    .map(remote::Command::Connect),
            )))
            .map(Command::Remote)
            .boxed();

        let bp_tail = break_name().or_not().then(break_flags().or_not());
        let r#break = op2(BREAK_COMMAND, BREAK_COMMAND_SHORT)
            .ignore_then(choice((
                op(BREAK_TRACE_SUBCOMMAND)
                    .ignore_then(bp_tail.clone())
                    .map(|(name, flags)| breakpoint(NewBreakpoint::trace(), name, flags)),
                op(BREAK_ENABLE_SUBCOMMAND)
                    .ignore_then(break_name())
                    .map(|name| {
                        Command::Breakpoint(r#break::Command::Enable(name.to_string()))
                    }),
                op(BREAK_DISABLE_SUBCOMMAND)
                    .ignore_then(break_name())
                    .map(|name| {
                        Command::Breakpoint(r#break::Command::Disable(name.to_string()))
                    }),
                position()
                    .padded()
                    .then(bp_tail)
                    .map(|(pos, (name, flags))| {
                        breakpoint(NewBreakpoint::point(pos), name, flags)
                    }),
            )))
            .boxed();

        let trace = op(TRACE_COMMAND)
            .ignore_then(choice((
                op("on").to(true),
                op("off").to(false),
                op("true").to(true),
                op("false").to(false),
                op("yes").to(true),
                op("no").to(false),
            )))
            .map(Command::Trace)
            .boxed();

        let go = op2(GO_COMMAND, GO_COMMAND_SHORT)
            .to(Command::Map(map::Command::Go))
            .boxed();

        let goto = op(GOTO_COMMAND)
            .ignore_then(position().padded())
            .map(|target_id| Command::Map(map::Command::GoTo(target_id)))
            .boxed();

        let target = op(TARGET_COMMAND)
            .ignore_then(choice((
                op(TARGET_ADD_SUBCOMMAND)
                    .ignore_then(
                        position()
                            .then_ignore(text::whitespace().at_least(1))
                            .or_not(),
                    )
                    .then(rest())
                    .map(|(target_id, expression)| map::Command::AddTarget {
                        target_id,
                        expression: expression.to_string(),
                    }),
                op(TARGET_REMOVE_SUBCOMMAND).to(map::Command::RemoveTarget),
            )))
            .map(Command::Map)
            .boxed();

        let dump = op(DUMP_COMMAND).to(Command::Map(map::Command::Dump)).boxed();

        let watch = op2(WATCH_COMMAND, WATCH_COMMAND_SHORT)
            .ignore_then(choice((
                op(WATCH_REMOVE_SUBCOMMAND)
                    .ignore_then(number())
                    .map(watch::Command::Remove),
                rest().map(|source| watch::Command::Add(source.to_string())),
            )))
            .map(Command::Watch)
            .boxed();

        let message = op2(MESSAGE_COMMAND, MESSAGE_COMMAND_SHORT)
            .ignore_then(rest())
            .map(|text| Command::Message(text.to_string()))
            .boxed();

        let show = op(SHOW_COMMAND)
            .ignore_then(text::ascii::ident().try_map(|aspect: &str, span| {
                aspect.parse::<show::Aspect>().map_err(|_| {
                    Rich::custom(span, format!("unknown aspect `{aspect}`, see `show help`"))
                })
            }))
            .map(Command::Show)
            .padded()
            .boxed();

        let stat = op(STAT_COMMAND).to(Command::Stat).boxed();

        let help = op2(HELP_COMMAND, HELP_COMMAND_SHORT)
            .ignore_then(text::ascii::ident().or_not())
            .map(|s| Command::Help(s.map(ToOwned::to_owned)))
            .padded()
            .boxed();

        choice((
            command(SESSION_COMMAND, session),
            command(CLOSE_COMMAND, close),
            command(REMOTE_COMMAND, remote),
            command(BREAK_COMMAND, r#break),
            command(TRACE_COMMAND, trace),
            command(GOTO_COMMAND, goto),
            command(GO_COMMAND, go),
            command(TARGET_COMMAND, target),
            command(DUMP_COMMAND, dump),
            command(WATCH_COMMAND, watch),
            command(MESSAGE_COMMAND, message),
            command(SHOW_COMMAND, show),
            command(STAT_COMMAND, stat),
            command(HELP_COMMAND, help),
        ))
        .map_err(|e| {
            let span = e.span();
            if span.start == 0 && span.end == 0 {
                Rich::custom(*e.span(), "type help for list of commands")
            } else {
                e
            }
        })
    }
}

#[test]
fn test_position_parser() {
    struct TestCase {
        string: &'static str,
        result: Result<u32, ()>,
    }
    let cases = vec![
        TestCase {
            string: "1",
            result: Ok(0),
        },
        TestCase {
            string: "12",
            result: Ok(11),
        },
        TestCase {
            string: "0",
            result: Err(()),
        },
        TestCase {
            string: "-1",
            result: Err(()),
        },
        TestCase {
            string: "99999999999",
            result: Err(()),
        },
    ];

    for tc in cases {
        let expr = position().then_ignore(end()).parse(tc.string).into_result();
        assert_eq!(expr.map_err(|_| ()), tc.result);
    }
}

#[test]
fn test_parser() {
    use crate::client::state::BreakpointMode;

    struct TestCase {
        inputs: Vec<&'static str>,
        command_matcher: fn(result: Result<Command, CommandError>),
    }
    let cases = vec![
        TestCase {
            inputs: vec!["", "   "],
            command_matcher: |result| {
                assert!(matches!(result.unwrap(), Command::SkipInput));
            },
        },
        TestCase {
            inputs: vec!["session", "s", "session new", "  s  new "],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Session(session::Command::New)
                ));
            },
        },
        TestCase {
            inputs: vec!["session info", "s info"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Session(session::Command::Info)
                ));
            },
        },
        TestCase {
            inputs: vec!["session 2", " s   2 "],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Session(session::Command::Switch(2))
                ));
            },
        },
        TestCase {
            inputs: vec!["close 0", "  close  0"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Session(session::Command::Close(0))
                ));
            },
        },
        TestCase {
            inputs: vec!["close", "close x"],
            command_matcher: |result| assert!(result.is_err()),
        },
        TestCase {
            inputs: vec!["remote list"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Remote(remote::Command::List)
                ));
            },
        },
        TestCase {
            inputs: vec!["remote connect 1", "remote  connect 1 "],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Remote(remote::Command::Connect(1))
                ));
            },
        },
        TestCase {
            inputs: vec!["b 3 b1", "break 3 b1", "break 3 b1 before"],
            command_matcher: |result| {
                let Command::Breakpoint(r#break::Command::Add(bp)) = result.unwrap() else {
                    panic!("breakpoint expected");
                };
                assert_eq!(bp.name.as_deref(), Some("b1"));
                assert_eq!(bp.mode, BreakpointMode::Point);
                assert_eq!(bp.target_id, Some(2));
                assert!(bp.break_before);
                assert!(!bp.break_after);
            },
        },
        TestCase {
            inputs: vec!["b 1 after", "break  1   after "],
            command_matcher: |result| {
                let Command::Breakpoint(r#break::Command::Add(bp)) = result.unwrap() else {
                    panic!("breakpoint expected");
                };
                assert_eq!(bp.name, None);
                assert_eq!(bp.target_id, Some(0));
                assert!(!bp.break_before);
                assert!(bp.break_after);
            },
        },
        TestCase {
            inputs: vec!["b trace", "break trace t both"],
            command_matcher: |result| {
                let Command::Breakpoint(r#break::Command::Add(bp)) = result.unwrap() else {
                    panic!("breakpoint expected");
                };
                assert_eq!(bp.mode, BreakpointMode::Trace);
                assert_eq!(bp.target_id, None);
                assert!(bp.break_before);
            },
        },
        TestCase {
            inputs: vec!["b 0", "break", "b 1 before after"],
            command_matcher: |result| assert!(result.is_err()),
        },
        TestCase {
            inputs: vec!["b enable bp1"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Enable(name)) if name == "bp1"
                ));
            },
        },
        TestCase {
            inputs: vec!["break disable tr2"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Disable(name)) if name == "tr2"
                ));
            },
        },
        TestCase {
            inputs: vec!["trace on", "trace true", "trace yes"],
            command_matcher: |result| {
                assert!(matches!(result.unwrap(), Command::Trace(true)));
            },
        },
        TestCase {
            inputs: vec!["trace off", "trace false", "trace  no "],
            command_matcher: |result| {
                assert!(matches!(result.unwrap(), Command::Trace(false)));
            },
        },
        TestCase {
            inputs: vec!["trace", "trace maybe"],
            command_matcher: |result| assert!(result.is_err()),
        },
        TestCase {
            inputs: vec!["go", "g"],
            command_matcher: |result| {
                assert!(matches!(result.unwrap(), Command::Map(map::Command::Go)));
            },
        },
        TestCase {
            inputs: vec!["goto 4", " goto  4 "],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Map(map::Command::GoTo(3))
                ));
            },
        },
        TestCase {
            inputs: vec!["target add 2 {target: \"a\", handler: \"b\"}"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Map(map::Command::AddTarget { target_id: Some(1), expression })
                        if expression == "{target: \"a\", handler: \"b\"}"
                ));
            },
        },
        TestCase {
            inputs: vec!["target add 5", "target  add   5 "],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Map(map::Command::AddTarget { target_id: None, expression })
                        if expression == "5"
                ));
            },
        },
        TestCase {
            inputs: vec!["target remove"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Map(map::Command::RemoveTarget)
                ));
            },
        },
        TestCase {
            inputs: vec!["dump"],
            command_matcher: |result| {
                assert!(matches!(result.unwrap(), Command::Map(map::Command::Dump)));
            },
        },
        TestCase {
            inputs: vec!["watch $.user.name", "w   $.user.name  "],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Watch(watch::Command::Add(source)) if source == "$.user.name"
                ));
            },
        },
        TestCase {
            inputs: vec!["watch remove 2", "w remove 2"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Watch(watch::Command::Remove(2))
                ));
            },
        },
        TestCase {
            inputs: vec!["message {a: 1} to \"x\"", "m {a: 1} to \"x\""],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Message(text) if text == "{a: 1} to \"x\""
                ));
            },
        },
        TestCase {
            inputs: vec!["show map", "  show   map "],
            command_matcher: |result| {
                assert!(matches!(result.unwrap(), Command::Show(show::Aspect::Map)));
            },
        },
        TestCase {
            inputs: vec!["show dumps"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Show(show::Aspect::Dumps)
                ));
            },
        },
        TestCase {
            inputs: vec!["show", "show everything"],
            command_matcher: |result| assert!(result.is_err()),
        },
        TestCase {
            inputs: vec!["stat"],
            command_matcher: |result| {
                assert!(matches!(result.unwrap(), Command::Stat));
            },
        },
        TestCase {
            inputs: vec!["help", "h"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Help(None)
                ));
            },
        },
        TestCase {
            inputs: vec!["help break", "h  break"],
            command_matcher: |result| {
                assert!(matches!(
                    result.unwrap(),
                    Command::Help(Some(cmd)) if cmd == "break"
                ));
            },
        },
        TestCase {
            inputs: vec!["voo", "sessions x"],
            command_matcher: |result| assert!(result.is_err()),
        },
    ];

    for case in cases {
        for input in case.inputs {
            let result = Command::parse(input);
            (case.command_matcher)(result);
        }
    }
}
