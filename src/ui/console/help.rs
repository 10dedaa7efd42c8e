use crate::ui::command;
use command::parser;

pub const HELP: &str = r#"
Available debugger commands:

s, session <>|new|info|<id>                 -- open a new session, show sessions or switch to a session
close <id>                                  -- close a session (not the current one)
remote list|connect <n>                     -- list sessions known by the server or connect to one of them
b, break <pos> [name] [before|after|both]   -- add breakpoint at message map target
b, break trace [name] [before|after|both]   -- add trace breakpoint, it breaks on every step
b, break enable|disable <name>              -- activate or deactivate a breakpoint
trace on|off                                -- switch message tracing on the server
g, go                                       -- start or continue message map execution
goto <pos>                                  -- move map cursor to a target
target add [<pos>] <expression>             -- add a target into message map
target remove                               -- remove a target from message map
dump                                        -- make a dump of the message map
w, watch <expression>|remove <n>            -- add or remove watch expression
m, message <expression> to <expression>     -- set message content and its target
show watch|map|exception|dumps|help         -- show an aspect of the session state
stat                                        -- print raw session state
h, help <>|<command>                        -- show help
q, quit                                     -- exit the debugger client
"#;

pub const EXPRESSION_DESCRIPTION: &str = "
\x1b[;1mExpressions\x1b[0m
Watches, message contents and map targets are written in a small expression language.
`$` is the current message content (it is null for `message` and `target add`).
This is a restricted subset of JavaScript expressions, function calls and assignments are not supported.

Available syntax:
`null`, `true`, `false`, numbers, \"strings\" - literals
`[a, b]`, `{key: value, \"other key\": value}` - array and object literals
`.field` - get field of an object (missing field is null), `.length` of arrays and strings
`[expr]` - index an array by number or an object by string
`!`, `-` - unary operators
`*`, `/`, `%`, `+`, `-` - arithmetic, `+` concatenates when any operand is a string
`<`, `<=`, `>`, `>=`, `==`, `!=` - comparison, `==` compares structures
`&&`, `||` - logical operators, return one of operands
`(` and `)` - parentheses to prioritize operations

Examples:
`$.user.name` - field `name` of field `user` of the message
`$.items[0].price * 2` - doubled price of the first item
`$.items.length > 0 && $.items[0]` - first item or false
";

pub const HELP_SESSION: &str = "\
\x1b[32;1ms, session\x1b[0m
Manage local debug sessions. Every session has a local id (0, 1, 2, ...) and an id assigned by the server.

Available subcomands:
session, session new - open a new session and make it current
session info - show local sessions, current session marked with `*`
session <id> - make session <id> current
";

pub const HELP_CLOSE: &str = "\
\x1b[32;1mclose\x1b[0m
Close a session by its local id. Current session can not be closed, switch to another one first.
Closing an already closed session does nothing.
";

pub const HELP_REMOTE: &str = "\
\x1b[32;1mremote\x1b[0m
Work with sessions opened on the server by other clients.

Available subcomands:
remote list - show sessions known by the server but not connected locally
remote connect <n> - connect session <n> from the last listing and make it current
";

pub const HELP_BREAK: &str = "\
\x1b[32;1mb, break\x1b[0m
Manage breakpoints. Target positions start from 1, as in `show map` output.

Available subcomands:
break <pos> [name] [before|after|both] - break before (default), after or around target <pos>
break trace [name] [before|after|both] - break on every step of the message map
break enable <name> - activate breakpoint
break disable <name> - deactivate breakpoint

Breakpoint names are generated if omitted: `bp1`, `bp2`, ... for point breakpoints, `tr1`, ... for trace breakpoints.

Examples of usage:
break 3 - break before third target
b 2 check after - add breakpoint named `check` after second target
";

pub const HELP_TRACE: &str = "\
\x1b[32;1mtrace\x1b[0m
Switch server-wide message tracing.

Available subcomands:
trace on|true|yes - enable tracing
trace off|false|no - disable tracing
";

pub const HELP_GO: &str = "\
\x1b[32;1mg, go\x1b[0m
Start or continue message map execution until a breakpoint or the end of the map.
";

pub const HELP_GOTO: &str = "\
\x1b[32;1mgoto\x1b[0m
Move message map cursor to target <pos>.
";

pub const HELP_TARGET: &str = "\
\x1b[32;1mtarget\x1b[0m
Edit message map.

Available subcomands:
target add [<pos>] <expression> - add a target described by expression (see `help expression`)
target remove - remove a target from the message map

Examples of usage:
target add {target: \"user/actor\", handler: \"onMessage\"}
target add 2 {messageMapId: {id: \"7\"}}
";

pub const HELP_DUMP: &str = "\
\x1b[32;1mdump\x1b[0m
Make a snapshot of the message map and the message content, see `show dumps`.
";

pub const HELP_WATCH: &str = "\
\x1b[32;1mw, watch\x1b[0m
Manage watch expressions of the current session. Watches are evaluated against message content
every time `show watch` is called (see `help expression`).

Available subcomands:
watch <expression> - add watch expression
watch remove <n> - remove watch number <n>

Examples of usage:
watch $.user.name
w $.items.length
";

pub const HELP_MESSAGE: &str = "\
\x1b[32;1mm, message\x1b[0m
Set content of the debugged message and its target (see `help expression`).

Examples of usage:
message {user: {name: \"bob\"}} to {target: \"users\", handler: \"create\"}
";

pub const HELP_SHOW: &str = "\
\x1b[32;1mshow\x1b[0m
Show an aspect of the current session state.

Available subcomands:
show watch - watch expressions evaluated over the current message
show map - message map, `->` marks current target, `[...]` are breakpoints
show exception - last exception with its causes
show dumps - dumps made by the `dump` command
show help - list of aspects

Breakpoint markers: `*` - inactive, `<` - breaks before target, `>` - breaks after target.
";

pub const HELP_STAT: &str = "\
\x1b[32;1mstat\x1b[0m
Print raw session state as returned by the server.
";

pub const HELP_QUIT: &str = "\
\x1b[32;1mq, quit\x1b[0m
Exit the debugger client. Sessions stay open on the server.
";

pub fn help_for_command(command: Option<&str>) -> &str {
    match command {
        None => HELP,
        Some("expression") => EXPRESSION_DESCRIPTION,
        Some(parser::SESSION_COMMAND) | Some(parser::SESSION_COMMAND_SHORT) => HELP_SESSION,
        Some(parser::CLOSE_COMMAND) => HELP_CLOSE,
        Some(parser::REMOTE_COMMAND) => HELP_REMOTE,
        Some(parser::BREAK_COMMAND) | Some(parser::BREAK_COMMAND_SHORT) => HELP_BREAK,
        Some(parser::TRACE_COMMAND) => HELP_TRACE,
        Some(parser::GO_COMMAND) | Some(parser::GO_COMMAND_SHORT) => HELP_GO,
        Some(parser::GOTO_COMMAND) => HELP_GOTO,
        Some(parser::TARGET_COMMAND) => HELP_TARGET,
        Some(parser::DUMP_COMMAND) => HELP_DUMP,
        Some(parser::WATCH_COMMAND) | Some(parser::WATCH_COMMAND_SHORT) => HELP_WATCH,
        Some(parser::MESSAGE_COMMAND) | Some(parser::MESSAGE_COMMAND_SHORT) => HELP_MESSAGE,
        Some(parser::SHOW_COMMAND) => HELP_SHOW,
        Some(parser::STAT_COMMAND) => HELP_STAT,
        Some(parser::QUIT_COMMAND) | Some(parser::QUIT_COMMAND_SHORT) => HELP_QUIT,
        _ => "unknown command",
    }
}
