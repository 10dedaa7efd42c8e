//! Text views of a session state.
//!
//! Every renderer here is a pure function from server state to output lines, printing is up
//! to a caller.

use crate::client::exception;
use crate::client::expression::to_display_string;
use crate::client::registry::GlobalId;
use crate::client::state::{Breakpoint, Dump, MapSnapshot, Target};
use crate::client::watch::WatchExpression;
use crate::ui::command::session::SessionInfo;
use crate::ui::command::show::Aspect;
use itertools::Itertools;
use serde_json::Value;
use strum::{EnumMessage, IntoEnumIterator};

/// Rendered map target: a name and additional info lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetView {
    pub name: String,
    pub info: Vec<String>,
}

pub fn render_target(target: &Target) -> TargetView {
    let key_value = |fields: &[(String, String)]| {
        fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect()
    };

    match target {
        Target::Actor {
            target_path,
            handler_path,
            parameters,
        } => TargetView {
            name: format!("actor://{target_path}/#{handler_path}"),
            info: key_value(parameters),
        },
        Target::MapReference { map_id } => TargetView {
            name: format!("map://{map_id}"),
            info: vec![],
        },
        Target::Exchanging => TargetView {
            name: "EXCHANGING".to_string(),
            info: vec![],
        },
        Target::Opaque(fields) => TargetView {
            name: "Target with:".to_string(),
            info: key_value(fields),
        },
    }
}

/// Breakpoint marker like `[*<bp1>]`: `*` - inactive, `<` - break before, `>` - break after.
pub fn render_breakpoint_marker(breakpoint: &Breakpoint) -> String {
    format!(
        "[{}{}{}{}]",
        if breakpoint.active { "" } else { "*" },
        if breakpoint.break_before { "<" } else { "" },
        breakpoint.name,
        if breakpoint.break_after { ">" } else { "" },
    )
}

pub fn render_map(snapshot: &MapSnapshot) -> Vec<String> {
    if !snapshot.has_map() {
        return vec!["No message map present.".to_string()];
    }

    let mut lines = vec![format!(
        "Message map has {} target(s).",
        snapshot.targets.len()
    )];
    if snapshot.finished {
        lines.push("Message map is finished.".to_string());
    }
    if snapshot.last_exception.is_some() {
        lines.push("Map is interrupted exceptionally.".to_string());
        lines.push("\tUse `show exception` to show exception.".to_string());
    }

    for (idx, map_target) in snapshot.targets.iter().enumerate() {
        let cursor = if snapshot.cursor == Some(idx) { "->" } else { "" };
        let view = render_target(&map_target.target);

        // cursor, breakpoint markers, position, name
        let markers = map_target
            .breakpoints
            .iter()
            .map(|name| format!("{} ", render_breakpoint_marker(&snapshot.breakpoint(name))))
            .join("");
        lines.push(format!("{cursor:<2} {markers}{}) {}", idx + 1, view.name));
        lines.extend(view.info.into_iter().map(|info| format!("\t{info}")));
    }

    lines
}

pub fn render_dumps(dumps: &[Dump]) -> Vec<String> {
    let mut lines = vec![format!("There are {} dumps.", dumps.len())];

    for (i, dump) in dumps.iter().enumerate() {
        let position = dump
            .map_index
            .map(|idx| (idx + 1).to_string())
            .unwrap_or_else(|| "?".to_string());
        let view = dump.current_target().map(render_target);

        lines.push(format!(
            "{}) [{}] at target #{position}: {}",
            i + 1,
            dump.reason,
            view.as_ref()
                .map(|v| v.name.as_str())
                .unwrap_or("unknown target"),
        ));
        if let Some(view) = view {
            lines.extend(view.info.into_iter().map(|info| format!("\t\t{info}")));
        }
        lines.push(format!(
            "\t Message content: {}",
            to_display_string(&dump.message_content)
        ));
    }

    lines
}

pub fn render_exception(exception: Option<&Value>) -> Vec<String> {
    let Some(exception) = exception else {
        return vec!["No exception.".to_string()];
    };

    let mut lines: Vec<String> = exception::cause_chain(exception)
        .into_iter()
        .enumerate()
        .map(|(depth, node)| {
            let message = exception::node_message(node).unwrap_or("<no message>");
            if depth == 0 {
                format!("Exception: {message}")
            } else {
                format!("{}Caused by: {message}", "  ".repeat(depth))
            }
        })
        .collect();

    lines.push(
        serde_json::to_string_pretty(exception).unwrap_or_else(|_| exception.to_string()),
    );
    lines
}

/// Render watches, an evaluation error of one watch is rendered inline.
pub fn render_watches(message_content: Option<&Value>, watches: &[WatchExpression]) -> Vec<String> {
    let mut lines = vec![];
    if message_content.is_none() {
        lines.push("No message available.".to_string());
    }

    for (i, watch) in watches.iter().enumerate() {
        let number = i + 1;
        let line = match message_content {
            None => format!("{number}) {}", watch.source()),
            Some(content) => match watch.evaluate(content) {
                Ok(value) => format!("{number}) {} = {}", watch.source(), value),
                Err(e) => format!(
                    "{number}) {} = Error evaluating expression: {e}",
                    watch.source()
                ),
            },
        };
        lines.push(line);
    }

    lines
}

pub fn render_aspects() -> Vec<String> {
    let mut lines = vec!["Allowed show arguments:".to_string()];
    lines.extend(Aspect::iter().map(|aspect| {
        format!(
            "\t{aspect}\t- {}",
            aspect.get_message().unwrap_or_default()
        )
    }));
    lines
}

pub fn render_sessions(sessions: &[SessionInfo]) -> Vec<String> {
    if sessions.is_empty() {
        return vec!["No sessions.".to_string()];
    }

    sessions
        .iter()
        .map(|info| {
            let marker = if info.current { "*" } else { " " };
            match &info.global_id {
                Some(global_id) => format!("{marker} {}: {global_id}", info.local_id),
                None => format!("{marker} {}: closed", info.local_id),
            }
        })
        .collect()
}

pub fn render_remote_listing(listing: &[GlobalId]) -> Vec<String> {
    if listing.is_empty() {
        return vec!["No unconnected remote sessions.".to_string()];
    }

    let mut lines = vec!["Unconnected remote sessions:".to_string()];
    lines.extend(
        listing
            .iter()
            .enumerate()
            .map(|(idx, global_id)| format!("\t{idx}) {global_id}")),
    );
    lines
}
