//! Event scripts: a line-oriented stand-in for clicks, field edits and drops
//!
//! ```text
//! select add_product - steam        # '-' (or nothing) addresses the page
//! click add_group 1
//! select add_recipe 3 boil_coal
//! change update_voltage_tier 4 2
//! drag 4 into 1                     # drop inside group 1's body
//! drag 4 3                          # drop onto row 3
//! show
//! ```
//!
//! A `#` preceded by whitespace starts a trailing comment, except on `change`
//! lines, whose value runs to the end of the line.

use regex::Regex;
use tracing::debug;

use crate::actions::{Outcome, Trigger};
use crate::catalog::Catalog;
use crate::dnd::DropTarget;
use crate::error::{CatalogError, ScriptError};
use crate::project::Project;
use crate::registry::Iid;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action {
        verb: String,
        /// `None` when the iid attribute is missing or not a number
        iid: Option<Iid>,
        trigger: Trigger,
    },
    Drop {
        payload: String,
        target: DropTarget,
    },
    Show,
}

struct Patterns {
    click: Regex,
    change: Regex,
    select: Regex,
    drag: Regex,
    comment: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            click: Regex::new(r"^click\s+(\w+)(?:\s+(\S+))?$")?,
            change: Regex::new(r"^change\s+(\w+)\s+(\S+)(?:\s+(.*))?$")?,
            select: Regex::new(r"^select\s+(\w+)\s+(\S+)\s+(\S+)$")?,
            drag: Regex::new(r"^drag\s+(\S+)\s+(?:(into)\s+)?(\S+)$")?,
            comment: Regex::new(r"\s+#.*$")?,
        })
    }
}

fn iid_attr(text: Option<&str>) -> Option<Iid> {
    text.and_then(|t| t.parse().ok())
}

/// Parse a whole script; the first malformed line aborts.
pub fn parse_script(text: &str) -> Result<Vec<Command>, ScriptError> {
    let patterns = Patterns::new().map_err(|e| ScriptError {
        line: 0,
        message: "invalid command pattern",
        text: e.to_string(),
    })?;
    let mut commands = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let full = raw.trim();
        if full.is_empty() || full.starts_with('#') {
            continue;
        }
        let line = patterns.comment.replace(full, "");
        let error = |message| ScriptError {
            line: index + 1,
            message,
            text: raw.to_string(),
        };

        let command = if line == "show" {
            Command::Show
        } else if let Some(cap) = patterns.change.captures(full) {
            Command::Action {
                verb: cap[1].to_string(),
                iid: iid_attr(Some(&cap[2])),
                trigger: Trigger::Change(cap.get(3).map_or("", |m| m.as_str()).to_string()),
            }
        } else if let Some(cap) = patterns.click.captures(&line) {
            Command::Action {
                verb: cap[1].to_string(),
                iid: iid_attr(cap.get(2).map(|m| m.as_str())),
                trigger: Trigger::Click,
            }
        } else if let Some(cap) = patterns.select.captures(&line) {
            Command::Action {
                verb: cap[1].to_string(),
                iid: iid_attr(Some(&cap[2])),
                trigger: Trigger::Select(cap[3].to_string()),
            }
        } else if let Some(cap) = patterns.drag.captures(&line) {
            let target: Iid = cap[3].parse().map_err(|_| error("drop target is not an iid"))?;
            Command::Drop {
                payload: cap[1].to_string(),
                target: if cap.get(2).is_some() {
                    DropTarget::GroupContent(target)
                } else {
                    DropTarget::Node(target)
                },
            }
        } else {
            return Err(error("unrecognized command"));
        };
        commands.push(command);
    }

    Ok(commands)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub applied: usize,
    pub ignored: usize,
}

/// Feed `commands` to the session in order. `show` hands the current
/// project to `on_show`.
pub fn run_script<C: Catalog>(
    session: &mut Session<C>,
    commands: &[Command],
    mut on_show: impl FnMut(&Project, &C),
) -> Result<RunStats, CatalogError> {
    let mut stats = RunStats::default();

    for command in commands {
        let applied = match command {
            Command::Action { verb, iid, trigger } => session.dispatch(verb, *iid, trigger)? != Outcome::Ignored,
            Command::Drop { payload, target } => session.drop_onto(payload, *target)?,
            Command::Show => {
                on_show(session.project(), session.catalog());
                continue;
            }
        };
        if applied {
            stats.applied += 1;
        } else {
            debug!(?command, "command had no effect");
            stats.ignored += 1;
        }
    }

    Ok(stats)
}
