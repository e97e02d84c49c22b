//! Raw CPU time snapshots and the kernel stat line parser.
//!
//! `/proc/<pid>/stat` and `/proc/<pid>/task/<tid>/stat` share one format:
//!
//! ```text
//! pid (comm) state ppid pgrp session tty_nr tpgid flags minflt cminflt majflt cmajflt utime stime ...
//! ```
//!
//! `comm` is not escaped by the kernel and may itself contain spaces and
//! parentheses, so the parser splits on the first `(` and the last `)`
//! instead of tokenizing the whole line on whitespace.

use crate::error::UsageError;

/// Index of `utime` within the fields following the command.
const UTIME_POST_INDEX: usize = 11;
/// Index of `stime` within the fields following the command.
const STIME_POST_INDEX: usize = 12;

/// One CPU time snapshot of a process or thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStat {
    /// Process id, or thread id when read from a task entry.
    pub id: u32,
    /// Command name, verbatim.
    pub command: String,
    /// Single character run state (`R`, `S`, `D`, ...). `None` where the
    /// platform has no such notion.
    pub state: Option<char>,
    pub parent_id: u32,
    /// User-mode time in platform ticks.
    pub user_ticks: u64,
    /// Kernel-mode time in platform ticks.
    pub kernel_ticks: u64,
}

impl RawStat {
    /// Snapshot carrying only CPU times, as produced by platforms whose APIs
    /// do not report a command or state alongside the times.
    pub fn from_times(id: u32, user_ticks: u64, kernel_ticks: u64) -> Self {
        Self {
            id,
            command: String::new(),
            state: None,
            parent_id: 0,
            user_ticks,
            kernel_ticks,
        }
    }

    /// User plus kernel ticks.
    pub fn total_ticks(&self) -> u64 {
        self.user_ticks.saturating_add(self.kernel_ticks)
    }
}

/// The three parts of a stat line: pre-fields, command, post-fields.
struct StatParts<'a> {
    pre: Vec<&'a str>,
    command: &'a str,
    post: Vec<&'a str>,
}

fn split_parts(line: &str) -> Result<StatParts<'_>, UsageError> {
    let open = line
        .find('(')
        .ok_or_else(|| UsageError::parse(line, "missing '(' before command"))?;
    let close = line
        .rfind(')')
        .ok_or_else(|| UsageError::parse(line, "missing ')' after command"))?;
    if close < open {
        return Err(UsageError::parse(line, "')' precedes '('"));
    }

    Ok(StatParts {
        pre: line[..open].split_whitespace().collect(),
        command: &line[open + 1..close],
        post: line[close + 1..].split_whitespace().collect(),
    })
}

/// Splits a stat line into all of its fields with the command as a single
/// token, so the result can be indexed with the field numbers from proc(5).
pub fn split_stat_line(line: &str) -> Result<Vec<&str>, UsageError> {
    let parts = split_parts(line)?;
    let mut fields = parts.pre;
    fields.push(parts.command);
    fields.extend(parts.post);
    Ok(fields)
}

/// Parses a kernel stat line into a `RawStat`.
pub fn parse_stat_line(line: &str) -> Result<RawStat, UsageError> {
    let parts = split_parts(line)?;

    if parts.pre.len() != 1 {
        return Err(UsageError::parse(
            line,
            format!(
                "expected a single id before the command, found {}",
                parts.pre.len()
            ),
        ));
    }

    let id = parse_field::<u32>(line, &parts.pre, 0, "id")?;
    let post = &parts.post;

    let state_field = post
        .first()
        .ok_or_else(|| UsageError::parse(line, "missing state field"))?;
    let mut state_chars = state_field.chars();
    let state = match (state_chars.next(), state_chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(UsageError::parse(
                line,
                format!("state field `{}` is not a single character", state_field),
            ))
        }
    };

    let parent_id = parse_field::<u32>(line, post, 1, "ppid")?;
    let user_ticks = parse_field::<u64>(line, post, UTIME_POST_INDEX, "utime")?;
    let kernel_ticks = parse_field::<u64>(line, post, STIME_POST_INDEX, "stime")?;

    Ok(RawStat {
        id,
        command: parts.command.to_string(),
        state: Some(state),
        parent_id,
        user_ticks,
        kernel_ticks,
    })
}

fn parse_field<T: std::str::FromStr>(
    line: &str,
    fields: &[&str],
    index: usize,
    name: &str,
) -> Result<T, UsageError> {
    let raw = fields
        .get(index)
        .ok_or_else(|| UsageError::parse(line, format!("missing {} field", name)))?;
    raw.parse::<T>()
        .map_err(|_| UsageError::parse(line, format!("{} field `{}` is not numeric", name, raw)))
}
