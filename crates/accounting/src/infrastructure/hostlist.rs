//! Host range expansion in the scheduler's hostlist syntax

use error_stack::Report;

use crate::domain::error::HostRangeError;
use crate::domain::snapshot::HostRangeExpander;

/// Upper bound on the hosts a single expression may expand to.
const MAX_HOSTS: usize = 1 << 20;

/// Expands expressions like `node[01-04,07],gpu[1-2]-ib`.
///
/// Items are separated by commas outside brackets. Each bracket group holds
/// comma separated numbers or `lo-hi` ranges; zero padding follows the width
/// of the lower bound. Several bracket groups in one item expand to their
/// cartesian product.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlurmHostlist;

impl HostRangeExpander for SlurmHostlist {
    fn expand(&self, expression: &str) -> Result<Vec<String>, Report<HostRangeError>> {
        let mut hosts = Vec::new();
        for item in split_items(expression).map_err(|reason| error(expression, reason))? {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            hosts.extend(expand_item(item).map_err(|reason| error(expression, reason))?);
            if hosts.len() > MAX_HOSTS {
                return Err(error(expression, too_many_hosts()));
            }
        }
        Ok(hosts)
    }
}

fn error(expression: &str, reason: impl Into<String>) -> Report<HostRangeError> {
    Report::new(HostRangeError {
        expression: expression.to_string(),
        reason: reason.into(),
    })
}

/// Split on commas that are not inside brackets.
fn split_items(expression: &str) -> Result<Vec<&str>, String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in expression.char_indices() {
        match c {
            '[' if depth > 0 => return Err("nested brackets".to_string()),
            '[' => depth += 1,
            ']' if depth == 0 => return Err("unmatched `]`".to_string()),
            ']' => depth -= 1,
            ',' if depth == 0 => {
                items.push(&expression[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unmatched `[`".to_string());
    }
    items.push(&expression[start..]);
    Ok(items)
}

fn expand_item(item: &str) -> Result<Vec<String>, String> {
    let Some(open) = item.find('[') else {
        return Ok(vec![item.to_string()]);
    };
    let close = item[open..]
        .find(']')
        .map(|offset| open + offset)
        .ok_or_else(|| "unmatched `[`".to_string())?;

    let prefix = &item[..open];
    let numbers = expand_ranges(&item[open + 1..close])?;
    let suffixes = expand_item(&item[close + 1..])?;
    if numbers.len().saturating_mul(suffixes.len()) > MAX_HOSTS {
        return Err(too_many_hosts());
    }

    let mut hosts = Vec::with_capacity(numbers.len() * suffixes.len());
    for number in &numbers {
        for suffix in &suffixes {
            hosts.push(format!("{prefix}{number}{suffix}"));
        }
    }
    Ok(hosts)
}

fn expand_ranges(body: &str) -> Result<Vec<String>, String> {
    if body.trim().is_empty() {
        return Err("empty brackets".to_string());
    }

    let mut numbers = Vec::new();
    for part in body.split(',') {
        let part = part.trim();
        let (lo, hi) = part.split_once('-').unwrap_or((part, part));
        let width = lo.len();
        let start = parse_bound(lo)?;
        let end = parse_bound(hi)?;
        if end < start {
            return Err(format!("range `{part}` is reversed"));
        }
        let span = end - start;
        if span >= MAX_HOSTS as u64 || numbers.len() + span as usize >= MAX_HOSTS {
            return Err(too_many_hosts());
        }
        numbers.extend((start..=end).map(|n| format!("{n:0width$}")));
    }
    Ok(numbers)
}

fn too_many_hosts() -> String {
    format!("expands to more than {MAX_HOSTS} hosts")
}

fn parse_bound(bound: &str) -> Result<u64, String> {
    bound
        .parse::<u64>()
        .map_err(|_| format!("`{bound}` is not a number"))
}
