//! Best-effort repair of model-produced JSON.
//!
//! Only trailing commas (`,` directly before `}` or `]`, whitespace allowed
//! in between) are removed, and never inside string values. Anything else is
//! left for the parser to reject.

use serde_json::Value;
use tracing::error;

use crate::error::{Error, Result};

/// Strip trailing commas until none are left.
pub fn strip_trailing_commas(text: &str) -> String {
    let mut current = text.to_string();
    while let Some(next) = strip_pass(&current) {
        current = next;
    }
    current
}

/// One left-to-right pass. Returns `None` when nothing was removed.
///
/// A dropped comma takes the whitespace after it along, so `[1,, ]` needs a
/// second pass to become `[1]`.
fn strip_pass(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut changed = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '"' => in_string = true,
            ',' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if matches!(chars.get(j), Some('}') | Some(']')) {
                    changed = true;
                    i = j;
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
        i += 1;
    }

    changed.then_some(out)
}

/// Repair and parse. On failure the decode error and the repaired text are
/// returned so the caller can report them.
pub fn correct_json(text: &str) -> Result<Value> {
    let repaired = strip_trailing_commas(text);
    serde_json::from_str(&repaired).map_err(|e| {
        error!("SanitizationError: {} for JSON: {}", e, repaired);
        Error::Sanitization {
            reason: e.to_string(),
            text: repaired,
        }
    })
}
