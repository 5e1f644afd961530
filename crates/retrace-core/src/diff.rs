//! Structural diff between a record's previous and incoming state.
//!
//! The diff is a forward diff: it maps each changed field to its new value.
//! Fields present only in `previous` map to `null`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::errors::CoreError;
use crate::record::{Record, record_id};

/// What to do with an update whose incoming payload is absent or empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmptyIncomingPolicy {
    /// Fail with `CoreError::EmptyIncoming`.
    #[default]
    Reject,
    /// Diff against an empty object, recording every previous field as `null`.
    DiffAgainstEmpty,
}

impl EmptyIncomingPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::DiffAgainstEmpty => "diff_against_empty",
        }
    }
}

/// Compute the fields of `incoming` that differ from `previous`.
///
/// Nested objects and arrays compare structurally; numbers compare by value,
/// so `1` and `1.0` are equal. An empty result means nothing changed.
#[must_use]
pub fn diff(previous: &Record, incoming: &Record) -> Record {
    let mut changes = Record::new();

    for (key, new_value) in incoming {
        match previous.get(key) {
            Some(old_value) if values_equal(old_value, new_value) => {}
            _ => {
                changes.insert(key.clone(), new_value.clone());
            }
        }
    }

    for key in previous.keys() {
        if !incoming.contains_key(key) {
            changes.insert(key.clone(), Value::Null);
        }
    }

    changes
}

/// Diff an update, applying `policy` when `incoming` is absent or empty.
///
/// # Errors
///
/// Returns `CoreError::EmptyIncoming` under `EmptyIncomingPolicy::Reject`, and
/// `CoreError::MissingId` if the rejected record has no id to report.
pub fn compute_update_diff(
    previous: &Record,
    incoming: Option<&Record>,
    policy: EmptyIncomingPolicy,
) -> Result<Record, CoreError> {
    match incoming {
        Some(incoming) if !incoming.is_empty() => Ok(diff(previous, incoming)),
        _ => match policy {
            EmptyIncomingPolicy::Reject => Err(CoreError::EmptyIncoming {
                origin: record_id(previous)?.to_string(),
            }),
            EmptyIncomingPolicy::DiffAgainstEmpty => Ok(diff(previous, &Record::new())),
        },
    }
}

/// Deep equality with numeric comparison by value.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Integers compare exactly. An integer equals a float only when the float is
/// whole and converts back to exactly that integer.
fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (x.is_f64(), y.is_f64()) {
        (false, false) => x == y,
        (true, true) => x.as_f64() == y.as_f64(),
        (true, false) => float_equals_integer(x, y),
        (false, true) => float_equals_integer(y, x),
    }
}

// 2^63 and 2^64 are exact in f64; whole floats below them cast without loss.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_equals_integer(float: &Number, integer: &Number) -> bool {
    let Some(f) = float.as_f64() else {
        return false;
    };
    if f.trunc() != f {
        return false;
    }
    if let Some(i) = integer.as_i64() {
        (-I64_BOUND..I64_BOUND).contains(&f) && f as i64 == i
    } else if let Some(u) = integer.as_u64() {
        (0.0..U64_BOUND).contains(&f) && f as u64 == u
    } else {
        false
    }
}
