use serde_json::{Map, Value};

use crate::profile::models::{Profile, LEADERSHIP_FLAGS, LEADERSHIP_SIGNALS, MENTORED};

/// String spellings of a false flag. Any other non-blank string is true.
const FALSY_STRINGS: &[&str] = &["false", "no", "0"];

/// Coerces every entry's leadership signals into canonical types, in place:
/// flags become booleans and `mentored` a non-negative integer.
/// Entries whose `leadershipSignals` is not an object are left alone.
/// Applying it twice gives the same result as applying it once.
pub fn normalize_profile(profile: &mut Profile) {
    let Some(entries) = profile.experiences_mut() else {
        return;
    };
    for entry in entries.iter_mut() {
        if let Some(signals) = entry
            .get_mut(LEADERSHIP_SIGNALS)
            .and_then(Value::as_object_mut)
        {
            normalize_signals(signals);
        }
    }
}

pub fn normalize_signals(signals: &mut Map<String, Value>) {
    for flag in LEADERSHIP_FLAGS {
        let canonical = coerce_flag(signals.get(flag));
        signals.insert(flag.to_string(), Value::Bool(canonical));
    }
    let mentored = coerce_count(signals.get(MENTORED));
    signals.insert(MENTORED.to_string(), Value::from(mentored));
}

fn coerce_flag(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.trim().to_lowercase();
            !(s.is_empty() || FALSY_STRINGS.contains(&s.as_str()))
        }
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}

fn coerce_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                u
            } else {
                n.as_f64().map(truncate_count).unwrap_or(0)
            }
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(|i| i.max(0) as u64)
                .or_else(|_| s.parse::<f64>().map(truncate_count))
                .unwrap_or(0)
        }
        Some(Value::Bool(b)) => u64::from(*b),
        _ => 0,
    }
}

fn truncate_count(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.trunc() as u64
    } else {
        0
    }
}
