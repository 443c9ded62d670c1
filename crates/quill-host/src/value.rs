//! Host-resident value trees.
//!
//! Every value node lives behind an `Rc<RefCell<_>>` so that a container and
//! any number of guest handles can refer to the same node. Releasing a handle
//! drops one reference; the node itself goes away with its last reference.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::{HostError, HostResult};
use crate::html::HtmlSet;

/// Variant tag of a host resource, as reported by `type_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Kind {
    Null = 0,
    Int = 1,
    Float = 2,
    String = 3,
    Bool = 4,
    Array = 5,
    Object = 6,
    Date = 7,
    Node = 8,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "Null",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Bool => "Bool",
            Self::Array => "Array",
            Self::Object => "Object",
            Self::Date => "Date",
            Self::Node => "Node",
        };
        f.write_str(name)
    }
}

/// Shared reference to a value node.
pub type Slot = Rc<RefCell<Value>>;

/// A value node.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Array(Vec<Slot>),
    /// Keys enumerate in ascending order, so `keys` and `values` always pair up.
    Object(BTreeMap<String, Slot>),
    /// Milliseconds since the Unix epoch.
    Date(f64),
    /// Nodes of a parsed HTML document.
    Node(HtmlSet),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::String(_) => Kind::String,
            Self::Bool(_) => Kind::Bool,
            Self::Array(_) => Kind::Array,
            Self::Object(_) => Kind::Object,
            Self::Date(_) => Kind::Date,
            Self::Node(_) => Kind::Node,
        }
    }

    pub fn into_slot(self) -> Slot {
        Rc::new(RefCell::new(self))
    }

    /// Builds a value tree from parsed JSON.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(|item| Self::from_json(item).into_slot())
                    .collect(),
            ),
            serde_json::Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v).into_slot()))
                    .collect(),
            ),
        }
    }

    /// Renders the tree as JSON. Dates become their timestamp, nodes their markup.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Int(i) => (*i).into(),
            Self::Float(f) | Self::Date(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Node(nodes) => serde_json::Value::String(nodes.outer_html()),
            Self::Array(items) => items.iter().map(|i| i.borrow().to_json()).collect(),
            Self::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.borrow().to_json()))
                    .collect(),
            ),
        }
    }
}

/// Recursively duplicates a node so the copy shares nothing mutable with the source.
pub fn deep_copy(slot: &Slot) -> Slot {
    let copied = match &*slot.borrow() {
        Value::Array(items) => Value::Array(items.iter().map(deep_copy).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), deep_copy(v)))
                .collect(),
        ),
        other => other.clone(),
    };
    copied.into_slot()
}

/// Whether `target` is `root` or is reachable from it.
pub fn reaches(root: &Slot, target: &Slot) -> bool {
    if Rc::ptr_eq(root, target) {
        return true;
    }
    match &*root.borrow() {
        Value::Array(items) => items.iter().any(|item| reaches(item, target)),
        Value::Object(map) => map.values().any(|v| reaches(v, target)),
        _ => false,
    }
}

/// Parses `text` into epoch milliseconds.
///
/// `format` uses chrono's strftime syntax. Formats without an offset are
/// interpreted in `time_zone` (`UTC`, `GMT`, or `+HH:MM`); formats without a
/// time component are taken at midnight.
pub fn parse_date(
    text: &str,
    format: &str,
    locale: Option<&str>,
    time_zone: Option<&str>,
) -> HostResult<f64> {
    let parse_error = || HostError::DateParse {
        text: text.to_owned(),
        format: format.to_owned(),
    };

    if let Some(locale) = locale.filter(|l| !l.starts_with("en")) {
        tracing::debug!(locale, "date locale not supported, parsing with English names");
    }

    let offset = match time_zone {
        Some(tz) => parse_offset(tz).ok_or_else(parse_error)?,
        None => FixedOffset::east_opt(0).ok_or_else(parse_error)?,
    };

    let text = text.trim();
    let millis = if let Ok(dt) = DateTime::parse_from_str(text, format) {
        dt.timestamp_millis()
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
        naive
            .and_local_timezone(offset)
            .single()
            .ok_or_else(parse_error)?
            .timestamp_millis()
    } else {
        let date = NaiveDate::parse_from_str(text, format).map_err(|_| parse_error())?;
        date.and_hms_opt(0, 0, 0)
            .and_then(|naive| naive.and_local_timezone(offset).single())
            .ok_or_else(parse_error)?
            .timestamp_millis()
    };

    #[allow(clippy::cast_precision_loss)]
    Ok(millis as f64)
}

fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let tz = tz.trim();
    if tz.is_empty() || tz.eq_ignore_ascii_case("utc") || tz.eq_ignore_ascii_case("gmt") {
        return FixedOffset::east_opt(0);
    }
    let rest = tz
        .strip_prefix("UTC")
        .or_else(|| tz.strip_prefix("GMT"))
        .unwrap_or(tz);
    let (sign, digits) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    let seconds = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?;
    FixedOffset::east_opt(seconds.checked_mul(sign)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_numbers_split_into_int_and_float() {
        let json: serde_json::Value = serde_json::from_str(r#"[1, 2.5, -3]"#).unwrap();
        let Value::Array(items) = Value::from_json(&json) else {
            panic!("expected array");
        };
        let kinds: Vec<Kind> = items.iter().map(|i| i.borrow().kind()).collect();
        assert_eq!(kinds, vec![Kind::Int, Kind::Float, Kind::Int]);
    }

    #[test]
    fn deep_copy_is_independent() {
        let inner = Value::Int(1).into_slot();
        let outer = Value::Array(vec![inner.clone()]).into_slot();
        let copy = deep_copy(&outer);
        *inner.borrow_mut() = Value::Int(2);
        let Value::Array(items) = &*copy.borrow() else {
            panic!("expected array");
        };
        assert!(matches!(*items[0].borrow(), Value::Int(1)));
    }

    #[test]
    fn reaches_finds_nested_containers() {
        let leaf = Value::Object(BTreeMap::new()).into_slot();
        let mid = Value::Array(vec![leaf.clone()]).into_slot();
        let root = Value::Array(vec![mid.clone()]).into_slot();
        assert!(reaches(&root, &leaf));
        assert!(!reaches(&leaf, &root));
    }

    #[test]
    fn parses_plain_dates_at_midnight_utc() {
        let ms = parse_date("2021-03-04", "%Y-%m-%d", None, None).unwrap();
        assert!((ms - 1_614_816_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn applies_fixed_offsets() {
        let utc = parse_date("2021-03-04 09:00", "%Y-%m-%d %H:%M", None, Some("UTC")).unwrap();
        let tokyo =
            parse_date("2021-03-04 09:00", "%Y-%m-%d %H:%M", None, Some("+09:00")).unwrap();
        assert!((utc - tokyo - 9.0 * 3_600_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn offsets_out_of_range_are_rejected() {
        assert_eq!(
            parse_offset("-05:30").map(|o| o.local_minus_utc()),
            Some(-19_800)
        );
        assert_eq!(parse_offset("+99:99"), None);
        assert_eq!(parse_offset("+9"), FixedOffset::east_opt(32_400));
    }

    #[test]
    fn parses_english_month_names() {
        let ms = parse_date("Mar 4, 2021", "%b %d, %Y", Some("en_US"), None).unwrap();
        assert!((ms - 1_614_816_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_mismatched_text() {
        let err = parse_date("yesterday", "%Y-%m-%d", None, None).unwrap_err();
        assert!(matches!(err, HostError::DateParse { .. }));
    }
}
