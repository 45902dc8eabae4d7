//! The `resultMsg` grammar: records separated by `|`, fields by `-`.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use super::items::Record;
use crate::error::GatewayError;

/// Payload meaning "no results".
pub const NO_RESULTS: &str = "0";

const RECORD_SEP: char = '|';
const FIELD_SEP: char = '-';

/// Positional fields of one record.
#[derive(Debug)]
pub struct Fields<'a> {
    record: &'a str,
    parts: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    pub fn split(record: &'a str) -> Self {
        Self {
            record,
            parts: record.split(FIELD_SEP).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn int(&self, idx: usize) -> Result<i64, GatewayError> {
        let raw = self.parts.get(idx).ok_or_else(|| {
            GatewayError::Decode(format!("record `{}` has no field {idx}", self.record))
        })?;
        raw.trim().parse().map_err(|_| {
            GatewayError::Decode(format!(
                "field {idx} of record `{}` is not a number: `{raw}`",
                self.record
            ))
        })
    }
}

/// Non-empty record segments of `msg`, or `None` for the `"0"` sentinel.
///
/// Empty segments (the upstream often ends the payload with `|`) are
/// skipped.
pub fn segments(msg: &str) -> Option<impl Iterator<Item = &str>> {
    if msg.trim() == NO_RESULTS {
        return None;
    }
    Some(
        msg.split(RECORD_SEP)
            .map(str::trim)
            .filter(|s| !s.is_empty()),
    )
}

/// Decode every record of `msg` as `T`. The sentinel decodes to an empty
/// list.
pub fn records<T: Record>(msg: &str) -> Result<Vec<T>, GatewayError> {
    match segments(msg) {
        Some(parts) => parts.map(record::<T>).collect(),
        None => Ok(Vec::new()),
    }
}

/// Decode only the first record of `msg`; `None` for the sentinel or an
/// empty payload.
pub fn first_record<T: Record>(msg: &str) -> Result<Option<T>, GatewayError> {
    match segments(msg).and_then(|mut s| s.next()) {
        Some(segment) => record::<T>(segment).map(Some),
        None => Ok(None),
    }
}

fn record<T: Record>(segment: &str) -> Result<T, GatewayError> {
    let fields = Fields::split(segment);
    if fields.len() < T::FIELDS {
        return Err(GatewayError::Decode(format!(
            "record `{segment}` has {} fields, expected {}",
            fields.len(),
            T::FIELDS
        )));
    }
    T::from_fields(&fields)
}

/// Map `N` dash-separated daily prices to `timestamp -> price`.
///
/// Price `i` (oldest first) lands on `now - (N - 1 - i)` days, so the last
/// price is stamped with `now` itself.
pub fn price_history(msg: &str, now: DateTime<Utc>) -> BTreeMap<String, String> {
    let prices: Vec<&str> = msg
        .trim_end_matches(RECORD_SEP)
        .split(FIELD_SEP)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let n = prices.len() as i64;

    prices
        .into_iter()
        .enumerate()
        .map(|(i, price)| {
            let day = now - Duration::days(n - 1 - i as i64);
            (day.timestamp().to_string(), price.to_owned())
        })
        .collect()
}
