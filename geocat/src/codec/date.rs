use chrono::{DateTime, Utc};
use geocat_core::catalog::Metadata;
use serde::Serialize;

/// RFC 7231 date, e.g. `Tue, 15 Nov 1994 08:12:31 GMT`.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A point in time as an HTTP date plus a human readable distance from now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateJson {
    pub timestamp: String,
    pub pretty: String,
}

#[must_use]
pub fn encode_date(date: DateTime<Utc>, now: DateTime<Utc>) -> DateJson {
    DateJson {
        timestamp: date.format(HTTP_DATE_FORMAT).to_string(),
        pretty: pretty_relative(date, now),
    }
}

/// `created` and `modified` of an entry, when known.
#[must_use]
pub(crate) fn encode_metadata(
    metadata: &Metadata,
    now: DateTime<Utc>,
) -> (Option<DateJson>, Option<DateJson>) {
    (
        metadata.created.map(|d| encode_date(d, now)),
        metadata.modified.map(|d| encode_date(d, now)),
    )
}

const UNITS: &[(u64, &str)] = &[
    (31_556_952, "year"),
    (2_629_746, "month"),
    (604_800, "week"),
    (86_400, "day"),
    (3_600, "hour"),
    (60, "minute"),
];

/// Distance between `date` and `now` in the largest whole unit, e.g. `3 days ago`.
#[must_use]
pub fn pretty_relative(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(date);
    let suffix = if delta.num_seconds() < 0 {
        "from now"
    } else {
        "ago"
    };
    let seconds = delta.num_seconds().unsigned_abs();
    match UNITS.iter().find(|(length, _)| seconds >= *length) {
        Some((length, unit)) => {
            let count = seconds / length;
            let plural = if count == 1 { "" } else { "s" };
            format!("{count} {unit}{plural} {suffix}")
        }
        None => format!("moments {suffix}"),
    }
}
