// List filter: scopes a files.list query to one user and an optional
// creation-time window. Dates come from the CLI as `YYYYMMDD` strings.

use chrono::{Local, NaiveDate, TimeDelta, TimeZone};
use log::warn;

/// Date format accepted by `--from` / `--to`.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// The (user, lower bound, upper bound) triple used to scope a listing.
/// Bounds are inclusive epoch seconds; `None` means unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListFilter {
    pub user: String,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl ListFilter {
    /// Query parameters for files.list, in the order they are sent.
    /// Unset bounds are left out entirely rather than sent as zero.
    pub fn query_params(&self, token: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("token", token.to_string()), ("user", self.user.clone())];
        if let Some(from) = self.from {
            params.push(("ts_from", from.to_string()));
        }
        if let Some(to) = self.to {
            params.push(("ts_to", to.to_string()));
        }
        params
    }
}

/// Build a filter from CLI-supplied date strings.
///
/// A date that is empty or does not parse as `YYYYMMDD` leaves that side
/// unbounded. This is not reported as an error, only logged.
pub fn build_filter(user: &str, from: Option<&str>, to: Option<&str>) -> ListFilter {
    ListFilter {
        user: user.to_string(),
        from: from.and_then(|s| parse_bound("from", s)),
        to: to.and_then(|s| parse_bound("to", s)),
    }
}

fn parse_bound(side: &str, raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    let date = match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            warn!("ignoring --{} {:?}: expected a date like 20240131", side, raw);
            return None;
        }
    };
    let ts = local_midnight(date);
    if ts.is_none() {
        warn!("ignoring --{} {}: no valid local time on that day", side, raw);
    }
    ts
}

/// Epoch seconds of local midnight on `date`.
pub fn local_midnight(date: NaiveDate) -> Option<i64> {
    midnight_in(&Local, date)
}

/// Epoch seconds of midnight on `date` in `tz`. When a clock change skips
/// midnight, the first valid instant after it is used instead.
pub fn midnight_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<i64> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    (0..=GAP_SEARCH_STEPS)
        .map(|step| midnight + TimeDelta::minutes(15 * step))
        .find_map(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp())
}

// Clock changes move in multiples of 15 minutes and never by more than a
// few hours.
const GAP_SEARCH_STEPS: i64 = 16;
