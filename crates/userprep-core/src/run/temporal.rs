use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use polars::prelude::{Column, DataType, NamedFrom, Series, TimeUnit};

use crate::errors::RunError;
use crate::PrepResult;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

const SECONDS_PER_DAY: i64 = 86_400;

/// Datetime from an ISO-like value. A bare date reads as midnight and a
/// trailing `Z` is ignored.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| parse_date(trimmed).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

/// Date from a date-only value, or the date part of a datetime value.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            let with_time = trimmed.strip_suffix('Z').unwrap_or(trimmed);
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(with_time, fmt).ok())
                .map(|parsed| parsed.date())
        })
}

pub(crate) fn parse_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
}

/// Cast a string column to a temporal dtype, value by value.
///
/// Values no format accepts become null. Non-temporal dtypes are an error.
pub(crate) fn cast_string_to_temporal(
    name: &str,
    column: &Column,
    dtype: &DataType,
) -> PrepResult<Column> {
    let strings = column.as_materialized_series().str().map_err(|err| {
        Box::new(RunError(format!(
            "failed to read temporal column {name} as string: {err}"
        )))
    })?;
    let physical = match dtype {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let values = strings
                .into_iter()
                .map(|value| {
                    value
                        .and_then(parse_datetime)
                        .and_then(|parsed| epoch_ticks(parsed, unit))
                })
                .collect::<Vec<_>>();
            Series::new(name.into(), values)
        }
        DataType::Date => {
            let values = strings
                .into_iter()
                .map(|value| value.and_then(parse_date).and_then(epoch_days))
                .collect::<Vec<_>>();
            Series::new(name.into(), values)
        }
        DataType::Time => {
            let values = strings
                .into_iter()
                .map(|value| value.and_then(parse_time).map(nanos_from_midnight))
                .collect::<Vec<_>>();
            Series::new(name.into(), values)
        }
        other => {
            return Err(Box::new(RunError(format!(
                "column {name}: {other} is not a temporal type"
            ))))
        }
    };
    let typed = physical.cast(dtype).map_err(|err| {
        Box::new(RunError(format!(
            "failed to build {dtype} column {name}: {err}"
        )))
    })?;
    Ok(typed.into())
}

pub(crate) fn is_temporal(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date | DataType::Time)
}

fn epoch_ticks(parsed: NaiveDateTime, unit: TimeUnit) -> Option<i64> {
    let utc = parsed.and_utc();
    match unit {
        TimeUnit::Nanoseconds => utc.timestamp_nanos_opt(),
        TimeUnit::Microseconds => Some(utc.timestamp_micros()),
        TimeUnit::Milliseconds => Some(utc.timestamp_millis()),
    }
}

fn epoch_days(date: NaiveDate) -> Option<i32> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    i32::try_from(midnight.and_utc().timestamp().div_euclid(SECONDS_PER_DAY)).ok()
}

fn nanos_from_midnight(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1_000_000_000 + i64::from(time.nanosecond())
}
