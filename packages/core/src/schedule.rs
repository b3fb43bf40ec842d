//! Repeat-schedule expressions.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

const EVERY: &str = "@every";

#[derive(thiserror::Error, Debug)]
pub enum ScheduleError {
    #[error("invalid interval in schedule '{expression}': {source}")]
    InvalidInterval {
        expression: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("schedule '{expression}' has a zero interval")]
    ZeroInterval { expression: String },

    #[error("invalid cron expression '{expression}': {message}")]
    InvalidCron { expression: String, message: String },
}

/// When a repeated run should fire next.
///
/// Accepted forms:
/// - a cron expression with a leading seconds field, evaluated in UTC:
///   `sec min hour day-of-month month [day-of-week]`. Day of week numbers
///   run from 0 (Sunday) to 6 (Saturday) and an omitted day of week means
///   `*`. Shorthands such as `@hourly` and `@daily` are accepted too.
/// - `@every <duration>` with a human readable duration (`"@every 1h 30m"`)
#[derive(Clone, Debug)]
pub enum Schedule {
    Cron {
        expression: String,
        schedule: Box<cron::Schedule>,
    },
    Every(Duration),
}

impl Schedule {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let expression = expression.trim();

        if let Some(interval) = expression.strip_prefix(EVERY) {
            let interval = humantime::parse_duration(interval.trim()).map_err(|source| {
                ScheduleError::InvalidInterval {
                    expression: expression.to_string(),
                    source,
                }
            })?;
            if interval.is_zero() {
                return Err(ScheduleError::ZeroInterval {
                    expression: expression.to_string(),
                });
            }
            return Ok(Schedule::Every(interval));
        }

        let invalid = |message: String| ScheduleError::InvalidCron {
            expression: expression.to_string(),
            message,
        };
        let normalized = normalize_cron(expression).map_err(invalid)?;
        let schedule =
            cron::Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))?;
        Ok(Schedule::Cron {
            expression: expression.to_string(),
            schedule: Box::new(schedule),
        })
    }

    /// How long to wait after `now` for the next tick.
    ///
    /// `None` means the schedule will never fire again.
    pub fn delay_after(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Schedule::Every(interval) => Some(*interval),
            Schedule::Cron { schedule, .. } => schedule
                .after(&now)
                .next()
                .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO)),
        }
    }
}

/// Rewrite a seconds-first expression into the `cron` crate's dialect, which
/// numbers days of the week from 1 (Sunday) to 7 and requires the field.
fn normalize_cron(expression: &str) -> Result<String, String> {
    if expression.starts_with('@') {
        return Ok(expression.to_string());
    }

    let mut fields: Vec<String> = expression.split_whitespace().map(str::to_string).collect();
    match fields.len() {
        5 => fields.push("*".to_string()),
        6 => {
            let day_of_week = shift_day_of_week(&fields[5])?;
            fields[5] = day_of_week;
        }
        n => {
            return Err(format!(
                "expected 5 or 6 fields (sec min hour dom month [dow]), got {}",
                n
            ))
        }
    }
    Ok(fields.join(" "))
}

fn shift_day_of_week(field: &str) -> Result<String, String> {
    let items = field
        .split(',')
        .map(|item| -> Result<String, String> {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };
            let range = range
                .split('-')
                .map(|bound| match bound.parse::<u8>() {
                    Ok(day @ 0..=6) => Ok((day + 1).to_string()),
                    Ok(day) => Err(format!("day of week {} is out of range 0-6", day)),
                    Err(_) => Ok(bound.to_string()),
                })
                .collect::<Result<Vec<_>, _>>()?
                .join("-");
            Ok(match step {
                Some(step) => format!("{}/{}", range, step),
                None => range,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items.join(","))
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schedule::parse(s)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Cron { expression, .. } => f.write_str(expression),
            Schedule::Every(interval) => {
                write!(f, "{} {}", EVERY, humantime::format_duration(*interval))
            }
        }
    }
}
