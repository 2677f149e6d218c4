use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use thiserror::Error;

/// Number of fields in a standard cron expression (no seconds)
const CRON_FIELDS: usize = 5;

const DAY_OF_WEEK_FIELD: usize = 4;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("schedule is empty")]
    Empty,
    #[error("unknown descriptor `{0}`")]
    UnknownDescriptor(String),
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid day-of-week `{0}`")]
    InvalidDayOfWeek(String),
    #[error("could not parse the schedule: {0}")]
    Invalid(#[from] cron::error::Error),
    #[error("schedule never fires after {0}")]
    Exhausted(DateTime<Utc>),
}

/// A validated 5-field cron expression
///
/// Accepts `minute hour day-of-month month day-of-week` plus the usual
/// descriptor shortcuts. Evaluated in UTC.
///
/// When both day fields are restricted a day matches if either of them does,
/// so such expressions are kept as two schedules.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    schedules: Vec<Schedule>,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ScheduleError::Empty);
        }

        let standard = expand_descriptor(trimmed)?;

        let fields: Vec<&str> = standard.split_whitespace().collect();
        if fields.len() != CRON_FIELDS {
            return Err(ScheduleError::FieldCount(fields.len()));
        }

        let (minute, hour, day_of_month, month) = (fields[0], fields[1], fields[2], fields[3]);
        let translated = translate_day_of_week(fields[DAY_OF_WEEK_FIELD])?;
        let day_of_week = translated.as_str();

        // the cron crate wants a leading seconds field
        let build = |dom: &str, dow: &str| {
            Schedule::from_str(&format!("0 {minute} {hour} {dom} {month} {dow}"))
        };

        let schedules = if is_unrestricted(day_of_month) || is_unrestricted(day_of_week) {
            vec![build(day_of_month, day_of_week)?]
        } else {
            vec![build(day_of_month, "*")?, build("*", day_of_week)?]
        };

        Ok(Self { schedules })
    }

    /// First firing strictly after `after`, if the schedule ever fires again
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedules
            .iter()
            .filter_map(|schedule| schedule.after(&after).next())
            .min()
    }
}

/// A bare `*` or `?` day field places no restriction; steps and lists do
fn is_unrestricted(field: &str) -> bool {
    matches!(field, "*" | "?")
}

fn expand_descriptor(expression: &str) -> Result<&str, ScheduleError> {
    if !expression.starts_with('@') {
        return Ok(expression);
    }

    match expression.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => Ok("0 0 1 1 *"),
        "@monthly" => Ok("0 0 1 * *"),
        "@weekly" => Ok("0 0 * * 0"),
        "@daily" | "@midnight" => Ok("0 0 * * *"),
        "@hourly" => Ok("0 * * * *"),
        _ => Err(ScheduleError::UnknownDescriptor(expression.to_string())),
    }
}

/// Convert numeric weekdays from the usual 0-7 numbering (0 and 7 are Sunday)
/// to the 1-7 numbering (1 is Sunday) used by the cron crate.
/// Names are left alone.
fn translate_day_of_week(field: &str) -> Result<String, ScheduleError> {
    let invalid = || ScheduleError::InvalidDayOfWeek(field.to_string());

    let mut parts = Vec::new();
    for part in field.split(',') {
        let (base, step) = match part.split_once('/') {
            Some((base, step)) => (base, Some(step)),
            None => (part, None),
        };
        let suffix = step.map(|s| format!("/{s}")).unwrap_or_default();

        match base.split_once('-') {
            Some((start, end)) => match (parse_weekday(start), parse_weekday(end)) {
                (Some(start), Some(end)) => {
                    let (start, end) = (start.ok_or_else(invalid)?, end.ok_or_else(invalid)?);
                    if start > end {
                        return Err(invalid());
                    }

                    if end < 7 {
                        parts.push(format!("{}-{}{suffix}", start + 1, end + 1));
                        continue;
                    }

                    // a range reaching 7 wraps around to Sunday
                    if start < 7 {
                        parts.push(format!("{}-7{suffix}", start + 1));
                    }
                    let step = match step {
                        Some(step) => step.parse::<u32>().map_err(|_| invalid())?,
                        None => 1,
                    };
                    if step == 0 {
                        return Err(invalid());
                    }
                    if (7 - start) % step == 0 {
                        parts.push("1".to_string());
                    }
                }
                (None, None) => parts.push(part.to_string()),
                _ => return Err(invalid()),
            },
            None => match parse_weekday(base) {
                Some(day) => {
                    let day = day.ok_or_else(invalid)?;
                    parts.push(format!("{}{suffix}", shift_weekday(day)));
                }
                None => parts.push(part.to_string()),
            },
        }
    }

    Ok(parts.join(","))
}

/// None if the token is not numeric, Some(None) if it is numeric but out of range
fn parse_weekday(token: &str) -> Option<Option<u32>> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(token.parse::<u32>().ok().filter(|day| *day <= 7))
}

fn shift_weekday(day: u32) -> u32 {
    if day == 7 { 1 } else { day + 1 }
}
