// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidDate,
    InvalidDateTime,
    InvalidNumber,
    InvalidBool,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate => f.write_str("invalid date value"),
            Self::InvalidDateTime => f.write_str("invalid datetime value"),
            Self::InvalidNumber => f.write_str("invalid numeric value"),
            Self::InvalidBool => f.write_str("invalid boolean value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn parse_date(input: &str) -> ValidationResult<Date> {
    let trimmed = input.trim();
    // Accept a full timestamp too and keep its calendar date.
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(date_part, &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)
}

pub fn parse_datetime(input: &str) -> ValidationResult<OffsetDateTime> {
    let trimmed = input.trim();
    if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(value);
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        trimmed,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }
    if trimmed.len() == DATE_LAYOUT.len() {
        let date = parse_date(trimmed).map_err(|_| ValidationError::InvalidDateTime)?;
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc());
    }
    Err(ValidationError::InvalidDateTime)
}

pub fn parse_number(input: &str) -> ValidationResult<f64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|ch| *ch != ',' && *ch != '_')
        .collect();
    if cleaned.is_empty() {
        return Err(ValidationError::InvalidNumber);
    }
    let value = cleaned
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidNumber)?;
    if !value.is_finite() {
        return Err(ValidationError::InvalidNumber);
    }
    Ok(value)
}

pub fn parse_bool(input: &str) -> ValidationResult<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ValidationError::InvalidBool),
    }
}
