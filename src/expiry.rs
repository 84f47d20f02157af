//! Signed response URL expiry checks.
//!
//! CloudFormation hands out pre-signed S3 URLs. Legacy (SigV2) URLs carry an
//! absolute `Expires` epoch; SigV4 URLs carry the signing time in
//! `X-Amz-Date` and a lifetime in `X-Amz-Expires`.

use crate::error::ExpiryParseError;
use crate::types::CallbackAddress;
use std::time::Duration;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use url::form_urlencoded;

/// Signed expiry of the callback address.
///
/// # Errors
/// Returns [`ExpiryParseError::Missing`] if no expiry parameter is present and
/// [`ExpiryParseError::Malformed`] if one cannot be parsed.
pub fn expires_at(address: &CallbackAddress) -> Result<OffsetDateTime, ExpiryParseError> {
    let query = address
        .path
        .split_once('?')
        .map(|(_, query)| query)
        .ok_or(ExpiryParseError::Missing)?;

    let mut expires = None;
    let mut amz_date = None;
    let mut amz_expires = None;
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        match name.as_ref() {
            "Expires" => expires = Some(value.into_owned()),
            "X-Amz-Date" => amz_date = Some(value.into_owned()),
            "X-Amz-Expires" => amz_expires = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(raw) = expires {
        let secs = parse_seconds("Expires", &raw)?;
        return OffsetDateTime::from_unix_timestamp(secs).map_err(|_| malformed("Expires", &raw));
    }

    match (amz_date, amz_expires) {
        (Some(date), Some(lifetime)) => {
            let signed_at = PrimitiveDateTime::parse(
                &date,
                format_description!("[year][month][day]T[hour][minute][second]Z"),
            )
            .map_err(|_| malformed("X-Amz-Date", &date))?
            .assume_utc();
            let lifetime = parse_seconds("X-Amz-Expires", &lifetime)?;
            signed_at
                .checked_add(time::Duration::seconds(lifetime))
                .ok_or_else(|| malformed("X-Amz-Expires", &lifetime.to_string()))
        }
        _ => Err(ExpiryParseError::Missing),
    }
}

/// Whether the callback window is too short to schedule another invocation,
/// measured against the current time.
///
/// # Errors
/// Propagates [`expires_at`] failures; an unknown expiry is never treated as
/// "not expired".
pub fn is_expired(
    address: &CallbackAddress,
    safety_margin: Duration,
) -> Result<bool, ExpiryParseError> {
    is_expired_at(address, safety_margin, OffsetDateTime::now_utc())
}

/// Whether `expiry <= now + safety_margin`, with `now` rounded up to whole
/// seconds.
///
/// # Errors
/// Same as [`is_expired`].
pub fn is_expired_at(
    address: &CallbackAddress,
    safety_margin: Duration,
    now: OffsetDateTime,
) -> Result<bool, ExpiryParseError> {
    let expiry = expires_at(address)?.unix_timestamp();
    let margin = i64::try_from(safety_margin.as_secs()).unwrap_or(i64::MAX);
    Ok(expiry <= ceil_seconds(now).saturating_add(margin))
}

fn ceil_seconds(now: OffsetDateTime) -> i64 {
    let secs = now.unix_timestamp();
    if now.nanosecond() > 0 { secs + 1 } else { secs }
}

fn parse_seconds(parameter: &'static str, raw: &str) -> Result<i64, ExpiryParseError> {
    raw.trim().parse().map_err(|_| malformed(parameter, raw))
}

fn malformed(parameter: &'static str, value: &str) -> ExpiryParseError {
    ExpiryParseError::Malformed {
        parameter,
        value: value.to_string(),
    }
}
