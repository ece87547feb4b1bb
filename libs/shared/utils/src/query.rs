use std::fmt::Display;
use std::str::FromStr;

use shared_models::error::AppError;

/// Parses an optional query-string filter. A missing or blank value means
/// "no filter"; anything else must parse as `T`.
pub fn optional_param<T>(name: &str, raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::BadRequest(format!("Invalid {} '{}': {}", name, value, e))),
    }
}
