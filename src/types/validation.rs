//! Minimal request checks.
//!
//! Only constraints the upstream would reject with an opaque 400 are checked
//! here; everything else is left to the upstream.

use crate::{GatewayError, Result};

/// Largest page size the upstream accepts.
pub const MAX_LIMIT: u32 = 25;

pub(crate) fn check_scores(min: Option<f64>, max: Option<f64>) -> Result<()> {
    for score in [min, max].into_iter().flatten() {
        if !(0.0..=10.0).contains(&score) {
            return Err(GatewayError::Validation(format!(
                "score {score} is outside 0-10"
            )));
        }
    }
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(GatewayError::Validation(format!(
            "min_score {min} is greater than max_score {max}"
        )));
    }
    Ok(())
}

pub(crate) fn check_dates(start: Option<&str>, end: Option<&str>) -> Result<()> {
    for date in [start, end].into_iter().flatten() {
        if !is_iso_date(date) {
            return Err(GatewayError::Validation(format!(
                "date '{date}' is not in YYYY-MM-DD format"
            )));
        }
    }
    // ISO dates compare correctly as strings.
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(GatewayError::Validation(format!(
            "start_date {start} is after end_date {end}"
        )));
    }
    Ok(())
}

pub(crate) fn check_paging(page: Option<u32>, limit: Option<u32>) -> Result<()> {
    if page == Some(0) {
        return Err(GatewayError::Validation("page starts at 1".to_string()));
    }
    if let Some(limit) = limit
        && !(1..=MAX_LIMIT).contains(&limit)
    {
        return Err(GatewayError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    Ok(())
}

fn is_iso_date(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return false;
    };
    let numeric = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    if !(numeric(year, 4) && numeric(month, 2) && numeric(day, 2)) {
        return false;
    }
    let (Ok(month), Ok(day)) = (month.parse::<u32>(), day.parse::<u32>()) else {
        return false;
    };
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_in_range_pass() {
        assert!(check_scores(Some(6.5), Some(9.0)).is_ok());
        assert!(check_scores(None, None).is_ok());
    }

    #[test]
    fn inverted_scores_fail() {
        assert!(check_scores(Some(9.0), Some(6.0)).is_err());
        assert!(check_scores(Some(11.0), None).is_err());
    }

    #[test]
    fn dates_must_be_iso() {
        assert!(check_dates(Some("2020-01-31"), None).is_ok());
        assert!(check_dates(Some("2020-1-31"), None).is_err());
        assert!(check_dates(Some("2020-13-01"), None).is_err());
        assert!(check_dates(Some("yesterday"), None).is_err());
        assert!(check_dates(Some("2021-01-01"), Some("2020-01-01")).is_err());
    }

    #[test]
    fn paging_bounds() {
        assert!(check_paging(Some(1), Some(25)).is_ok());
        assert!(check_paging(Some(0), None).is_err());
        assert!(check_paging(None, Some(26)).is_err());
    }
}
