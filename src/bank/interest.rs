//! Simple and annually compounded interest on a principal.
use thiserror::Error;

/// Errors that can occur when quoting interest.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterestError {
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    #[error("{0} must not be negative")]
    Negative(&'static str),
}

/// Interest earned on a principal over a number of years.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestQuote {
    pub principal: f64,
    /// Annual rate in percent, e.g. 5.0 for 5%.
    pub rate_percent: f64,
    pub years: f64,
    pub simple: f64,
    pub compound: f64,
}

fn check(name: &'static str, value: f64) -> Result<f64, InterestError> {
    if !value.is_finite() {
        Err(InterestError::NotFinite(name))
    } else if value < 0.0 {
        Err(InterestError::Negative(name))
    } else {
        Ok(value)
    }
}

/// Simple interest: `p * r * t`.
pub fn simple_interest(principal: f64, rate_percent: f64, years: f64) -> f64 {
    principal * (rate_percent / 100.0) * years
}

/// Interest compounded once a year: `p * (1 + r)^t - p`.
pub fn compound_interest(principal: f64, rate_percent: f64, years: f64) -> f64 {
    principal * (1.0 + rate_percent / 100.0).powf(years) - principal
}

/// Quotes both kinds of interest after validating the inputs.
pub fn quote(principal: f64, rate_percent: f64, years: f64) -> Result<InterestQuote, InterestError> {
    let principal = check("principal", principal)?;
    let rate_percent = check("rate", rate_percent)?;
    let years = check("time", years)?;
    Ok(InterestQuote {
        principal,
        rate_percent,
        years,
        simple: simple_interest(principal, rate_percent, years),
        compound: compound_interest(principal, rate_percent, years),
    })
}
