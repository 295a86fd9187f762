use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number as JsonNumber;

use crate::ParseError;

/// A configuration number, held as a finite IEEE-754 double.
#[derive(Clone, Copy, Debug, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Number(f64);

impl Number {
    /// Creates a new [`Number`] after validating finiteness.
    ///
    /// ```
    /// # use configdiff_core::Number;
    /// let num = Number::new(42.0)?;
    /// assert_eq!(num.get(), 42.0);
    /// # Ok::<(), configdiff_core::ParseError>(())
    /// ```
    pub fn new(value: f64) -> Result<Self, ParseError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(ParseError::NotFinite { value })
        }
    }

    /// Returns the raw floating-point value.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }

    /// Returns the value as an integer when it has no fractional part.
    #[must_use]
    pub fn as_integer(self) -> Option<i64> {
        if self.0.fract() == 0.0 && (i64::MIN as f64) <= self.0 && self.0 <= (i64::MAX as f64) {
            Some(self.0 as i64)
        } else {
            None
        }
    }

    /// Converts the number into a `serde_json::Number` using minimal integer representation when possible.
    pub fn to_json_number(self) -> JsonNumber {
        if !(self.0 == 0.0 && self.0.is_sign_negative()) {
            if let Some(int) = self.as_integer() {
                return JsonNumber::from(int);
            }
        }
        // Finiteness is checked at construction.
        JsonNumber::from_f64(self.0).unwrap_or_else(|| JsonNumber::from(0))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_integer() {
            Some(int) => write!(f, "{int}"),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(Number::new(3.0).unwrap().to_string(), "3");
        assert_eq!(Number::new(-0.0).unwrap().to_string(), "0");
        assert_eq!(Number::new(1.5).unwrap().to_string(), "1.5");
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(matches!(Number::new(f64::NAN), Err(ParseError::NotFinite { .. })));
        assert!(Number::new(f64::INFINITY).is_err());
    }

    #[test]
    fn json_number_is_minimal() {
        assert_eq!(Number::new(5.0).unwrap().to_json_number().to_string(), "5");
        assert_eq!(Number::new(0.25).unwrap().to_json_number().to_string(), "0.25");
    }
}
