//! Gender Value Object
//!
//! Common vocabulary for the local signup form and both providers,
//! which report gender with different spellings.

use std::fmt;
use std::str::FromStr;

use kernel::error::app_error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    /// Kakao reports `"male"` / `"female"` or omits the field
    pub fn from_kakao(value: Option<&str>) -> Self {
        match value {
            Some("male") => Gender::Male,
            Some("female") => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    /// Naver reports `"M"` / `"F"` / `"U"`
    pub fn from_naver(value: Option<&str>) -> Self {
        match value {
            Some("M") => Gender::Male,
            Some("F") => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    /// Stored values were written by [`Gender::as_str`]
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "unknown" | "u" => Ok(Gender::Unknown),
            _ => Err(AppError::bad_request(
                "Gender must be one of male, female, unknown",
            )),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_vocabularies() {
        assert_eq!(Gender::from_kakao(Some("female")), Gender::Female);
        assert_eq!(Gender::from_kakao(None), Gender::Unknown);
        assert_eq!(Gender::from_naver(Some("M")), Gender::Male);
        assert_eq!(Gender::from_naver(Some("U")), Gender::Unknown);
        // Naver letters are not Kakao words
        assert_eq!(Gender::from_kakao(Some("M")), Gender::Unknown);
    }

    #[test]
    fn test_parse_form_value() {
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" male ".parse::<Gender>().unwrap(), Gender::Male);
        assert!("robot".parse::<Gender>().is_err());
    }
}
