//! Identity provider identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Third-party OAuth provider a user can federate with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Kakao,
    Naver,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Kakao, Provider::Naver];

    /// Path segment and log label
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Kakao => "kakao",
            Provider::Naver => "naver",
        }
    }

    /// Cookie holding the provider-issued access token
    pub fn access_cookie(&self) -> &'static str {
        match self {
            Provider::Kakao => "kakaoAccessToken",
            Provider::Naver => "naverAccessToken",
        }
    }

    /// Cookie holding the provider-issued refresh token
    pub fn refresh_cookie(&self) -> &'static str {
        match self {
            Provider::Kakao => "kakaoRefreshToken",
            Provider::Naver => "naverRefreshToken",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_names_are_distinct() {
        let mut names: Vec<&str> = Provider::ALL
            .iter()
            .flat_map(|p| [p.access_cookie(), p.refresh_cookie()])
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }
}
