//! Supported profile platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A platform a profile link can point to.
///
/// The wire and storage representation is the camelCase name returned by
/// [`Platform::as_str`]. A user holds at most one link per platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Platform {
    Github,
    FrontendMentor,
    Twitter,
    Linkedin,
    Youtube,
    Facebook,
    Twitch,
    DevTo,
    Codewars,
    FreeCodeCamp,
    Gitlab,
    Hashnode,
    StackOverflow,
}

impl Platform {
    /// Every supported platform, in catalogue order.
    pub const ALL: [Platform; 13] = [
        Platform::Github,
        Platform::FrontendMentor,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Youtube,
        Platform::Facebook,
        Platform::Twitch,
        Platform::DevTo,
        Platform::Codewars,
        Platform::FreeCodeCamp,
        Platform::Gitlab,
        Platform::Hashnode,
        Platform::StackOverflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Github => "github",
            Platform::FrontendMentor => "frontendMentor",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
            Platform::Twitch => "twitch",
            Platform::DevTo => "devTo",
            Platform::Codewars => "codewars",
            Platform::FreeCodeCamp => "freeCodeCamp",
            Platform::Gitlab => "gitlab",
            Platform::Hashnode => "hashnode",
            Platform::StackOverflow => "stackOverflow",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a supported platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_platform() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("GitHub".parse::<Platform>().is_err());
        assert!("devto".parse::<Platform>().is_err());
    }

    #[test]
    fn test_serde_matches_as_str() {
        for platform in Platform::ALL {
            let encoded = serde_json::to_string(&platform).unwrap();
            assert_eq!(encoded, format!("\"{}\"", platform.as_str()));
        }
    }

    #[test]
    fn test_unknown_platform_message() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported platform: myspace");
    }
}
