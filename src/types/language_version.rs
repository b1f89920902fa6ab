use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A `major.minor` language version, used to gate rules that only make sense
/// for newer toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageVersion {
    pub major: u32,
    pub minor: u32,
}

impl LanguageVersion {
    pub const FOUR: LanguageVersion = LanguageVersion::new(4, 0);
    pub const FIVE: LanguageVersion = LanguageVersion::new(5, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

/// Sources are assumed to target 5.0 unless configured otherwise.
impl Default for LanguageVersion {
    fn default() -> Self {
        Self::FIVE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid language version '{0}', expected MAJOR or MAJOR.MINOR")]
pub struct LanguageVersionError(pub String);

impl FromStr for LanguageVersion {
    type Err = LanguageVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| LanguageVersionError(s.to_string()))?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| LanguageVersionError(s.to_string()))?,
            None => 0,
        };
        // Patch components are accepted and ignored
        if let Some(patch) = parts.next()
            && patch.parse::<u32>().is_err()
        {
            return Err(LanguageVersionError(s.to_string()));
        }
        if parts.next().is_some() {
            return Err(LanguageVersionError(s.to_string()));
        }
        Ok(Self { major, minor })
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl<'de> Deserialize<'de> for LanguageVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for LanguageVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
