use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A threshold of at least 1.
///
/// Rejected while deserializing, so `warning = 0` fails configuration
/// instead of flagging every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositiveUsize(usize);

impl PositiveUsize {
    pub fn new(value: usize) -> Result<Self, PositiveUsizeError> {
        if value >= 1 {
            Ok(Self(value))
        } else {
            Err(PositiveUsizeError(value))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Constructor for literal defaults. Panics on 0.
    pub const fn from_const(value: usize) -> Self {
        assert!(value >= 1, "PositiveUsize must be at least 1");
        Self(value)
    }
}

/// A zero threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("value must be at least 1, got {0}")]
pub struct PositiveUsizeError(usize);

impl<'de> Deserialize<'de> for PositiveUsize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = usize::deserialize(deserializer)?;
        PositiveUsize::new(value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for PositiveUsize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}
