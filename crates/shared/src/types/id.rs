//! Typed identifiers for type-safe ledger references.
//!
//! Using typed identifiers prevents accidentally passing a routing number where
//! an account number is expected.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an account or routing number fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// The input was empty.
    #[error("identifier must not be empty")]
    Empty,
    /// The input contained a character that is not an ASCII digit.
    #[error("identifier must contain only digits, found {0:?}")]
    NonDigit(char),
}

/// Macro to generate typed numeric-string identifiers.
///
/// Account and routing numbers are digit strings, not integers: leading zeros
/// are significant.
macro_rules! typed_number {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier without validating its contents.
            ///
            /// Values read back from the ledger are trusted as stored.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parses and validates an identifier (non-empty, ASCII digits only).
            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                if value.is_empty() {
                    return Err(IdParseError::Empty);
                }
                if let Some(bad) = value.chars().find(|c| !c.is_ascii_digit()) {
                    return Err(IdParseError::NonDigit(bad));
                }
                Ok(Self(value.to_string()))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

typed_number!(AccountNumber, "Account number within a routing domain.");
typed_number!(RoutingNumber, "Routing number identifying a bank's domain.");

/// Position of an entry in the append-only ledger.
///
/// Assigned by the store at append time. Strictly increasing, but gaps are
/// allowed (a rolled-back insert still consumes a sequence value).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceId(pub i64);

impl SequenceId {
    /// The position before the first entry of an empty ledger.
    pub const ZERO: Self = Self(0);

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SequenceId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
