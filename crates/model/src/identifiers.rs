//! Type-safe identifiers for map entities.
//!
//! All identifiers use Arc<str> for cheap cloning. New identifiers are minted
//! from the creation timestamp by [`IdGenerator`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Mint a fresh identifier from the generator's timestamp sequence
            pub fn generate(ids: &mut IdGenerator) -> Self {
                Self::new(ids.next_raw().to_string())
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

impl_identifier!(MapId);
impl_identifier!(LayerId);
impl_identifier!(MarkerId);
impl_identifier!(PolygonId);
impl_identifier!(TimelineEventId);

/// Issues creation-timestamp identifiers (milliseconds since the UNIX epoch).
///
/// Two ids requested within the same millisecond would collide, so the
/// generator never hands out a value less than or equal to the previous one.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the sequence at a fixed instant; ids still follow the wall clock
    /// once it overtakes `millis`.
    pub fn starting_at(millis: i64) -> Self {
        Self { last: millis - 1 }
    }

    pub fn next_raw(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last = now.max(self.last + 1);
        self.last
    }
}
