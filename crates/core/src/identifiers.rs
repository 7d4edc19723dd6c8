//! Type-safe identifiers for routes and road-topology segments.
//!
//! Route identifiers use Arc<str> for cheap cloning. Segment identifiers are
//! parsed once from provider reference strings into a numeric topology id and
//! a travel direction.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

/// Provider-assigned route id; clones share one allocation
#[derive(Clone, Debug)]
pub struct RouteIdentifier(Arc<str>);

impl RouteIdentifier {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for RouteIdentifier {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for RouteIdentifier {}

impl Hash for RouteIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for RouteIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RouteIdentifier {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for RouteIdentifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Direction of travel along a topology segment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
pub enum TravelDirection {
    #[strum(serialize = "+")]
    Forward,
    #[strum(serialize = "-")]
    Backward,
}

/// Directional road-topology segment, rendered as `here:cm:segment:{id}#{+|-}`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId {
    pub topology: u64,
    pub direction: TravelDirection,
}

const SEGMENT_PREFIX: &str = "here:cm:segment";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no directional segment id in reference {0:?}")]
pub struct InvalidSegmentRef(pub String);

impl SegmentId {
    pub fn new(topology: u64, direction: TravelDirection) -> Self {
        Self {
            topology,
            direction,
        }
    }

    /// Parse any reference form that ends in `<digits>#<+|->`, with or
    /// without an offset range after the direction.
    ///
    /// The digits must start the string or follow a `:`. Compact references
    /// (`$0::314876232:$1:809153406#+0.85..1`) parse the same as expanded ones.
    pub fn parse(reference: &str) -> Option<Self> {
        let bytes = reference.as_bytes();

        for (hash, _) in reference.match_indices('#') {
            let direction = match bytes.get(hash + 1) {
                Some(b'+') => TravelDirection::Forward,
                Some(b'-') => TravelDirection::Backward,
                _ => continue,
            };

            let digits_start = bytes[..hash]
                .iter()
                .rposition(|b| !b.is_ascii_digit())
                .map_or(0, |i| i + 1);
            if digits_start == hash {
                continue;
            }
            if digits_start > 0 && bytes[digits_start - 1] != b':' {
                continue;
            }

            if let Ok(topology) = reference[digits_start..hash].parse() {
                return Some(Self::new(topology, direction));
            }
        }

        None
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SEGMENT_PREFIX}:{}#{}", self.topology, self.direction)
    }
}

impl FromStr for SegmentId {
    type Err = InvalidSegmentRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidSegmentRef(s.to_owned()))
    }
}

impl Serialize for SegmentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SegmentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Cow::<str>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Expansion table for compact references (`$0:` -> `hrn:here:data::…:`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RefReplacements(HashMap<String, String>);

impl RefReplacements {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self(table)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace every `$key:` placeholder with `value:`
    pub fn expand<'a>(&self, compact: &'a str) -> Cow<'a, str> {
        if self.0.is_empty() || !compact.contains('$') {
            return Cow::Borrowed(compact);
        }

        let mut expanded = compact.to_owned();
        for (key, value) in &self.0 {
            let placeholder = format!("${key}:");
            if expanded.contains(&placeholder) {
                expanded = expanded.replace(&placeholder, &format!("{value}:"));
            }
        }
        Cow::Owned(expanded)
    }

    /// Expand then parse
    pub fn segment_id(&self, reference: &str) -> Option<SegmentId> {
        SegmentId::parse(&self.expand(reference))
    }
}
