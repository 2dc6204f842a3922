use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ─── Topology ────────────────────────────────────────────────────

/// One of the two measured deployment strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    Global,
    Regional,
}

impl Topology {
    pub const ALL: [Topology; 2] = [Topology::Global, Topology::Regional];

    /// Path of the measurement endpoint serving this topology.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Self::Global => "/api/edge-global",
            Self::Regional => "/api/edge-region",
        }
    }

    /// Prefix of this topology's keys in the flat sample shape.
    pub fn key_prefix(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Regional => "regional",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Regional => "Regional",
        }
    }

    /// Series colour used by the chart renderer.
    pub fn colour(self) -> &'static str {
        match self {
            Self::Global => "#8884d8",
            Self::Regional => "#82ca9d",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topology '{0}' (expected 'global' or 'regional')")]
pub struct UnknownTopology(pub String);

impl FromStr for Topology {
    type Err = UnknownTopology;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "regional" => Ok(Self::Regional),
            other => Err(UnknownTopology(other.to_owned())),
        }
    }
}

// ─── Query count ─────────────────────────────────────────────────

/// Number of database queries the route handler performs per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QueryCount {
    #[default]
    One,
    Two,
    Five,
}

impl QueryCount {
    pub fn get(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Five => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("query count must be 1, 2 or 5 (got {0})")]
pub struct InvalidQueryCount(pub u8);

impl TryFrom<u8> for QueryCount {
    type Error = InvalidQueryCount;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            5 => Ok(Self::Five),
            other => Err(InvalidQueryCount(other)),
        }
    }
}

impl From<QueryCount> for u8 {
    fn from(value: QueryCount) -> Self {
        value.get()
    }
}

impl fmt::Display for QueryCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

// ─── Readings ────────────────────────────────────────────────────

/// One topology's measurement within a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopologyReading {
    /// Server-reported handler duration (ms)
    pub processing_time_ms: f64,
    /// Server-reported: the function instance was freshly initialised
    pub cold_start: bool,
    /// Client-measured dispatch → parsed body (ms)
    pub end_to_end_ms: f64,
}

/// One record per round. An unselected topology is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    pub fetch_num: u32,
    pub global: Option<TopologyReading>,
    pub regional: Option<TopologyReading>,
}

impl Sample {
    pub fn reading(&self, topology: Topology) -> Option<&TopologyReading> {
        match topology {
            Topology::Global => self.global.as_ref(),
            Topology::Regional => self.regional.as_ref(),
        }
    }
}

/// Flat wire shape consumed by the dashboard:
/// `{ fetchNum, global_processingTime, global_coldStart, global_endToEndTime, regional_… }`.
/// Keys of an absent topology are left out entirely.
impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = Topology::ALL
            .iter()
            .filter(|t| self.reading(**t).is_some())
            .count();
        let mut map = serializer.serialize_map(Some(1 + present * 3))?;
        map.serialize_entry("fetchNum", &self.fetch_num)?;
        for topology in Topology::ALL {
            if let Some(r) = self.reading(topology) {
                let prefix = topology.key_prefix();
                map.serialize_entry(&format!("{prefix}_processingTime"), &r.processing_time_ms)?;
                map.serialize_entry(&format!("{prefix}_coldStart"), &r.cold_start)?;
                map.serialize_entry(&format!("{prefix}_endToEndTime"), &r.end_to_end_ms)?;
            }
        }
        map.end()
    }
}
