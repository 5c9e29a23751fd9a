// ── Zone domain type ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a zone. Only `active` matters to the analytics
/// views; everything else is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ZoneStatus {
    Active,
    Other(String),
}

impl From<String> for ZoneStatus {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Other(raw)
        }
    }
}

impl From<ZoneStatus> for String {
    fn from(status: ZoneStatus) -> Self {
        match status {
            ZoneStatus::Active => "active".into(),
            ZoneStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// A managed domain. Immutable once fetched; the whole list is replaced
/// on each zone-list refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub status: ZoneStatus,
    pub plan: Option<String>,
}

impl Zone {
    /// Placeholder for a zone known only by identifier (selected before
    /// the zone list has loaded). The identifier doubles as display name.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            status: ZoneStatus::Active,
            plan: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ZoneStatus::Active
    }

    /// Match by identifier or (case-insensitive) name.
    pub fn matches(&self, identifier: &str) -> bool {
        self.id == identifier || self.name.eq_ignore_ascii_case(identifier)
    }
}
