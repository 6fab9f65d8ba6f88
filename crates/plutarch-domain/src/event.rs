//! Candidate groups and consolidated events

use crate::{CanonicalId, ClaimId, Confidence, EventKind, Provenance, TimeSpan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Storage identifier for a consolidated event, based on UUIDv7
///
/// Decision capabilities never see this id; they work with short event codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EventId(u128);

impl EventId {
    /// Generate a new UUIDv7-based EventId
    ///
    /// # Examples
    ///
    /// ```
    /// use plutarch_domain::EventId;
    ///
    /// let id = EventId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an EventId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an EventId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for EventId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_string(&s)
    }
}

/// Arbitration outcome for a consolidated event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Group had one member
    Singleton,
    /// Members describe one event
    SameEvent,
    /// Members describe distinct events
    DifferentEvents,
    /// Members describe one event but disagreed on identity fields
    ConflictResolved,
}

impl Decision {
    /// Snake-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::SameEvent => "same_event",
            Self::DifferentEvents => "different_events",
            Self::ConflictResolved => "conflict_resolved",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human review marker; events are marked, never removed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ReviewStatus {
    /// Not yet reviewed
    #[default]
    Pending,
    /// Confirmed by a reviewer
    Validated,
    /// Judged wrong by a reviewer
    Rejected,
    /// Same as another event
    Duplicate {
        /// Code of the surviving event
        of: String,
    },
}

/// Why two claims were linked into one candidate group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingCriterion {
    /// Resolved spans overlap
    TemporalOverlap,
    /// Same canonical organization
    SameOrg,
    /// At least one shared canonical role
    SameRole,
    /// Same org and role, one side lacks a start year
    MissingTime,
}

/// One edge of the grouping graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingEdge {
    /// Claim indices `(i, j)` with `i < j`
    pub pair: (usize, usize),

    /// Criteria that matched for this pair
    pub criteria: Vec<GroupingCriterion>,
}

/// A tentative cluster of claims hypothesized to describe one event
///
/// Lives for one consolidation pass only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateGroup {
    /// Group identifier within the pass
    pub group_id: String,

    /// Claim indices, ascending
    pub member_indices: Vec<usize>,

    /// Claim ids in the same order as `member_indices`
    pub member_claim_ids: Vec<ClaimId>,

    /// Edges that joined the members
    pub grouping_criteria: Vec<GroupingEdge>,
}

impl CandidateGroup {
    /// Number of member claims
    pub fn len(&self) -> usize {
        self.member_indices.len()
    }

    /// Whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.member_indices.is_empty()
    }

    /// Whether the group holds exactly one claim
    pub fn is_singleton(&self) -> bool {
        self.member_indices.len() == 1
    }
}

/// The durable output unit for a career position or award
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedEvent {
    /// Storage identifier
    #[serde(default)]
    pub event_id: EventId,

    /// Short code shown to decision capabilities (`G001`, `S004`, `N002`)
    pub event_code: String,

    /// Career position or award
    #[serde(default)]
    pub kind: EventKind,

    /// How the record was arbitrated
    pub decision: Decision,

    /// Canonical organization, when resolved
    #[serde(default)]
    pub canonical_organization_id: Option<CanonicalId>,

    /// Display name of the organization
    #[serde(default)]
    pub organization: Option<String>,

    /// First year
    #[serde(default)]
    pub time_start: Option<i32>,

    /// Last year; absent means open-ended or unknown
    #[serde(default)]
    pub time_end: Option<i32>,

    /// Roles held
    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// Locations
    #[serde(default)]
    pub locations: BTreeSet<String>,

    /// Confidence in the record
    pub confidence: Confidence,

    /// Reasoning behind the decision
    #[serde(default)]
    pub reasoning: String,

    /// Accumulated evidence
    #[serde(default)]
    pub provenance: Provenance,

    /// Review marker
    #[serde(default)]
    pub review_status: ReviewStatus,
}

impl ConsolidatedEvent {
    /// Span covered by the record
    pub fn time_span(&self) -> TimeSpan {
        TimeSpan {
            start: self.time_start,
            end: self.time_end,
        }
    }

    /// Number of independent source domains
    pub fn source_count(&self) -> usize {
        self.provenance.source_count()
    }

    /// Whether the event is still a match candidate
    pub fn is_active(&self) -> bool {
        matches!(
            self.review_status,
            ReviewStatus::Pending | ReviewStatus::Validated
        )
    }

    /// Mark as rejected; the record is kept for audit
    pub fn mark_rejected(&mut self) {
        self.review_status = ReviewStatus::Rejected;
    }

    /// Mark as a duplicate of another event
    pub fn mark_duplicate_of(&mut self, code: impl Into<String>) {
        self.review_status = ReviewStatus::Duplicate { of: code.into() };
    }

    /// Compact view handed to a match decider
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            event_code: self.event_code.clone(),
            kind: self.kind,
            organization: self.organization.clone(),
            time: self.time_span(),
            roles: self.roles.iter().cloned().collect(),
            locations: self.locations.iter().cloned().collect(),
        }
    }
}

/// Compact, id-free description of an existing event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Short code the decider refers back to
    pub event_code: String,
    /// Career position or award
    pub kind: EventKind,
    /// Organization display name
    pub organization: Option<String>,
    /// Span covered
    pub time: TimeSpan,
    /// Roles held
    pub roles: Vec<String>,
    /// Locations
    pub locations: Vec<String>,
}
