//! Claim module - one extracted assertion from one source

use crate::{Confidence, TimeSpan};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-assigned, opaque claim identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(String);

impl ClaimId {
    /// Wrap a caller-supplied identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClaimId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which attribute of a fact a claim asserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Organization mention
    Organization,
    /// Role or title mention
    Role,
    /// Location mention
    Location,
    /// Raw time marker ("1990-1995", "since 2007")
    TimeMarker,
    /// Single-valued fact such as a birth year
    ScalarFact,
}

/// Ranked category describing how directly a quote supports a fact
///
/// Lower rank is stronger. Variant order matches rank order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    /// A labelled field ("Date of birth: 12 May 1950")
    #[serde(alias = "explicit-field", alias = "born-field")]
    ExplicitField,
    /// Running prose ("she was born in 1950")
    #[serde(alias = "born-narrative")]
    Narrative,
    /// Any other mention
    #[default]
    Other,
    /// Only a category tag ("1950 births")
    #[serde(alias = "category-only", alias = "category")]
    CategoryOnly,
    /// Label not recognized
    #[serde(other)]
    Unknown,
}

impl EvidenceType {
    /// Evidence quality rank; lower is stronger
    pub fn rank(&self) -> u8 {
        match self {
            Self::ExplicitField => 0,
            Self::Narrative => 1,
            Self::Other => 2,
            Self::CategoryOnly => 3,
            Self::Unknown => 4,
        }
    }

    /// Parse a label, accepting both snake_case and hyphenated spellings
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "explicit_field" | "born_field" => Self::ExplicitField,
            "narrative" | "born_narrative" => Self::Narrative,
            "other" => Self::Other,
            "category_only" | "category" => Self::CategoryOnly,
            _ => Self::Unknown,
        }
    }

    /// Hyphenated label used in narratives and tables
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExplicitField => "explicit-field",
            Self::Narrative => "narrative",
            Self::Other => "other",
            Self::CategoryOnly => "category-only",
            Self::Unknown => "unknown",
        }
    }
}

/// The value a claim asserts
///
/// Serialized untagged: a bare number is a year, an object is a time range,
/// a string is free text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    /// A single year
    Year(i32),
    /// A structured span of years
    TimeRange(TimeSpan),
    /// Free text (names, titles, places)
    Text(String),
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(y) => write!(f, "{}", y),
            Self::TimeRange(span) => write!(f, "{}", span),
            Self::Text(t) => f.write_str(t),
        }
    }
}

/// One extracted assertion from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Caller-assigned identifier
    pub claim_id: ClaimId,

    /// Chunk or document identifier
    pub source_id: String,

    /// Domain used for independent-source counting
    pub source_domain: String,

    /// Attribute asserted by this claim
    pub attribute_type: AttributeType,

    /// Name of the scalar attribute (`birth_year`), for scalar facts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Asserted value; `None` when the extractor found nothing usable
    #[serde(default)]
    pub raw_value: Option<ClaimValue>,

    /// Verbatim supporting text
    #[serde(default)]
    pub evidence_quote: String,

    /// How directly the quote supports the value
    #[serde(default)]
    pub evidence_type: EvidenceType,
}

impl Claim {
    /// Create a scalar-fact claim (birth year and the like)
    pub fn scalar(
        claim_id: impl Into<ClaimId>,
        source_domain: impl Into<String>,
        value: Option<ClaimValue>,
        evidence_type: EvidenceType,
    ) -> Self {
        let claim_id = claim_id.into();
        Self {
            source_id: claim_id.to_string(),
            claim_id,
            source_domain: source_domain.into(),
            attribute_type: AttributeType::ScalarFact,
            attribute: None,
            raw_value: value,
            evidence_quote: String::new(),
            evidence_type,
        }
    }

    /// Attach the supporting quote
    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.evidence_quote = quote.into();
        self
    }

    /// Name the scalar attribute
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this claim asserts `attribute`; unnamed claims match any
    pub fn asserts(&self, attribute: &str) -> bool {
        self.attribute.as_deref().is_none_or(|a| a == attribute)
    }

    /// Evidence quality rank of this claim; lower is stronger
    pub fn quality_rank(&self) -> u8 {
        self.evidence_type.rank()
    }
}

impl From<String> for ClaimId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of multi-valued fact an event claim describes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A job, office or appointment
    #[default]
    CareerPosition,
    /// A prize, honour or award
    Award,
}

/// A per-source assertion about one career position or award
///
/// This is what the extractor assembles from one chunk; it decomposes into
/// attribute-level [`Claim`]s via [`EventClaim::attribute_claims`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventClaim {
    /// Caller-assigned identifier
    pub claim_id: ClaimId,

    /// Chunk or document identifier
    pub source_id: String,

    /// Domain used for independent-source counting
    pub source_domain: String,

    /// Career position or award
    #[serde(default)]
    pub kind: EventKind,

    /// Organization mention as written in the source
    #[serde(default)]
    pub organization: Option<String>,

    /// Role mentions as written in the source
    #[serde(default)]
    pub roles: Vec<String>,

    /// Location mentions
    #[serde(default)]
    pub locations: Vec<String>,

    /// Resolved span
    #[serde(default)]
    pub time: TimeSpan,

    /// Raw time markers the span was resolved from
    #[serde(default)]
    pub time_markers: Vec<String>,

    /// Verbatim supporting text
    #[serde(default)]
    pub evidence_quote: String,

    /// How directly the quote supports the event
    #[serde(default)]
    pub evidence_type: EvidenceType,

    /// Confidence stated by the extractor
    #[serde(default)]
    pub confidence: Confidence,
}

impl EventClaim {
    /// Create an event claim with only identity fields set
    pub fn new(
        claim_id: impl Into<ClaimId>,
        source_id: impl Into<String>,
        source_domain: impl Into<String>,
    ) -> Self {
        Self {
            claim_id: claim_id.into(),
            source_id: source_id.into(),
            source_domain: source_domain.into(),
            kind: EventKind::default(),
            organization: None,
            roles: Vec::new(),
            locations: Vec::new(),
            time: TimeSpan::unknown(),
            time_markers: Vec::new(),
            evidence_quote: String::new(),
            evidence_type: EvidenceType::default(),
            confidence: Confidence::default(),
        }
    }

    /// Set the organization mention
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Add a role mention
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a location mention
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    /// Set the resolved span
    pub fn with_time(mut self, time: TimeSpan) -> Self {
        self.time = time;
        self
    }

    /// Set the supporting quote
    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.evidence_quote = quote.into();
        self
    }

    /// Set the event kind
    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the stated confidence
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Decompose into attribute-level claims
    ///
    /// Derived ids are `<claim_id>#org`, `#role<n>`, `#loc<n>` and `#time`.
    pub fn attribute_claims(&self) -> Vec<Claim> {
        let mut claims = Vec::new();
        let base = |suffix: String, attribute_type, value| Claim {
            claim_id: ClaimId::new(format!("{}#{}", self.claim_id, suffix)),
            source_id: self.source_id.clone(),
            source_domain: self.source_domain.clone(),
            attribute_type,
            attribute: None,
            raw_value: Some(value),
            evidence_quote: self.evidence_quote.clone(),
            evidence_type: self.evidence_type,
        };

        if let Some(org) = &self.organization {
            claims.push(base(
                "org".to_string(),
                AttributeType::Organization,
                ClaimValue::Text(org.clone()),
            ));
        }
        for (n, role) in self.roles.iter().enumerate() {
            claims.push(base(
                format!("role{}", n),
                AttributeType::Role,
                ClaimValue::Text(role.clone()),
            ));
        }
        for (n, loc) in self.locations.iter().enumerate() {
            claims.push(base(
                format!("loc{}", n),
                AttributeType::Location,
                ClaimValue::Text(loc.clone()),
            ));
        }
        if self.time.is_known() {
            claims.push(base(
                "time".to_string(),
                AttributeType::TimeMarker,
                ClaimValue::TimeRange(self.time),
            ));
        }
        claims
    }
}
