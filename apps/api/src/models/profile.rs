use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Coarse career domain assigned to a resume by keyword classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "Product Management")]
    ProductManagement,
    Engineering,
    #[default]
    Other,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::ProductManagement => "Product Management",
            Domain::Engineering => "Engineering",
            Domain::Other => "Other",
        }
    }
}

/// Structured fields extracted from a resume. Stored alongside its embedding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub degree: Option<String>,
    pub domain: Domain,
    /// Fields without a schema yet. Flattened into the top-level JSON object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored profile: caller-assigned identifier plus its metadata.
/// Row `i` of the index embeddings belongs to the `i`-th record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: ProfileFields,
}

/// A search hit: the stored record plus its raw inner-product score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProfile {
    #[serde(flatten)]
    pub record: ProfileRecord,
    pub score: f32,
}

/// Upload response returned after a resume has been indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub degree: Option<String>,
    pub domain: Domain,
}

impl Profile {
    pub fn new(id: String, fields: ProfileFields) -> Self {
        Self {
            id,
            skills: fields.skills,
            location: fields.location,
            degree: fields.degree,
            domain: fields.domain,
        }
    }
}
