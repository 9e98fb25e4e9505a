//! SKOS thesaurus entities. Tiles reference concepts by id, never own them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConceptScheme {
    pub(crate) id: Uuid,
    #[serde(default)]
    pub(crate) uri: Option<String>,
    #[serde(default)]
    pub(crate) pref_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Concept {
    pub(crate) id: Uuid,
    /// External URI, several concepts of different schemes may share one
    #[serde(default)]
    pub(crate) uri: Option<String>,
    #[serde(default)]
    pub(crate) scheme: Option<Uuid>,
    /// language tag → preferred label
    #[serde(default)]
    pub(crate) pref_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub(crate) narrower: Vec<Uuid>,
}

impl Concept {
    /// Preferred label in `language`, else the first label in tag order.
    pub(crate) fn label(&self, language: &str) -> Option<&str> {
        self.pref_labels
            .get(language)
            .or_else(|| self.pref_labels.values().next())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Collection {
    pub(crate) id: Uuid,
    #[serde(default)]
    pub(crate) label: String,
    /// Concepts or nested collections
    #[serde(default)]
    pub(crate) members: Vec<Uuid>,
}
