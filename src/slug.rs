use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MapperError;

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern should compile"));

/// URL-safe handle of a graph model: letters, numbers, underscores or hyphens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct Slug(String);

impl Slug {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = MapperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !SLUG_PATTERN.is_match(&value) {
            return Err(MapperError::Validation(format!(
                "enter a valid slug consisting of letters, numbers, underscores or hyphens, got {value:?}"
            )));
        }
        Ok(Slug(value))
    }
}

impl TryFrom<&str> for Slug {
    type Error = MapperError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Slug::try_from(value.to_owned())
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
