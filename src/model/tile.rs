use std::collections::BTreeMap;
use std::fmt::Display;

use jiff::Timestamp;
use jiff::civil::{Date, DateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) enum NumberValue {
    Int(i64),
    Float(f64),
}

impl NumberValue {
    /// Parses `xsd:integer`/`xsd:decimal` lexical forms, `None` for NaN and infinities.
    pub(crate) fn parse(s: &str) -> Option<NumberValue> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Some(NumberValue::Int(n));
        }
        s.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(NumberValue::Float)
    }

    pub(crate) fn from_json(n: &serde_json::Number) -> Option<NumberValue> {
        match n.as_i64() {
            Some(i) => Some(NumberValue::Int(i)),
            None => n.as_f64().filter(|f| f.is_finite()).map(NumberValue::Float),
        }
    }

    pub(crate) fn to_json(self) -> serde_json::Value {
        match self {
            NumberValue::Int(i) => i.into(),
            NumberValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Calendar value, keeping the precision it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) enum DateValue {
    Date(Date),
    DateTime(DateTime),
    Instant(Timestamp),
}

impl DateValue {
    pub(crate) fn parse(s: &str) -> Option<DateValue> {
        let s = s.trim();
        if !s.contains(['T', 't', ' ']) {
            return s.parse::<Date>().ok().map(DateValue::Date);
        }
        if let Ok(instant) = s.parse::<Timestamp>() {
            return Some(DateValue::Instant(instant));
        }
        s.parse::<DateTime>().ok().map(DateValue::DateTime)
    }
}

impl TryFrom<String> for DateValue {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DateValue::parse(&value).ok_or_else(|| format!("invalid date {value:?}"))
    }
}

impl From<DateValue> for String {
    fn from(value: DateValue) -> Self {
        value.to_string()
    }
}

impl Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateValue::Date(date) => date.fmt(f),
            DateValue::DateTime(datetime) => datetime.fmt(f),
            DateValue::Instant(instant) => instant.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum TileValue {
    String {
        value: String,
        language: Option<String>,
    },
    Number(NumberValue),
    Boolean(bool),
    Date(DateValue),
    Concept(Uuid),
    ConceptList(Vec<Uuid>),
    ResourceInstance(Uuid),
    ResourceInstanceList(Vec<Uuid>),
}

impl TileValue {
    /// Appends to a list value, ignoring ids already present.
    /// Returns false for scalar values.
    pub(crate) fn push(&mut self, id: Uuid) -> bool {
        match self {
            TileValue::ConceptList(ids) | TileValue::ResourceInstanceList(ids) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
                true
            }
            _ => false,
        }
    }
}

/// One group of co-located node values inside a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Tile {
    pub(crate) tileid: Uuid,
    pub(crate) resourceinstance_id: Uuid,
    pub(crate) nodegroup_id: Uuid,
    pub(crate) parenttile_id: Option<Uuid>,
    pub(crate) data: BTreeMap<Uuid, TileValue>,
}

impl Tile {
    pub(crate) fn new(
        tileid: Uuid,
        resourceinstance_id: Uuid,
        nodegroup_id: Uuid,
        parenttile_id: Option<Uuid>,
    ) -> Tile {
        Tile {
            tileid,
            resourceinstance_id,
            nodegroup_id,
            parenttile_id,
            data: BTreeMap::new(),
        }
    }
}
