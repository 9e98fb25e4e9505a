//! Tagged view of the values a predicate can carry in an expanded document.

use serde_json::{Map, Number, Value as JsonValue};

use crate::error::{MapperError, MapperResult};

use super::vocab::{ID, LANGUAGE, RDFS_LABEL, TYPE, VALUE};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    String(String),
    Number(Number),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PredicateValue<'a> {
    /// Bare JSON string, number or boolean
    Literal(Literal),
    /// `{"@value": ..., "@type": ...}`
    Typed { value: Literal, datatype: &'a str },
    /// `{"@value": ..., "@language": ...}`
    Tagged { value: String, language: &'a str },
    /// Node object, possibly a reference carrying only `@id`
    Node(NodeObject<'a>),
    List(Vec<PredicateValue<'a>>),
}

impl PredicateValue<'_> {
    /// Short description used in error messages
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            PredicateValue::Literal(_) => "literal",
            PredicateValue::Typed { .. } => "typed value",
            PredicateValue::Tagged { .. } => "language tagged value",
            PredicateValue::Node(_) => "node object",
            PredicateValue::List(_) => "list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NodeObject<'a> {
    map: &'a Map<String, JsonValue>,
}

impl<'a> NodeObject<'a> {
    pub(crate) fn from_value(value: &'a JsonValue) -> MapperResult<NodeObject<'a>> {
        match value {
            JsonValue::Object(map) => Ok(NodeObject { map }),
            other => Err(MapperError::SchemaMismatch(format!(
                "expected a JSON-LD node object, found {other}"
            ))),
        }
    }

    pub(crate) fn id(&self) -> Option<&'a str> {
        self.map.get(ID.as_str()).and_then(JsonValue::as_str)
    }

    /// First `@type`, documents handled here carry a single class per node.
    pub(crate) fn type_iri(&self) -> Option<&'a str> {
        match self.map.get(TYPE.as_str())? {
            JsonValue::String(ty) => Some(ty.as_str()),
            JsonValue::Array(types) => types.iter().find_map(JsonValue::as_str),
            _ => None,
        }
    }

    /// Predicates other than keywords and `rdfs:label`, which export derives.
    pub(crate) fn predicates(
        self,
    ) -> impl Iterator<Item = (&'a str, MapperResult<PredicateValue<'a>>)> + 'a {
        self.map
            .iter()
            .filter(|(key, _)| !key.starts_with('@') && key.as_str() != RDFS_LABEL.as_str())
            .map(|(key, value)| (key.as_str(), PredicateValue::parse(value)))
    }

    pub(crate) fn has_predicates(&self) -> bool {
        self.predicates().next().is_some()
    }
}

impl<'a> PredicateValue<'a> {
    pub(crate) fn parse(value: &'a JsonValue) -> MapperResult<PredicateValue<'a>> {
        PredicateValue::parse_nested(value, false)
    }

    fn parse_nested(value: &'a JsonValue, in_list: bool) -> MapperResult<PredicateValue<'a>> {
        match value {
            JsonValue::String(s) => Ok(PredicateValue::Literal(Literal::String(s.clone()))),
            JsonValue::Number(n) => Ok(PredicateValue::Literal(Literal::Number(n.clone()))),
            JsonValue::Bool(b) => Ok(PredicateValue::Literal(Literal::Bool(*b))),
            JsonValue::Null => Err(MapperError::TypeCoercion(
                "null is not a valid predicate value".to_string(),
            )),
            JsonValue::Array(items) => {
                if in_list {
                    return Err(MapperError::CardinalityViolation(
                        "nested lists are not supported".to_string(),
                    ));
                }
                let items = items
                    .iter()
                    .map(|item| PredicateValue::parse_nested(item, true))
                    .collect::<MapperResult<Vec<_>>>()?;
                Ok(PredicateValue::List(items))
            }
            JsonValue::Object(map) => match map.get(VALUE.as_str()) {
                Some(inner) => parse_value_object(map, inner),
                None => Ok(PredicateValue::Node(NodeObject { map })),
            },
        }
    }
}

fn parse_value_object<'a>(
    map: &'a Map<String, JsonValue>,
    inner: &'a JsonValue,
) -> MapperResult<PredicateValue<'a>> {
    let literal = match inner {
        JsonValue::String(s) => Literal::String(s.clone()),
        JsonValue::Number(n) => Literal::Number(n.clone()),
        JsonValue::Bool(b) => Literal::Bool(*b),
        other => {
            return Err(MapperError::TypeCoercion(format!(
                "@value must be a scalar, found {other}"
            )));
        }
    };
    match (map.get(TYPE.as_str()), map.get(LANGUAGE.as_str())) {
        (Some(JsonValue::String(datatype)), None) => Ok(PredicateValue::Typed {
            value: literal,
            datatype: datatype.as_str(),
        }),
        (None, Some(JsonValue::String(language))) => match literal {
            Literal::String(value) => Ok(PredicateValue::Tagged {
                value,
                language: language.as_str(),
            }),
            _ => Err(MapperError::TypeCoercion(
                "@language requires a string @value".to_string(),
            )),
        },
        (None, None) => Ok(PredicateValue::Literal(literal)),
        _ => Err(MapperError::TypeCoercion(
            "@value objects take either one @type IRI or one @language".to_string(),
        )),
    }
}
