//! Failure taxonomy of the JSON-LD mapper

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub(crate) enum MapperError {
    /// Predicate, type or identifier does not fit the graph model
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Dangling concept or resource instance reference
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Array given for a single-valued node, or a single-valued node written twice
    #[error("cardinality violation: {0}")]
    CardinalityViolation(String),

    #[error("concept {uri} is not a member of collection {collection}")]
    ConceptNotInCollection { uri: String, collection: Uuid },

    /// Literal value could not be parsed as its declared type
    #[error("type coercion error: {0}")]
    TypeCoercion(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("graph {0} not found")]
    GraphNotFound(String),

    #[error("resource {0} not found")]
    ResourceNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl MapperError {
    /// Machine readable reason, stable across releases
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            MapperError::SchemaMismatch(_) => "SchemaMismatch",
            MapperError::UnresolvedReference(_) => "UnresolvedReference",
            MapperError::CardinalityViolation(_) => "CardinalityViolation",
            MapperError::ConceptNotInCollection { .. } => "ConceptNotInCollection",
            MapperError::TypeCoercion(_) => "TypeCoercionError",
            MapperError::Validation(_) => "ValidationError",
            MapperError::GraphNotFound(_) => "GraphNotFound",
            MapperError::ResourceNotFound(_) => "ResourceNotFound",
            MapperError::Storage(_) => "StorageError",
        }
    }
}

pub(crate) type MapperResult<T> = std::result::Result<T, MapperError>;
