//! Just enough JSON-LD: inline context expansion, IRI minting and a typed
//! view of predicate values.

mod context;
mod iri;
mod value;

pub(crate) mod vocab;

pub(crate) use context::expand_document;
pub(crate) use iri::{IriMinter, LocalIri};
pub(crate) use value::{Literal, NodeObject, PredicateValue};
