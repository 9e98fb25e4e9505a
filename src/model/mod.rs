mod concept;
mod graph;
mod resource;
mod tile;

pub(crate) use concept::{Collection, Concept, ConceptScheme};
pub(crate) use graph::{Cardinality, Datatype, GraphModel, GraphSchema, Node};
pub(crate) use resource::ResourceInstance;
pub(crate) use tile::{DateValue, NumberValue, Tile, TileValue};
