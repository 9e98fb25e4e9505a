//! Loaders feeding the store: graph definitions, thesauri and business data.

mod business_data;
mod concepts;
mod graph;

pub(crate) use business_data::{export_business_data, load_business_data};
pub(crate) use concepts::load_thesaurus;
pub(crate) use graph::load_graphs;
