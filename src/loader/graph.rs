use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::info;

use crate::error::{MapperError, MapperResult};
use crate::model::{GraphModel, GraphSchema};
use crate::store::GraphRepo;

#[derive(Deserialize)]
struct GraphFile {
    graph: Vec<GraphModel>,
}

/// Registers every graph of a `{"graph": [...]}` document. The whole file
/// is validated before the first graph is stored.
pub(crate) fn load_graphs(
    graphs: &GraphRepo,
    document: &JsonValue,
) -> MapperResult<Vec<Arc<GraphSchema>>> {
    let file = GraphFile::deserialize(document)
        .map_err(|err| MapperError::Validation(format!("invalid graph file: {err}")))?;

    let mut slugs = HashMap::new();
    for model in &file.graph {
        GraphSchema::compile(model.clone())?;
        if let Some(slug) = &model.slug {
            if let Some(other) = slugs.insert(slug.as_str(), model.graphid) {
                if other != model.graphid {
                    return Err(MapperError::Validation(format!(
                        "graphs {other} and {} share slug {slug}",
                        model.graphid
                    )));
                }
            }
        }
    }

    let schemas = file
        .graph
        .into_iter()
        .map(|model| graphs.register(model))
        .collect::<MapperResult<Vec<_>>>()?;
    info!(target: "loader", graphs = schemas.len(), "graph file loaded");
    Ok(schemas)
}
