use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::info;
use uuid::Uuid;

use super::codec::StoreSerDe;
use crate::error::{MapperError, MapperResult};
use crate::model::{GraphModel, GraphSchema};
use crate::slug::Slug;

/// Graph models keyed by id plus a unique slug index.
#[derive(Clone)]
pub(crate) struct GraphRepo {
    keyspace: Keyspace,
    graphs: PartitionHandle,
    slugs: PartitionHandle,
    cache: Arc<RwLock<HashMap<Uuid, Arc<GraphSchema>>>>,
    /// Serializes slug uniqueness check and write
    writer: Arc<Mutex<()>>,
}

impl GraphRepo {
    pub(crate) fn new(keyspace: Keyspace) -> Result<GraphRepo> {
        let graphs = keyspace.open_partition("graphs", PartitionCreateOptions::default())?;
        let slugs = keyspace.open_partition("graph_slugs", PartitionCreateOptions::default())?;
        Ok(GraphRepo {
            keyspace,
            graphs,
            slugs,
            cache: Arc::default(),
            writer: Arc::default(),
        })
    }

    /// Validates and stores a graph model, replacing one with the same id.
    pub(crate) fn register(&self, model: GraphModel) -> MapperResult<Arc<GraphSchema>> {
        let schema = Arc::new(GraphSchema::compile(model)?);
        let graphid = schema.graphid();
        let slug = schema.model().slug.clone();

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slug) = &slug {
            if let Some(owner) = self.slug_owner(slug)? {
                if owner != graphid {
                    return Err(MapperError::Validation(format!(
                        "slug {slug} is already used by graph {owner}"
                    )));
                }
            }
        }
        let previous = self.load(graphid)?;

        let mut batch = self.keyspace.batch();
        if let Some(old_slug) = previous.as_ref().and_then(|m| m.slug.as_ref()) {
            if slug.as_ref() != Some(old_slug) {
                batch.remove(&self.slugs, old_slug.as_str());
            }
        }
        if let Some(slug) = &slug {
            batch.insert(&self.slugs, slug.as_str(), graphid.as_bytes().as_slice());
        }
        batch.insert(&self.graphs, graphid.as_bytes().as_slice(), schema.model().to_bytes()?);
        batch
            .commit()
            .with_context(|| format!("unable to store graph {graphid}"))?;

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(graphid, schema.clone());
        info!(target: "store", %graphid, name = schema.model().name.as_str(), "graph registered");
        Ok(schema)
    }

    pub(crate) fn find(&self, graphid: Uuid) -> MapperResult<Arc<GraphSchema>> {
        if let Some(schema) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&graphid)
        {
            return Ok(schema.clone());
        }
        let model = self
            .load(graphid)?
            .ok_or_else(|| MapperError::GraphNotFound(graphid.to_string()))?;
        let schema = Arc::new(GraphSchema::compile(model)?);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(graphid, schema.clone());
        Ok(schema)
    }

    pub(crate) fn find_by_slug(&self, slug: &Slug) -> MapperResult<Option<Arc<GraphSchema>>> {
        match self.slug_owner(slug)? {
            Some(graphid) => self.find(graphid).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn graph_ids(&self) -> Result<Vec<Uuid>> {
        let mut ids = vec![];
        for entry in self.graphs.keys() {
            let key = entry?;
            ids.push(Uuid::from_slice(&key)?);
        }
        Ok(ids)
    }

    fn load(&self, graphid: Uuid) -> Result<Option<GraphModel>> {
        match self.graphs.get(graphid.as_bytes())? {
            Some(bytes) => Ok(Some(GraphModel::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn slug_owner(&self, slug: &Slug) -> Result<Option<Uuid>> {
        match self.slugs.get(slug.as_str())? {
            Some(bytes) => Ok(Some(Uuid::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
