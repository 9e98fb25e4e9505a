//! fjall backed persistence, one partition per concern.

mod codec;
mod concept_repo;
mod graph_repo;
mod resource_repo;

use anyhow::Result;
use fjall::Keyspace;

pub(crate) use concept_repo::ConceptRepo;
pub(crate) use graph_repo::GraphRepo;
pub(crate) use resource_repo::ResourceRepo;

#[derive(Clone)]
pub(crate) struct Store {
    pub(crate) graphs: GraphRepo,
    pub(crate) concepts: ConceptRepo,
    pub(crate) resources: ResourceRepo,
}

impl Store {
    pub(crate) fn open(keyspace: Keyspace) -> Result<Store> {
        Ok(Store {
            graphs: GraphRepo::new(keyspace.clone())?,
            concepts: ConceptRepo::new(keyspace.clone())?,
            resources: ResourceRepo::new(keyspace)?,
        })
    }
}
