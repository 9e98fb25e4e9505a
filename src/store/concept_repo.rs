use std::collections::{HashSet, VecDeque};

use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, UserKey};
use tracing::info;
use uuid::Uuid;

use super::codec::StoreSerDe;
use crate::model::{Collection, Concept, ConceptScheme};

/// `uri\0id`, so every concept sharing a URI sits under one prefix.
struct UriIndexKey(Vec<u8>);

impl UriIndexKey {
    fn new(uri: &str, id: Uuid) -> UriIndexKey {
        let mut key = UriIndexKey::prefix(uri);
        key.0.extend_from_slice(id.as_bytes());
        key
    }
    fn prefix(uri: &str) -> UriIndexKey {
        let mut key = Vec::with_capacity(uri.len() + 17);
        key.extend_from_slice(uri.as_bytes());
        key.push(0);
        UriIndexKey(key)
    }
    fn id(bytes: &[u8]) -> Result<Uuid> {
        let start = bytes
            .len()
            .checked_sub(16)
            .context("uri index key is too short")?;
        Ok(Uuid::from_slice(&bytes[start..])?)
    }
}

impl From<UriIndexKey> for UserKey {
    fn from(value: UriIndexKey) -> Self {
        UserKey::from(value.0)
    }
}

/// Read-mostly SKOS store: concepts, their URI index, collections and schemes.
#[derive(Clone)]
pub(crate) struct ConceptRepo {
    keyspace: Keyspace,
    concepts: PartitionHandle,
    uri_index: PartitionHandle,
    collections: PartitionHandle,
    schemes: PartitionHandle,
}

impl ConceptRepo {
    pub(crate) fn new(keyspace: Keyspace) -> Result<ConceptRepo> {
        let options = PartitionCreateOptions::default();
        let concepts = keyspace.open_partition("concepts", options.clone())?;
        let uri_index = keyspace.open_partition("concept_uris", options.clone())?;
        let collections = keyspace.open_partition("collections", options.clone())?;
        let schemes = keyspace.open_partition("concept_schemes", options)?;
        Ok(ConceptRepo {
            keyspace,
            concepts,
            uri_index,
            collections,
            schemes,
        })
    }

    /// Stores a thesaurus in one batch, replacing entries with the same ids.
    pub(crate) fn save(
        &self,
        schemes: &[ConceptScheme],
        concepts: &[Concept],
        collections: &[Collection],
    ) -> Result<()> {
        let mut batch = self.keyspace.batch();
        for scheme in schemes {
            batch.insert(&self.schemes, scheme.id.as_bytes().as_slice(), scheme.to_bytes()?);
        }
        for concept in concepts {
            if let Some(previous) = self.find_concept(concept.id)? {
                if let Some(uri) = previous.uri.filter(|uri| Some(uri) != concept.uri.as_ref()) {
                    batch.remove(&self.uri_index, UriIndexKey::new(&uri, concept.id));
                }
            }
            if let Some(uri) = &concept.uri {
                batch.insert(&self.uri_index, UriIndexKey::new(uri, concept.id), b"".as_slice());
            }
            batch.insert(&self.concepts, concept.id.as_bytes().as_slice(), concept.to_bytes()?);
        }
        for collection in collections {
            batch.insert(
                &self.collections,
                collection.id.as_bytes().as_slice(),
                collection.to_bytes()?,
            );
        }
        batch.commit().context("unable to store thesaurus")?;
        info!(
            target: "store",
            schemes = schemes.len(),
            concepts = concepts.len(),
            collections = collections.len(),
            "thesaurus stored"
        );
        Ok(())
    }

    pub(crate) fn find_concept(&self, id: Uuid) -> Result<Option<Concept>> {
        match self.concepts.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(Concept::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every concept carrying `uri`, ordered by concept id.
    pub(crate) fn find_by_uri(&self, uri: &str) -> Result<Vec<Concept>> {
        let mut concepts = vec![];
        for entry in self.uri_index.prefix(UriIndexKey::prefix(uri).0) {
            let (key, _) = entry?;
            let id = UriIndexKey::id(&key)?;
            let concept = self
                .find_concept(id)?
                .with_context(|| format!("uri index points at missing concept {id}"))?;
            concepts.push(concept);
        }
        Ok(concepts)
    }

    pub(crate) fn find_collection(&self, id: Uuid) -> Result<Option<Collection>> {
        match self.collections.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(Collection::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn find_scheme(&self, id: Uuid) -> Result<Option<ConceptScheme>> {
        match self.schemes.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(ConceptScheme::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Concept ids reachable from a collection through `member` and
    /// `narrower` edges, `None` for an unknown collection.
    pub(crate) fn reachable(&self, collection: Uuid) -> Result<Option<HashSet<Uuid>>> {
        let Some(root) = self.find_collection(collection)? else {
            return Ok(None);
        };
        let mut visited = HashSet::from([root.id]);
        let mut concepts = HashSet::new();
        let mut queue: VecDeque<Uuid> = root.members.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(nested) = self.find_collection(id)? {
                queue.extend(nested.members);
            } else if let Some(concept) = self.find_concept(id)? {
                concepts.insert(concept.id);
                queue.extend(concept.narrower);
            }
        }
        Ok(Some(concepts))
    }
}
