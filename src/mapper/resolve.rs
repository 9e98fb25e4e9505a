use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{MapperError, MapperResult};
use crate::json_ld::{IriMinter, LocalIri};
use crate::model::Concept;
use crate::store::ConceptRepo;

/// Resolves concept IRIs for the duration of one import, memoizing
/// collection reachability.
pub(super) struct ConceptResolver<'a> {
    concepts: &'a ConceptRepo,
    iris: &'a IriMinter,
    reachable: HashMap<Uuid, HashSet<Uuid>>,
}

impl<'a> ConceptResolver<'a> {
    pub(super) fn new(concepts: &'a ConceptRepo, iris: &'a IriMinter) -> ConceptResolver<'a> {
        ConceptResolver {
            concepts,
            iris,
            reachable: HashMap::new(),
        }
    }

    /// Local `/concepts/<uuid>` IRIs are looked up by id, anything else by
    /// external URI. With a collection the first candidate reachable from
    /// it wins, without one the URI must be unambiguous.
    pub(super) fn resolve(&mut self, iri: &str, collection: Option<Uuid>) -> MapperResult<Concept> {
        let candidates = match self.iris.parse(iri) {
            Some(LocalIri::Concept(id)) => self.concepts.find_concept(id)?.into_iter().collect(),
            Some(_) => {
                return Err(MapperError::UnresolvedReference(format!(
                    "{iri} does not identify a concept"
                )));
            }
            None => self.concepts.find_by_uri(iri)?,
        };
        if candidates.is_empty() {
            return Err(MapperError::UnresolvedReference(format!(
                "unknown concept {iri}"
            )));
        }

        match collection {
            Some(collection) => {
                let members = self.members(collection)?;
                candidates
                    .into_iter()
                    .find(|concept| members.contains(&concept.id))
                    .ok_or_else(|| MapperError::ConceptNotInCollection {
                        uri: iri.to_string(),
                        collection,
                    })
            }
            None => {
                let count = candidates.len();
                let mut candidates = candidates.into_iter();
                match (candidates.next(), candidates.next()) {
                    (Some(concept), None) => Ok(concept),
                    _ => Err(MapperError::UnresolvedReference(format!(
                        "{iri} matches {count} concepts and the node has no collection to choose from"
                    ))),
                }
            }
        }
    }

    fn members(&mut self, collection: Uuid) -> MapperResult<&HashSet<Uuid>> {
        if !self.reachable.contains_key(&collection) {
            let members = self.concepts.reachable(collection)?.ok_or_else(|| {
                MapperError::UnresolvedReference(format!("unknown collection {collection}"))
            })?;
            self.reachable.insert(collection, members);
        }
        self.reachable.get(&collection).ok_or_else(|| {
            MapperError::UnresolvedReference(format!("unknown collection {collection}"))
        })
    }
}
