use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::info;
use uuid::Uuid;

use crate::error::{MapperError, MapperResult};
use crate::model::{Collection, Concept, ConceptScheme};
use crate::store::ConceptRepo;

#[derive(Default, Deserialize)]
#[serde(default)]
struct Thesaurus {
    schemes: Vec<ConceptScheme>,
    concepts: Vec<Concept>,
    collections: Vec<Collection>,
}

/// Stores a JSON rendition of a SKOS thesaurus, returns the number of
/// concepts stored. References may point into the file or into concepts
/// loaded earlier.
pub(crate) fn load_thesaurus(concepts: &ConceptRepo, document: &JsonValue) -> MapperResult<usize> {
    let thesaurus = Thesaurus::deserialize(document)
        .map_err(|err| MapperError::Validation(format!("invalid thesaurus file: {err}")))?;

    let scheme_ids = unique_ids(thesaurus.schemes.iter().map(|s| s.id), "scheme")?;
    let concept_ids = unique_ids(thesaurus.concepts.iter().map(|c| c.id), "concept")?;
    let collection_ids = unique_ids(thesaurus.collections.iter().map(|c| c.id), "collection")?;

    let known_concept = |id: Uuid| -> MapperResult<bool> {
        Ok(concept_ids.contains(&id) || concepts.find_concept(id)?.is_some())
    };
    let known_collection = |id: Uuid| -> MapperResult<bool> {
        Ok(collection_ids.contains(&id) || concepts.find_collection(id)?.is_some())
    };

    for concept in &thesaurus.concepts {
        if let Some(scheme) = concept.scheme {
            if !scheme_ids.contains(&scheme) && concepts.find_scheme(scheme)?.is_none() {
                return Err(MapperError::Validation(format!(
                    "concept {} belongs to unknown scheme {scheme}",
                    concept.id
                )));
            }
        }
        for narrower in &concept.narrower {
            if !known_concept(*narrower)? {
                return Err(MapperError::Validation(format!(
                    "concept {} lists unknown narrower concept {narrower}",
                    concept.id
                )));
            }
        }
    }
    for collection in &thesaurus.collections {
        for member in &collection.members {
            if !known_concept(*member)? && !known_collection(*member)? {
                return Err(MapperError::Validation(format!(
                    "collection {} lists unknown member {member}",
                    collection.id
                )));
            }
        }
    }

    concepts.save(
        &thesaurus.schemes,
        &thesaurus.concepts,
        &thesaurus.collections,
    )?;
    info!(
        target: "loader",
        concepts = thesaurus.concepts.len(),
        collections = thesaurus.collections.len(),
        "thesaurus loaded"
    );
    Ok(thesaurus.concepts.len())
}

fn unique_ids(ids: impl Iterator<Item = Uuid>, what: &str) -> MapperResult<HashSet<Uuid>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(MapperError::Validation(format!("duplicate {what} {id}")));
        }
    }
    Ok(seen)
}
