//! Bulk resource import and export in the platform's business data format.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use tracing::info;
use uuid::Uuid;

use crate::error::{MapperError, MapperResult};
use crate::model::{
    Cardinality, Datatype, DateValue, GraphSchema, Node, NumberValue, ResourceInstance, Tile,
    TileValue,
};
use crate::store::Store;

#[derive(Serialize, Deserialize)]
struct BusinessDataFile {
    business_data: BusinessData,
}

#[derive(Default, Serialize, Deserialize)]
struct BusinessData {
    #[serde(default)]
    resources: Vec<BusinessResource>,
}

#[derive(Serialize, Deserialize)]
struct BusinessResource {
    resourceinstance: ResourceInstance,
    #[serde(default)]
    tiles: Vec<RawTile>,
}

/// Tile as written in business data files, node values still untyped.
#[derive(Serialize, Deserialize)]
struct RawTile {
    tileid: Uuid,
    resourceinstance_id: Uuid,
    nodegroup_id: Uuid,
    #[serde(default)]
    parenttile_id: Option<Uuid>,
    #[serde(default)]
    data: Map<String, JsonValue>,
}

/// Imports every resource of a business data document, each one replaced
/// atomically. Returns the imported resource ids.
pub(crate) fn load_business_data(store: &Store, document: &JsonValue) -> MapperResult<Vec<Uuid>> {
    let file = BusinessDataFile::deserialize(document)
        .map_err(|err| MapperError::Validation(format!("invalid business data file: {err}")))?;
    let in_file: HashSet<Uuid> = file
        .business_data
        .resources
        .iter()
        .map(|r| r.resourceinstance.resourceinstanceid)
        .collect();

    let mut collections = Collections::default();
    let mut converted = Vec::with_capacity(file.business_data.resources.len());
    for resource in file.business_data.resources {
        let instance = &resource.resourceinstance;
        let schema = store.graphs.find(instance.graph_id)?;
        if let Some(existing) = store.resources.find(instance.resourceinstanceid)? {
            if existing.graph_id != instance.graph_id {
                return Err(MapperError::SchemaMismatch(format!(
                    "resource {} belongs to graph {}, not {}",
                    instance.resourceinstanceid, existing.graph_id, instance.graph_id
                )));
            }
        }
        let tiles = convert_tiles(store, &schema, &resource, &in_file, &mut collections)?;
        converted.push((resource.resourceinstance, tiles));
    }

    let mut ids = Vec::with_capacity(converted.len());
    for (resource, tiles) in converted {
        let id = resource.resourceinstanceid;
        let _guard = store.resources.lock(id);
        store.resources.replace(&resource, &tiles)?;
        ids.push(id);
    }
    info!(target: "loader", resources = ids.len(), "business data loaded");
    Ok(ids)
}

/// Concepts reachable from each collection seen so far.
#[derive(Default)]
struct Collections(HashMap<Uuid, HashSet<Uuid>>);

impl Collections {
    fn contains(&mut self, store: &Store, collection: Uuid, concept: Uuid) -> MapperResult<bool> {
        if !self.0.contains_key(&collection) {
            let members = store.concepts.reachable(collection)?.ok_or_else(|| {
                MapperError::UnresolvedReference(format!("unknown collection {collection}"))
            })?;
            self.0.insert(collection, members);
        }
        Ok(self.0.get(&collection).is_some_and(|members| members.contains(&concept)))
    }
}

fn convert_tiles(
    store: &Store,
    schema: &GraphSchema,
    resource: &BusinessResource,
    in_file: &HashSet<Uuid>,
    collections: &mut Collections,
) -> MapperResult<Vec<Tile>> {
    let resource_id = resource.resourceinstance.resourceinstanceid;
    let groups: HashMap<Uuid, Uuid> = resource
        .tiles
        .iter()
        .map(|t| (t.tileid, t.nodegroup_id))
        .collect();
    if groups.len() != resource.tiles.len() {
        return Err(MapperError::Validation(format!(
            "resource {resource_id} repeats a tile id"
        )));
    }

    let mut siblings = HashSet::new();
    let mut tiles = Vec::with_capacity(resource.tiles.len());
    for raw in &resource.tiles {
        let invalid = |message: String| {
            MapperError::Validation(format!(
                "tile {} of resource {resource_id}: {message}",
                raw.tileid
            ))
        };
        if raw.resourceinstance_id != resource_id {
            return Err(invalid(format!(
                "belongs to resource {}",
                raw.resourceinstance_id
            )));
        }
        let group = schema
            .nodegroup(raw.nodegroup_id)
            .ok_or_else(|| invalid(format!("unknown node group {}", raw.nodegroup_id)))?;
        let parent_group = match raw.parenttile_id {
            Some(parent) => Some(
                *groups
                    .get(&parent)
                    .ok_or_else(|| invalid(format!("unknown parent tile {parent}")))?,
            ),
            None => None,
        };
        if parent_group != group.parentnodegroup_id {
            return Err(invalid("parent tile does not hold the parent node group".to_string()));
        }
        if group.cardinality == Cardinality::One
            && !siblings.insert((raw.nodegroup_id, raw.parenttile_id))
        {
            return Err(MapperError::CardinalityViolation(format!(
                "resource {resource_id} holds several tiles of node group {}",
                raw.nodegroup_id
            )));
        }

        let mut tile = Tile::new(raw.tileid, resource_id, raw.nodegroup_id, raw.parenttile_id);
        for (key, raw_value) in &raw.data {
            let node = Uuid::try_parse(key)
                .ok()
                .and_then(|id| schema.node(id))
                .filter(|node| node.nodegroup_id == Some(raw.nodegroup_id))
                .ok_or_else(|| invalid(format!("node {key} is not part of the node group")))?;
            let value = convert_value(store, node, raw_value, resource_id, in_file, collections)?;
            if let Some(value) = value {
                tile.data.insert(node.nodeid, value);
            }
        }
        tiles.push(tile);
    }
    Ok(tiles)
}

fn convert_value(
    store: &Store,
    node: &Node,
    raw: &JsonValue,
    resource_id: Uuid,
    in_file: &HashSet<Uuid>,
    collections: &mut Collections,
) -> MapperResult<Option<TileValue>> {
    if raw.is_null() {
        return Ok(None);
    }
    let mismatch = || {
        MapperError::TypeCoercion(format!(
            "node {} ({:?}) cannot hold {raw}",
            node.name, node.datatype
        ))
    };
    let value = match node.datatype {
        Datatype::Semantic => return Err(mismatch()),
        Datatype::String => match raw {
            JsonValue::String(s) => TileValue::String {
                value: s.clone(),
                language: None,
            },
            JsonValue::Object(map) => TileValue::String {
                value: map
                    .get("value")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(mismatch)?
                    .to_string(),
                language: map
                    .get("language")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
            },
            _ => return Err(mismatch()),
        },
        Datatype::Number => match raw {
            JsonValue::Number(n) => NumberValue::from_json(n),
            JsonValue::String(s) => NumberValue::parse(s),
            _ => None,
        }
        .map(TileValue::Number)
        .ok_or_else(mismatch)?,
        Datatype::Boolean => match raw {
            JsonValue::Bool(b) => TileValue::Boolean(*b),
            JsonValue::String(s) if s == "true" => TileValue::Boolean(true),
            JsonValue::String(s) if s == "false" => TileValue::Boolean(false),
            _ => return Err(mismatch()),
        },
        Datatype::Date => raw
            .as_str()
            .and_then(DateValue::parse)
            .map(TileValue::Date)
            .ok_or_else(mismatch)?,
        Datatype::Concept => {
            let id = concept_id(store, raw).ok_or_else(mismatch)??;
            check_collection(store, node, id, collections)?;
            TileValue::Concept(id)
        }
        Datatype::ConceptList => {
            let mut ids = vec![];
            for item in list_items(raw) {
                let id = concept_id(store, item).ok_or_else(mismatch)??;
                check_collection(store, node, id, collections)?;
                ids.push(id);
            }
            TileValue::ConceptList(ids)
        }
        Datatype::ResourceInstance => TileValue::ResourceInstance(
            resource_ref(store, raw, resource_id, in_file).ok_or_else(mismatch)??,
        ),
        Datatype::ResourceInstanceList => {
            let mut ids = vec![];
            for item in list_items(raw) {
                ids.push(resource_ref(store, item, resource_id, in_file).ok_or_else(mismatch)??);
            }
            TileValue::ResourceInstanceList(ids)
        }
    };
    Ok(Some(value))
}

fn list_items(raw: &JsonValue) -> Vec<&JsonValue> {
    match raw {
        JsonValue::Array(items) => items.iter().collect(),
        single => vec![single],
    }
}

/// `None` when the value is not a UUID at all.
fn concept_id(store: &Store, raw: &JsonValue) -> Option<MapperResult<Uuid>> {
    let id = raw.as_str().and_then(|s| Uuid::try_parse(s).ok())?;
    Some(match store.concepts.find_concept(id) {
        Ok(Some(_)) => Ok(id),
        Ok(None) => Err(MapperError::UnresolvedReference(format!(
            "unknown concept {id}"
        ))),
        Err(err) => Err(err.into()),
    })
}

fn check_collection(
    store: &Store,
    node: &Node,
    concept: Uuid,
    collections: &mut Collections,
) -> MapperResult<()> {
    match node.collection() {
        Some(collection) if !collections.contains(store, collection, concept)? => {
            Err(MapperError::ConceptNotInCollection {
                uri: concept.to_string(),
                collection,
            })
        }
        _ => Ok(()),
    }
}

/// Accepts a bare UUID or `{"resourceId": uuid}`.
fn resource_ref(
    store: &Store,
    raw: &JsonValue,
    resource_id: Uuid,
    in_file: &HashSet<Uuid>,
) -> Option<MapperResult<Uuid>> {
    let text = match raw {
        JsonValue::String(s) => s.as_str(),
        JsonValue::Object(map) => map.get("resourceId")?.as_str()?,
        _ => return None,
    };
    let id = Uuid::try_parse(text).ok()?;
    if id == resource_id || in_file.contains(&id) {
        return Some(Ok(id));
    }
    Some(match store.resources.exists(id) {
        Ok(true) => Ok(id),
        Ok(false) => Err(MapperError::UnresolvedReference(format!(
            "unknown resource instance {id}"
        ))),
        Err(err) => Err(err.into()),
    })
}

/// Renders stored resources back into a business data document.
pub(crate) fn export_business_data(store: &Store, ids: &[Uuid]) -> MapperResult<JsonValue> {
    let mut resources = Vec::with_capacity(ids.len());
    for id in ids {
        let resourceinstance = store
            .resources
            .find(*id)?
            .ok_or(MapperError::ResourceNotFound(*id))?;
        let tiles = store
            .resources
            .tiles(*id)?
            .into_iter()
            .map(|tile| RawTile {
                tileid: tile.tileid,
                resourceinstance_id: tile.resourceinstance_id,
                nodegroup_id: tile.nodegroup_id,
                parenttile_id: tile.parenttile_id,
                data: tile
                    .data
                    .iter()
                    .map(|(node, value)| (node.to_string(), raw_value(value)))
                    .collect(),
            })
            .collect();
        resources.push(BusinessResource {
            resourceinstance,
            tiles,
        });
    }
    let file = BusinessDataFile {
        business_data: BusinessData { resources },
    };
    serde_json::to_value(file).map_err(|err| MapperError::Storage(err.into()))
}

fn raw_value(value: &TileValue) -> JsonValue {
    match value {
        TileValue::String {
            value,
            language: None,
        } => JsonValue::String(value.clone()),
        TileValue::String {
            value,
            language: Some(language),
        } => json!({ "value": value, "language": language }),
        TileValue::Number(number) => number.to_json(),
        TileValue::Boolean(b) => JsonValue::Bool(*b),
        TileValue::Date(date) => JsonValue::String(date.to_string()),
        TileValue::Concept(id) => JsonValue::String(id.to_string()),
        TileValue::ConceptList(ids) => ids
            .iter()
            .map(|id| JsonValue::String(id.to_string()))
            .collect(),
        TileValue::ResourceInstance(id) => json!({ "resourceId": id }),
        TileValue::ResourceInstanceList(ids) => ids
            .iter()
            .map(|id| json!({ "resourceId": id }))
            .collect(),
    }
}
