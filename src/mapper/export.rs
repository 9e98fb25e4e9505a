//! Tile tree → JSON-LD document.

use serde_json::{Map, Value as JsonValue, json};
use uuid::Uuid;

use super::Mapper;
use crate::error::{MapperError, MapperResult};
use crate::json_ld::vocab::{ID, LANGUAGE, RDFS_LABEL, TYPE, VALUE, XSD_DATE_TIME};
use crate::model::{Datatype, GraphSchema, Node, Tile, TileValue};

pub(super) struct Exporter<'a> {
    mapper: &'a Mapper,
    schema: &'a GraphSchema,
    resource_id: Uuid,
    tiles: &'a [Tile],
}

impl<'a> Exporter<'a> {
    pub(super) fn new(
        mapper: &'a Mapper,
        schema: &'a GraphSchema,
        resource_id: Uuid,
        tiles: &'a [Tile],
    ) -> Exporter<'a> {
        Exporter {
            mapper,
            schema,
            resource_id,
            tiles,
        }
    }

    pub(super) fn document(&self) -> MapperResult<JsonValue> {
        let root = self.schema.root();
        let mut document = Map::new();
        document.insert(
            ID.as_str().to_string(),
            self.mapper.iris.resource(self.resource_id).into(),
        );
        document.insert(TYPE.as_str().to_string(), root.ontologyclass.clone().into());
        self.emit_children(root, None, &mut document)?;
        Ok(JsonValue::Object(document))
    }

    /// Emits every populated child of `parent` in graph order.
    fn emit_children(
        &self,
        parent: &Node,
        tile: Option<&Tile>,
        out: &mut Map<String, JsonValue>,
    ) -> MapperResult<()> {
        for (edge, child) in self.schema.children(parent.nodeid) {
            let mut values = vec![];
            if self.schema.is_nodegroup_root(child) {
                let parent_id = tile.map(|t| t.tileid);
                for child_tile in self
                    .tiles
                    .iter()
                    .filter(|t| t.nodegroup_id == child.nodeid && t.parenttile_id == parent_id)
                {
                    values.extend(self.emit_node(child, child_tile)?);
                }
            } else if let Some(tile) = tile {
                values.extend(self.emit_node(child, tile)?);
            }
            merge(out, &edge.ontologyproperty, values);
        }
        Ok(())
    }

    fn emit_node(&self, node: &Node, tile: &Tile) -> MapperResult<Vec<JsonValue>> {
        if node.datatype == Datatype::Semantic {
            let mut object = Map::new();
            object.insert(
                ID.as_str().to_string(),
                self.mapper.iris.tile_node(tile.tileid, node.nodeid).into(),
            );
            object.insert(TYPE.as_str().to_string(), node.ontologyclass.clone().into());
            self.emit_children(node, Some(tile), &mut object)?;
            // an empty branch inside a tile carries no information
            if object.len() == 2 && !self.schema.is_nodegroup_root(node) {
                return Ok(vec![]);
            }
            return Ok(vec![JsonValue::Object(object)]);
        }

        let Some(value) = tile.data.get(&node.nodeid) else {
            return Ok(vec![]);
        };
        let values = match value {
            TileValue::String { value, language } => vec![match language {
                Some(language) => json!({ VALUE.as_str(): value, LANGUAGE.as_str(): language }),
                None => JsonValue::String(value.clone()),
            }],
            TileValue::Number(number) => vec![number.to_json()],
            TileValue::Boolean(b) => vec![JsonValue::Bool(*b)],
            TileValue::Date(date) => vec![json!({
                TYPE.as_str(): XSD_DATE_TIME.as_str(),
                VALUE.as_str(): date.to_string(),
            })],
            TileValue::Concept(id) => {
                let mut concept = self.concept(node, *id)?;
                self.emit_children(node, Some(tile), &mut concept)?;
                vec![JsonValue::Object(concept)]
            }
            TileValue::ConceptList(ids) => ids
                .iter()
                .map(|id| self.concept(node, *id).map(JsonValue::Object))
                .collect::<MapperResult<_>>()?,
            TileValue::ResourceInstance(id) => {
                let mut resource = self.resource(node, *id)?;
                self.emit_children(node, Some(tile), &mut resource)?;
                vec![JsonValue::Object(resource)]
            }
            TileValue::ResourceInstanceList(ids) => ids
                .iter()
                .map(|id| self.resource(node, *id).map(JsonValue::Object))
                .collect::<MapperResult<_>>()?,
        };
        Ok(values)
    }

    fn concept(&self, node: &Node, id: Uuid) -> MapperResult<Map<String, JsonValue>> {
        let concept = self
            .mapper
            .store
            .concepts
            .find_concept(id)?
            .ok_or_else(|| {
                MapperError::UnresolvedReference(format!(
                    "node {} references missing concept {id}",
                    node.name
                ))
            })?;
        let mut object = Map::new();
        object.insert(ID.as_str().to_string(), self.mapper.iris.concept(id).into());
        object.insert(TYPE.as_str().to_string(), node.ontologyclass.clone().into());
        if let Some(label) = concept.label(&self.mapper.language) {
            object.insert(RDFS_LABEL.as_str().to_string(), label.into());
        }
        Ok(object)
    }

    fn resource(&self, node: &Node, id: Uuid) -> MapperResult<Map<String, JsonValue>> {
        if id != self.resource_id && !self.mapper.store.resources.exists(id)? {
            return Err(MapperError::UnresolvedReference(format!(
                "node {} references missing resource instance {id}",
                node.name
            )));
        }
        let mut object = Map::new();
        object.insert(ID.as_str().to_string(), self.mapper.iris.resource(id).into());
        object.insert(TYPE.as_str().to_string(), node.ontologyclass.clone().into());
        Ok(object)
    }
}

/// One value stays a single object, more become an array. Several child
/// nodes bound to the same property share one entry.
fn merge(out: &mut Map<String, JsonValue>, property: &str, mut values: Vec<JsonValue>) {
    if values.is_empty() {
        return;
    }
    if let Some(existing) = out.remove(property) {
        match existing {
            JsonValue::Array(mut items) => {
                items.append(&mut values);
                values = items;
            }
            single => values.insert(0, single),
        }
    }
    let entry = if values.len() == 1 {
        values.remove(0)
    } else {
        JsonValue::Array(values)
    };
    out.insert(property.to_string(), entry);
}
