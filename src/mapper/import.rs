//! JSON-LD document → tile tree.

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::Mapper;
use super::resolve::ConceptResolver;
use crate::error::{MapperError, MapperResult};
use crate::json_ld::vocab::{
    XSD_BOOLEAN, XSD_DATE, XSD_DATE_TIME, XSD_DECIMAL, XSD_DOUBLE, XSD_FLOAT, XSD_INTEGER,
    XSD_STRING,
};
use crate::json_ld::{LocalIri, Literal, NodeObject, PredicateValue};
use crate::model::{
    Cardinality, Datatype, DateValue, GraphSchema, Node, NumberValue, Tile, TileValue,
};

pub(super) struct Importer<'a> {
    mapper: &'a Mapper,
    schema: &'a GraphSchema,
    resolver: ConceptResolver<'a>,
    resource_id: Uuid,
    tiles: Vec<Tile>,
    tile_index: HashMap<Uuid, usize>,
}

impl<'a> Importer<'a> {
    pub(super) fn new(
        mapper: &'a Mapper,
        schema: &'a GraphSchema,
        resource_id: Uuid,
    ) -> Importer<'a> {
        Importer {
            mapper,
            schema,
            resolver: ConceptResolver::new(&mapper.store.concepts, &mapper.iris),
            resource_id,
            tiles: vec![],
            tile_index: HashMap::new(),
        }
    }

    /// Maps an expanded document onto fresh tiles, persisting nothing.
    pub(super) fn build(mut self, document: &JsonValue) -> MapperResult<Vec<Tile>> {
        let object = NodeObject::from_value(document)?;
        let schema = self.schema;
        let root = schema.root();

        let expected = self.mapper.iris.resource(self.resource_id);
        let local = LocalIri::Resource(self.resource_id);
        match object.id() {
            Some(id) if self.mapper.iris.parse(id) == Some(local) => {}
            Some(id) => {
                return Err(MapperError::SchemaMismatch(format!(
                    "document @id {id} does not match {expected}"
                )));
            }
            None => {
                return Err(MapperError::SchemaMismatch(format!(
                    "document has no @id, expected {expected}"
                )));
            }
        }
        if object.type_iri() != Some(root.ontologyclass.as_str()) {
            return Err(MapperError::SchemaMismatch(format!(
                "document @type {} does not match graph root class {}",
                object.type_iri().unwrap_or("(none)"),
                root.ontologyclass
            )));
        }

        self.visit_children(root, object, None)?;
        Ok(self.tiles)
    }

    fn visit_children(
        &mut self,
        parent: &'a Node,
        object: NodeObject<'_>,
        tile: Option<usize>,
    ) -> MapperResult<()> {
        let schema = self.schema;
        for (predicate, value) in object.predicates() {
            let value = value?;
            let candidates = schema.candidates(parent.nodeid, predicate);
            if candidates.is_empty() {
                return Err(MapperError::SchemaMismatch(format!(
                    "predicate {predicate} is not valid below node {}",
                    parent.name
                )));
            }
            match value {
                PredicateValue::List(items) => {
                    for item in &items {
                        let node = self.select(&candidates, predicate, item)?;
                        if !schema.accepts_many(node) {
                            return Err(MapperError::CardinalityViolation(format!(
                                "node {} takes a single value, found a list for {predicate}",
                                node.name
                            )));
                        }
                        self.visit_value(node, item, tile)?;
                    }
                }
                value => {
                    let node = self.select(&candidates, predicate, &value)?;
                    self.visit_value(node, &value, tile)?;
                }
            }
        }
        Ok(())
    }

    /// Picks the child node a value belongs to. Node objects match on class,
    /// literals on datatype. Ties between nodes of one class are broken by
    /// which node can actually take the value.
    fn select(
        &mut self,
        candidates: &[&'a Node],
        predicate: &str,
        value: &PredicateValue<'_>,
    ) -> MapperResult<&'a Node> {
        match value {
            PredicateValue::Node(object) => {
                let class = object.type_iri();
                let matching: Vec<&'a Node> = candidates
                    .iter()
                    .copied()
                    .filter(|node| !node.datatype.is_literal())
                    .filter(|node| class.is_none_or(|class| node.ontologyclass == class))
                    .collect();
                match matching.as_slice() {
                    [] => Err(MapperError::SchemaMismatch(format!(
                        "no node of class {} below {predicate}",
                        class.unwrap_or("(none)")
                    ))),
                    [node] => Ok(*node),
                    [first, ..] => {
                        for node in &matching {
                            if self.accepts(node, *object)? {
                                return Ok(*node);
                            }
                        }
                        Ok(*first)
                    }
                }
            }
            PredicateValue::List(_) => Err(MapperError::CardinalityViolation(format!(
                "nested list below {predicate}"
            ))),
            literal => {
                let kind = literal_kind(literal);
                let mut literals = candidates
                    .iter()
                    .copied()
                    .filter(|node| node.datatype.is_literal());
                let first = literals.next().ok_or_else(|| {
                    MapperError::SchemaMismatch(format!(
                        "{predicate} expects a node object, found a {}",
                        literal.describe()
                    ))
                })?;
                Ok(std::iter::once(first)
                    .chain(literals)
                    .find(|node| Some(node.datatype) == kind)
                    .unwrap_or(first))
            }
        }
    }

    /// Whether `node` can take `object` without error.
    fn accepts(&mut self, node: &'a Node, object: NodeObject<'_>) -> MapperResult<bool> {
        let id = object.id();
        let fits = match node.datatype {
            Datatype::Concept | Datatype::ConceptList => match id {
                Some(id) => match self.resolver.resolve(id, node.collection()) {
                    Ok(_) => true,
                    Err(MapperError::Storage(err)) => return Err(MapperError::Storage(err)),
                    Err(_) => false,
                },
                None => false,
            },
            Datatype::ResourceInstance | Datatype::ResourceInstanceList => id
                .and_then(|id| self.mapper.iris.parse(id))
                .is_some_and(|iri| matches!(iri, LocalIri::Resource(_))),
            _ => match id.and_then(|id| self.mapper.iris.parse(id)) {
                None => true,
                Some(LocalIri::TileNode { node: nodeid, .. }) => nodeid == node.nodeid,
                Some(_) => false,
            },
        };
        Ok(fits
            && object
                .predicates()
                .all(|(predicate, _)| !self.schema.candidates(node.nodeid, predicate).is_empty()))
    }

    fn visit_value(
        &mut self,
        node: &'a Node,
        value: &PredicateValue<'_>,
        parent_tile: Option<usize>,
    ) -> MapperResult<()> {
        let hint = match value {
            PredicateValue::Node(object) => {
                match object.id().and_then(|id| self.mapper.iris.parse(id)) {
                    Some(LocalIri::TileNode { tile, node: nodeid }) => {
                        if nodeid != node.nodeid {
                            return Err(MapperError::SchemaMismatch(format!(
                                "tile IRI names node {nodeid}, the document places it at node {}",
                                node.name
                            )));
                        }
                        Some(tile)
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        let tile = self.tile_for(node, hint, parent_tile)?;

        match node.datatype {
            Datatype::Semantic => {
                let PredicateValue::Node(object) = value else {
                    return Err(MapperError::SchemaMismatch(format!(
                        "semantic node {} expects a node object, found a {}",
                        node.name,
                        value.describe()
                    )));
                };
                self.visit_children(node, *object, Some(tile))
            }
            Datatype::Concept | Datatype::ConceptList => {
                let object = expect_reference(node, value)?;
                let iri = object.id().ok_or_else(|| {
                    MapperError::UnresolvedReference(format!(
                        "concept value for node {} has no @id",
                        node.name
                    ))
                })?;
                let concept = self.resolver.resolve(iri, node.collection())?;
                self.write(tile, node, concept.id, TileValue::Concept)?;
                self.visit_nested(node, object, tile)
            }
            Datatype::ResourceInstance | Datatype::ResourceInstanceList => {
                let object = expect_reference(node, value)?;
                let target = self.resource_reference(node, object)?;
                self.write(tile, node, target, TileValue::ResourceInstance)?;
                self.visit_nested(node, object, tile)
            }
            _ => {
                let coerced = coerce(node, value)?;
                self.store(tile, node, coerced)
            }
        }
    }

    /// Children hanging off a reference node share its tile. List nodes
    /// have no single value to hang them from.
    fn visit_nested(
        &mut self,
        node: &'a Node,
        object: NodeObject<'_>,
        tile: usize,
    ) -> MapperResult<()> {
        if !object.has_predicates() {
            return Ok(());
        }
        if node.datatype.is_list() {
            return Err(MapperError::SchemaMismatch(format!(
                "values of list node {} cannot carry nested predicates",
                node.name
            )));
        }
        self.visit_children(node, object, Some(tile))
    }

    fn resource_reference(&self, node: &Node, object: NodeObject<'_>) -> MapperResult<Uuid> {
        let iri = object.id().ok_or_else(|| {
            MapperError::UnresolvedReference(format!(
                "resource value for node {} has no @id",
                node.name
            ))
        })?;
        let Some(LocalIri::Resource(target)) = self.mapper.iris.parse(iri) else {
            return Err(MapperError::UnresolvedReference(format!(
                "{iri} does not identify a resource instance"
            )));
        };
        if target != self.resource_id && !self.mapper.store.resources.exists(target)? {
            return Err(MapperError::UnresolvedReference(format!(
                "resource instance {target} does not exist"
            )));
        }
        Ok(target)
    }

    /// Index of the tile holding `node`'s value, opening a new tile for
    /// node group roots.
    fn tile_for(
        &mut self,
        node: &Node,
        hint: Option<Uuid>,
        parent_tile: Option<usize>,
    ) -> MapperResult<usize> {
        if !self.schema.is_nodegroup_root(node) {
            return parent_tile.ok_or_else(|| {
                MapperError::SchemaMismatch(format!("node {} has no enclosing tile", node.name))
            });
        }
        let parent_id = parent_tile.map(|idx| self.tiles[idx].tileid);
        let sibling = self
            .tiles
            .iter()
            .position(|t| t.nodegroup_id == node.nodeid && t.parenttile_id == parent_id);

        if node.datatype.is_list() {
            if let Some(idx) = sibling {
                return Ok(idx);
            }
        } else if sibling.is_some()
            && self
                .schema
                .nodegroup(node.nodeid)
                .is_some_and(|g| g.cardinality == Cardinality::One)
        {
            return Err(MapperError::CardinalityViolation(format!(
                "node group {} holds a single tile",
                node.name
            )));
        }

        let tileid = hint.unwrap_or_else(Uuid::now_v7);
        if self.tile_index.contains_key(&tileid) {
            return Err(MapperError::CardinalityViolation(format!(
                "tile {tileid} appears more than once"
            )));
        }
        let idx = self.tiles.len();
        self.tiles
            .push(Tile::new(tileid, self.resource_id, node.nodeid, parent_id));
        self.tile_index.insert(tileid, idx);
        Ok(idx)
    }

    fn write(
        &mut self,
        tile: usize,
        node: &Node,
        id: Uuid,
        single: fn(Uuid) -> TileValue,
    ) -> MapperResult<()> {
        let data = &mut self.tiles[tile].data;
        match node.datatype {
            Datatype::ConceptList => {
                data.entry(node.nodeid)
                    .or_insert_with(|| TileValue::ConceptList(vec![]))
                    .push(id);
                Ok(())
            }
            Datatype::ResourceInstanceList => {
                data.entry(node.nodeid)
                    .or_insert_with(|| TileValue::ResourceInstanceList(vec![]))
                    .push(id);
                Ok(())
            }
            _ => self.store(tile, node, single(id)),
        }
    }

    fn store(&mut self, tile: usize, node: &Node, value: TileValue) -> MapperResult<()> {
        let data = &mut self.tiles[tile].data;
        if data.contains_key(&node.nodeid) {
            return Err(MapperError::CardinalityViolation(format!(
                "node {} already holds a value",
                node.name
            )));
        }
        data.insert(node.nodeid, value);
        Ok(())
    }
}

fn expect_reference<'a>(node: &Node, value: &PredicateValue<'a>) -> MapperResult<NodeObject<'a>> {
    match value {
        PredicateValue::Node(object) => Ok(*object),
        other => Err(MapperError::SchemaMismatch(format!(
            "node {} expects a reference, found a {}",
            node.name,
            other.describe()
        ))),
    }
}

fn literal_kind(value: &PredicateValue<'_>) -> Option<Datatype> {
    match value {
        PredicateValue::Literal(Literal::String(_)) | PredicateValue::Tagged { .. } => {
            Some(Datatype::String)
        }
        PredicateValue::Literal(Literal::Number(_)) => Some(Datatype::Number),
        PredicateValue::Literal(Literal::Bool(_)) => Some(Datatype::Boolean),
        PredicateValue::Typed { datatype, .. } => xsd_kind(datatype),
        _ => None,
    }
}

fn xsd_kind(datatype: &str) -> Option<Datatype> {
    if datatype == XSD_STRING.as_str() {
        Some(Datatype::String)
    } else if [XSD_INTEGER, XSD_DECIMAL, XSD_DOUBLE, XSD_FLOAT]
        .iter()
        .any(|t| t.as_str() == datatype)
    {
        Some(Datatype::Number)
    } else if datatype == XSD_BOOLEAN.as_str() {
        Some(Datatype::Boolean)
    } else if datatype == XSD_DATE.as_str() || datatype == XSD_DATE_TIME.as_str() {
        Some(Datatype::Date)
    } else {
        None
    }
}

/// Parses a literal into the native representation of a literal node.
fn coerce(node: &Node, value: &PredicateValue<'_>) -> MapperResult<TileValue> {
    let mismatch = || {
        MapperError::TypeCoercion(format!(
            "node {} ({:?}) cannot hold {}",
            node.name,
            node.datatype,
            describe_literal(value)
        ))
    };
    let (literal, declared) = match value {
        PredicateValue::Tagged { value, language } => {
            return match node.datatype {
                Datatype::String => Ok(TileValue::String {
                    value: value.clone(),
                    language: Some(language.to_string()),
                }),
                _ => Err(mismatch()),
            };
        }
        PredicateValue::Literal(literal) => (literal, None),
        PredicateValue::Typed { value, datatype } => {
            let kind = xsd_kind(datatype).ok_or_else(|| {
                MapperError::TypeCoercion(format!("unsupported datatype {datatype}"))
            })?;
            if kind != node.datatype {
                return Err(mismatch());
            }
            (value, Some(*datatype))
        }
        _ => return Err(mismatch()),
    };

    match (node.datatype, literal) {
        (Datatype::String, Literal::String(s)) => Ok(TileValue::String {
            value: s.clone(),
            language: None,
        }),
        (Datatype::Number, literal) => {
            let number = match literal {
                Literal::Number(n) => NumberValue::from_json(n),
                Literal::String(s) => NumberValue::parse(s),
                Literal::Bool(_) => None,
            }
            .ok_or_else(mismatch)?;
            if declared == Some(XSD_INTEGER.as_str()) && !matches!(number, NumberValue::Int(_)) {
                return Err(mismatch());
            }
            Ok(TileValue::Number(number))
        }
        (Datatype::Boolean, Literal::Bool(b)) => Ok(TileValue::Boolean(*b)),
        (Datatype::Boolean, Literal::String(s)) => match s.trim() {
            "true" | "1" => Ok(TileValue::Boolean(true)),
            "false" | "0" => Ok(TileValue::Boolean(false)),
            _ => Err(mismatch()),
        },
        (Datatype::Date, Literal::String(s)) => DateValue::parse(s)
            .map(TileValue::Date)
            .ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

fn describe_literal(value: &PredicateValue<'_>) -> String {
    match value {
        PredicateValue::Literal(literal) | PredicateValue::Typed { value: literal, .. } => {
            match literal {
                Literal::String(s) => format!("{s:?}"),
                Literal::Number(n) => n.to_string(),
                Literal::Bool(b) => b.to_string(),
            }
        }
        PredicateValue::Tagged { value, language } => format!("{value:?}@{language}"),
        other => format!("a {}", other.describe()),
    }
}
