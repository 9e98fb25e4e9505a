//! Graph models: the node/edge/node group schema of one resource type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MapperError, MapperResult};
use crate::slug::Slug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Datatype {
    Semantic,
    String,
    Number,
    Boolean,
    Date,
    Concept,
    ConceptList,
    ResourceInstance,
    ResourceInstanceList,
}

impl Datatype {
    /// Several values inside one tile
    pub(crate) fn is_list(self) -> bool {
        matches!(self, Datatype::ConceptList | Datatype::ResourceInstanceList)
    }
    pub(crate) fn is_literal(self) -> bool {
        matches!(
            self,
            Datatype::String | Datatype::Number | Datatype::Boolean | Datatype::Date
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Cardinality {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "n")]
    Many,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NodeConfig {
    /// Collection restricting the concepts a concept node accepts
    #[serde(rename = "rdmCollection", default)]
    pub(crate) rdm_collection: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Node {
    pub(crate) nodeid: Uuid,
    pub(crate) name: String,
    pub(crate) datatype: Datatype,
    pub(crate) ontologyclass: String,
    #[serde(default)]
    pub(crate) nodegroup_id: Option<Uuid>,
    #[serde(default)]
    pub(crate) istopnode: bool,
    #[serde(default)]
    pub(crate) config: Option<NodeConfig>,
}

impl Node {
    pub(crate) fn collection(&self) -> Option<Uuid> {
        self.config.as_ref().and_then(|c| c.rdm_collection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Edge {
    pub(crate) domainnode_id: Uuid,
    pub(crate) rangenode_id: Uuid,
    pub(crate) ontologyproperty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NodeGroup {
    pub(crate) nodegroupid: Uuid,
    pub(crate) cardinality: Cardinality,
    #[serde(default)]
    pub(crate) parentnodegroup_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct GraphModel {
    pub(crate) graphid: Uuid,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) slug: Option<Slug>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) nodegroups: Vec<NodeGroup>,
}

/// A validated graph model with lookup tables, shared read-only between
/// requests.
#[derive(Debug)]
pub(crate) struct GraphSchema {
    model: GraphModel,
    root: usize,
    nodes: HashMap<Uuid, usize>,
    nodegroups: HashMap<Uuid, usize>,
    /// domain node → indexes into `model.edges`, in declaration order
    children: HashMap<Uuid, Vec<usize>>,
}

impl GraphSchema {
    pub(crate) fn compile(model: GraphModel) -> MapperResult<GraphSchema> {
        let label = format!("graph {} ({})", model.name, model.graphid);
        let invalid = |message: String| MapperError::Validation(format!("{label}: {message}"));

        let mut nodes = HashMap::new();
        for (idx, node) in model.nodes.iter().enumerate() {
            if nodes.insert(node.nodeid, idx).is_some() {
                return Err(invalid(format!("duplicate node {}", node.nodeid)));
            }
        }
        let mut nodegroups = HashMap::new();
        for (idx, group) in model.nodegroups.iter().enumerate() {
            if !nodes.contains_key(&group.nodegroupid) {
                return Err(invalid(format!(
                    "node group {} has no root node",
                    group.nodegroupid
                )));
            }
            nodegroups.insert(group.nodegroupid, idx);
        }

        let mut top_nodes = model.nodes.iter().enumerate().filter(|(_, n)| n.istopnode);
        let (root, top) = top_nodes
            .next()
            .ok_or_else(|| invalid("missing top node".to_string()))?;
        if top_nodes.next().is_some() {
            return Err(invalid("more than one top node".to_string()));
        }
        if top.nodegroup_id.is_some() {
            return Err(invalid("top node must not belong to a node group".to_string()));
        }

        let mut children: HashMap<Uuid, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<Uuid, Uuid> = HashMap::new();
        for (idx, edge) in model.edges.iter().enumerate() {
            for end in [edge.domainnode_id, edge.rangenode_id] {
                if !nodes.contains_key(&end) {
                    return Err(invalid(format!("edge references unknown node {end}")));
                }
            }
            if incoming.insert(edge.rangenode_id, edge.domainnode_id).is_some() {
                return Err(invalid(format!(
                    "node {} has more than one parent",
                    edge.rangenode_id
                )));
            }
            children.entry(edge.domainnode_id).or_default().push(idx);
        }

        let schema = GraphSchema {
            root,
            nodes,
            nodegroups,
            children,
            model,
        };

        for node in &schema.model.nodes {
            if node.istopnode {
                continue;
            }
            let Some(group_id) = node.nodegroup_id else {
                return Err(invalid(format!("node {} has no node group", node.name)));
            };
            if schema.nodegroup(group_id).is_none() {
                return Err(invalid(format!(
                    "node {} references unknown node group {group_id}",
                    node.name
                )));
            }
            let parent = incoming
                .get(&node.nodeid)
                .and_then(|id| schema.node(*id))
                .ok_or_else(|| invalid(format!("node {} is not connected", node.name)))?;
            let consistent = if schema.is_nodegroup_root(node) {
                schema
                    .nodegroup(node.nodeid)
                    .is_some_and(|g| g.parentnodegroup_id == parent.nodegroup_id)
            } else {
                node.nodegroup_id == parent.nodegroup_id
            };
            if !consistent {
                return Err(invalid(format!(
                    "node {} does not nest inside the node group of {}",
                    node.name, parent.name
                )));
            }
        }

        Ok(schema)
    }

    pub(crate) fn model(&self) -> &GraphModel {
        &self.model
    }
    pub(crate) fn graphid(&self) -> Uuid {
        self.model.graphid
    }
    pub(crate) fn root(&self) -> &Node {
        &self.model.nodes[self.root]
    }
    pub(crate) fn node(&self, nodeid: Uuid) -> Option<&Node> {
        self.nodes.get(&nodeid).map(|idx| &self.model.nodes[*idx])
    }
    pub(crate) fn nodegroup(&self, nodegroupid: Uuid) -> Option<&NodeGroup> {
        self.nodegroups
            .get(&nodegroupid)
            .map(|idx| &self.model.nodegroups[*idx])
    }
    pub(crate) fn is_nodegroup_root(&self, node: &Node) -> bool {
        node.nodegroup_id == Some(node.nodeid)
    }
    /// A node that takes several values, either in one tile or one tile each.
    pub(crate) fn accepts_many(&self, node: &Node) -> bool {
        node.datatype.is_list()
            || (self.is_nodegroup_root(node)
                && self
                    .nodegroup(node.nodeid)
                    .is_some_and(|g| g.cardinality == Cardinality::Many))
    }
    pub(crate) fn children(&self, nodeid: Uuid) -> impl Iterator<Item = (&Edge, &Node)> + '_ {
        self.children
            .get(&nodeid)
            .into_iter()
            .flatten()
            .map(|idx| &self.model.edges[*idx])
            .filter_map(|edge| self.node(edge.rangenode_id).map(|node| (edge, node)))
    }
    /// Child nodes reached from `nodeid` through `property`.
    pub(crate) fn candidates(&self, nodeid: Uuid, property: &str) -> Vec<&Node> {
        self.children(nodeid)
            .filter(|(edge, _)| edge.ontologyproperty == property)
            .map(|(_, node)| node)
            .collect()
    }
}
