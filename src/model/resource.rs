use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ResourceInstance {
    pub(crate) resourceinstanceid: Uuid,
    pub(crate) graph_id: Uuid,
    #[serde(default)]
    pub(crate) legacyid: Option<String>,
}

impl ResourceInstance {
    pub(crate) fn new(resourceinstanceid: Uuid, graph_id: Uuid) -> ResourceInstance {
        ResourceInstance {
            resourceinstanceid,
            graph_id,
            legacyid: None,
        }
    }
}
