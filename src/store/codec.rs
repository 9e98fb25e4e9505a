use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{Collection, Concept, ConceptScheme, GraphModel, ResourceInstance, Tile};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub(crate) struct Header {
    version: u32,
}

impl Header {
    pub(crate) const V_1: Header = Header { version: 1 };
}

/// Versioned postcard encoding of every persisted value.
pub(crate) trait StoreSerDe: Serialize + DeserializeOwned {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = postcard::to_extend(&Header::V_1, vec![])
            .context("unable to serialize record header")?;
        postcard::to_extend(self, header).context("unable to serialize record")
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (header, payload): (Header, _) =
            postcard::take_from_bytes(bytes).context("unable to deserialize record header")?;
        if header != Header::V_1 {
            tracing::error!(target: "store", ?header, "invalid record header version");
            bail!("unsupported record version {}", header.version);
        }
        postcard::from_bytes(payload).context("unable to deserialize record")
    }
}

impl StoreSerDe for GraphModel {}
impl StoreSerDe for Concept {}
impl StoreSerDe for ConceptScheme {}
impl StoreSerDe for Collection {}
impl StoreSerDe for ResourceInstance {}
impl StoreSerDe for Tile {}
