use uuid::Uuid;

/// What a local IRI minted under `base_url` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocalIri {
    Resource(Uuid),
    Concept(Uuid),
    TileNode { tile: Uuid, node: Uuid },
}

#[derive(Debug, Clone)]
pub(crate) struct IriMinter {
    base_url: String,
}

impl IriMinter {
    pub(crate) fn new(base_url: &str) -> IriMinter {
        IriMinter {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn resource(&self, id: Uuid) -> String {
        format!("{}/resources/{}", self.base_url, id.hyphenated())
    }

    pub(crate) fn concept(&self, id: Uuid) -> String {
        format!("{}/concepts/{}", self.base_url, id.hyphenated())
    }

    pub(crate) fn tile_node(&self, tile: Uuid, node: Uuid) -> String {
        format!(
            "{}/tile/{}/node/{}",
            self.base_url,
            tile.hyphenated(),
            node.hyphenated()
        )
    }

    /// Classifies an IRI minted under `base_url`, `None` for foreign IRIs
    /// and blank nodes.
    pub(crate) fn parse(&self, iri: &str) -> Option<LocalIri> {
        let path = iri.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        match segments.as_slice() {
            ["resources", id] => Uuid::try_parse(id).ok().map(LocalIri::Resource),
            ["concepts", id] => Uuid::try_parse(id).ok().map(LocalIri::Concept),
            ["tile", tile, "node", node] => Some(LocalIri::TileNode {
                tile: Uuid::try_parse(tile).ok()?,
                node: Uuid::try_parse(node).ok()?,
            }),
            _ => None,
        }
    }
}
