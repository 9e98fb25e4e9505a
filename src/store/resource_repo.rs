use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, UserKey};
use tracing::debug;
use uuid::Uuid;

use super::codec::StoreSerDe;
use crate::model::{ResourceInstance, Tile};

const LOCK_STRIPES: usize = 64;

/// Resource id followed by tile id, tiles of one resource share a prefix.
struct TileKey([u8; 32]);

impl TileKey {
    fn new(resource: Uuid, tile: Uuid) -> TileKey {
        let mut key = [0; 32];
        key[..16].copy_from_slice(resource.as_bytes());
        key[16..].copy_from_slice(tile.as_bytes());
        TileKey(key)
    }
}

impl From<TileKey> for UserKey {
    fn from(value: TileKey) -> Self {
        UserKey::new(&value.0)
    }
}

#[derive(Clone)]
pub(crate) struct ResourceRepo {
    keyspace: Keyspace,
    resources: PartitionHandle,
    tiles: PartitionHandle,
    stripes: Arc<[Mutex<()>]>,
}

impl ResourceRepo {
    pub(crate) fn new(keyspace: Keyspace) -> Result<ResourceRepo> {
        let options = PartitionCreateOptions::default();
        let resources = keyspace.open_partition("resources", options.clone())?;
        let tiles = keyspace.open_partition("tiles", options)?;
        let stripes = (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect();
        Ok(ResourceRepo {
            keyspace,
            resources,
            tiles,
            stripes,
        })
    }

    /// Serializes writers of one resource. Distinct resources rarely share
    /// a stripe.
    pub(crate) fn lock(&self, id: Uuid) -> MutexGuard<'_, ()> {
        let stripe = (id.as_u128() % LOCK_STRIPES as u128) as usize;
        self.stripes[stripe]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces a resource and its whole tile tree atomically.
    pub(crate) fn replace(&self, resource: &ResourceInstance, tiles: &[Tile]) -> Result<()> {
        let id = resource.resourceinstanceid;
        let mut batch = self.keyspace.batch();
        for entry in self.tiles.prefix(id.as_bytes()) {
            let (key, _) = entry?;
            batch.remove(&self.tiles, key);
        }
        for tile in tiles {
            batch.insert(
                &self.tiles,
                TileKey::new(id, tile.tileid),
                tile.to_bytes()?,
            );
        }
        batch.insert(&self.resources, id.as_bytes().as_slice(), resource.to_bytes()?);
        batch
            .commit()
            .with_context(|| format!("unable to store resource {id}"))?;
        debug!(target: "store", resource = %id, tiles = tiles.len(), "resource replaced");
        Ok(())
    }

    pub(crate) fn find(&self, id: Uuid) -> Result<Option<ResourceInstance>> {
        match self.resources.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(ResourceInstance::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.resources.contains_key(id.as_bytes())?)
    }

    /// Tiles of a resource, ordered by tile id.
    pub(crate) fn tiles(&self, id: Uuid) -> Result<Vec<Tile>> {
        let mut tiles = vec![];
        for entry in self.tiles.prefix(id.as_bytes()) {
            let (_, bytes) = entry?;
            tiles.push(Tile::from_bytes(&bytes)?);
        }
        Ok(tiles)
    }

    pub(crate) fn resource_ids(&self) -> Result<Vec<Uuid>> {
        let mut ids = vec![];
        for entry in self.resources.keys() {
            let key = entry?;
            ids.push(Uuid::from_slice(&key)?);
        }
        Ok(ids)
    }
}
