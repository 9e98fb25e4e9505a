mod config;
mod error;
mod http;
mod json_ld;
mod loader;
mod mapper;
mod model;
mod slug;
mod store;
#[cfg(test)]
mod testing;

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use fd_lock::RwLock;
use fjall::{Keyspace, PersistMode};
use serde_json::Value as JsonValue;
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, RuntimeConfig};
use crate::flags::TilegraphCmd;
use crate::mapper::Mapper;
use crate::store::Store;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// JSON-LD gateway for tile based resource graphs.
        cmd tilegraph {
            /// TOML configuration file, defaults apply when omitted.
            optional -c, --config config: PathBuf

            /// Serve the resource endpoint until interrupted.
            cmd serve {}
            /// Register the graph models of a `{"graph": [...]}` file.
            cmd load-graphs {
                required path: PathBuf
            }
            /// Load concept schemes, concepts and collections.
            cmd load-concepts {
                required path: PathBuf
            }
            /// Load resources and their tiles.
            cmd load-business-data {
                required path: PathBuf
            }
            /// Dump resources as business data, every resource when no id is given.
            cmd export-business-data {
                repeated ids: String
                optional -o, --output output: PathBuf
            }
            /// Print the JSON-LD document of one resource.
            cmd export {
                required resourceid: String
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let flags = flags::Tilegraph::from_env_or_exit();
    let config = match &flags.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let data_dir = config.storage.data_dir.clone();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("unable to create data directory {}", data_dir.display()))?;
    let mut lock = RwLock::new(File::create(data_dir.join("tilegraph.lock"))?);
    let _guard = lock
        .try_write()
        .with_context(|| format!("data directory {} is in use", data_dir.display()))?;
    let keyspace = fjall::Config::new(data_dir.join("keyspace")).open()?;
    let runtime = RuntimeConfig {
        init: config,
        keyspace: keyspace.clone(),
    };

    match flags.subcommand {
        TilegraphCmd::Serve(_) => http::serve(&runtime).await?,
        TilegraphCmd::LoadGraphs(cmd) => {
            let store = Store::open(keyspace.clone())?;
            let graphs = loader::load_graphs(&store.graphs, &read_json(&cmd.path).await?)?;
            for schema in &graphs {
                info!(
                    graph = %schema.graphid(),
                    name = schema.model().name.as_str(),
                    "graph registered"
                );
            }
            persist(&keyspace)?;
        }
        TilegraphCmd::LoadConcepts(cmd) => {
            let store = Store::open(keyspace.clone())?;
            let count = loader::load_thesaurus(&store.concepts, &read_json(&cmd.path).await?)?;
            info!(concepts = count, "thesaurus loaded");
            persist(&keyspace)?;
        }
        TilegraphCmd::LoadBusinessData(cmd) => {
            let store = Store::open(keyspace.clone())?;
            let ids = loader::load_business_data(&store, &read_json(&cmd.path).await?)?;
            info!(resources = ids.len(), "business data loaded");
            persist(&keyspace)?;
        }
        TilegraphCmd::ExportBusinessData(cmd) => {
            let store = Store::open(keyspace)?;
            let ids = if cmd.ids.is_empty() {
                store.resources.resource_ids()?
            } else {
                cmd.ids
                    .iter()
                    .map(|id| parse_id(id))
                    .collect::<Result<Vec<_>>>()?
            };
            let document = loader::export_business_data(&store, &ids)?;
            let text = serde_json::to_string_pretty(&document)?;
            match &cmd.output {
                Some(path) => tokio::fs::write(path, text)
                    .await
                    .with_context(|| format!("unable to write {}", path.display()))?,
                None => println!("{text}"),
            }
        }
        TilegraphCmd::Export(cmd) => {
            let store = Store::open(keyspace)?;
            let mapper = Mapper::new(
                store,
                &runtime.init.server.base_url,
                &runtime.init.export.default_language,
            );
            let document = mapper.export(parse_id(&cmd.resourceid)?)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(())
}

async fn read_json(path: &Path) -> Result<JsonValue> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("unable to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn parse_id(text: &str) -> Result<Uuid> {
    Uuid::try_parse(text).with_context(|| format!("invalid resource id {text:?}"))
}

fn persist(keyspace: &Keyspace) -> Result<()> {
    keyspace.persist(PersistMode::SyncAll)?;
    Ok(())
}
