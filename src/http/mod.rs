//! JSON-LD resource endpoint.

mod auth;
mod content_type;
mod error;

use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use serde_json::Value as JsonValue;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use self::auth::bearer_auth;
use self::content_type::JsonLd;
use crate::config::{ApiConfig, RuntimeConfig};
use crate::error::{MapperError, MapperResult};
use crate::mapper::Mapper;
use crate::model::GraphSchema;
use crate::slug::Slug;
use crate::store::Store;

pub(crate) async fn serve(config: &RuntimeConfig) -> Result<()> {
    let store = Store::open(config.keyspace.clone())?;
    let graphs = store.graphs.graph_ids()?.len();
    let mapper = Mapper::new(
        store,
        &config.init.server.base_url,
        &config.init.export.default_language,
    );
    let app = router(mapper, config.init.api.clone());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.init.server.http_port)).await?;
    info!(
        target: "http",
        port = config.init.server.http_port,
        graphs,
        base_url = config.init.server.base_url.as_str(),
        "listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received the terminate signal; stopping"),
                _ = sigint.recv() => info!("Received the interrupt signal; stopping"),
            }
        })
        .await?;
    Ok(())
}

pub(crate) fn router(mapper: Mapper, api: ApiConfig) -> Router {
    Router::new()
        .route("/resources/{graph}/{resourceid}", put(put_resource))
        .route("/resources/{id}", get(get_resource).post(post_resource))
        .route_layer(middleware::from_fn(bearer_auth))
        .layer(Extension(api))
        .layer(TraceLayer::new_for_http())
        .with_state(mapper)
}

async fn put_resource(
    State(mapper): State<Mapper>,
    Path((graph, resourceid)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, JsonLd<JsonValue>), MapperError> {
    let resource_id = parse_resource_id(&resourceid)?;
    let document = parse_body(&body)?;
    let exported = blocking(move || {
        let schema = find_graph(mapper.store(), &graph)?;
        mapper.import(&schema, resource_id, &document)
    })
    .await?;
    Ok((StatusCode::CREATED, JsonLd(Json(exported))))
}

async fn get_resource(
    State(mapper): State<Mapper>,
    Path(id): Path<String>,
) -> Result<JsonLd<JsonValue>, MapperError> {
    let resource_id = parse_resource_id(&id)?;
    let exported = blocking(move || mapper.export(resource_id)).await?;
    Ok(JsonLd(Json(exported)))
}

/// Creates a resource under a server generated id, answering with its IRI
/// in `Location`.
async fn post_resource(
    State(mapper): State<Mapper>,
    Path(graph): Path<String>,
    body: Bytes,
) -> Result<Response, MapperError> {
    let document = parse_body(&body)?;
    let (location, exported) = blocking(move || {
        let schema = find_graph(mapper.store(), &graph)?;
        let (resource_id, exported) = mapper.create(&schema, &document)?;
        Ok((mapper.iris().resource(resource_id), exported))
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        JsonLd(Json(exported)),
    )
        .into_response())
}

/// Graph addressed by id or by slug.
fn find_graph(store: &Store, key: &str) -> MapperResult<Arc<GraphSchema>> {
    if let Ok(graphid) = Uuid::try_parse(key) {
        return store.graphs.find(graphid);
    }
    let not_found = || MapperError::GraphNotFound(key.to_string());
    let slug = Slug::try_from(key).map_err(|_| not_found())?;
    store.graphs.find_by_slug(&slug)?.ok_or_else(not_found)
}

fn parse_resource_id(text: &str) -> MapperResult<Uuid> {
    Uuid::try_parse(text)
        .map_err(|err| MapperError::Validation(format!("invalid resource id {text:?}: {err}")))
}

fn parse_body(body: &[u8]) -> MapperResult<JsonValue> {
    serde_json::from_slice(body)
        .map_err(|err| MapperError::Validation(format!("malformed JSON body: {err}")))
}

/// Storage is synchronous, keep it off the async workers.
async fn blocking<T, F>(work: F) -> MapperResult<T>
where
    F: FnOnce() -> MapperResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| MapperError::Storage(err.into()))?
}
