//! Purpose: HTTP host answering the six resource routes through the serializer registry.
//! Exports: `ServeConfig`, `serve`.
//! Role: Axum-based loopback server; builds a fresh `Environ` per request.
//! Invariants: Response content type comes from the registry entry and is never altered by JSONP.
//! Invariants: Loopback-only unless explicitly allowed.
//! Invariants: Errors use a stable JSON envelope with a kind-derived status.

use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{Path as AxumPath, RawQuery, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tiddlyweb_jsonp::config::Config;
use tiddlyweb_jsonp::core::environ::Environ;
use tiddlyweb_jsonp::core::error::{Error, ErrorKind};
use tiddlyweb_jsonp::store::Store;

use crate::render::{Target, render_target, select_serializer};

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub store: Store,
    pub config: Config,
    pub allow_non_loopback: bool,
}

struct AppState {
    store: Store,
    config: Config,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    for (content_type, entry) in config.config.serializers() {
        tracing::info!(
            content_type,
            serializer = entry.id.as_str(),
            response_type = entry.response_type.as_str(),
            "registered serializer"
        );
    }

    let state = Arc::new(AppState {
        store: config.store,
        config: config.config,
    });

    let app = Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:recipe", get(get_recipe))
        .route("/bags", get(list_bags))
        .route("/bags/:bag", get(get_bag))
        .route("/bags/:bag/tiddlers", get(list_tiddlers))
        .route("/bags/:bag/tiddlers/:title", get(get_tiddler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    tracing::info!(bind = %config.bind, "serving");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.config.negotiate(None).is_none() {
        return Err(Error::new(ErrorKind::Internal)
            .with_message("no serializer registered for application/json"));
    }

    Ok(())
}

pub(crate) fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn list_recipes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    respond(&state, &headers, query.as_deref(), &Target::Recipes)
}

async fn get_recipe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AxumPath(name): AxumPath<String>,
    RawQuery(query): RawQuery,
) -> Response {
    respond(&state, &headers, query.as_deref(), &Target::Recipe { name })
}

async fn list_bags(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    respond(&state, &headers, query.as_deref(), &Target::Bags)
}

async fn get_bag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AxumPath(name): AxumPath<String>,
    RawQuery(query): RawQuery,
) -> Response {
    respond(&state, &headers, query.as_deref(), &Target::Bag { name })
}

async fn list_tiddlers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AxumPath(bag): AxumPath<String>,
    RawQuery(query): RawQuery,
) -> Response {
    respond(&state, &headers, query.as_deref(), &Target::Tiddlers { bag })
}

async fn get_tiddler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AxumPath((bag, title)): AxumPath<(String, String)>,
    RawQuery(query): RawQuery,
) -> Response {
    respond(
        &state,
        &headers,
        query.as_deref(),
        &Target::Tiddler { bag, title },
    )
}

fn respond(state: &AppState, headers: &HeaderMap, query: Option<&str>, target: &Target) -> Response {
    let environ = Environ::from_query_string(query.unwrap_or_default());
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    let result = select_serializer(&state.config, accept, &environ).and_then(
        |(serializer, response_type)| {
            let body = render_target(serializer.as_ref(), &state.store, target)?;
            Ok((body, response_type))
        },
    );
    match result {
        Ok((body, response_type)) => text_response(body, response_type),
        Err(err) => error_response(err),
    }
}

fn text_response(body: String, response_type: &str) -> Response {
    let value = match HeaderValue::from_str(response_type) {
        Ok(value) => value,
        Err(err) => {
            return error_response(
                Error::new(ErrorKind::Internal)
                    .with_message("invalid registered response type")
                    .with_source(err),
            );
        }
    };
    let mut response = body.into_response();
    response.headers_mut().insert(header::CONTENT_TYPE, value);
    response
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

fn error_response(err: Error) -> Response {
    let status = match err.kind() {
        ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Serialization | ErrorKind::Io | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind: format!("{:?}", err.kind()),
            message: err.message().unwrap_or("error").to_string(),
            hint: err.hint().map(str::to_string),
        },
    };
    (status, Json(body)).into_response()
}
