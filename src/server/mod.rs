// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Development server
//!
//! Serves the output directory with warp and pushes a reload event to
//! connected browsers whenever it changes. HTML pages get the reload
//! snippet injected on the way out.

mod livereload;

pub use livereload::{inject_snippet, LiveReload, LIVERELOAD_PATH};

use std::net::SocketAddr;
use std::path::PathBuf;

use futures::future::BoxFuture;
use futures::FutureExt;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::config::ServerConfig;
use crate::errors::AssetflowError;

/// Bound static server, not yet accepting
pub struct DevServer {
    addr: SocketAddr,
    server: BoxFuture<'static, ()>,
}

impl DevServer {
    /// Bind to the configured address; port 0 picks a free port
    pub async fn bind(
        config: &ServerConfig,
        root: PathBuf,
        reload: LiveReload,
    ) -> Result<Self, AssetflowError> {
        let target = format!("{}:{}", config.host, config.port);
        let addr = tokio::net::lookup_host(&target)
            .await
            .map_err(|e| AssetflowError::Server {
                message: format!("Failed to resolve {target}: {e}"),
            })?
            .next()
            .ok_or_else(|| AssetflowError::Server {
                message: format!("{target} resolved to no address"),
            })?;

        let (addr, server) = warp::serve(routes(root, reload))
            .try_bind_ephemeral(addr)
            .map_err(|e| AssetflowError::Server {
                message: format!("Failed to bind {target}: {e}"),
            })?;

        Ok(Self {
            addr,
            server: server.boxed(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until the task is dropped
    pub async fn serve(self) {
        tracing::debug!(addr = %self.addr, "dev server accepting");
        self.server.await
    }
}

/// Reload event stream plus static files below `root`
pub fn routes(
    root: PathBuf,
    reload: LiveReload,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let events = warp::path(LIVERELOAD_PATH.trim_start_matches('/'))
        .and(warp::path::end())
        .and(warp::get())
        .map(move || {
            tracing::debug!(clients = reload.clients() + 1, "live reload client connected");
            warp::sse::reply(warp::sse::keep_alive().stream(reload.events()))
        });

    let files = warp::fs::dir(root).and_then(with_snippet);

    events
        .or(files)
        .with(warp::reply::with::header("cache-control", "no-cache"))
}

async fn with_snippet(file: warp::fs::File) -> Result<Response, Rejection> {
    let is_html = file
        .path()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
    if !is_html {
        return Ok(file.into_response());
    }

    let read = tokio::fs::read(file.path()).await;
    match read {
        Ok(body) => {
            let html = inject_snippet(&String::from_utf8_lossy(&body));
            Ok(warp::reply::html(html).into_response())
        }
        Err(e) => {
            tracing::warn!(path = %file.path().display(), "serving page without reload snippet: {e}");
            Ok(file.into_response())
        }
    }
}
