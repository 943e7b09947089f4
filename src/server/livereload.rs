// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Browser reload over server-sent events

use std::convert::Infallible;
use std::sync::OnceLock;

use futures::Stream;
use regex::Regex;
use tokio::sync::broadcast::{self, error::RecvError};
use warp::sse::Event;

/// Event stream endpoint the injected snippet connects to
pub const LIVERELOAD_PATH: &str = "/__livereload";

const SNIPPET: &str = r#"<script>(function(){var es=new EventSource("/__livereload");es.onmessage=function(e){if(e.data==="reload"){location.reload();}};})();</script>"#;

fn body_close() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</body>").expect("static regex"))
}

/// Insert the reload snippet before the last `</body>`, or append it
pub fn inject_snippet(html: &str) -> String {
    match body_close().find_iter(html).last() {
        Some(m) => {
            let mut out = String::with_capacity(html.len() + SNIPPET.len());
            out.push_str(&html[..m.start()]);
            out.push_str(SNIPPET);
            out.push_str(&html[m.start()..]);
            out
        }
        None => format!("{html}{SNIPPET}"),
    }
}

/// Fan-out of reload events to every connected browser
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<()>,
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every connected browser to reload; returns how many were told
    pub fn reload(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn clients(&self) -> usize {
        self.tx.receiver_count()
    }

    /// One `reload` event per broadcast, for a single browser.
    ///
    /// A browser that fell behind gets a single event for everything it
    /// missed.
    pub fn events(&self) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
        futures::stream::unfold(self.subscribe(), |mut rx| async move {
            match rx.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    Some((Ok(Event::default().data("reload")), rx))
                }
                Err(RecvError::Closed) => None,
            }
        })
    }
}
