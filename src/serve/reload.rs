//! Live-reload signalling.
//!
//! After a category rewrites its outputs, a [`ReloadMessage`] is broadcast to
//! every connected browser. Stylesheet runs swap the changed stylesheets in
//! place; anything else reloads the page.

use crate::build::{Category, WrittenFileSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::broadcast;

/// Websocket endpoint browsers connect to
pub const RELOAD_PATH: &str = "/__livereload";

/// Path the client script is served from
pub const CLIENT_PATH: &str = "/__livereload.js";

/// Message pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Reload the whole page
    Reload,
    /// Re-fetch these stylesheets (URL paths below the server root)
    Css { paths: Vec<String> },
}

impl ReloadMessage {
    /// Pick the message for a finished category run.
    ///
    /// `out_dir` is the server root; written files are turned into URL paths
    /// relative to it.
    pub fn for_run(written: &WrittenFileSet, out_dir: &Path) -> Self {
        if written.category != Category::Style {
            return ReloadMessage::Reload;
        }
        let paths = written
            .files
            .iter()
            .filter(|p| p.extension().map(|e| e == "css").unwrap_or(false))
            .filter_map(|p| p.strip_prefix(out_dir).ok())
            .map(|rel| {
                let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
                format!("/{}", parts.join("/"))
            })
            .collect();
        ReloadMessage::Css { paths }
    }
}

/// Fan-out of reload messages to websocket sessions.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Subscribe a new session.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Broadcast a message; returns the number of sessions reached.
    pub fn notify(&self, message: ReloadMessage) -> usize {
        tracing::debug!(?message, "live reload");
        self.tx.send(message).unwrap_or(0)
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Browser side of live reload.
pub const CLIENT_SCRIPT: &str = r#"(function () {
  var url = (location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '/__livereload';
  function refreshCss(paths) {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    var stamp = Date.now();
    for (var i = 0; i < links.length; i++) {
      var link = links[i];
      var href = new URL(link.href, location.href);
      if (paths.indexOf(href.pathname) === -1) continue;
      href.searchParams.set('livereload', stamp);
      link.href = href.toString();
    }
  }
  function connect() {
    var socket = new WebSocket(url);
    socket.onmessage = function (event) {
      var message = JSON.parse(event.data);
      if (message.type === 'css') {
        refreshCss(message.paths);
      } else {
        location.reload();
      }
    };
    socket.onclose = function () {
      setTimeout(connect, 1000);
    };
  }
  connect();
})();
"#;

/// Insert the client script tag before the closing body tag.
///
/// Pages without `</body>` get the tag appended.
pub fn inject_client(html: &str) -> String {
    let tag = format!("<script src=\"{}\"></script>", CLIENT_PATH);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..at]);
            out.push_str(&tag);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{}{}", html, tag),
    }
}
