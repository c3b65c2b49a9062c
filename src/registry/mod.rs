//! Build-artifact registry: the manifest capability the resolver consumes.

use std::collections::HashMap;

pub mod manifest;

pub use manifest::ManifestRegistry;

/// Maps logical bundle names to content-addressed build output paths and
/// reports whether a dev server is serving them.
pub trait ArtifactRegistry {
    fn lookup(&self, bundle: &str) -> Option<String>;
    fn is_dev_server_running(&self) -> bool;
    fn dev_server(&self) -> &DevServer;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevServer {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl Default for DevServer {
    fn default() -> Self {
        Self { protocol: "http".into(), host: "localhost".into(), port: 3035 }
    }
}

impl DevServer {
    pub fn uri_for(&self, path: &str) -> String {
        format!(
            "{}://{}:{}/{}",
            self.protocol,
            self.host,
            self.port,
            path.trim_start_matches('/')
        )
    }
}

/// In-memory registry for embedding hosts that already hold the manifest.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: HashMap<String, String>,
    dev_server: DevServer,
    dev_server_running: bool,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, bundle: impl Into<String>, path: impl Into<String>) -> Self {
        self.entries.insert(bundle.into(), path.into());
        self
    }

    pub fn with_dev_server(mut self, dev_server: DevServer, running: bool) -> Self {
        self.dev_server = dev_server;
        self.dev_server_running = running;
        self
    }
}

impl ArtifactRegistry for StaticRegistry {
    fn lookup(&self, bundle: &str) -> Option<String> {
        self.entries.get(bundle).cloned()
    }

    fn is_dev_server_running(&self) -> bool {
        self.dev_server_running
    }

    fn dev_server(&self) -> &DevServer {
        &self.dev_server
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_server_uri_joins_with_single_slash() {
        let ds = DevServer::default();
        assert_eq!(
            ds.uri_for("/packs/application-k344a6d59eef8632c9d1.js"),
            "http://localhost:3035/packs/application-k344a6d59eef8632c9d1.js"
        );
        assert_eq!(ds.uri_for("packs/a.js"), "http://localhost:3035/packs/a.js");
    }

    #[test]
    fn static_registry_lookup() {
        let reg = StaticRegistry::new().with_entry("application.js", "/packs/application-abc.js");
        assert_eq!(reg.lookup("application.js").as_deref(), Some("/packs/application-abc.js"));
        assert_eq!(reg.lookup("missing.js"), None);
        assert!(!reg.is_dev_server_running());
    }
}
