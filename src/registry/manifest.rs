//! Webpack `manifest.json` adapter with a dev-server port probe.

use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::{Context, Result};
use tokio::{net::TcpStream, time::timeout};
use tracing::debug;

use super::{ArtifactRegistry, DevServer};
use crate::config::Config;

const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ManifestRegistry {
    entries: HashMap<String, String>,
    dev_server: DevServer,
    dev_server_running: bool,
}

impl ManifestRegistry {
    /// Read the manifest and settle dev-server state as of now.
    pub async fn load(cfg: &Config) -> Result<Self> {
        let dev_server = DevServer {
            protocol: cfg.get("SSR_DEV_SERVER_PROTOCOL").unwrap_or_else(|| "http".into()),
            host: cfg.get("SSR_DEV_SERVER_HOST").unwrap_or_else(|| "localhost".into()),
            port: cfg
                .get_u64("SSR_DEV_SERVER_PORT")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(3035),
        };

        let dev_server_running = match cfg.dev_server_mode() {
            Some(forced) => forced,
            None => probe(&dev_server).await,
        };

        let entries = read_manifest(&cfg.manifest_path()).await?;
        Ok(Self { entries, dev_server, dev_server_running })
    }
}

async fn read_manifest(path: &Path) -> Result<HashMap<String, String>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading manifest: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing manifest: {}", path.display()))?;

    // Non-string entries (e.g. webpacker's "entrypoints" table) are not bundles.
    let mut map = HashMap::new();
    if let Some(obj) = value.as_object() {
        for (k, v) in obj {
            if let Some(s) = v.as_str() {
                map.insert(k.clone(), s.to_string());
            }
        }
    }
    Ok(map)
}

async fn probe(ds: &DevServer) -> bool {
    let addr = format!("{}:{}", ds.host, ds.port);
    let running = matches!(timeout(PROBE_TIMEOUT, TcpStream::connect(&addr)).await, Ok(Ok(_)));
    debug!("Dev server at {} running: {}", addr, running);
    running
}

impl ArtifactRegistry for ManifestRegistry {
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
