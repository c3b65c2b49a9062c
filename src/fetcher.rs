//! Bundle fetching: local file open or dev-server GET with bounded retry.

use std::{future::Future, time::Duration};

use anyhow::Context;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::{fs::File, io::AsyncReadExt, time::sleep};
use tracing::debug;

use crate::{config::Config, error::Result, resolver::ResolvedAsset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_tries: 10, delay: Duration::from_millis(1000) }
    }
}

impl RetryPolicy {
    pub fn new(max_tries: u32, delay: Duration) -> Self {
        Self { max_tries: max_tries.max(1), delay }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or
/// `policy.max_tries` attempts are spent. The last error is returned as-is.
pub async fn retry<T, E, F, Fut, P>(policy: RetryPolicy, is_retryable: P, mut op: F) -> std::result::Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_tries = policy.max_tries.max(1);
    let mut tries = 0;
    loop {
        tries += 1;
        match op(tries).await {
            Ok(v) => return Ok(v),
            Err(e) if tries < max_tries && is_retryable(&e) => {
                debug!(
                    "The remote bundle is not ready trying again in {}ms - {} of {}",
                    policy.delay.as_millis(),
                    tries,
                    max_tries
                );
                sleep(policy.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Any HTTP error status means the dev server has not compiled the pack yet.
/// Connect and timeout errors are not retried.
pub fn is_not_ready(err: &reqwest::Error) -> bool {
    err.is_status()
}

enum Body {
    Remote(Response),
    Local(File),
}

/// Unread bundle contents plus the file name they came from.
pub struct BundleStream {
    file_name: String,
    body: Body,
}

impl BundleStream {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub async fn read_all(self) -> anyhow::Result<Vec<u8>> {
        let mut buf = Vec::new();
        match self.body {
            Body::Remote(resp) => {
                let mut stream = resp.bytes_stream();
                while let Some(chunk) = stream.next().await {
                    let bytes = chunk.context("bundle stream error")?;
                    buf.extend_from_slice(&bytes);
                }
            }
            Body::Local(mut file) => {
                file.read_to_end(&mut buf)
                    .await
                    .with_context(|| format!("reading bundle file: {}", self.file_name))?;
            }
        }
        Ok(buf)
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    http: Client,
}

impl Fetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let http = Client::builder().timeout(cfg.request_timeout()).build()?;
        Ok(Self { http })
    }

    pub async fn fetch(&self, asset: &ResolvedAsset, policy: RetryPolicy) -> Result<BundleStream> {
        let file_name = asset.file_name();
        match asset {
            ResolvedAsset::Local { path } => {
                let file = File::open(path).await?;
                Ok(BundleStream { file_name, body: Body::Local(file) })
            }
            ResolvedAsset::Remote { uri } => {
                let resp = retry(policy, is_not_ready, move |_| async move {
                    debug!("Reading remote bundle {}", uri);
                    self.http.get(uri).send().await?.error_for_status()
                })
                .await?;
                Ok(BundleStream { file_name, body: Body::Remote(resp) })
            }
        }
    }
}
