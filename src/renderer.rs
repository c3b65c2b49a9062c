//! The render pipeline: resolve, fetch, assemble, execute.

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use tracing::error;

use crate::{
    config::Config,
    error::{Error, Result},
    execution::ExecutionEngine,
    fetcher::{BundleStream, Fetcher, RetryPolicy},
    process::Interpreter,
    registry::{ArtifactRegistry, ManifestRegistry},
    resolver::{ResolvedAsset, Resolver},
    script::{AssembledScript, Props, ScriptAssembler},
};

/// Where, if anywhere, to keep a copy of the assembled script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTemp {
    #[default]
    Disabled,
    /// `<output_dir>/<bundle>`
    Default,
    Path(PathBuf),
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub props: Props,
    pub output_temp: OutputTemp,
    pub max_tries: u32,
    pub delay: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            props: Props::new(),
            output_temp: OutputTemp::Disabled,
            max_tries: 10,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RenderOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self { max_tries: cfg.max_tries(), delay: cfg.delay(), ..Self::default() }
    }
}

pub struct Renderer<R: ArtifactRegistry> {
    registry: R,
    public_root: PathBuf,
    output_dir: PathBuf,
    fetcher: Fetcher,
    assembler: ScriptAssembler,
    engine: ExecutionEngine,
}

impl<R: ArtifactRegistry> Renderer<R> {
    pub fn new(registry: R, public_root: impl Into<PathBuf>, fetcher: Fetcher) -> Self {
        Self {
            registry,
            public_root: public_root.into(),
            output_dir: PathBuf::from("tmp/ssr"),
            fetcher,
            assembler: ScriptAssembler::default(),
            engine: ExecutionEngine::default(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_assembler(mut self, assembler: ScriptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_engine(mut self, engine: ExecutionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn resolve(&self, bundle: &str) -> Result<ResolvedAsset> {
        Resolver::new(&self.registry, &self.public_root).resolve(bundle)
    }

    pub async fn render(&self, bundle: &str, opts: &RenderOptions) -> Result<String> {
        let asset = self.resolve(bundle)?;
        let stream = self
            .fetcher
            .fetch(&asset, RetryPolicy::new(opts.max_tries, opts.delay))
            .await?;

        let script = match self.prepare(bundle, stream, opts).await {
            Ok(script) => script,
            Err(e) => {
                error!("Unable to execute the bundle '{}': {:#}", bundle, e);
                return Err(Error::unable_to_run(bundle));
            }
        };

        self.engine.execute(bundle, &script).await
    }

    async fn prepare(&self, bundle: &str, stream: BundleStream, opts: &RenderOptions) -> anyhow::Result<AssembledScript> {
        let file_name = stream.file_name().to_string();
        let body = stream.read_all().await?;
        let script = self
            .assembler
            .assemble(&file_name, &body, &opts.props)
            .context("serializing props")?;

        Ok(match self.persist_target(bundle, &opts.output_temp) {
            Some(dest) => script.with_persist_to(dest),
            None => script,
        })
    }

    fn persist_target(&self, bundle: &str, output_temp: &OutputTemp) -> Option<PathBuf> {
        match output_temp {
            OutputTemp::Disabled => None,
            OutputTemp::Default => Some(self.output_dir.join(bundle)),
            OutputTemp::Path(p) => Some(p.clone()),
        }
    }
}

impl Renderer<ManifestRegistry> {
    /// Manifest-backed renderer; manifest and dev-server state are read now.
    pub async fn from_config(cfg: &Config) -> Result<Self> {
        let registry = ManifestRegistry::load(cfg)
            .await
            .map_err(|e| Error::Registry(format!("{:#}", e)))?;

        Ok(Self::new(registry, cfg.public_root(), Fetcher::from_config(cfg)?)
            .with_output_dir(cfg.output_dir())
            .with_assembler(ScriptAssembler::new(cfg.key_style()))
            .with_engine(ExecutionEngine::new(Interpreter::from_config(cfg))))
    }
}

/// Load the registry described by `cfg` and render `bundle` once.
pub async fn render(cfg: &Config, bundle: &str, opts: &RenderOptions) -> Result<String> {
    Renderer::from_config(cfg).await?.render(bundle, opts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticRegistry;

    fn renderer() -> Renderer<StaticRegistry> {
        Renderer::new(StaticRegistry::new(), "/srv/app/public", Fetcher::new(reqwest::Client::new()))
            .with_output_dir("/srv/app/tmp/ssr")
    }

    #[test]
    fn persist_targets() {
        let r = renderer();
        assert_eq!(r.persist_target("application.js", &OutputTemp::Disabled), None);
        assert_eq!(
            r.persist_target("application.js", &OutputTemp::Default),
            Some(PathBuf::from("/srv/app/tmp/ssr/application.js"))
        );
        assert_eq!(
            r.persist_target("application.js", &OutputTemp::Path("/tmp/out.js".into())),
            Some(PathBuf::from("/tmp/out.js"))
        );
    }

    #[test]
    fn default_options() {
        let opts = RenderOptions::default();
        assert_eq!(opts.max_tries, 10);
        assert_eq!(opts.delay, Duration::from_millis(1000));
        assert!(opts.props.is_empty());
        assert_eq!(opts.output_temp, OutputTemp::Disabled);
    }

    #[tokio::test]
    async fn missing_bundle_is_not_wrapped() {
        let err = renderer()
            .render("missing.js", &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingBundle { ref bundle } if bundle == "missing.js"));
    }
}
