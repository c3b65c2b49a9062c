//! Bundle name to location resolution.

use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    registry::ArtifactRegistry,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
    Remote { uri: String },
    Local { path: PathBuf },
}

impl ResolvedAsset {
    /// Last path segment, used to name the transient script.
    pub fn file_name(&self) -> String {
        let raw = match self {
            Self::Remote { uri } => uri.rsplit('/').next().unwrap_or_default().to_string(),
            Self::Local { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if raw.is_empty() { "bundle.js".to_string() } else { raw }
    }
}

impl std::fmt::Display for ResolvedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { uri } => write!(f, "{}", uri),
            Self::Local { path } => write!(f, "{}", path.display()),
        }
    }
}

pub struct Resolver<'a, R: ArtifactRegistry> {
    registry: &'a R,
    public_root: &'a Path,
}

impl<'a, R: ArtifactRegistry> Resolver<'a, R> {
    pub fn new(registry: &'a R, public_root: &'a Path) -> Self {
        Self { registry, public_root }
    }

    /// Hashed output path for `bundle` as the manifest records it.
    pub fn hashed_bundle_name(&self, bundle: &str) -> Result<String> {
        self.registry
            .lookup(bundle)
            .ok_or_else(|| Error::missing_bundle(bundle))
    }

    pub fn resolve(&self, bundle: &str) -> Result<ResolvedAsset> {
        let hashed = self.hashed_bundle_name(bundle)?;

        if self.registry.is_dev_server_running() {
            Ok(ResolvedAsset::Remote { uri: self.registry.dev_server().uri_for(&hashed) })
        } else {
            Ok(ResolvedAsset::Local { path: self.public_root.join(hashed.trim_start_matches('/')) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DevServer, StaticRegistry};

    const HASHED: &str = "/packs/application-k344a6d59eef8632c9d1.js";

    #[test]
    fn missing_bundle_carries_identifier() {
        let reg = StaticRegistry::new();
        let root = PathBuf::from("/srv/app/public");
        let err = Resolver::new(&reg, &root).resolve("missing.js").unwrap_err();
        match err {
            Error::MissingBundle { bundle } => assert_eq!(bundle, "missing.js"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn resolves_local_under_public_root() {
        let reg = StaticRegistry::new().with_entry("application.js", HASHED);
        let root = PathBuf::from("/srv/app/public");
        let resolver = Resolver::new(&reg, &root);

        assert_eq!(resolver.hashed_bundle_name("application.js").unwrap(), HASHED);
        let asset = resolver.resolve("application.js").unwrap();
        assert_eq!(
            asset,
            ResolvedAsset::Local {
                path: PathBuf::from("/srv/app/public/packs/application-k344a6d59eef8632c9d1.js")
            }
        );
        assert_eq!(asset.file_name(), "application-k344a6d59eef8632c9d1.js");
        // Same registry state, same answer.
        assert_eq!(resolver.resolve("application.js").unwrap(), asset);
    }

    #[test]
    fn resolves_remote_when_dev_server_runs() {
        let reg = StaticRegistry::new()
            .with_entry("application.js", HASHED)
            .with_dev_server(DevServer::default(), true);
        let root = PathBuf::from("/srv/app/public");

        let asset = Resolver::new(&reg, &root).resolve("application.js").unwrap();
        assert_eq!(
            asset,
            ResolvedAsset::Remote {
                uri: "http://localhost:3035/packs/application-k344a6d59eef8632c9d1.js".into()
            }
        );
        assert_eq!(asset.file_name(), "application-k344a6d59eef8632c9d1.js");
    }
}
