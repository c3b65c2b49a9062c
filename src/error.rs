//! Typed errors surfaced by the render pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The bundle identifier has no entry in the manifest.
    #[error("The ReactJS package '{bundle}' is missing from the manifest.json file.")]
    MissingBundle { bundle: String },

    /// Remote fetch failed; retry exhaustion lands here unchanged.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Opening a local bundle file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Anything that went wrong after the bundle was fetched.
    #[error("{message}")]
    Execution { bundle: String, message: String },

    /// The artifact registry itself could not answer.
    #[error("registry error: {0}")]
    Registry(String),
}

impl Error {
    pub fn missing_bundle(bundle: &str) -> Self {
        Self::MissingBundle { bundle: bundle.to_string() }
    }

    /// Generic wrapper for failures while preparing or spawning the script.
    pub fn unable_to_run(bundle: &str) -> Self {
        Self::Execution {
            bundle: bundle.to_string(),
            message: format!("Unable to run the bundle '{}'", bundle),
        }
    }

    /// The interpreter ran but did not finish cleanly.
    pub fn unable_to_execute(bundle: &str) -> Self {
        Self::Execution {
            bundle: bundle.to_string(),
            message: format!("Unable to execute the server bundle {}", bundle),
        }
    }

    pub fn bundle(&self) -> Option<&str> {
        match self {
            Self::MissingBundle { bundle } | Self::Execution { bundle, .. } => Some(bundle),
            _ => None,
        }
    }
}
