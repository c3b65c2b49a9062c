//! Execution engine: transient script lifecycle and result classification.

use std::{
    fs,
    io::Write,
    path::Path,
};

use anyhow::{Context, Result};
use tracing::{debug, error, warn};

use crate::{error::Error, process::Interpreter, script::AssembledScript};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    interpreter: Interpreter,
}

impl ExecutionEngine {
    pub fn new(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Run `script` for `bundle` and return its stdout.
    pub async fn execute(&self, bundle: &str, script: &AssembledScript) -> crate::Result<String> {
        let result = match self.run(script).await {
            Ok(r) => r,
            Err(e) => {
                error!("Unable to execute the bundle '{}': {:#}", bundle, e);
                return Err(Error::unable_to_run(bundle));
            }
        };

        if !result.success() {
            return Err(Error::unable_to_execute(bundle));
        }
        Ok(result.stdout)
    }

    /// Materialize, optionally persist, run, and remove the transient file.
    /// The file is removed on every return path, including `?` exits.
    pub async fn run(&self, script: &AssembledScript) -> Result<ExecutionResult> {
        let (stem, ext) = script.temp_affixes();
        let mut transient = tempfile::Builder::new()
            .prefix(&stem)
            .suffix(&ext)
            .tempfile()
            .context("creating transient script")?;

        transient
            .write_all(script.as_bytes())
            .and_then(|_| transient.flush())
            .context("writing transient script")?;

        if let Some(dest) = script.persist_to() {
            if let Err(e) = persist_copy(transient.path(), dest) {
                warn!("Unable to copy server bundle to {}: {:#}", dest.display(), e);
            }
        }

        let result = self.interpreter.run(transient.path()).await;

        if let Err(e) = transient.close() {
            warn!("Unable to remove transient script: {}", e);
        }
        result
    }
}

fn persist_copy(src: &Path, dest: &Path) -> Result<()> {
    debug!("Copying server bundle to {}", dest.display());
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::copy(src, dest).with_context(|| format!("copying to {}", dest.display()))?;
    Ok(())
}
