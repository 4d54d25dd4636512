//! Background writes of loader artifacts.
//!
//! Writes are spawned on a tokio runtime as soon as a module is loaded and awaited once every module has run, so a
//! slow disk never delays test execution but every write still completes (or fails) before the run ends.

use std::io;
use std::path::PathBuf;

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::error::StructuralError;

pub struct ArtifactWriter {
    runtime: Runtime,
    pending: Vec<(PathBuf, JoinHandle<io::Result<()>>)>,
}

impl ArtifactWriter {
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("probe-artifacts")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            pending: Vec::new(),
        })
    }

    /// Start writing `contents` to `path`.
    pub fn write(&mut self, path: PathBuf, contents: Vec<u8>) {
        tracing::debug!(file = %path.display(), bytes = contents.len(), "writing artifact");
        let target = path.clone();
        let handle = self
            .runtime
            .spawn(async move { tokio::fs::write(&target, contents).await });
        self.pending.push((path, handle));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait for every write; failed writes become structural errors.
    pub fn finish(self) -> Vec<StructuralError> {
        let Self { runtime, pending } = self;
        runtime.block_on(async move {
            let mut errors = Vec::new();
            for (path, handle) in pending {
                let outcome = match handle.await {
                    Ok(result) => result,
                    Err(join) => Err(io::Error::other(join)),
                };
                if let Err(source) = outcome {
                    tracing::warn!(file = %path.display(), %source, "artifact write failed");
                    errors.push(StructuralError::Artifact { path, source });
                }
            }
            errors
        })
    }
}
