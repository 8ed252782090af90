//! Manifest file watcher for continuous re-sync.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::artefact::ArtefactManifest;

/// A watcher that monitors an artefact manifest for changes.
pub struct ManifestWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ArtefactManifest>,
}

impl ManifestWatcher {
    /// Create a new ManifestWatcher.
    ///
    /// Returns the watcher and a receiver for reloaded manifests.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ArtefactManifest>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to be delivered.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Manifest change detected, reloading");
                        match ArtefactManifest::load(&path) {
                            Ok(manifest) => {
                                let _ = tx.send(manifest);
                            }
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    "Failed to reload manifest, keeping previous one"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Manifest watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;

    const MANIFEST: &str = r#"
[[artefact]]
slug = "vat-rates"
rendering_app = "frontend"
paths = ["/vat-rates"]
"#;

    fn manifest_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn append(path: &Path, text: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }

    #[tokio::test]
    async fn test_edit_delivers_reloaded_manifest() {
        let file = manifest_file();
        let (watcher, mut rx) = ManifestWatcher::new(file.path());
        let _watcher = watcher.run().unwrap();

        append(
            file.path(),
            "\n[[artefact]]\nowning_app = \"whitehall\"\nprefixes = [\"/government\"]\n",
        );

        // A single write can surface as more than one event.
        let reloaded = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let manifest = rx.recv().await.unwrap();
                if manifest.artefacts.len() == 2 {
                    return manifest;
                }
            }
        })
        .await
        .expect("reloaded manifest not delivered");

        assert_eq!(reloaded.artefacts[0].slug.as_deref(), Some("vat-rates"));
        assert_eq!(reloaded.artefacts[1].prefixes, vec!["/government"]);
    }

    #[tokio::test]
    async fn test_broken_edit_delivers_nothing() {
        let file = manifest_file();
        let (watcher, mut rx) = ManifestWatcher::new(file.path());
        let _watcher = watcher.run().unwrap();

        append(file.path(), "\n[[artefact\npaths = \n");

        let received = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;
        assert!(received.is_err(), "unparseable manifest must not be delivered");
    }
}
