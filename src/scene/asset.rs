//! # Asset Loading
//!
//! Loads the controller model off the frame path. The frame loop only ever
//! polls [`AssetLoad`]; it never waits on it.

use std::path::{Path, PathBuf};
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::SceneGraph;
use crate::error::{PadscopeError, Result};

/// Reads and parses a JSON model asset.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read and `Asset` if it cannot be parsed.
///
/// # Examples
///
/// ```no_run
/// use padscope::scene::asset::load_scene;
///
/// # async fn demo() -> padscope::error::Result<()> {
/// let scene = load_scene("assets/ps4_controller.json").await?;
/// println!("{} nodes", scene.nodes().len());
/// # Ok(())
/// # }
/// ```
pub async fn load_scene<P: AsRef<Path>>(path: P) -> Result<SceneGraph> {
    let path = path.as_ref();
    debug!("Loading model asset from {}", path.display());
    let contents = tokio::fs::read_to_string(path).await?;
    let scene = SceneGraph::from_json(&contents)?;
    info!(
        "Loaded model '{}' ({} nodes) from {}",
        scene.name(),
        scene.nodes().len(),
        path.display()
    );
    Ok(scene)
}

/// State of an in-flight asset load.
#[derive(Debug)]
pub enum AssetStatus {
    /// Still loading.
    Pending,
    /// Finished; the outcome is handed over exactly once.
    Complete(Result<SceneGraph>),
    /// Outcome was already taken, or the load was never started.
    Consumed,
}

/// Completion signal for a background asset load.
#[derive(Debug)]
pub struct AssetLoad {
    path: PathBuf,
    rx: Option<oneshot::Receiver<Result<SceneGraph>>>,
}

impl AssetLoad {
    /// Starts loading `path` on a tokio task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = oneshot::channel();
        let task_path = path.clone();
        tokio::spawn(async move {
            let outcome = load_scene(&task_path).await;
            // Receiver gone means nobody is waiting for the model anymore.
            let _ = tx.send(outcome);
        });
        Self { path, rx: Some(rx) }
    }

    /// A load that has already completed with `outcome`.
    ///
    /// Lets callers hand over an in-memory scene (or a failure) through the
    /// same completion path as a real load.
    pub fn ready(path: impl Into<PathBuf>, outcome: Result<SceneGraph>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self {
            path: path.into(),
            rx: Some(rx),
        }
    }

    /// Path being loaded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks for completion without blocking.
    pub fn poll(&mut self) -> AssetStatus {
        let Some(rx) = self.rx.as_mut() else {
            return AssetStatus::Consumed;
        };

        match rx.try_recv() {
            Ok(outcome) => {
                self.rx = None;
                AssetStatus::Complete(outcome)
            }
            Err(oneshot::error::TryRecvError::Empty) => AssetStatus::Pending,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.rx = None;
                AssetStatus::Complete(Err(PadscopeError::Render(format!(
                    "asset loader for {} stopped without a result",
                    self.path.display()
                ))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_asset(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_scene_from_file() {
        let file = write_asset(
            r##"{ "name": "pad", "nodes": [{ "name": "button_cross", "materials": [{ "emissive": "#000000" }] }] }"##,
        );

        let scene = tokio_test::block_on(load_scene(file.path())).unwrap();
        assert_eq!(scene.name(), "pad");
        assert!(scene.find("button_cross").is_some());
    }

    #[test]
    fn test_load_scene_missing_file() {
        let result = tokio_test::block_on(load_scene("/nonexistent/padscope/model.json"));
        assert!(matches!(result, Err(PadscopeError::Io(_))));
    }

    #[test]
    fn test_load_scene_malformed_json() {
        let file = write_asset("{ not json");
        let result = tokio_test::block_on(load_scene(file.path()));
        assert!(matches!(result, Err(PadscopeError::Asset(_))));
    }

    #[test]
    fn test_bundled_asset_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/ps4_controller.json");
        let scene = tokio_test::block_on(load_scene(path)).unwrap();
        assert!(scene.find("button_cross").is_some());
        assert!(scene.find("button_r2").is_some());
    }

    #[test]
    fn test_ready_hands_outcome_over_once() {
        let mut load = AssetLoad::ready("memory", Ok(SceneGraph::default()));
        assert!(matches!(load.poll(), AssetStatus::Complete(Ok(_))));
        assert!(matches!(load.poll(), AssetStatus::Consumed));
    }

    #[tokio::test]
    async fn test_spawned_load_completes() {
        let file = write_asset(r#"{ "name": "pad", "nodes": [] }"#);
        let mut load = AssetLoad::spawn(file.path());
        assert_eq!(load.path(), file.path());

        let mut outcome = None;
        for _ in 0..200 {
            match load.poll() {
                AssetStatus::Pending => tokio::time::sleep(std::time::Duration::from_millis(5)).await,
                AssetStatus::Complete(result) => {
                    outcome = Some(result);
                    break;
                }
                AssetStatus::Consumed => panic!("load consumed before completion"),
            }
        }

        let scene = outcome.expect("asset load did not complete").unwrap();
        assert_eq!(scene.name(), "pad");
    }

    #[tokio::test]
    async fn test_spawned_load_reports_failure() {
        let mut load = AssetLoad::spawn("/nonexistent/padscope/model.json");
        for _ in 0..200 {
            match load.poll() {
                AssetStatus::Pending => tokio::time::sleep(std::time::Duration::from_millis(5)).await,
                AssetStatus::Complete(result) => {
                    assert!(result.is_err());
                    return;
                }
                AssetStatus::Consumed => break,
            }
        }
        panic!("failed asset load never reported completion");
    }
}
