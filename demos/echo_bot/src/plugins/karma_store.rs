//! Karma storage, provided to other plugins as `dyn KarmaStore`.
//!
//! Scores live in memory. With a `path` configured they are loaded at
//! startup and written back as JSON after every change:
//!
//! ```toml
//! [plugin.karma-store]
//! path = "./karma.json"
//! ```

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chime::prelude::*;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{info, warn};

/// Per-name karma scores. Names compare case-insensitively.
#[async_trait]
pub trait KarmaStore: Send + Sync {
    /// Adds `delta` to `name` and returns the new score.
    async fn adjust(&self, name: &str, delta: i64) -> i64;

    async fn score(&self, name: &str) -> i64;

    /// Returns up to `n` names with the highest scores.
    async fn top(&self, n: usize) -> Vec<(String, i64)>;
}

impl Capability for dyn KarmaStore {
    const ID: &'static str = "demo.karma_store";
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct KarmaStoreConfig {
    pub path: Option<PathBuf>,
}

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new("karma-store", init).provides::<dyn KarmaStore>()
}

async fn init(ctx: PluginContext) -> anyhow::Result<()> {
    let config: KarmaStoreConfig = ctx.config()?;
    let store = FileKarmaStore::open(config.path).await?;
    ctx.provide::<dyn KarmaStore>(Arc::new(store))?;
    Ok(())
}

pub struct FileKarmaStore {
    scores: Mutex<HashMap<String, i64>>,
    path: Option<PathBuf>,
}

impl FileKarmaStore {
    /// Creates a store, loading existing scores from `path` if it exists.
    pub async fn open(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let scores = match &path {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => {
                    let scores: HashMap<String, i64> = serde_json::from_slice(&bytes)?;
                    info!(path = %path.display(), entries = scores.len(), "Loaded karma");
                    scores
                }
                Err(err) if err.kind() == ErrorKind::NotFound => HashMap::new(),
                Err(err) => return Err(err.into()),
            },
            None => HashMap::new(),
        };
        Ok(Self {
            scores: Mutex::new(scores),
            path,
        })
    }

    async fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let json = serde_json::to_vec_pretty(&*self.scores.lock());
        let result = match json {
            Ok(bytes) => tokio::fs::write(path, bytes).await.map_err(anyhow::Error::from),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            warn!(path = %path.display(), error = %err, "Failed to save karma");
        }
    }
}

#[async_trait]
impl KarmaStore for FileKarmaStore {
    async fn adjust(&self, name: &str, delta: i64) -> i64 {
        let score = {
            let mut scores = self.scores.lock();
            let entry = scores.entry(name.to_lowercase()).or_default();
            *entry += delta;
            *entry
        };
        self.save().await;
        score
    }

    async fn score(&self, name: &str) -> i64 {
        self.scores
            .lock()
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or_default()
    }

    async fn top(&self, n: usize) -> Vec<(String, i64)> {
        let mut all: Vec<_> = self
            .scores
            .lock()
            .iter()
            .map(|(name, score)| (name.clone(), *score))
            .collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all.truncate(n);
        all
    }
}
