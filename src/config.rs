use clap::Parser;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(long, default_value = "0.0.0.0")]
    pub host: String,

    #[clap(long, default_value_t = 8001)]
    pub port: u16,

    /// Root directory for generated code, archives and the sqlite database.
    #[clap(long, value_parser, default_value = "./data")]
    pub data_dir: PathBuf,
}

/// Credentials and endpoints for the external providers. Immutable once
/// built; runtime updates swap in a whole new snapshot.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub tryon_url: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self {
            openai: non_empty_var("OPENAI_API_KEY"),
            anthropic: non_empty_var("ANTHROPIC_API_KEY"),
            tryon_url: non_empty_var("TRYON_API_URL"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Fields accepted by the setup-api-keys endpoint. Absent fields leave the
/// current value in place.
#[derive(Debug, Deserialize)]
pub struct KeyUpdate {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
}

/// Process-wide credential state. A request handler takes a snapshot once
/// and works against it; an update never mutates a snapshot already handed
/// out, so an in-flight generation keeps the keys it started with.
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<Arc<ApiKeys>>>,
}

impl SharedConfig {
    pub fn new(keys: ApiKeys) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(keys))),
        }
    }

    pub fn snapshot(&self) -> Arc<ApiKeys> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn apply(&self, update: KeyUpdate) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let current = guard.as_ref();
        *guard = Arc::new(ApiKeys {
            openai: update.openai.or_else(|| current.openai.clone()),
            anthropic: update.anthropic.or_else(|| current.anthropic.clone()),
            tryon_url: current.tryon_url.clone(),
        });
    }
}
