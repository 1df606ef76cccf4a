//! Shared context for agent instances.
//!
//! Holds what agents in one process share: configuration, the lazily
//! created platform handle and the document index. Cloning is cheap and
//! every clone sees the same state.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::config::Config;
use crate::documents::SharedDocumentIndex;
use crate::foundry::{AgentsApi, FoundryClient};
use crate::Result;

type ApiFactory = Arc<dyn Fn(&Config) -> Result<Arc<dyn AgentsApi>> + Send + Sync>;

struct Inner {
    config: Config,
    factory: ApiFactory,
    api: Mutex<Option<Arc<dyn AgentsApi>>>,
    documents: SharedDocumentIndex,
}

/// Context holds all process-wide state agents draw on.
#[derive(Clone)]
pub struct AgentContext {
    inner: Arc<Inner>,
}

impl AgentContext {
    /// Context talking to the configured project endpoint.
    pub fn new(config: Config) -> Self {
        Self::with_factory(
            config,
            Arc::new(|config: &Config| -> Result<Arc<dyn AgentsApi>> {
                let client = FoundryClient::from_config(&config.foundry)?;
                Ok(Arc::new(client))
            }),
        )
    }

    /// Context that always hands out `api`.
    pub fn with_api(config: Config, api: Arc<dyn AgentsApi>) -> Self {
        Self::with_factory(
            config,
            Arc::new(move |_: &Config| -> Result<Arc<dyn AgentsApi>> { Ok(api.clone()) }),
        )
    }

    fn with_factory(config: Config, factory: ApiFactory) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                factory,
                api: Mutex::new(None),
                documents: SharedDocumentIndex::new(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Platform handle, created on first use.
    pub fn api(&self) -> Result<Arc<dyn AgentsApi>> {
        let mut slot = self.inner.api.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(api) = slot.as_ref() {
            return Ok(api.clone());
        }

        debug!("Creating agent service client");
        let api = (self.inner.factory)(&self.inner.config)?;
        *slot = Some(api.clone());
        Ok(api)
    }

    pub fn documents(&self) -> &SharedDocumentIndex {
        &self.inner.documents
    }

    /// Drop the cached platform handle; the next call re-creates it.
    pub fn reset(&self) {
        self.inner
            .api
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
