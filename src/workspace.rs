//! Top-level wiring: one [`Workspace`] per configured index, handing out the
//! services the UI layer calls.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::fileserver::FileServerClient;
use crate::index::{IndexClient, RemoteIndex, SchemaManager};
use crate::service::{ContentService, PageRepository, WorkStatusAggregator, WorksService};

pub struct Workspace {
    pub works: WorksService,
    pub content: ContentService,
    pub pages: PageRepository,
    pub fileserver: Option<Arc<FileServerClient>>,
}

impl Workspace {
    pub fn from_config(config: &Config) -> Result<Self> {
        let index: Arc<dyn IndexClient> = Arc::new(RemoteIndex::new(&config.index)?);
        let fileserver = Arc::new(FileServerClient::new(&config.fileserver)?);
        Ok(Self::with_index(index, Some(fileserver), config))
    }

    /// Wire services over an arbitrary index client; used by tests and by
    /// hosts that bring their own transport.
    pub fn with_index(
        index: Arc<dyn IndexClient>,
        fileserver: Option<Arc<FileServerClient>>,
        config: &Config,
    ) -> Self {
        // One schema manager shared by every service, so the convergence
        // check runs once per process no matter which operation comes first.
        let schema = Arc::new(SchemaManager::new(index.clone()));
        let aggregator =
            WorkStatusAggregator::new(index.clone(), config.limits.max_pages_per_work);
        Self {
            works: WorksService::new(
                index.clone(),
                schema.clone(),
                config.language.clone(),
                config.limits.clone(),
            ),
            content: ContentService::new(index.clone(), schema.clone()),
            pages: PageRepository::new(index, schema, aggregator, fileserver.clone()),
            fileserver,
        }
    }
}
