use crate::api::{self, AppState};
use crate::bootstrap::{self, BootstrapResources};
use crate::config::{FolioConfig, StoreConfig};
use crate::database::Database;
use crate::importer::{build_http_client, HttpSource, ImportRunner, ImportSummary, ImporterKind, MediaSink};
use crate::remote::RemoteStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Bootstraps the backend once and hands out cloned handles for whichever
/// entrypoint (REST server, one-shot import) needs them.
pub struct FolioNode {
    config: FolioConfig,
    bootstrap: BootstrapResources,
    remote: Option<RemoteStore>,
    importer: ImportRunner,
}

impl FolioNode {
    pub async fn start(config: FolioConfig) -> Result<Self> {
        let client = build_http_client()?;
        let remote = match &config.store {
            StoreConfig::Local => None,
            StoreConfig::Remote(remote) => Some(RemoteStore::new(remote, client.clone())),
        };
        Self::assemble(config, Arc::new(client), remote).await
    }

    /// Like [`FolioNode::start`] but fetches feeds and pages through `source`.
    /// Importer output always goes to the local database.
    pub async fn with_source(config: FolioConfig, source: Arc<dyn HttpSource>) -> Result<Self> {
        Self::assemble(config, source, None).await
    }

    async fn assemble(
        config: FolioConfig,
        source: Arc<dyn HttpSource>,
        remote: Option<RemoteStore>,
    ) -> Result<Self> {
        let bootstrap = bootstrap::initialize(&config).await?;
        let sink: Arc<dyn MediaSink> = match &remote {
            Some(remote) => Arc::new(remote.clone()),
            None => Arc::new(bootstrap.database.clone()),
        };
        let importer = ImportRunner::new(config.importer.clone(), source, sink);

        tracing::info!(
            directories_created = ?bootstrap.directories_created,
            database_initialized = bootstrap.database_initialized,
            store = if remote.is_some() { "remote" } else { "local" },
            "folio node initialized"
        );

        Ok(Self {
            config,
            bootstrap,
            remote,
            importer,
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            config: self.config.clone(),
            database: self.bootstrap.database.clone(),
            importer: self.importer.clone(),
            remote: self.remote.clone(),
        }
    }

    pub fn database(&self) -> Database {
        self.bootstrap.database.clone()
    }

    pub fn importer(&self) -> ImportRunner {
        self.importer.clone()
    }

    /// Runs the REST API server until shutdown, with the import scheduler
    /// alongside when an interval is configured.
    pub async fn run_http_server(&self) -> Result<()> {
        let scheduler = self.spawn_import_scheduler();
        let result = api::serve_http(self.app_state()).await;
        if let Some(handle) = scheduler {
            handle.abort();
        }
        result
    }

    pub async fn run_import(&self, kind: ImporterKind) -> Result<ImportSummary> {
        self.importer.run(kind).await
    }

    pub fn spawn_import_scheduler(&self) -> Option<JoinHandle<()>> {
        let secs = self.config.importer.interval_secs?;
        let runner = self.importer.clone();
        tracing::info!(interval_secs = secs, "import scheduler enabled");
        Some(tokio::spawn(run_schedule(runner, Duration::from_secs(secs))))
    }
}

/// Runs every importer once per `period`. Failures are logged by the runner
/// and retried on the next tick.
async fn run_schedule(runner: ImportRunner, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        for kind in [ImporterKind::Movies, ImporterKind::Books] {
            if let Err(err) = runner.run(kind).await {
                tracing::debug!(importer = %kind, error = %err, "scheduled import will retry next tick");
            }
        }
    }
}
