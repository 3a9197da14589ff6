// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup wiring shared by every subcommand.
//!
//! Malformed catalog or table content is fatal here, before any request is
//! accepted.

use std::sync::Arc;

use modelgate_config::ModelgateConfig;
use modelgate_core::{ModelgateError, RoutingLogStore};
use modelgate_gateway::{Pipeline, StatsSettings};
use modelgate_log::{LogWriter, MemoryRoutingLog, SqliteRoutingLog};
use modelgate_proxy::Dispatcher;
use modelgate_router::{ModelRegistry, ModelSpec, Router, RoutingTable};
use tracing::{info, warn};

/// Which routing log backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogBackend {
    /// SQLite when `log.database_path` is set, memory otherwise.
    Configured,
    /// Always in memory. Dry runs use this so they never touch the real log.
    Memory,
}

/// Everything `serve` and `route` need.
pub struct Runtime {
    pub pipeline: Arc<Pipeline>,
    pub writer: LogWriter,
    pub stats: StatsSettings,
}

fn read_file(path: &str, what: &str) -> Result<String, ModelgateError> {
    std::fs::read_to_string(path)
        .map_err(|e| ModelgateError::Config(format!("failed to read {what} `{path}`: {e}")))
}

/// Load the catalog and table from configured files or the built-ins.
pub fn load_router(config: &ModelgateConfig) -> Result<Router, ModelgateError> {
    let registry = match &config.catalog.models_path {
        Some(path) => ModelRegistry::from_json(&read_file(path, "model catalog")?, &config.providers)?,
        None => ModelRegistry::builtin(&config.providers)?,
    };
    let table = match &config.catalog.routing_table_path {
        Some(path) => RoutingTable::from_json(&read_file(path, "routing table")?)?,
        None => RoutingTable::builtin()?,
    };

    if !registry.has_configured_provider() {
        warn!("no provider has a credential or base URL; every request will fail");
    }
    if !table.has_mode(&config.gateway.default_mode) {
        return Err(ModelgateError::Config(format!(
            "default mode `{}` is not in the routing table",
            config.gateway.default_mode
        )));
    }

    info!(
        models = registry.all().len(),
        modes = table.modes().count(),
        "catalog loaded"
    );
    Router::new(Arc::new(registry), Arc::new(table))
}

/// The savings baseline: the configured model, else the priciest one.
pub fn baseline_model(config: &ModelgateConfig, registry: &ModelRegistry) -> Result<Option<ModelSpec>, ModelgateError> {
    match &config.log.baseline_model {
        Some(id) => Ok(Some(registry.get(id)?.clone())),
        None => Ok(registry.most_expensive().cloned()),
    }
}

/// Open the routing log store.
pub async fn open_store(
    config: &ModelgateConfig,
    backend: LogBackend,
) -> Result<Arc<dyn RoutingLogStore>, ModelgateError> {
    match (&config.log.database_path, backend) {
        (Some(path), LogBackend::Configured) => Ok(Arc::new(SqliteRoutingLog::open(path).await?)),
        _ => {
            if backend == LogBackend::Configured {
                info!("no log.database_path configured, routing log kept in memory");
            }
            Ok(Arc::new(MemoryRoutingLog::new()))
        }
    }
}

/// Assemble the pipeline and spawn the log writer.
pub async fn build_runtime(config: &ModelgateConfig, backend: LogBackend) -> Result<Runtime, ModelgateError> {
    let router = load_router(config)?;
    let baseline = baseline_model(config, router.registry())?;
    let dispatcher = Dispatcher::new(&config.providers, &config.proxy)?;
    let store = open_store(config, backend).await?;
    let writer = LogWriter::spawn(Arc::clone(&store), config.log.queue_capacity);

    let pipeline = Pipeline::new(config, router, dispatcher, store, writer.sender());
    Ok(Runtime {
        pipeline: Arc::new(pipeline),
        writer,
        stats: StatsSettings {
            window_hours: config.log.stats_window_hours,
            baseline,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_catalog_loads() {
        let router = load_router(&ModelgateConfig::default()).unwrap();
        assert!(router.registry().contains("gpt-4o-mini"));
        assert!(router.table().has_mode("standard"));
    }

    #[test]
    fn catalog_files_override_builtins() {
        let mut catalog = tempfile::NamedTempFile::new().unwrap();
        write!(
            catalog,
            r#"{{"models":[{{"id":"tiny","display_name":"Tiny","provider":"ollama",
                "input_cost_per_mtok":0.0,"output_cost_per_mtok":0.0,"max_context_tokens":8192}}]}}"#
        )
        .unwrap();
        let mut table = tempfile::NamedTempFile::new().unwrap();
        write!(
            table,
            r#"{{"standard":{{"simple":["tiny"],"standard":["tiny"],"complex":["tiny"]}}}}"#
        )
        .unwrap();

        let mut config = ModelgateConfig::default();
        config.catalog.models_path = Some(catalog.path().display().to_string());
        config.catalog.routing_table_path = Some(table.path().display().to_string());

        let router = load_router(&config).unwrap();
        assert_eq!(router.registry().all().len(), 1);
        assert_eq!(baseline_model(&config, router.registry()).unwrap().unwrap().id, "tiny");
    }

    #[test]
    fn missing_catalog_file_is_a_config_error() {
        let mut config = ModelgateConfig::default();
        config.catalog.models_path = Some("/nonexistent/models.json".into());
        let err = load_router(&config).unwrap_err();
        assert!(matches!(err, ModelgateError::Config(ref m) if m.contains("model catalog")));
    }

    #[test]
    fn default_mode_must_exist() {
        let mut config = ModelgateConfig::default();
        config.gateway.default_mode = "turbo".into();
        assert!(matches!(load_router(&config), Err(ModelgateError::Config(_))));
    }

    #[test]
    fn unknown_baseline_is_rejected() {
        let mut config = ModelgateConfig::default();
        config.log.baseline_model = Some("gpt-17".into());
        let router = load_router(&config).unwrap();
        assert!(matches!(
            baseline_model(&config, router.registry()),
            Err(ModelgateError::UnknownModel { .. })
        ));
    }

    #[tokio::test]
    async fn sqlite_store_when_path_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ModelgateConfig::default();
        config.log.database_path = Some(dir.path().join("log.db").display().to_string());

        let _store = open_store(&config, LogBackend::Configured).await.unwrap();
        assert!(dir.path().join("log.db").exists());

        let memory = open_store(&config, LogBackend::Memory).await.unwrap();
        assert!(memory.entries_since(chrono::DateTime::<chrono::Utc>::MIN_UTC).await.unwrap().is_empty());
    }
}
