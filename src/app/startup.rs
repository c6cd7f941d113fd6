//! Application startup
//!
//! Staged startup: parse CLI flags, bring up logging, load and validate
//! configuration, build the runtime, then run the synchronization loop
//! until every organization is processed and the analysis queue drains
//! (or a shutdown signal cuts the run short).

use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::analyzer::{CommandAnalyzer, CommitAnalyzer};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::version;
use crate::github::types::OrgRepository;
use crate::github::{ApiResult, GitHubApi, GitHubClient};
use crate::keys::DeployKeyManager;
use crate::orchestrator::ScanOrchestrator;
use crate::queue::AnalysisQueue;
use crate::scanner::IdentityResolver;
use crate::store::{CommitStore, MemoryStore};
use crate::webhook::WebhookManager;

use super::cli::Args;
use super::config::AppConfig;

/// Process entry point behind `main`.
pub fn startup() {
    let args = Args::parse();
    let use_color = resolve_color(args.color, args.no_color);

    let log_file = args
        .log_file
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned());
    if let Err(error) = init_logging(
        args.log_level.as_deref(),
        args.log_format.as_deref(),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("Failed to initialise logging: {error}");
        std::process::exit(1);
    }

    log::info!(
        "repopulse {} starting (build {} {})",
        env!("CARGO_PKG_VERSION"),
        version::git_hash(),
        version::build_time()
    );

    let config = match AppConfig::load(&args) {
        Ok(config) => config,
        Err(error) => {
            log_error_with_context(&error, "Configuration loading failed");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            log::error!("FATAL: could not start async runtime: {error}");
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(run(config));
    std::process::exit(code);
}

async fn run(config: AppConfig) -> i32 {
    let (shutdown, _shutdown_rx) = ShutdownCoordinator::install();

    let api: Arc<dyn GitHubApi> = match GitHubClient::new(&config.token) {
        Ok(client) => Arc::new(client),
        Err(error) => {
            log::error!("FATAL: GitHub client construction failed: {error}");
            return 1;
        }
    };

    let analyzer: Arc<dyn CommitAnalyzer> = match CommandAnalyzer::new(&config.analyzer_command) {
        Ok(analyzer) => Arc::new(analyzer),
        Err(error) => {
            log::error!("FATAL: analyzer setup failed: {error}");
            return 1;
        }
    };

    let store: Arc<dyn CommitStore> = Arc::new(MemoryStore::new());
    let queue = AnalysisQueue::new(config.queue_concurrency);
    let queue_task = queue.start(Arc::clone(&store), analyzer, shutdown.subscribe());

    let keys = DeployKeyManager::new(Arc::clone(&api), &config.key_storage_root);
    let orchestrator = Arc::new(ScanOrchestrator::new(
        Arc::clone(&api),
        Arc::clone(&store),
        queue.clone(),
        keys,
        &config.clone_root,
        config.reference_date,
    ));

    let organizations = match organizations_to_sync(api.as_ref(), &config).await {
        Ok(organizations) => organizations,
        Err(error) => {
            log::error!("FATAL: organization discovery failed: {error}");
            return 1;
        }
    };
    if organizations.is_empty() {
        log::warn!("no organizations to synchronize");
    }

    let mut sync_failures = 0usize;
    for organization in &organizations {
        if shutdown.is_shutdown_requested() {
            log::info!("shutdown requested, skipping remaining organizations");
            break;
        }
        sync_failures +=
            sync_organization(&api, &orchestrator, &config, &shutdown, organization).await;
    }

    tokio::select! {
        _ = queue.drain() => {}
        _ = wait_for_shutdown(&shutdown) => {
            log::info!("shutdown requested, abandoning queued analysis work");
        }
    }

    shutdown.trigger_shutdown();
    let _ = queue_task.await;

    let metrics = queue.metrics();
    log::info!(
        "run complete: {} analyses done, {} failed, {} repositories failed to sync",
        metrics.completed,
        metrics.failed,
        sync_failures
    );

    if sync_failures > 0 {
        1
    } else {
        0
    }
}

/// Synchronize one organization; returns the number of failed repositories.
async fn sync_organization(
    api: &Arc<dyn GitHubApi>,
    orchestrator: &Arc<ScanOrchestrator>,
    config: &AppConfig,
    shutdown: &ShutdownCoordinator,
    organization: &str,
) -> usize {
    log::info!("synchronizing organization {organization}");

    // Webhook provisioning is best-effort; a missing hook degrades
    // freshness, not correctness of this run.
    if let Some(webhook) = &config.webhook {
        let manager = WebhookManager::new(Arc::clone(api), webhook.secret.clone());
        match manager.get_or_create(organization, &webhook.url).await {
            Ok(hook) => log::debug!("{organization}: webhook {} in place", hook.id),
            Err(error) => log::warn!("{organization}: webhook provisioning failed: {error}"),
        }
    }

    let members = match api.members(organization).await {
        Ok(members) => members,
        Err(error) => {
            log::warn!(
                "{organization}: member listing failed, commits will be unattributed: {error}"
            );
            Vec::new()
        }
    };
    let identity = Arc::new(Mutex::new(IdentityResolver::new(
        members,
        config.aliases.clone(),
    )));

    let repositories = match repositories_to_sync(api.as_ref(), config, organization).await {
        Ok(repositories) => repositories,
        Err(error) => {
            log::error!("{organization}: repository listing failed: {error}");
            return 1;
        }
    };
    log::info!(
        "{organization}: {} repositories to synchronize",
        repositories.len()
    );

    let limit = Arc::new(Semaphore::new(config.max_parallel_repos));
    let mut tasks = JoinSet::new();
    for repository in repositories {
        if shutdown.is_shutdown_requested() {
            break;
        }
        let permit = match Arc::clone(&limit).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let orchestrator = Arc::clone(orchestrator);
        let identity = Arc::clone(&identity);
        let organization = organization.to_string();
        tasks.spawn(async move {
            let _permit = permit;
            let name = repository.name.clone();
            let outcome = orchestrator
                .sync_repository(&organization, &repository, identity)
                .await;
            (name, outcome)
        });
    }

    let mut failures = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(_))) => {}
            Ok((name, Err(error))) => {
                failures += 1;
                log::error!("{organization}/{name}: synchronization failed: {error}");
            }
            Err(join_error) => {
                failures += 1;
                log::error!("{organization}: synchronization task failed: {join_error}");
            }
        }
    }
    failures
}

async fn organizations_to_sync(api: &dyn GitHubApi, config: &AppConfig) -> ApiResult<Vec<String>> {
    if !config.organizations.is_empty() {
        return Ok(config.organizations.clone());
    }
    log::info!("no organizations configured, discovering via the API");
    Ok(api
        .organizations()
        .await?
        .into_iter()
        .map(|organization| organization.login)
        .collect())
}

async fn repositories_to_sync(
    api: &dyn GitHubApi,
    config: &AppConfig,
    organization: &str,
) -> ApiResult<Vec<OrgRepository>> {
    match &config.repository {
        Some(name) => Ok(vec![api.repository(organization, name).await?]),
        None => api.repositories(organization, config.reference_date).await,
    }
}

/// Resolves to color on or off: explicit flags win, otherwise the
/// decision is left to `colored` (NO_COLOR, CLICOLOR, tty detection).
fn resolve_color(force_color: bool, no_color: bool) -> bool {
    if no_color {
        colored::control::set_override(false);
    } else if force_color {
        colored::control::set_override(true);
    }
    colored::control::SHOULD_COLORIZE.should_colorize()
}

async fn wait_for_shutdown(shutdown: &ShutdownCoordinator) {
    let mut rx = shutdown.subscribe();
    // Subscribing before the flag check closes the gap where a trigger
    // lands between the two.
    if shutdown.is_shutdown_requested() {
        return;
    }
    let _ = rx.recv().await;
}
