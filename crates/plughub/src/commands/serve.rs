//! Serve command

use anyhow::{Context, Result};
use plughub_core::RuntimeConfig;
use std::sync::Arc;
use tracing::{info, warn};

use super::{pick_url, Services};
use crate::cli::ServeArgs;
use crate::server::{self, AppState};

pub fn run(args: ServeArgs, mut config: RuntimeConfig) -> Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    let self_repo =
        pick_url(args.self_repo, config.github.self_repo_url.as_ref()).unwrap_or_default();
    let plugin_repo = pick_url(args.plugin_repo, config.github.plugin_repo_url.as_ref());

    let services = Services::new(config)?;
    let schedule = services.config.schedule.clone();
    let poller = Arc::new(services.poller(&self_repo));
    let repo = Arc::new(services.repo_manager());

    if let Some(url) = &plugin_repo {
        // A failed first refresh is retried by the periodic scan
        if let Err(e) = repo.set_repo_url(url) {
            warn!(url = %url, error = %e, "initial repository refresh failed");
        }
    }

    if self_repo.is_empty() || args.no_poll || !schedule.release_poll_enabled {
        info!("release poller disabled");
    } else {
        poller
            .start(schedule.release_poll_interval())
            .context("Failed to start the release poller")?;
    }

    if repo.repo_url().is_empty() || args.no_scan || !schedule.repo_scan_enabled {
        info!("periodic repository scan disabled");
    } else {
        repo.start(schedule.repo_scan_interval())
            .context("Failed to start the repository scan")?;
    }

    let state = AppState {
        poller: poller.clone(),
        repo: repo.clone(),
        repo_dir: services.config.storage.repo_dir(),
        scan_interval: schedule.repo_scan_interval(),
    };
    let addr = format!("{}:{}", services.config.server.host, services.config.server.port);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let result = runtime.block_on(server::serve(&addr, state));
    drop(runtime);

    poller.stop();
    repo.stop();
    info!("shutdown complete");
    result
}
