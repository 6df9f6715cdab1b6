//! Check-update command

use anyhow::{anyhow, Result};
use plughub_core::RuntimeConfig;
use plughub_update::PollOutcome;

use super::{pick_url, Services};
use crate::cli::CheckUpdateArgs;
use crate::output;

pub fn run(args: CheckUpdateArgs, config: RuntimeConfig) -> Result<()> {
    let repo_url = pick_url(args.self_repo, config.github.self_repo_url.as_ref()).ok_or_else(
        || anyhow!("No self-update repository set (use --self-repo or github.self-repo-url)"),
    )?;

    let services = Services::new(config)?;
    let poller = services.poller(&repo_url);

    output::header("Self-update");
    output::kv("Repository", poller.repo_url());
    output::kv("Current version", display_version(&poller.current_version()));

    let spinner = output::spinner("Checking for updates...");
    let result = poller.poll_once();
    spinner.finish_and_clear();

    match result? {
        PollOutcome::NoRelease => {
            output::info("Latest release carries no update bundles");
        }
        PollOutcome::Unchanged | PollOutcome::CacheRefreshed => {
            output::success("Already up to date");
        }
        PollOutcome::Applied { tag } => {
            output::success(&format!("Updated to {}", tag));
            if let Some(release) = poller.latest_release() {
                for asset in &release.assets {
                    output::kv(asset.platform.as_str(), &asset.local_path.display().to_string());
                }
            }
        }
        PollOutcome::Incomplete { tag, failed } => {
            output::warning(&format!(
                "Release {} found but {} asset(s) failed: {}",
                tag,
                failed.len(),
                failed.join(", ")
            ));
            return Err(anyhow!("Update to {} incomplete", tag));
        }
    }

    Ok(())
}

fn display_version(version: &str) -> &str {
    if version.is_empty() {
        "(none)"
    } else {
        version
    }
}
