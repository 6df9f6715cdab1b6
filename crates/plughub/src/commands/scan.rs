//! Scan command

use anyhow::{anyhow, Context, Result};
use plughub_core::RuntimeConfig;
use plughub_repo::TagOutcome;

use super::{pick_url, Services};
use crate::cli::ScanArgs;
use crate::output;

pub fn run(args: ScanArgs, config: RuntimeConfig) -> Result<()> {
    let repo_url = pick_url(args.plugin_repo, config.github.plugin_repo_url.as_ref()).ok_or_else(
        || anyhow!("No plugin repository set (use --plugin-repo or github.plugin-repo-url)"),
    )?;

    let services = Services::new(config)?;
    let manager = services.repo_manager();

    let spinner = output::spinner("Fetching release list...");
    let found = manager.set_repo_url(&repo_url);
    spinner.finish_and_clear();
    let found = found.with_context(|| format!("Failed to refresh {}", repo_url))?;

    output::header("Plugin repository");
    output::kv("Repository", &repo_url);
    output::kv("Tags", &found.to_string());

    match args.tag {
        Some(tag) => {
            let outcome = manager.process_tag(&tag)?;
            report_tag(&tag, &outcome);
            if !outcome.is_success() {
                return Err(anyhow!("No plugins packaged for {}", tag));
            }
        }
        None => {
            let summary = manager.process_all_tags();
            output::kv(
                "Processed",
                &format!("{}/{}", summary.processed, summary.total),
            );
            for tag in &summary.failed {
                output::warning(&format!("{}: nothing packaged", tag));
            }
        }
    }

    for (name, info) in manager.get_all_tags() {
        if info.is_processed() {
            output::header(&name);
            for package in info.plugin_packages.values() {
                output::kv(&package.id, &package.local_path.display().to_string());
            }
        }
    }

    Ok(())
}

fn report_tag(tag: &str, outcome: &TagOutcome) {
    match outcome {
        TagOutcome::AlreadyProcessed => output::info(&format!("{} already processed", tag)),
        TagOutcome::InProgress => output::warning(&format!("{} is already being processed", tag)),
        TagOutcome::Processed {
            packages,
            failed_assets,
        } => {
            output::success(&format!("{}: {} package(s) built", tag, packages));
            for asset in failed_assets {
                output::warning(&format!("{}: asset {} failed", tag, asset));
            }
        }
        TagOutcome::NothingPackaged { failed_assets } => {
            output::error(&format!("{}: nothing packaged", tag));
            for asset in failed_assets {
                output::warning(&format!("{}: asset {} failed", tag, asset));
            }
        }
    }
}
