//! Initialization and renewal around the work the tool runs.
//!
//! A renewal failure ends the current unit of work: a child program is never started, or kept
//! running, on a ticket that could not be renewed. Only `watch` retries on its next round.

use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use krb5_keeper::{FsSource, RefreshOutcome, TicketLifecycleManager};
use tracing::{error, info};

/// Fetches the keytab from the selected source and obtains the first ticket.
pub async fn initialize(
    manager: &TicketLifecycleManager,
    source_dir: Option<PathBuf>,
    source_url: Option<String>,
    locator: &str,
) -> Result<()> {
    match (source_dir, source_url) {
        (Some(dir), None) => manager.ensure_initialized_from(&FsSource::new(dir), locator).await?,
        (None, Some(url)) => initialize_from_url(manager, &url, locator).await?,
        (Some(_), Some(_)) => {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "--source-dir and --source-url are mutually exclusive",
            ))
        }
        (None, None) if manager.enabled() => {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "a keytab source is required: pass --source-dir or --source-url",
            ))
        }
        (None, None) => {}
    }

    Ok(())
}

#[cfg(feature = "http")]
async fn initialize_from_url(manager: &TicketLifecycleManager, url: &str, locator: &str) -> Result<()> {
    let base = url::Url::parse(url)
        .map_err(|err| Error::new(ErrorKind::InvalidData, format!("invalid source URL ({url:?}): {err:?}")))?;

    manager
        .ensure_initialized_from(&krb5_keeper::HttpSource::new(base), locator)
        .await?;

    Ok(())
}

#[cfg(not(feature = "http"))]
async fn initialize_from_url(_manager: &TicketLifecycleManager, _url: &str, _locator: &str) -> Result<()> {
    Err(Error::new(
        ErrorKind::Unsupported,
        "--source-url requires the tool to be built with the `http` feature",
    ))
}

/// Renews the ticket when it is due, or unconditionally with `force`. Every failure is returned.
pub async fn renew(manager: &TicketLifecycleManager, force: bool) -> krb5_keeper::Result<()> {
    if manager.refresh(force).await? == RefreshOutcome::Renewed {
        info!("Kerberos TGT renewed");
    }

    Ok(())
}

/// One renewal check of `watch`.
///
/// Returns `Ok(false)` when the renewal failed in a way the next round may recover from.
pub async fn watch_round(manager: &TicketLifecycleManager) -> krb5_keeper::Result<bool> {
    match renew(manager, false).await {
        Ok(()) => Ok(true),
        Err(err) if err.is_retryable() => {
            error!(%err, "Kerberos TGT renewal failed, retrying on the next round");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

pub async fn watch(manager: &TicketLifecycleManager, interval: Duration) -> Result<()> {
    loop {
        tokio::time::sleep(interval).await;
        watch_round(manager).await?;
    }
}

/// Renews the ticket, then runs `program` until it exits, checking the ticket every `interval`.
///
/// The child is killed if a renewal fails while it runs.
pub async fn exec(
    manager: &TicketLifecycleManager,
    force_refresh: bool,
    program: &Path,
    args: &[String],
    interval: Duration,
) -> Result<ExitStatus> {
    renew(manager, force_refresh).await?;

    let mut child = tokio::process::Command::new(program).args(args).spawn()?;
    info!(program = %program.display(), "Started child process");

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        let renewal = tokio::select! {
            status = child.wait() => {
                let status = status?;
                info!(%status, "Child process exited");
                return Ok(status);
            }
            _ = ticker.tick() => renew(manager, false).await,
        };

        if let Err(err) = renewal {
            error!(%err, "Kerberos TGT renewal failed, stopping the child process");
            child.kill().await?;
            return Err(err.into());
        }
    }
}
