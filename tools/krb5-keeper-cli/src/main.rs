#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod cli;
mod config;
mod driver;
mod logging;

use std::io::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

use krb5_keeper::paths::{LAMBDA_TASK_DIR, LAMBDA_WRITE_DIR};
use krb5_keeper::{KeeperPaths, TemplateSource, TicketLifecycleManager};
use tracing::{info, warn};

use crate::cli::{Exec, Keeper, KeeperCmd, Watch};
use crate::config::Settings;

const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(60);

async fn run(data: Keeper) -> Result<()> {
    logging::init_logging();

    let Keeper {
        source_dir,
        source_url,
        template,
        task_dir,
        write_dir,
        subcommand,
    } = data;

    let Settings {
        options,
        keytab_locator,
    } = Settings::from_env()?;

    let paths = KeeperPaths::under(
        task_dir.unwrap_or_else(|| PathBuf::from(LAMBDA_TASK_DIR)),
        write_dir.unwrap_or_else(|| PathBuf::from(LAMBDA_WRITE_DIR)),
    );
    let template = select_template(template, &paths.config_template);

    let manager = TicketLifecycleManager::builder(options)
        .paths(paths)
        .template(template)
        .build();

    if !manager.enabled() {
        warn!("Not running as a Linux function: Kerberos ticket management is disabled");
    }

    driver::initialize(&manager, source_dir, source_url, &keytab_locator).await?;

    match subcommand {
        KeeperCmd::Init(_) => {
            println!("{:#?}", manager.status());
        }
        KeeperCmd::Watch(Watch { interval }) => {
            let interval = interval.map(Duration::from_secs).unwrap_or(DEFAULT_WATCH_INTERVAL);

            driver::watch(&manager, interval).await?;
        }
        KeeperCmd::Exec(Exec {
            force_refresh,
            program,
            args,
        }) => {
            let status = driver::exec(&manager, force_refresh, &program, &args, DEFAULT_WATCH_INTERVAL).await?;

            std::process::exit(status.code().unwrap_or(1));
        }
    }

    Ok(())
}

fn select_template(explicit: Option<PathBuf>, packaged: &Path) -> TemplateSource {
    match explicit {
        Some(path) => TemplateSource::File(path),
        None if packaged.is_file() => TemplateSource::File(packaged.to_owned()),
        None => {
            info!(path = %packaged.display(), "No packaged configuration template, using the built-in one");
            TemplateSource::builtin()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    match Keeper::from_env() {
        Ok(flags) => run(flags).await,
        Err(err) => err.exit(),
    }
}
