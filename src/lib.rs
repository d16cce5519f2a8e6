#![doc = include_str!("../README.md")]

#[macro_use]
extern crate tracing;

pub mod acquirer;
pub mod clock;
pub mod context;
mod error;
pub mod manager;
pub mod native_env;
pub mod options;
pub mod paths;
mod secret;
pub mod template;

pub use keytab_source::{CredentialSource, FsSource, Locator};
#[cfg(feature = "http")]
pub use keytab_source::HttpSource;

pub use crate::acquirer::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner, TicketAcquirer};
pub use crate::clock::{Clock, SystemClock};
pub use crate::context::ExecutionContext;
pub use crate::error::{Error, ProcessError, Result};
pub use crate::manager::{ManagerBuilder, ManagerStatus, RefreshOutcome, TicketLifecycleManager};
pub use crate::options::TicketOptions;
pub use crate::paths::{KeeperPaths, KRB5_CONFIG_ENV};
pub use crate::secret::Secret;
pub use crate::template::TemplateSource;
