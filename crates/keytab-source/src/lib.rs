#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

#[macro_use]
extern crate tracing;

mod fs;
#[cfg(feature = "http")]
mod http;
mod locator;

use std::future::Future;

use thiserror::Error;

pub use fs::FsSource;
#[cfg(feature = "http")]
pub use http::HttpSource;
pub use locator::{Locator, LOCATOR_SEPARATOR};

/// An error returned by a [CredentialSource] or by [Locator] parsing.
#[derive(Debug, Error)]
pub enum Error {
    /// The locator is not in `<container>/<key>` form.
    #[error("invalid keytab locator {0:?}: expected <container>/<key>")]
    InvalidLocator(String),

    /// The container or the key does not exist.
    #[error("keytab {0} not found")]
    NotFound(Locator),

    /// The source refused to hand out the object.
    #[error("access to keytab {0} denied")]
    AccessDenied(Locator),

    /// The source could not be reached or failed mid-transfer.
    #[error("keytab source unavailable: {0}")]
    Unavailable(String),
}

/// The [Result] type of this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Supplies keytab bytes.
///
/// Implementations only perform the fetch; validation of the returned bytes is up to the caller.
pub trait CredentialSource: Send + Sync {
    /// Fetches the object named by `locator`.
    fn fetch(&self, locator: &Locator) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

impl<T: CredentialSource> CredentialSource for &T {
    fn fetch(&self, locator: &Locator) -> impl Future<Output = Result<Vec<u8>>> + Send {
        (**self).fetch(locator)
    }
}
