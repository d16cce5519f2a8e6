use std::io::{Error, ErrorKind, Result};
use std::time::Duration;

use krb5_keeper::TicketOptions;

/// Kerberos realm.
pub const REALM_ENV: &str = "KRB5_KEEPER_REALM";
/// KDC hostname of the realm.
pub const REALM_KDC_ENV: &str = "KRB5_KEEPER_REALM_KDC";
/// Principal to authenticate as: `username@REALM`.
pub const PRINCIPAL_ENV: &str = "KRB5_KEEPER_PRINCIPAL";
/// Keytab location in `<container>/<key>` form.
pub const KEYTAB_LOCATOR_ENV: &str = "KRB5_KEEPER_KEYTAB_LOCATOR";
/// Maximum ticket age in seconds.
pub const TICKET_LIFETIME_ENV: &str = "KRB5_KEEPER_TICKET_LIFETIME";
/// Ticket renewability window in seconds.
pub const TICKET_RENEW_LIFETIME_ENV: &str = "KRB5_KEEPER_TICKET_RENEW_LIFETIME";

const DEFAULT_REALM: &str = "EXAMPLE.COM";
const DEFAULT_REALM_KDC: &str = "DC1.EXAMPLE.COM";
const DEFAULT_PRINCIPAL: &str = "sample_user@EXAMPLE.COM";
const DEFAULT_KEYTAB_LOCATOR: &str = "default-bucket/path/to/a/keytab";

/// Settings resolved once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub options: TicketOptions,
    pub keytab_locator: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_owned());

        let mut options = TicketOptions::new(value(REALM_ENV, DEFAULT_REALM), value(PRINCIPAL_ENV, DEFAULT_PRINCIPAL))
            .with_realm_kdc(value(REALM_KDC_ENV, DEFAULT_REALM_KDC));

        if let Some(lifetime) = lookup(TICKET_LIFETIME_ENV) {
            options = options.with_ticket_lifetime(parse_seconds(TICKET_LIFETIME_ENV, &lifetime)?);
        }

        if let Some(renew_lifetime) = lookup(TICKET_RENEW_LIFETIME_ENV) {
            options = options.with_ticket_renew_lifetime(parse_seconds(TICKET_RENEW_LIFETIME_ENV, &renew_lifetime)?);
        }

        Ok(Self {
            options,
            keytab_locator: value(KEYTAB_LOCATOR_ENV, DEFAULT_KEYTAB_LOCATOR),
        })
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<Duration> {
    value.trim().parse().map(Duration::from_secs).map_err(|err| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("{name} must be a number of seconds ({value:?}): {err}"),
        )
    })
}
