use std::time::Duration;

use crate::{Error, Result};

/// Default maximum ticket age before a forced renewal.
pub const DEFAULT_TICKET_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Default renewability window handed to the external program through the template.
pub const DEFAULT_TICKET_RENEW_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Identity and lifetime parameters of the managed ticket.
///
/// Built once at process start and owned by the [TicketLifecycleManager](crate::TicketLifecycleManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketOptions {
    /// The Kerberos realm (or domain for an AD network).
    pub realm: String,
    /// Hostname of the Key Distribution Center of the realm.
    pub realm_kdc: Option<String>,
    /// Fully qualified principal: `username@REALM`.
    pub principal: String,
    /// Interval after which a new TGT is obtained.
    pub ticket_lifetime: Duration,
    /// Advisory renewability window; only consumed by the configuration template.
    pub ticket_renew_lifetime: Duration,
}

impl TicketOptions {
    pub fn new(realm: impl Into<String>, principal: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            realm_kdc: None,
            principal: principal.into(),
            ticket_lifetime: DEFAULT_TICKET_LIFETIME,
            ticket_renew_lifetime: DEFAULT_TICKET_RENEW_LIFETIME,
        }
    }

    pub fn with_realm_kdc(mut self, realm_kdc: impl Into<String>) -> Self {
        self.realm_kdc = Some(realm_kdc.into());
        self
    }

    pub fn with_ticket_lifetime(mut self, ticket_lifetime: Duration) -> Self {
        self.ticket_lifetime = ticket_lifetime;
        self
    }

    pub fn with_ticket_renew_lifetime(mut self, ticket_renew_lifetime: Duration) -> Self {
        self.ticket_renew_lifetime = ticket_renew_lifetime;
        self
    }

    /// Checks the invariants that must hold before the first ticket is acquired.
    pub fn validate(&self) -> Result<()> {
        if self.realm.trim().is_empty() {
            return Err(Error::InvalidOptions("realm must not be empty"));
        }

        if self.principal.trim().is_empty() {
            return Err(Error::InvalidOptions("principal must not be empty"));
        }

        if self.ticket_lifetime.is_zero() {
            return Err(Error::InvalidOptions("ticket lifetime must be greater than zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults() {
        let options = TicketOptions::new("EXAMPLE.COM", "sample_user@EXAMPLE.COM");

        assert_eq!(options.ticket_lifetime, Duration::from_secs(86_400));
        assert_eq!(options.ticket_renew_lifetime, Duration::from_secs(604_800));
        assert_eq!(options.realm_kdc, None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_missing_identity() {
        assert!(matches!(
            TicketOptions::new("", "user@EXAMPLE.COM").validate(),
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            TicketOptions::new("EXAMPLE.COM", "  ").validate(),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn rejects_zero_lifetime() {
        let options = TicketOptions::new("EXAMPLE.COM", "user@EXAMPLE.COM").with_ticket_lifetime(Duration::ZERO);

        assert!(matches!(options.validate(), Err(Error::InvalidOptions(_))));
    }
}
