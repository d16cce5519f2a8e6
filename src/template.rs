//! Placeholder substitution for the native Kerberos configuration.
//!
//! The configuration file is opaque text with `@@NAME@@` markers. Only the markers listed in
//! [Placeholder] are ever replaced; anything else is copied through untouched.
//!
//! Substitution is a single left-to-right pass and substituted values are never scanned again,
//! so the result does not depend on the order placeholders are considered in, even when a
//! value happens to contain marker-like text.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::{Error, KeeperPaths, Result, TicketOptions};

/// Built-in configuration template, used when the function package does not ship one.
pub const DEFAULT_KRB5_TEMPLATE: &str = include_str!("../templates/krb5.conf");

const MARKER: &str = "@@";

/// The known set of template tokens, declared in [Placeholder::ALL] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    RealmUpper,
    RealmLower,
    KdcHostname,
    DefaultCcache,
    DefaultKeytab,
    TicketLifetime,
    TicketRenewLifetime,
}

impl Placeholder {
    pub const ALL: &'static [Self] = &[
        Self::RealmUpper,
        Self::RealmLower,
        Self::KdcHostname,
        Self::DefaultCcache,
        Self::DefaultKeytab,
        Self::TicketLifetime,
        Self::TicketRenewLifetime,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::RealmUpper => "@@REALM-UCASE@@",
            Self::RealmLower => "@@REALM-LCASE@@",
            Self::KdcHostname => "@@KDC-HOSTNAME@@",
            Self::DefaultCcache => "@@DEFAULT-CCACHE@@",
            Self::DefaultKeytab => "@@DEFAULT-KEYTAB@@",
            Self::TicketLifetime => "@@TICKET-LIFETIME@@",
            Self::TicketRenewLifetime => "@@TICKET-RENEW-LIFETIME@@",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Where the configuration template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A template file, typically shipped inside the function package.
    File(PathBuf),
    Inline(String),
}

impl TemplateSource {
    /// The built-in [DEFAULT_KRB5_TEMPLATE].
    pub fn builtin() -> Self {
        Self::Inline(DEFAULT_KRB5_TEMPLATE.to_owned())
    }

    pub async fn load(&self) -> Result<Cow<'_, str>> {
        match self {
            Self::File(path) => {
                debug!(path = %path.display(), "Reading in KRB5 configuration template");

                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| Error::TemplateUnreadable {
                        path: path.clone(),
                        source,
                    })?;

                Ok(Cow::Owned(text))
            }
            Self::Inline(text) => Ok(Cow::Borrowed(text.as_str())),
        }
    }
}

/// Resolves placeholders from the ticket options and the file layout.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    options: &'a TicketOptions,
    paths: &'a KeeperPaths,
}

impl<'a> Bindings<'a> {
    pub fn new(options: &'a TicketOptions, paths: &'a KeeperPaths) -> Self {
        Self { options, paths }
    }

    /// `None` leaves the token in place, e.g. the KDC hostname when none is configured.
    pub fn resolve(&self, placeholder: Placeholder) -> Option<String> {
        let path = |path: &Path| path.display().to_string();

        match placeholder {
            Placeholder::RealmUpper => Some(self.options.realm.to_uppercase()),
            Placeholder::RealmLower => Some(self.options.realm.to_lowercase()),
            Placeholder::KdcHostname => self.options.realm_kdc.as_ref().map(|kdc| kdc.to_uppercase()),
            Placeholder::DefaultCcache => Some(path(&self.paths.ccache)),
            Placeholder::DefaultKeytab => Some(path(&self.paths.keytab)),
            Placeholder::TicketLifetime => Some(self.options.ticket_lifetime.as_secs().to_string()),
            Placeholder::TicketRenewLifetime => Some(self.options.ticket_renew_lifetime.as_secs().to_string()),
        }
    }
}

/// Replaces every occurrence of every known placeholder in `template`.
///
/// `resolve` is called at most once per distinct placeholder and only for placeholders that
/// actually occur in the template.
pub fn render(template: &str, mut resolve: impl FnMut(Placeholder) -> Option<String>) -> String {
    let mut resolved: Vec<Option<Option<String>>> = vec![None; Placeholder::ALL.len()];
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(position) = rest.find(MARKER) {
        output.push_str(&rest[..position]);
        rest = &rest[position..];

        match Placeholder::ALL.iter().find(|p| rest.starts_with(p.token())) {
            Some(&placeholder) => {
                let value = resolved[placeholder.index()].get_or_insert_with(|| resolve(placeholder));
                output.push_str(value.as_deref().unwrap_or(placeholder.token()));
                rest = &rest[placeholder.token().len()..];
            }
            None => {
                output.push_str(&rest[..1]);
                rest = &rest[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Lists `@@NAME@@` markers remaining in `text`.
pub fn unresolved_markers(text: &str) -> Vec<&str> {
    let mut markers = Vec::new();
    let mut offset = 0;

    while let Some(start) = text[offset..].find(MARKER).map(|position| offset + position) {
        let name_start = start + MARKER.len();

        match text[name_start..].find(MARKER) {
            Some(len) if len > 0 && text[name_start..name_start + len].chars().all(is_marker_char) => {
                let end = name_start + len + MARKER.len();
                markers.push(&text[start..end]);
                offset = end;
            }
            Some(_) => offset = start + 1,
            None => break,
        }
    }

    markers
}

fn is_marker_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
