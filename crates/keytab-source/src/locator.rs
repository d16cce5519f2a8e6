use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Separates the container from the key in a locator string.
pub const LOCATOR_SEPARATOR: char = '/';

/// Names a keytab object as `<container>/<key>`.
///
/// The container is everything before the first separator. The key is the remainder and
/// may itself contain separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    container: String,
    key: String,
}

impl Locator {
    /// Constructs a new [Locator] from already split parts.
    ///
    /// Returns an error if either part is empty or the container contains a separator.
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Result<Self, Error> {
        let container = container.into();
        let key = key.into();

        if container.is_empty() || key.is_empty() || container.contains(LOCATOR_SEPARATOR) {
            return Err(Error::InvalidLocator(format!("{container}{LOCATOR_SEPARATOR}{key}")));
        }

        Ok(Self { container, key })
    }

    /// Bucket (container) identifier.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Object key inside the container.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key split into its path segments, with empty segments dropped.
    pub fn key_segments(&self) -> impl Iterator<Item = &str> {
        self.key.split(LOCATOR_SEPARATOR).filter(|segment| !segment.is_empty())
    }
}

impl FromStr for Locator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches(LOCATOR_SEPARATOR);

        match trimmed.split_once(LOCATOR_SEPARATOR) {
            Some((container, key)) if !container.is_empty() && !key.is_empty() => Ok(Self {
                container: container.to_owned(),
                key: key.to_owned(),
            }),
            _ => Err(Error::InvalidLocator(s.to_owned())),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.container, LOCATOR_SEPARATOR, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::Locator;
    use crate::Error;

    #[test]
    fn splits_on_first_separator() {
        let locator: Locator = "my-bucket/path/to/keytab".parse().unwrap();

        assert_eq!(locator.container(), "my-bucket");
        assert_eq!(locator.key(), "path/to/keytab");
        assert_eq!(locator.key_segments().collect::<Vec<_>>(), ["path", "to", "keytab"]);
        assert_eq!(locator.to_string(), "my-bucket/path/to/keytab");
    }

    #[test]
    fn leading_separator_is_ignored() {
        let locator: Locator = "/my-bucket/keytab".parse().unwrap();

        assert_eq!(locator.container(), "my-bucket");
        assert_eq!(locator.key(), "keytab");
    }

    #[test]
    fn rejects_locator_without_separator() {
        assert!(matches!(
            "no-slash-here".parse::<Locator>(),
            Err(Error::InvalidLocator(value)) if value == "no-slash-here"
        ));
    }

    #[test]
    fn rejects_empty_parts() {
        for value in ["", "/", "bucket/", "//key"] {
            assert!(value.parse::<Locator>().is_err(), "{value:?} should be rejected");
        }

        assert!(Locator::new("bucket", "").is_err());
        assert!(Locator::new("buck/et", "key").is_err());
        assert!(Locator::new("bucket", "a/b").is_ok());
    }
}
