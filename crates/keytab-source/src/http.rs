use reqwest::StatusCode;
use url::Url;

use crate::{CredentialSource, Error, Locator, Result};

/// Fetches keytabs from an HTTP object store using path-style addressing.
///
/// The object is requested as `GET {base}/{container}/{key}`. Authentication, if any, must be
/// carried by `base` itself (e.g. a pre-signed URL prefix) or by the supplied client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: Url,
    client: reqwest::Client,
}

impl HttpSource {
    /// Creates a new [HttpSource] using a default `reqwest` client.
    pub fn new(base: Url) -> Self {
        Self::with_client(base, reqwest::Client::new())
    }

    /// Creates a new [HttpSource] that sends requests through `client`.
    pub fn with_client(base: Url, client: reqwest::Client) -> Self {
        Self { base, client }
    }

    fn object_url(&self, locator: &Locator) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Unavailable(format!("{} cannot be used as a base URL", self.base)))?
            .pop_if_empty()
            .push(locator.container())
            .extend(locator.key_segments());

        Ok(url)
    }
}

impl CredentialSource for HttpSource {
    #[instrument(level = "debug", skip(self), fields(base = %self.base), err)]
    async fn fetch(&self, locator: &Locator) -> Result<Vec<u8>> {
        let url = self.object_url(locator)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| Error::Unavailable(format!("request failed: {err}")))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(Error::NotFound(locator.clone())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(Error::AccessDenied(locator.clone())),
            status => return Err(Error::Unavailable(format!("unexpected status {status}"))),
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| Error::Unavailable(format!("unable to read the response body: {err}")))?;

        Ok(Vec::from(body))
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::HttpSource;
    use crate::Locator;

    #[test]
    fn object_url_uses_path_style() {
        let source = HttpSource::new(Url::parse("https://store.example.com/prefix/").unwrap());
        let locator: Locator = "my-bucket/path/to/keytab".parse().unwrap();

        assert_eq!(
            source.object_url(&locator).unwrap().as_str(),
            "https://store.example.com/prefix/my-bucket/path/to/keytab"
        );
    }
}
