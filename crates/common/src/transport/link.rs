use std::fmt;
use std::str::FromStr;

use url::Url;

use super::{KeyFragment, TransportError};
use crate::gate::SecretId;

/// Path segment that precedes the secret id in a share link
pub const VIEW_PATH: &str = "view";

/// A share link: `{base}/view/{id}#{fragment}`
///
/// The id names the stored ciphertext; the fragment carries the key (or salt) and
///  is never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    /// Origin (plus optional path prefix) of the deployment
    pub base: Url,
    pub id: SecretId,
    pub fragment: KeyFragment,
}

impl ShareLink {
    pub fn new(base: Url, id: SecretId, fragment: KeyFragment) -> Self {
        let mut base = base;
        base.set_fragment(None);
        base.set_query(None);
        Self { base, id, fragment }
    }

    pub fn to_url(&self) -> Url {
        let mut url = self.base.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}/{}", prefix, VIEW_PATH, self.id));
        url.set_fragment(Some(&self.fragment.to_string()));
        url
    }

    pub fn parse(link: &str) -> Result<Self, TransportError> {
        let url = Url::parse(link)?;
        let fragment: KeyFragment = url
            .fragment()
            .filter(|f| !f.is_empty())
            .ok_or(TransportError::MissingFragment)?
            .parse()?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let [prefix @ .., view, id] = segments.as_slice() else {
            return Err(TransportError::InvalidLink(url.path().to_string()));
        };
        if *view != VIEW_PATH {
            return Err(TransportError::InvalidLink(url.path().to_string()));
        }
        let id = SecretId::parse(id)
            .ok_or_else(|| TransportError::InvalidLink(format!("malformed id {}", id)))?;

        let mut base = url.clone();
        base.set_fragment(None);
        base.set_query(None);
        base.set_path(&format!("/{}", prefix.join("/")));

        Ok(Self { base, id, fragment })
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

impl FromStr for ShareLink {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
