use clap::Args;

use common::crypto::{self, CryptoError};
use common::transport::{KeyFragment, ShareLink};
use deadrop_daemon::http_server::api::client::ApiError;
use deadrop_daemon::http_server::api::v0::secrets::retrieve::{RetrieveRequest, RetrieveResponse};

#[derive(Args, Debug, Clone)]
pub struct Open {
    /// Share link, including its #fragment
    pub link: ShareLink,

    /// Passphrase for links created with one
    #[arg(long)]
    pub passphrase: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("secret not found or already burned")]
    Gone,
    #[error("this link needs --passphrase")]
    PassphraseRequired,
    #[error("could not decrypt: wrong key or passphrase, or the secret was tampered with")]
    Decrypt(#[from] CryptoError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Open {
    type Error = OpenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // check before spending a view
        if self.link.fragment.requires_passphrase() && self.passphrase.is_none() {
            return Err(OpenError::PassphraseRequired);
        }

        let request = RetrieveRequest { id: self.link.id };
        let envelope: RetrieveResponse = ctx.client.call(request).await.map_err(|e| {
            if e.is_not_found() {
                OpenError::Gone
            } else {
                OpenError::Api(e)
            }
        })?;

        let plaintext = match (&self.link.fragment, &self.passphrase) {
            (KeyFragment::Key(key), _) => crypto::decrypt(&envelope, key)?,
            (KeyFragment::Passphrase(salt), Some(passphrase)) => {
                crypto::decrypt_with_passphrase(&envelope, salt, passphrase)?
            }
            (KeyFragment::Passphrase(_), None) => return Err(OpenError::PassphraseRequired),
        };
        Ok(plaintext)
    }
}
