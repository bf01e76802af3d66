use std::io::Read;

use anyhow::Context;
use clap::Args;
use url::Url;

use common::crypto::{self, generate_random_password, DEFAULT_PASSWORD_LENGTH};
use common::lifecycle::{NewSecret, MAX_TTL_SECONDS, MAX_VIEW_LIMIT, MIN_TTL_SECONDS, MIN_VIEW_LIMIT};
use common::transport::{KeyFragment, ShareLink};
use deadrop_daemon::http_server::api::client::ApiError;
use deadrop_daemon::http_server::api::v0::secrets::create::{CreateRequest, CreateResponse};
use deadrop_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Share {
    /// Secret to share (read from stdin if omitted)
    pub secret: Option<String>,

    /// Number of times the secret can be viewed before it burns
    #[arg(long, default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(MIN_VIEW_LIMIT as i64..=MAX_VIEW_LIMIT as i64))]
    pub views: u32,

    /// Seconds until the secret expires, whatever views remain
    #[arg(long, default_value_t = 86_400,
        value_parser = clap::value_parser!(u64).range(MIN_TTL_SECONDS..=MAX_TTL_SECONDS))]
    pub ttl: u64,

    /// Derive the key from this passphrase; the link then carries only the salt
    #[arg(long, conflicts_with = "generate_passphrase")]
    pub passphrase: Option<String>,

    /// Generate a passphrase and print it alongside the link
    #[arg(long)]
    pub generate_passphrase: bool,

    /// Origin the link points at (defaults to public_url from config, then the remote)
    #[arg(long)]
    pub base_url: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("encryption failed: {0}")]
    Crypto(#[from] common::crypto::CryptoError),
    #[error("nothing to share")]
    Empty,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Share {
    fn plaintext(&self) -> Result<String, ShareError> {
        let plaintext = match &self.secret {
            Some(secret) => secret.clone(),
            None => {
                let mut input = String::new();
                std::io::stdin()
                    .read_to_string(&mut input)
                    .context("failed to read secret from stdin")?;
                input.trim_end_matches(['\r', '\n']).to_string()
            }
        };
        if plaintext.is_empty() {
            return Err(ShareError::Empty);
        }
        Ok(plaintext)
    }

    fn passphrase(&self) -> Option<String> {
        match (&self.passphrase, self.generate_passphrase) {
            (Some(passphrase), _) => Some(passphrase.clone()),
            (None, true) => Some(generate_random_password(DEFAULT_PASSWORD_LENGTH)),
            (None, false) => None,
        }
    }

    fn link_base(&self, ctx: &crate::cli::op::OpContext) -> Url {
        self.base_url
            .clone()
            .or_else(|| {
                AppState::load(ctx.config_path.clone())
                    .ok()
                    .and_then(|state| state.config.public_url)
            })
            .unwrap_or_else(|| ctx.client.base_url().clone())
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Share {
    type Error = ShareError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let plaintext = self.plaintext()?;
        let passphrase = self.passphrase();

        let (envelope, fragment) = match &passphrase {
            Some(passphrase) => {
                let (envelope, salt) = crypto::encrypt_with_passphrase(&plaintext, passphrase)?;
                (envelope, KeyFragment::Passphrase(salt))
            }
            None => {
                let (envelope, key) = crypto::encrypt(&plaintext)?;
                (envelope, KeyFragment::Key(key))
            }
        };

        let request = CreateRequest(NewSecret::new(envelope, self.views, self.ttl));
        let response: CreateResponse = ctx.client.call(request).await?;

        let link = ShareLink::new(self.link_base(ctx), response.id, fragment);
        let mut output = link.to_string();
        // a passphrase the user typed is already known to them
        if self.generate_passphrase {
            if let Some(passphrase) = passphrase {
                output.push_str(&format!("\npassphrase: {}", passphrase));
            }
        }
        Ok(output)
    }
}
