//! Identity provider client.
//!
//! The authorization gate asks an [`IdentityClient`] whether a bearer token
//! is valid. Two implementations ship:
//! - [`StaticTokenIdentity`]: fixed token → subject table from config
//! - [`IntrospectionIdentity`]: RFC 7662 token introspection over HTTP

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::IdentityConfig;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Subject the token was issued to.
    pub subject: String,
    /// Space-separated scopes, when the provider reports them.
    pub scope: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider looked at the token and refused it.
    #[error("{0}")]
    Rejected(String),
    /// The provider could not be asked.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    #[error("invalid identity provider configuration: {0}")]
    Config(String),
}

pub trait IdentityClient: Send + Sync {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, IdentityError>>;
}

/// Build the client described by `config`.
pub fn from_config(config: &IdentityConfig) -> Result<Arc<dyn IdentityClient>, IdentityError> {
    match &config.introspection_url {
        Some(raw) => {
            let endpoint = Url::parse(raw).map_err(|e| IdentityError::Config(e.to_string()))?;
            let client = IntrospectionIdentity::new(
                endpoint,
                config.client_id.clone(),
                config.client_secret.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
        None => Ok(Arc::new(StaticTokenIdentity::new(
            config
                .static_tokens
                .iter()
                .map(|(token, subject)| (token.clone(), subject.clone())),
        ))),
    }
}

/// Accepts a fixed set of tokens.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenIdentity {
    tokens: HashMap<String, String>,
}

impl StaticTokenIdentity {
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl IdentityClient for StaticTokenIdentity {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, IdentityError>> {
        let result = self
            .tokens
            .get(token)
            .map(|subject| Identity {
                subject: subject.clone(),
                scope: None,
            })
            .ok_or_else(|| IdentityError::Rejected("Invalid token".to_string()));
        future::ready(result).boxed()
    }
}

#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    active: bool,
    sub: Option<String>,
    username: Option<String>,
    scope: Option<String>,
}

/// Asks an OAuth2 introspection endpoint about each token.
#[derive(Debug, Clone)]
pub struct IntrospectionIdentity {
    client: reqwest::Client,
    endpoint: Url,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl IntrospectionIdentity {
    pub fn new(
        endpoint: Url,
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Config(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            client_id,
            client_secret,
        })
    }

    async fn introspect(&self, token: &str) -> Result<Identity, IdentityError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .form(&[("token", token), ("token_type_hint", "access_token")]);
        if let Some(id) = &self.client_id {
            request = request.basic_auth(id, self.client_secret.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Unavailable(format!(
                "introspection endpoint returned {status}"
            )));
        }

        let body: IntrospectionResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        if !body.active {
            return Err(IdentityError::Rejected("Token is not active".to_string()));
        }

        let subject = body
            .sub
            .or(body.username)
            .ok_or_else(|| IdentityError::Rejected("Token has no subject".to_string()))?;
        Ok(Identity {
            subject,
            scope: body.scope,
        })
    }
}

impl IdentityClient for IntrospectionIdentity {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, IdentityError>> {
        self.introspect(token).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_tokens() {
        let identity =
            StaticTokenIdentity::new([("t-1".to_string(), "alice".to_string())]);

        let ok = identity.verify("t-1").await.unwrap();
        assert_eq!(ok.subject, "alice");

        let err = identity.verify("t-2").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn from_config_picks_introspection_when_url_set() {
        let mut config = IdentityConfig::default();
        assert!(from_config(&config).is_ok());

        config.introspection_url = Some("::not a url::".into());
        assert!(matches!(from_config(&config), Err(IdentityError::Config(_))));

        config.introspection_url = Some("http://127.0.0.1:9/introspect".into());
        assert!(from_config(&config).is_ok());
    }
}
