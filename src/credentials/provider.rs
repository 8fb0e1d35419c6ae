//! The `CredentialProvider` capability and its shared error taxonomy.

use async_trait::async_trait;
use thiserror::Error;

use super::Credential;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("environment variables AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY are not set")]
    MissingEnvironment,

    #[error("invalid syntax in config/credentials file: {0}")]
    InvalidSyntax(String),

    #[error("profile not found: {0}")]
    MissingProfile(String),

    #[error("profile {0} has no aws_access_key_id")]
    MissingAccessKeyId(String),

    #[error("profile {0} has no aws_secret_access_key")]
    MissingSecretAccessKey(String),

    #[error("IMDS request failed: {0}")]
    Imds(String),

    #[error("ECS container credentials request failed: {0}")]
    Ecs(String),

    #[error("STS AssumeRole failed: {0}")]
    StsAssumeRole(String),

    #[error(transparent)]
    Sso(#[from] super::SsoError),

    #[error("no credential provider in the chain produced a credential")]
    NoCredentials,

    #[error("EC2 metadata access is disabled (AWS_EC2_METADATA_DISABLED=true)")]
    ImdsDisabled,
}

/// A polymorphic source of AWS credentials. `get_credential` is the sole
/// capability; everything else (caching, refresh, chaining) is composition
/// over this trait, not a method on it.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_credential(&self) -> Result<Credential, CredentialError>;
}

/// `Static` — wraps a fixed credential. Never expires, never fails.
pub struct StaticProvider(Credential);

impl StaticProvider {
    pub fn new(credential: Credential) -> Self {
        Self(credential)
    }
}

#[async_trait]
impl CredentialProvider for StaticProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        Ok(self.0.clone())
    }
}

/// `Null` — the chain's terminal sentinel; always fails so "last error" is
/// well-defined even if every real provider is absent.
#[derive(Default)]
pub struct NullProvider;

#[async_trait]
impl CredentialProvider for NullProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        Err(CredentialError::NoCredentials)
    }
}
