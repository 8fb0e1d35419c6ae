//! `Chain` — the default provider-selection order, and the profile-graph
//! builder that turns a `role_arn`/`source_profile` profile into a nested
//! `StsAssumeRole(SharedConfigFile(...))` provider.

use async_trait::async_trait;
use std::sync::Arc;

use super::ecs::EcsContainerProvider;
use super::environment::EnvironmentProvider;
use super::imds::Ec2ImdsProvider;
use super::profile_file::{resolve_profile, CredentialSourceKind, ProfileResolution, SharedFilePaths};
use super::sts::StsAssumeRoleProvider;
use super::{Credential, CredentialError, CredentialProvider, NullProvider, StaticProvider};

/// Ordered chain: `Environment → SharedConfigFile("default") →
/// EcsContainer (if configured) → Ec2ImdsV2 → Null`. Short-circuits on the
/// first success; propagates the last error if every provider fails.
pub struct Chain {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl Chain {
    pub fn new(providers: Vec<Arc<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// The default chain described in §4.3.
    pub fn default_chain() -> Self {
        let mut providers: Vec<Arc<dyn CredentialProvider>> = vec![
            Arc::new(EnvironmentProvider),
            Arc::new(super::profile_file::SharedConfigFileProvider::new("default")),
        ];
        if std::env::var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI").is_ok()
            || std::env::var("AWS_CONTAINER_CREDENTIALS_FULL_URI").is_ok()
        {
            providers.push(Arc::new(EcsContainerProvider::new()));
        }
        providers.push(Arc::new(Ec2ImdsProvider::new()));
        providers.push(Arc::new(NullProvider));
        Self::new(providers)
    }
}

#[async_trait]
impl CredentialProvider for Chain {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        let mut last_err = CredentialError::NoCredentials;
        for provider in &self.providers {
            match provider.get_credential().await {
                Ok(cred) => return Ok(cred),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}

/// Build the provider graph for one named profile, recursively resolving
/// `source_profile`/`credential_source` assume-role chains. This is where
/// `ProfileResolution` (read-only file parsing) becomes an actual
/// `CredentialProvider` capable of calling STS.
pub fn build_provider_for_profile(
    paths: &SharedFilePaths,
    profile: &str,
) -> Result<Arc<dyn CredentialProvider>, CredentialError> {
    match resolve_profile(paths, profile)? {
        ProfileResolution::Explicit(cred) => Ok(Arc::new(StaticProvider::new(cred))),
        ProfileResolution::AssumeRoleFromProfile {
            role_arn,
            source_profile,
            role_session_name,
        } => {
            let source = build_provider_for_profile(paths, &source_profile)?;
            Ok(Arc::new(StsAssumeRoleProvider::new(
                source,
                role_arn,
                role_session_name,
            )))
        }
        ProfileResolution::AssumeRoleFromSource {
            role_arn,
            credential_source,
            role_session_name,
        } => {
            let source: Arc<dyn CredentialProvider> = match credential_source {
                CredentialSourceKind::Environment => Arc::new(EnvironmentProvider),
                CredentialSourceKind::Ec2InstanceMetadata => Arc::new(Ec2ImdsProvider::new()),
                CredentialSourceKind::EcsContainer => Arc::new(EcsContainerProvider::new()),
            };
            Ok(Arc::new(StsAssumeRoleProvider::new(
                source,
                role_arn,
                role_session_name,
            )))
        }
    }
}
