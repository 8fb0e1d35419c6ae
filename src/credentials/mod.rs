//! The credential model and the provider chain (§3, §4.3).

mod chain;
mod deferred;
mod ecs;
mod environment;
mod imds;
mod profile_file;
mod provider;
mod rotating;
mod sso;
mod sts;
mod types;

pub use chain::{build_provider_for_profile, Chain};
pub use deferred::DeferredProvider;
pub use ecs::EcsContainerProvider;
pub use environment::EnvironmentProvider;
pub use imds::Ec2ImdsProvider;
pub use profile_file::{
    resolve_profile, CredentialSourceKind, ProfileResolution, SharedConfigFileProvider,
    SharedFilePaths,
};
pub use provider::{CredentialError, CredentialProvider, NullProvider, StaticProvider};
pub use rotating::RotatingProvider;
pub use sso::{resolve_sso_profile, SsoError, SsoProfile, SsoProvider};
pub use sts::StsAssumeRoleProvider;
pub use types::Credential;
