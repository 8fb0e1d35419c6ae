//! `SharedConfigFile` — reads the shared credentials and config INI files.
//!
//! The credentials file holds bare profile sections (`[default]`,
//! `[myprofile]`); the config file holds `[profile myprofile]` sections
//! (the default profile is still just `[default]` there too). A profile
//! can either carry a literal access key pair or describe an assume-role
//! chain (`role_arn` + `source_profile`, or `credential_source`) — see
//! [`ProfileResolution`], which [`crate::credentials::chain`] turns into an
//! actual provider graph at client-construction time.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config_file::{expand_tilde, IniFile};

use super::{Credential, CredentialError, CredentialProvider};

#[derive(Debug, Clone)]
pub enum CredentialSourceKind {
    Environment,
    Ec2InstanceMetadata,
    EcsContainer,
}

impl std::str::FromStr for CredentialSourceKind {
    type Err = CredentialError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Environment" => Ok(Self::Environment),
            "Ec2InstanceMetadata" => Ok(Self::Ec2InstanceMetadata),
            "EcsContainer" => Ok(Self::EcsContainer),
            other => Err(CredentialError::InvalidSyntax(format!(
                "unknown credential_source: {other}"
            ))),
        }
    }
}

/// What a profile section in the config/credentials files resolves to.
#[derive(Debug, Clone)]
pub enum ProfileResolution {
    /// A literal access key pair (and optional session token) was found.
    Explicit(Credential),
    /// `role_arn` + `source_profile`: assume this role using the named
    /// profile's credentials as the source.
    AssumeRoleFromProfile {
        role_arn: String,
        source_profile: String,
        role_session_name: Option<String>,
    },
    /// `role_arn` + `credential_source`: assume this role using credentials
    /// from the named built-in source instead of another profile.
    AssumeRoleFromSource {
        role_arn: String,
        credential_source: CredentialSourceKind,
        role_session_name: Option<String>,
    },
}

/// Locations of the two shared files, defaulted the way §6 specifies and
/// overridable via `AWS_SHARED_CREDENTIALS_FILE`/`AWS_CONFIG_FILE`.
#[derive(Debug, Clone)]
pub struct SharedFilePaths {
    pub credentials_path: PathBuf,
    pub config_path: PathBuf,
}

impl Default for SharedFilePaths {
    fn default() -> Self {
        Self {
            credentials_path: std::env::var("AWS_SHARED_CREDENTIALS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| expand_tilde("~/.aws/credentials")),
            config_path: std::env::var("AWS_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| expand_tilde("~/.aws/config")),
        }
    }
}

/// Read and resolve one profile's section from the shared files, without
/// deciding what to do about an assume-role chain — that's the caller's job.
pub fn resolve_profile(
    paths: &SharedFilePaths,
    profile: &str,
) -> Result<ProfileResolution, CredentialError> {
    if let Some(section) = read_section(&paths.credentials_path, profile)? {
        if let Some(cred) = explicit_credential(profile, &section)? {
            return Ok(ProfileResolution::Explicit(cred));
        }
    }

    let config_section_name = if profile == "default" {
        "default".to_string()
    } else {
        format!("profile {profile}")
    };
    let Some(section) = read_section(&paths.config_path, &config_section_name)? else {
        return Err(CredentialError::MissingProfile(profile.to_string()));
    };

    if let Some(cred) = explicit_credential(profile, &section)? {
        return Ok(ProfileResolution::Explicit(cred));
    }

    let role_arn = section
        .get("role_arn")
        .cloned()
        .ok_or_else(|| CredentialError::MissingProfile(profile.to_string()))?;
    let role_session_name = section.get("role_session_name").cloned();

    if let Some(source_profile) = section.get("source_profile") {
        return Ok(ProfileResolution::AssumeRoleFromProfile {
            role_arn,
            source_profile: source_profile.clone(),
            role_session_name,
        });
    }
    if let Some(source) = section.get("credential_source") {
        let credential_source: CredentialSourceKind = source.parse()?;
        return Ok(ProfileResolution::AssumeRoleFromSource {
            role_arn,
            credential_source,
            role_session_name,
        });
    }

    Err(CredentialError::InvalidSyntax(format!(
        "profile {profile} has role_arn but neither source_profile nor credential_source"
    )))
}

fn explicit_credential(
    profile: &str,
    section: &std::collections::BTreeMap<String, String>,
) -> Result<Option<Credential>, CredentialError> {
    let Some(access_key_id) = section.get("aws_access_key_id") else {
        return Ok(None);
    };
    let secret_access_key = section
        .get("aws_secret_access_key")
        .ok_or_else(|| CredentialError::MissingSecretAccessKey(profile.to_string()))?;
    let session_token = section.get("aws_session_token").cloned();
    Ok(Some(match session_token {
        Some(token) => Credential::with_session_token(access_key_id, secret_access_key, token),
        None => Credential::new(access_key_id, secret_access_key),
    }))
}

fn read_section(
    path: &Path,
    section: &str,
) -> Result<Option<std::collections::BTreeMap<String, String>>, CredentialError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CredentialError::InvalidSyntax(e.to_string())),
    };
    let ini = IniFile::parse(&content).map_err(|e| CredentialError::InvalidSyntax(e.to_string()))?;
    Ok(ini.section(section).cloned())
}

/// `CredentialProvider` adapter for a profile that only ever resolves to an
/// explicit access key pair — the common case. Assume-role profiles are
/// handled by composing this with [`crate::credentials::StsAssumeRoleProvider`]
/// in `chain.rs`, not by this type.
pub struct SharedConfigFileProvider {
    paths: SharedFilePaths,
    profile: String,
}

impl SharedConfigFileProvider {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            paths: SharedFilePaths::default(),
            profile: profile.into(),
        }
    }

    pub fn with_paths(profile: impl Into<String>, paths: SharedFilePaths) -> Self {
        Self {
            paths,
            profile: profile.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for SharedConfigFileProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        match resolve_profile(&self.paths, &self.profile)? {
            ProfileResolution::Explicit(cred) => Ok(cred),
            ProfileResolution::AssumeRoleFromProfile { .. }
            | ProfileResolution::AssumeRoleFromSource { .. } => Err(CredentialError::InvalidSyntax(
                format!(
                    "profile {} describes an assume-role chain; build it via credentials::chain::build_provider_for_profile",
                    self.profile
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[tokio::test]
    async fn reads_plain_credentials_profile() {
        let creds = write_tmp("[default]\naws_access_key_id = AKID\naws_secret_access_key = SECRET\n");
        let config = write_tmp("");
        let paths = SharedFilePaths {
            credentials_path: creds.path().to_path_buf(),
            config_path: config.path().to_path_buf(),
        };
        let provider = SharedConfigFileProvider::with_paths("default", paths);
        let cred = provider.get_credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKID");
    }

    #[tokio::test]
    async fn falls_back_to_config_file_profile_section() {
        let creds = write_tmp("");
        let config = write_tmp(
            "[profile dev]\naws_access_key_id = AKID2\naws_secret_access_key = SECRET2\n",
        );
        let paths = SharedFilePaths {
            credentials_path: creds.path().to_path_buf(),
            config_path: config.path().to_path_buf(),
        };
        let provider = SharedConfigFileProvider::with_paths("dev", paths);
        let cred = provider.get_credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKID2");
    }

    #[tokio::test]
    async fn missing_profile_errors() {
        let creds = write_tmp("");
        let config = write_tmp("");
        let paths = SharedFilePaths {
            credentials_path: creds.path().to_path_buf(),
            config_path: config.path().to_path_buf(),
        };
        let provider = SharedConfigFileProvider::with_paths("ghost", paths);
        let err = provider.get_credential().await.unwrap_err();
        assert!(matches!(err, CredentialError::MissingProfile(_)));
    }

    #[test]
    fn resolves_assume_role_with_source_profile() {
        let creds = write_tmp("");
        let config = write_tmp(
            "[profile target]\nrole_arn = arn:aws:iam::123:role/x\nsource_profile = base\nrole_session_name = sess\n",
        );
        let paths = SharedFilePaths {
            credentials_path: creds.path().to_path_buf(),
            config_path: config.path().to_path_buf(),
        };
        let resolution = resolve_profile(&paths, "target").unwrap();
        match resolution {
            ProfileResolution::AssumeRoleFromProfile {
                role_arn,
                source_profile,
                role_session_name,
            } => {
                assert_eq!(role_arn, "arn:aws:iam::123:role/x");
                assert_eq!(source_profile, "base");
                assert_eq!(role_session_name.as_deref(), Some("sess"));
            }
            other => panic!("expected AssumeRoleFromProfile, got {other:?}"),
        }
    }
}
