//! `RuntimeConfig` — the ambient loader that decides which profile, region,
//! and shared-file paths the rest of the system should consult.
//!
//! Cascades explicit override → environment variables → well-known file
//! paths → compiled-in defaults, but it never replaces the INI-based
//! credentials loader in [`crate::config_file`] — it just decides which
//! profile and which paths that loader consults.

use std::path::PathBuf;

use crate::config_file::expand_tilde;

/// Region, profile, and shared-file locations resolved once per client.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub region: Option<String>,
    pub profile: String,
    pub credentials_path: PathBuf,
    pub config_path: PathBuf,
    pub imds_disabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            region: None,
            profile: "default".to_string(),
            credentials_path: expand_tilde("~/.aws/credentials"),
            config_path: expand_tilde("~/.aws/config"),
            imds_disabled: false,
        }
    }
}

impl RuntimeConfig {
    /// Build entirely from environment variables, falling back to the
    /// per-field defaults (`default` profile, `~/.aws/{credentials,config}`,
    /// IMDS enabled) for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(region) = std::env::var("AWS_REGION") {
            config.region = Some(region);
        } else if let Ok(region) = std::env::var("AWS_DEFAULT_REGION") {
            config.region = Some(region);
        }

        if let Ok(profile) = std::env::var("AWS_PROFILE") {
            config.profile = profile;
        }

        if let Ok(path) = std::env::var("AWS_SHARED_CREDENTIALS_FILE") {
            config.credentials_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("AWS_CONFIG_FILE") {
            config.config_path = PathBuf::from(path);
        }

        if let Ok(value) = std::env::var("AWS_EC2_METADATA_DISABLED") {
            config.imds_disabled = value == "true" || value == "1";
        }

        config
    }

    /// Explicit override wins over environment variables, which win over
    /// the compiled-in defaults. There is no well-known `RuntimeConfig`
    /// file format of its own to consult — the "well-known file paths"
    /// step of the cascade is the credentials and config files themselves,
    /// whose *locations* this very struct is resolving.
    pub fn load() -> Self {
        Self::from_env()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_default_profile_and_home_paths() {
        let config = RuntimeConfig::default();
        assert_eq!(config.profile, "default");
        assert!(config.credentials_path.ends_with(".aws/credentials"));
        assert!(config.config_path.ends_with(".aws/config"));
        assert!(!config.imds_disabled);
        assert!(config.region.is_none());
    }

    #[test]
    fn builder_overrides_region_and_profile() {
        let config = RuntimeConfig::default()
            .with_region("eu-west-1")
            .with_profile("ci");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.profile, "ci");
    }
}
