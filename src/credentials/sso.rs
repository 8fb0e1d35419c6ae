//! `Sso` — AWS IAM Identity Center credential resolution.
//!
//! Two profile shapes feed this: *modern* (`sso_session` pointing at an
//! `[sso-session X]` section) and *legacy* (all `sso_*` fields inline on the
//! profile). Both read the same on-disk token cache; only the modern shape
//! supports refresh, since only it carries a refresh token and client
//! registration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use thiserror::Error;

use crate::config_file::{expand_tilde, IniFile};
use crate::crypto::{Digest, Sha1};

use super::{Credential, CredentialError, CredentialProvider};

const REFRESH_WINDOW_MINUTES: i64 = 15;
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Debug, Error)]
pub enum SsoError {
    #[error("config file not found: {0}")]
    ConfigFileNotFound(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("profile {0} is missing sso configuration")]
    SsoConfigMissing(String),

    #[error("sso-session {0} not found")]
    SsoSessionNotFound(String),

    #[error("token cache not found for key {0}")]
    TokenCacheNotFound(String),

    #[error("cached SSO token has expired")]
    TokenExpired,

    #[error("token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("client registration has expired")]
    ClientRegistrationExpired,

    #[error("invalid token cache format: {0}")]
    InvalidTokenFormat(String),

    #[error("GetRoleCredentials failed: {0}")]
    GetRoleCredentialsFailed(String),
}

/// Either profile shape, resolved into the fields this module needs.
#[derive(Debug, Clone)]
pub struct SsoProfile {
    pub sso_start_url: String,
    pub sso_region: String,
    pub sso_account_id: String,
    pub sso_role_name: String,
    /// Present only for the modern `sso_session` shape; its presence is what
    /// determines whether refresh is attempted.
    pub sso_session_name: Option<String>,
}

impl SsoProfile {
    /// The token-cache key: the session name for modern profiles, the start
    /// URL for legacy ones.
    fn cache_key(&self) -> &str {
        self.sso_session_name.as_deref().unwrap_or(&self.sso_start_url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenCacheEntry {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "expiresAt")]
    expires_at: DateTime<Utc>,
    #[serde(rename = "refreshToken", skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(rename = "clientId", skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(rename = "clientSecret", skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(rename = "registrationExpiresAt", skip_serializing_if = "Option::is_none")]
    registration_expires_at: Option<DateTime<Utc>>,
    #[serde(rename = "region", skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(rename = "startUrl", skip_serializing_if = "Option::is_none")]
    start_url: Option<String>,
}

fn cache_path(cache_dir: &Path, cache_key: &str) -> PathBuf {
    let hash = Sha1::hash(cache_key.as_bytes()).to_hex();
    cache_dir.join(format!("{hash}.json"))
}

fn read_cache_entry(cache_dir: &Path, cache_key: &str) -> Result<TokenCacheEntry, SsoError> {
    let path = cache_path(cache_dir, cache_key);
    let content = std::fs::read_to_string(&path)
        .map_err(|_| SsoError::TokenCacheNotFound(cache_key.to_string()))?;
    serde_json::from_str(&content).map_err(|e| SsoError::InvalidTokenFormat(e.to_string()))
}

fn write_cache_entry(cache_dir: &Path, cache_key: &str, entry: &TokenCacheEntry) -> Result<(), SsoError> {
    std::fs::create_dir_all(cache_dir).map_err(|e| SsoError::TokenRefreshFailed(e.to_string()))?;
    let path = cache_path(cache_dir, cache_key);
    let tmp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string(entry).map_err(|e| SsoError::TokenRefreshFailed(e.to_string()))?;
    std::fs::write(&tmp_path, content).map_err(|e| SsoError::TokenRefreshFailed(e.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms).map_err(|e| SsoError::TokenRefreshFailed(e.to_string()))?;
    }

    std::fs::rename(&tmp_path, &path).map_err(|e| SsoError::TokenRefreshFailed(e.to_string()))
}

#[derive(Debug, Serialize)]
struct RefreshTokenRequest<'a> {
    #[serde(rename = "grantType")]
    grant_type: &'a str,
    #[serde(rename = "clientId")]
    client_id: &'a str,
    #[serde(rename = "clientSecret")]
    client_secret: &'a str,
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "expiresIn")]
    expires_in: i64,
    #[serde(rename = "refreshToken")]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FederationCredentials {
    #[serde(rename = "roleCredentials")]
    role_credentials: RoleCredentials,
}

#[derive(Debug, Deserialize)]
struct RoleCredentials {
    #[serde(rename = "accessKeyId")]
    access_key_id: String,
    #[serde(rename = "secretAccessKey")]
    secret_access_key: String,
    #[serde(rename = "sessionToken")]
    session_token: String,
    /// Milliseconds since epoch, per §4.3.
    expiration: i64,
}

pub struct SsoProvider {
    profile: SsoProfile,
    cache_dir: PathBuf,
    client: reqwest::Client,
    /// Overrides the `https://oidc.<region>.amazonaws.com` base, tests only.
    oidc_endpoint: Option<String>,
    /// Overrides the `https://portal.sso.<region>.amazonaws.com` base, tests only.
    portal_endpoint: Option<String>,
}

impl SsoProvider {
    pub fn new(profile: SsoProfile) -> Self {
        Self {
            profile,
            cache_dir: expand_tilde("~/.aws/sso/cache"),
            client: reqwest::Client::new(),
            oidc_endpoint: None,
            portal_endpoint: None,
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    #[cfg(test)]
    fn with_oidc_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.oidc_endpoint = Some(endpoint.into());
        self
    }

    #[cfg(test)]
    fn with_portal_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.portal_endpoint = Some(endpoint.into());
        self
    }

    fn oidc_base(&self) -> String {
        self.oidc_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://oidc.{}.amazonaws.com", self.profile.sso_region))
    }

    fn portal_base(&self) -> String {
        self.portal_endpoint.clone().unwrap_or_else(|| {
            format!("https://portal.sso.{}.amazonaws.com", self.profile.sso_region)
        })
    }

    async fn refresh(&self, entry: &TokenCacheEntry) -> Result<TokenCacheEntry, SsoError> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) =
            (&entry.refresh_token, &entry.client_id, &entry.client_secret)
        else {
            return Err(SsoError::TokenExpired);
        };
        if let Some(reg_expiry) = entry.registration_expires_at {
            if reg_expiry <= Utc::now() {
                return Err(SsoError::ClientRegistrationExpired);
            }
        }

        let body = RefreshTokenRequest {
            grant_type: "refresh_token",
            client_id,
            client_secret,
            refresh_token,
        };
        let url = format!("{}/token", self.oidc_base());
        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| SsoError::TokenRefreshFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SsoError::TokenRefreshFailed(format!(
                "status {}",
                response.status()
            )));
        }
        let parsed: RefreshTokenResponse = response
            .json()
            .await
            .map_err(|e| SsoError::TokenRefreshFailed(e.to_string()))?;

        let refreshed = TokenCacheEntry {
            access_token: parsed.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(parsed.expires_in),
            refresh_token: parsed.refresh_token.or_else(|| entry.refresh_token.clone()),
            client_id: entry.client_id.clone(),
            client_secret: entry.client_secret.clone(),
            registration_expires_at: entry.registration_expires_at,
            region: entry.region.clone(),
            start_url: entry.start_url.clone(),
        };
        write_cache_entry(&self.cache_dir, self.profile.cache_key(), &refreshed)?;
        Ok(refreshed)
    }

    async fn get_role_credentials(&self, access_token: &str) -> Result<Credential, SsoError> {
        let url = format!("{}/federation/credentials", self.portal_base());
        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("account_id", self.profile.sso_account_id.as_str()),
                ("role_name", self.profile.sso_role_name.as_str()),
            ])
            .header("x-amz-sso_bearer_token", access_token)
            .send()
            .await
            .map_err(|e| SsoError::GetRoleCredentialsFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SsoError::GetRoleCredentialsFailed(format!(
                "status {}",
                response.status()
            )));
        }
        let parsed: FederationCredentials = response
            .json()
            .await
            .map_err(|e| SsoError::GetRoleCredentialsFailed(e.to_string()))?;
        let expiration = DateTime::from_timestamp_millis(parsed.role_credentials.expiration)
            .ok_or_else(|| SsoError::GetRoleCredentialsFailed("invalid expiration".to_string()))?;

        Ok(Credential::expiring(
            parsed.role_credentials.access_key_id,
            parsed.role_credentials.secret_access_key,
            Some(parsed.role_credentials.session_token),
            expiration,
        ))
    }
}

#[async_trait]
impl CredentialProvider for SsoProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        let mut entry = read_cache_entry(&self.cache_dir, self.profile.cache_key())?;

        let now = Utc::now();
        let near_expiry = entry.expires_at - now <= chrono::Duration::minutes(REFRESH_WINDOW_MINUTES);
        if entry.expires_at <= now || (near_expiry && entry.refresh_token.is_some()) {
            match self.refresh(&entry).await {
                Ok(refreshed) => entry = refreshed,
                Err(_) if entry.expires_at > now => {}
                Err(e) => return Err(e.into()),
            }
        }

        if entry.expires_at <= now {
            return Err(SsoError::TokenExpired.into());
        }

        Ok(self.get_role_credentials(&entry.access_token).await?)
    }
}

/// Read a profile's SSO configuration out of the config file, resolving the
/// `[sso-session X]` indirection for the modern shape.
pub fn resolve_sso_profile(config: &IniFile, profile_section: &str) -> Result<SsoProfile, SsoError> {
    let section = config
        .section(profile_section)
        .ok_or_else(|| SsoError::ProfileNotFound(profile_section.to_string()))?;

    if let Some(session_name) = section.get("sso_session") {
        let session_section_name = format!("sso-session {session_name}");
        let session = config
            .section(&session_section_name)
            .ok_or_else(|| SsoError::SsoSessionNotFound(session_name.clone()))?;
        let sso_start_url = session
            .get("sso_start_url")
            .ok_or_else(|| SsoError::SsoConfigMissing(profile_section.to_string()))?;
        let sso_region = session
            .get("sso_region")
            .ok_or_else(|| SsoError::SsoConfigMissing(profile_section.to_string()))?;
        let sso_account_id = section
            .get("sso_account_id")
            .ok_or_else(|| SsoError::SsoConfigMissing(profile_section.to_string()))?;
        let sso_role_name = section
            .get("sso_role_name")
            .ok_or_else(|| SsoError::SsoConfigMissing(profile_section.to_string()))?;
        return Ok(SsoProfile {
            sso_start_url: sso_start_url.clone(),
            sso_region: sso_region.clone(),
            sso_account_id: sso_account_id.clone(),
            sso_role_name: sso_role_name.clone(),
            sso_session_name: Some(session_name.clone()),
        });
    }

    let sso_start_url = section.get("sso_start_url");
    let sso_region = section.get("sso_region");
    let sso_account_id = section.get("sso_account_id");
    let sso_role_name = section.get("sso_role_name");
    match (sso_start_url, sso_region, sso_account_id, sso_role_name) {
        (Some(start_url), Some(region), Some(account_id), Some(role_name)) => Ok(SsoProfile {
            sso_start_url: start_url.clone(),
            sso_region: region.clone(),
            sso_account_id: account_id.clone(),
            sso_role_name: role_name.clone(),
            sso_session_name: None,
        }),
        _ => Err(SsoError::SsoConfigMissing(profile_section.to_string())),
    }
}
