//! `Ec2InstanceMetadata` — IMDSv2 (token handshake) with an IMDSv1 fallback.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{Credential, CredentialError, CredentialProvider};

const DEFAULT_ENDPOINT: &str = "http://169.254.169.254";
const TOKEN_TTL_SECONDS: &str = "21600";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ImdsCredential {
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    secret_access_key: String,
    #[serde(rename = "Token")]
    token: Option<String>,
    #[serde(rename = "Expiration")]
    expiration: chrono::DateTime<chrono::Utc>,
}

pub struct Ec2ImdsProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl Ec2ImdsProvider {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_token(&self) -> Option<String> {
        let resp = self
            .client
            .put(format!("{}/latest/api/token", self.endpoint))
            .header("X-aws-ec2-metadata-token-ttl-seconds", TOKEN_TTL_SECONDS)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.text().await.ok()
    }

    async fn get(&self, path: &str, token: Option<&str>) -> Result<String, CredentialError> {
        let mut req = self
            .client
            .get(format!("{}{path}", self.endpoint))
            .timeout(REQUEST_TIMEOUT);
        if let Some(token) = token {
            req = req.header("X-aws-ec2-metadata-token", token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| CredentialError::Imds(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(CredentialError::Imds(format!(
                "unexpected status {}",
                resp.status()
            )));
        }
        resp.text()
            .await
            .map_err(|e| CredentialError::Imds(e.to_string()))
    }
}

impl Default for Ec2ImdsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for Ec2ImdsProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        if std::env::var("AWS_EC2_METADATA_DISABLED").as_deref() == Ok("true") {
            return Err(CredentialError::ImdsDisabled);
        }

        let token = self.fetch_token().await;
        let role_list = self
            .get("/latest/meta-data/iam/security-credentials/", token.as_deref())
            .await?;
        let role = role_list
            .lines()
            .next()
            .ok_or_else(|| CredentialError::Imds("empty role list".to_string()))?;

        let body = self
            .get(
                &format!("/latest/meta-data/iam/security-credentials/{role}"),
                token.as_deref(),
            )
            .await?;
        let parsed: ImdsCredential =
            serde_json::from_str(&body).map_err(|e| CredentialError::Imds(e.to_string()))?;

        Ok(Credential::expiring(
            parsed.access_key_id,
            parsed.secret_access_key,
            parsed.token,
            parsed.expiration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // AWS_EC2_METADATA_DISABLED is process-global; serialize tests that touch it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn v2_handshake_fetches_token_then_role_then_credentials() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("AWS_EC2_METADATA_DISABLED");
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/latest/api/token"))
            .and(header("X-aws-ec2-metadata-token-ttl-seconds", "21600"))
            .respond_with(ResponseTemplate::new(200).set_body_string("tok-123"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/iam/security-credentials/"))
            .and(header("X-aws-ec2-metadata-token", "tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("my-role"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/iam/security-credentials/my-role"))
            .and(header("X-aws-ec2-metadata-token", "tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AccessKeyId": "AKID",
                "SecretAccessKey": "SECRET",
                "Token": "SESSION",
                "Expiration": "2030-01-01T00:00:00Z",
            })))
            .mount(&mock_server)
            .await;

        let provider = Ec2ImdsProvider::with_endpoint(mock_server.uri());
        let cred = provider.get_credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKID");
        assert_eq!(cred.session_token.as_deref(), Some("SESSION"));
        assert!(cred.expiration.is_some());
    }

    #[tokio::test]
    async fn v1_fallback_when_token_endpoint_unreachable() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("AWS_EC2_METADATA_DISABLED");
        let mock_server = MockServer::start().await;

        // No mock registered for PUT /latest/api/token: fetch_token() swallows
        // the resulting error and the provider proceeds without a token header.
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/iam/security-credentials/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("role-a"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/iam/security-credentials/role-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AccessKeyId": "AKID2",
                "SecretAccessKey": "SECRET2",
                "Token": serde_json::Value::Null,
                "Expiration": "2030-01-01T00:00:00Z",
            })))
            .mount(&mock_server)
            .await;

        let provider = Ec2ImdsProvider::with_endpoint(mock_server.uri());
        let cred = provider.get_credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKID2");
        assert_eq!(cred.session_token, None);
    }

    #[tokio::test]
    async fn disabled_via_env_var_skips_network_entirely() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");

        // Endpoint deliberately points nowhere; if the provider made a
        // request it would fail with a connection error, not `ImdsDisabled`.
        let provider = Ec2ImdsProvider::with_endpoint("http://127.0.0.1:1");
        let err = provider.get_credential().await.unwrap_err();
        assert!(matches!(err, CredentialError::ImdsDisabled));

        std::env::remove_var("AWS_EC2_METADATA_DISABLED");
    }

    #[tokio::test]
    async fn empty_role_list_errors() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("AWS_EC2_METADATA_DISABLED");
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/latest/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("tok"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/iam/security-credentials/"))
            .and(header_exists("X-aws-ec2-metadata-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let provider = Ec2ImdsProvider::with_endpoint(mock_server.uri());
        let err = provider.get_credential().await.unwrap_err();
        assert!(matches!(err, CredentialError::Imds(_)));
    }
}
