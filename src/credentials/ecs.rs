//! `EcsContainer` — reads `AWS_CONTAINER_CREDENTIALS_RELATIVE_URI` (preferred)
//! or `AWS_CONTAINER_CREDENTIALS_FULL_URI`, with an optional auth token.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{Credential, CredentialError, CredentialProvider};

const ECS_CREDENTIALS_HOST: &str = "http://169.254.170.2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct EcsCredential {
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    secret_access_key: String,
    #[serde(rename = "Token")]
    token: Option<String>,
    #[serde(rename = "Expiration")]
    expiration: chrono::DateTime<chrono::Utc>,
}

#[derive(Default)]
pub struct EcsContainerProvider {
    client: reqwest::Client,
}

impl EcsContainerProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn resolve_url() -> Option<String> {
        if let Ok(relative) = std::env::var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI") {
            return Some(format!("{ECS_CREDENTIALS_HOST}{relative}"));
        }
        std::env::var("AWS_CONTAINER_CREDENTIALS_FULL_URI").ok()
    }
}

#[async_trait]
impl CredentialProvider for EcsContainerProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        let url = Self::resolve_url()
            .ok_or_else(|| CredentialError::Ecs("no container credentials URI configured".to_string()))?;

        let mut req = self.client.get(&url).timeout(REQUEST_TIMEOUT);
        if let Ok(token) = std::env::var("AWS_CONTAINER_AUTHORIZATION_TOKEN") {
            req = req.header("Authorization", token);
        }

        let resp = req.send().await.map_err(|e| CredentialError::Ecs(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(CredentialError::Ecs(format!(
                "unexpected status {}",
                resp.status()
            )));
        }
        let parsed: EcsCredential = resp
            .json()
            .await
            .map_err(|e| CredentialError::Ecs(e.to_string()))?;

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
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // std::env is process-global; serialize tests that set the container env vars.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn fetches_credentials_from_full_uri() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/creds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AccessKeyId": "AKID",
                "SecretAccessKey": "SECRET",
                "Token": "TOKEN",
                "Expiration": "2030-01-01T00:00:00Z",
            })))
            .mount(&mock_server)
            .await;

        std::env::remove_var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI");
        std::env::remove_var("AWS_CONTAINER_AUTHORIZATION_TOKEN");
        std::env::set_var(
            "AWS_CONTAINER_CREDENTIALS_FULL_URI",
            format!("{}/creds", mock_server.uri()),
        );

        let provider = EcsContainerProvider::new();
        let cred = provider.get_credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKID");
        assert_eq!(cred.session_token.as_deref(), Some("TOKEN"));

        std::env::remove_var("AWS_CONTAINER_CREDENTIALS_FULL_URI");
    }

    #[tokio::test]
    async fn sends_authorization_token_when_configured() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/creds"))
            .and(header("Authorization", "s3cr3t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AccessKeyId": "AKID",
                "SecretAccessKey": "SECRET",
                "Token": serde_json::Value::Null,
                "Expiration": "2030-01-01T00:00:00Z",
            })))
            .mount(&mock_server)
            .await;

        std::env::remove_var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI");
        std::env::set_var(
            "AWS_CONTAINER_CREDENTIALS_FULL_URI",
            format!("{}/creds", mock_server.uri()),
        );
        std::env::set_var("AWS_CONTAINER_AUTHORIZATION_TOKEN", "s3cr3t");

        let provider = EcsContainerProvider::new();
        let cred = provider.get_credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKID");

        std::env::remove_var("AWS_CONTAINER_CREDENTIALS_FULL_URI");
        std::env::remove_var("AWS_CONTAINER_AUTHORIZATION_TOKEN");
    }

    #[tokio::test]
    async fn missing_uri_errors_without_a_network_call() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI");
        std::env::remove_var("AWS_CONTAINER_CREDENTIALS_FULL_URI");

        let provider = EcsContainerProvider::new();
        let err = provider.get_credential().await.unwrap_err();
        assert!(matches!(err, CredentialError::Ecs(_)));
    }
}
