//! `Environment` — reads `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`/`AWS_SESSION_TOKEN`.

use async_trait::async_trait;

use super::{Credential, CredentialError, CredentialProvider};

#[derive(Default)]
pub struct EnvironmentProvider;

#[async_trait]
impl CredentialProvider for EnvironmentProvider {
    async fn get_credential(&self) -> Result<Credential, CredentialError> {
        let access_key_id =
            std::env::var("AWS_ACCESS_KEY_ID").map_err(|_| CredentialError::MissingEnvironment)?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| CredentialError::MissingEnvironment)?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(match session_token {
            Some(token) => Credential::with_session_token(access_key_id, secret_access_key, token),
            None => Credential::new(access_key_id, secret_access_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-var-mutating tests; std::env is process-global.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn missing_env_errors() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");
        let provider = EnvironmentProvider;
        let err = provider.get_credential().await.unwrap_err();
        assert!(matches!(err, CredentialError::MissingEnvironment));
    }

    #[tokio::test]
    async fn reads_all_three_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("AWS_ACCESS_KEY_ID", "AKID");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "SECRET");
        std::env::set_var("AWS_SESSION_TOKEN", "TOKEN");
        let provider = EnvironmentProvider;
        let cred = provider.get_credential().await.unwrap();
        assert_eq!(cred.access_key_id, "AKID");
        assert_eq!(cred.session_token.as_deref(), Some("TOKEN"));
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");
        std::env::remove_var("AWS_SESSION_TOKEN");
    }
}
