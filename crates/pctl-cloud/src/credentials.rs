use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::CloudError;

#[derive(Clone, Debug)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Credential source, resolved exclusively through standard cloud-SDK
/// mechanisms (§6 "environment inputs": the system never reads its own
/// credential files).
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn credentials(&self) -> Result<AwsCredentials, CloudError>;
}

pub struct StaticCredentialsProvider {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn credentials(&self) -> Result<AwsCredentials, CloudError> {
        Ok(AwsCredentials {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
        })
    }
}

/// Resolves credentials from the EC2 instance-metadata service using the
/// IMDSv2 token-challenge protocol. This is mandatory, not a fallback: the
/// legacy unauthenticated metadata endpoint is absent on newer base images.
pub struct ImdsCredentialsProvider {
    client: reqwest::Client,
    cache: tokio::sync::Mutex<Option<(AwsCredentials, Instant)>>,
}

impl ImdsCredentialsProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, cache: tokio::sync::Mutex::new(None) }
    }

    async fn fetch_token(&self) -> Result<String, CloudError> {
        let resp = self
            .client
            .put("http://169.254.169.254/latest/api/token")
            .header("X-aws-ec2-metadata-token-ttl-seconds", "21600")
            .send()
            .await
            .map_err(|e| CloudError::Internal(format!("IMDS token request: {e}")))?;
        resp.text().await.map_err(|e| CloudError::Internal(format!("IMDS token decode: {e}")))
    }
}

#[async_trait]
impl CredentialsProvider for ImdsCredentialsProvider {
    async fn credentials(&self) -> Result<AwsCredentials, CloudError> {
        {
            let guard = self.cache.lock().await;
            if let Some((creds, expiry)) = guard.as_ref() {
                if Instant::now() < *expiry {
                    return Ok(creds.clone());
                }
            }
        }

        let token = self.fetch_token().await?;

        let role_name = self
            .client
            .get("http://169.254.169.254/latest/meta-data/iam/security-credentials/")
            .header("X-aws-ec2-metadata-token", &token)
            .send()
            .await
            .map_err(|e| CloudError::Internal(format!("IMDS role list: {e}")))?
            .text()
            .await
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or("")
            .to_string();

        if role_name.is_empty() {
            return Err(CloudError::NoCredentials);
        }

        let creds_url = format!(
            "http://169.254.169.254/latest/meta-data/iam/security-credentials/{role_name}"
        );
        let resp: Value = self
            .client
            .get(&creds_url)
            .header("X-aws-ec2-metadata-token", &token)
            .send()
            .await
            .map_err(|e| CloudError::Internal(format!("IMDS credentials request: {e}")))?
            .json()
            .await
            .map_err(|e| CloudError::Internal(format!("IMDS credentials decode: {e}")))?;

        let creds = AwsCredentials {
            access_key_id: resp["AccessKeyId"].as_str().unwrap_or("").to_string(),
            secret_access_key: resp["SecretAccessKey"].as_str().unwrap_or("").to_string(),
            session_token: resp["Token"].as_str().map(str::to_string),
        };

        debug!(role = %role_name, "resolved credentials via IMDSv2");

        let expiry = Instant::now() + Duration::from_secs(600);
        *self.cache.lock().await = Some((creds.clone(), expiry));
        Ok(creds)
    }
}

/// Static-then-IMDS resolution, mirroring the order the standard cloud SDKs
/// themselves use: explicit environment variables win when present, else
/// fall back to the instance metadata service.
pub async fn resolve_credentials(client: reqwest::Client) -> Result<AwsCredentials, CloudError> {
    if let (Ok(key), Ok(secret)) =
        (std::env::var("AWS_ACCESS_KEY_ID"), std::env::var("AWS_SECRET_ACCESS_KEY"))
    {
        return Ok(AwsCredentials {
            access_key_id: key,
            secret_access_key: secret,
            session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
        });
    }

    ImdsCredentialsProvider::new(client).credentials().await
}
