use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::credentials::CredentialsProvider;
use crate::error::CloudError;
use crate::sigv4;

/// Maximum attempts for a single signed call, per §4.E / §5: cloud API calls
/// retry with exponential backoff up to 3 attempts on transient errors.
const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(250);

/// Thin signed-request client shared by the object-store uploader, network
/// manager, and artifact cache. Every call goes over plain service endpoints
/// (no AWS SDK) signed with SigV4, mirroring the direct-API-call pattern the
/// orchestrator driver uses for its own cloud calls.
pub struct AwsClient {
    http: reqwest::Client,
    credentials: Arc<dyn CredentialsProvider>,
    pub region: String,
}

impl AwsClient {
    pub fn new(credentials: Arc<dyn CredentialsProvider>, region: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("static client configuration"),
            credentials,
            region: region.into(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Issues one signed request, retrying up to [`MAX_ATTEMPTS`] times with
    /// exponential backoff on transient failures only.
    pub async fn signed_request(
        &self,
        method: &str,
        host: &str,
        uri_path: &str,
        query_string: &str,
        service: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, CloudError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .try_once(method, host, uri_path, query_string, service, content_type, &body)
                .await;

            match result {
                Ok(text) => return Ok(text),
                Err(err) if attempt < MAX_ATTEMPTS && err.is_transient() => {
                    let backoff = BASE_BACKOFF * 2u32.pow(attempt - 1);
                    warn!(attempt, ?backoff, error = %err, "transient cloud error, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_once(
        &self,
        method: &str,
        host: &str,
        uri_path: &str,
        query_string: &str,
        service: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<String, CloudError> {
        let creds = self.credentials.credentials().await?;
        let headers =
            sigv4::sigv4_headers(method, uri_path, query_string, content_type, body, &creds,
                &self.region, service, host);

        let url = if query_string.is_empty() {
            format!("https://{host}{uri_path}")
        } else {
            format!("https://{host}{uri_path}?{query_string}")
        };

        let mut req = self.http.request(
            method.parse().map_err(|_| CloudError::Internal(format!("bad method {method}")))?,
            &url,
        );
        for (k, v) in &headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if !content_type.is_empty() {
            req = req.header("content-type", content_type);
        }
        req = req.body(body.to_vec());

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        let code = crate::xml::xml_error_code(&text).unwrap_or_else(|| status.to_string());
        let message = crate::xml::xml_error_message(&text).unwrap_or_else(|| text.clone());

        if status.as_u16() == 403 {
            return Err(CloudError::AccessDenied(message));
        }
        Err(CloudError::Api { code, message })
    }

    /// Issues an AWS Query-protocol call (EC2, STS): form-encoded POST body,
    /// XML response. Used by the network manager and account-id lookup.
    pub async fn query_api(
        &self,
        host: &str,
        service: &str,
        params: &[(&str, &str)],
    ) -> Result<String, CloudError> {
        let body = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
            .into_bytes();

        self.signed_request(
            "POST",
            host,
            "/",
            "",
            service,
            "application/x-www-form-urlencoded; charset=utf-8",
            body,
        )
        .await
    }

    /// Resolves the calling account id via STS GetCallerIdentity, needed to
    /// derive the deterministic bucket name `<prefix>-<region>-<account-id>`.
    pub async fn account_id(&self) -> Result<String, CloudError> {
        let xml = self
            .query_api(
                "sts.amazonaws.com",
                "sts",
                &[("Action", "GetCallerIdentity"), ("Version", "2011-06-15")],
            )
            .await?;
        crate::xml::xml_text(&xml, "Account")
            .ok_or_else(|| CloudError::Internal("GetCallerIdentity: no Account in response".into()))
    }
}

// ── URL encoding helper (no extra dep needed) ─────────────────────────────────

mod urlencoding {
    pub fn encode(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for byte in s.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char)
                }
                b' ' => out.push('+'),
                b => out.push_str(&format!("%{b:02X}")),
            }
        }
        out
    }
}
