use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::credentials::AwsCredentials;

type HmacSha256 = Hmac<Sha256>;

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Builds the full SigV4 header set (Authorization, x-amz-date,
/// x-amz-content-sha256, and x-amz-security-token when a session token is
/// present) for a single request.
#[allow(clippy::too_many_arguments)]
pub fn sigv4_headers(
    method: &str,
    uri_path: &str,
    query_string: &str,
    content_type: &str,
    body: &[u8],
    creds: &AwsCredentials,
    region: &str,
    service: &str,
    host: &str,
) -> BTreeMap<String, String> {
    let now = chrono::Utc::now();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(body);

    let mut signed_headers_map: BTreeMap<&str, String> = BTreeMap::new();
    signed_headers_map.insert("host", host.to_string());
    signed_headers_map.insert("x-amz-content-sha256", payload_hash.clone());
    signed_headers_map.insert("x-amz-date", amz_date.clone());
    if let Some(token) = &creds.session_token {
        signed_headers_map.insert("x-amz-security-token", token.clone());
    }
    if !content_type.is_empty() {
        signed_headers_map.insert("content-type", content_type.to_string());
    }

    let canonical_headers: String = signed_headers_map
        .iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect();
    let signed_headers: String =
        signed_headers_map.keys().copied().collect::<Vec<_>>().join(";");

    let canonical_request = format!(
        "{method}\n{uri_path}\n{query_string}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
    );

    let credential_scope = format!("{date_stamp}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key =
        derive_signing_key(&creds.secret_access_key, &date_stamp, region, service);
    let signature: String = hmac_sha256(&signing_key, string_to_sign.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        creds.access_key_id
    );

    let mut headers = BTreeMap::new();
    headers.insert("authorization".to_string(), authorization);
    headers.insert("x-amz-date".to_string(), amz_date);
    headers.insert("x-amz-content-sha256".to_string(), payload_hash);
    if let Some(token) = &creds.session_token {
        headers.insert("x-amz-security-token".to_string(), token.clone());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: None,
        }
    }

    #[test]
    fn sha256_hex_of_empty_body_matches_known_constant() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn headers_include_security_token_when_session_scoped() {
        let mut c = creds();
        c.session_token = Some("tok".to_string());
        let headers = sigv4_headers(
            "GET", "/", "", "", b"", &c, "us-east-1", "ec2", "ec2.amazonaws.com",
        );
        assert_eq!(headers.get("x-amz-security-token").unwrap(), "tok");
    }

    #[test]
    fn headers_omit_security_token_for_static_credentials() {
        let headers = sigv4_headers(
            "GET", "/", "", "", b"", &creds(), "us-east-1", "ec2", "ec2.amazonaws.com",
        );
        assert!(!headers.contains_key("x-amz-security-token"));
    }

    #[test]
    fn authorization_header_names_the_service_and_region_in_scope() {
        let headers = sigv4_headers(
            "GET", "/", "", "", b"", &creds(), "us-west-2", "s3", "s3.us-west-2.amazonaws.com",
        );
        let auth = headers.get("authorization").unwrap();
        assert!(auth.contains("/us-west-2/s3/aws4_request"));
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
    }
}
