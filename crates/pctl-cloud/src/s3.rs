use std::sync::Arc;

use tracing::info;

use crate::client::AwsClient;
use crate::error::CloudError;

const BUCKET_PREFIX: &str = "pctl";

/// Bucket name is deterministic per region/account so repeated creates are
/// idempotent without a side index: `<prefix>-<region>-<account-id>`.
pub fn bucket_name(region: &str, account_id: &str) -> String {
    format!("{BUCKET_PREFIX}-{region}-{account_id}")
}

fn object_key(cluster_name: &str) -> String {
    format!("{cluster_name}/install-software.sh")
}

fn bucket_host(bucket: &str, region: &str) -> String {
    if region == "us-east-1" {
        format!("{bucket}.s3.amazonaws.com")
    } else {
        format!("{bucket}.s3.{region}.amazonaws.com")
    }
}

pub struct S3Uploader {
    client: Arc<AwsClient>,
}

impl S3Uploader {
    pub fn new(client: Arc<AwsClient>) -> Self {
        Self { client }
    }

    /// Ensures the deterministic bucket exists, racing safely against
    /// concurrent creators (`BucketAlreadyOwnedByYou` is not an error).
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), CloudError> {
        let host = bucket_host(bucket, &self.client.region);
        let body = if self.client.region == "us-east-1" {
            Vec::new()
        } else {
            format!(
                "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\"><LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
                self.client.region
            )
            .into_bytes()
        };

        match self
            .client
            .signed_request("PUT", &host, "/", "", "s3", "", body)
            .await
        {
            Ok(_) => Ok(()),
            Err(CloudError::Api { code, .. }) if code == "BucketAlreadyOwnedByYou" => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Uploads the bootstrap script, creating the bucket on first use.
    /// Returns the `s3://bucket/key` URI the orchestrator config references.
    pub async fn upload(
        &self,
        cluster_name: &str,
        account_id: &str,
        script_content: &str,
    ) -> Result<String, CloudError> {
        let bucket = bucket_name(&self.client.region, account_id);
        self.ensure_bucket(&bucket).await?;

        let key = object_key(cluster_name);
        let host = bucket_host(&bucket, &self.client.region);
        let path = format!("/{key}");

        self.client
            .signed_request(
                "PUT",
                &host,
                &path,
                "",
                "s3",
                "text/x-shellscript",
                script_content.as_bytes().to_vec(),
            )
            .await?;

        let uri = format!("s3://{bucket}/{key}");
        info!(bucket, key, "uploaded bootstrap script");
        Ok(uri)
    }

    /// Removes the bootstrap object on teardown. Bucket itself is never
    /// deleted (it is shared across clusters in the same account/region).
    pub async fn remove(&self, cluster_name: &str, account_id: &str) -> Result<(), CloudError> {
        let bucket = bucket_name(&self.client.region, account_id);
        let key = object_key(cluster_name);
        let host = bucket_host(&bucket, &self.client.region);
        let path = format!("/{key}");

        self.client
            .signed_request("DELETE", &host, &path, "", "s3", "", Vec::new())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_name_is_prefix_region_account() {
        assert_eq!(bucket_name("us-east-1", "123456789012"), "pctl-us-east-1-123456789012");
    }

    #[test]
    fn object_key_is_cluster_scoped() {
        assert_eq!(object_key("my-cluster"), "my-cluster/install-software.sh");
    }

    #[test]
    fn bucket_host_omits_region_for_us_east_1() {
        assert_eq!(bucket_host("my-bucket", "us-east-1"), "my-bucket.s3.amazonaws.com");
    }

    #[test]
    fn bucket_host_includes_region_elsewhere() {
        assert_eq!(
            bucket_host("my-bucket", "eu-west-1"),
            "my-bucket.s3.eu-west-1.amazonaws.com"
        );
    }
}
