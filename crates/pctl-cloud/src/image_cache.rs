use std::sync::Arc;

use tracing::info;

use crate::client::AwsClient;
use crate::error::CloudError;
use crate::xml::xml_all_texts;

const FINGERPRINT_TAG_KEY: &str = "pctl:fingerprint";

/// Looks up and records custom images by fingerprint using the image's own
/// tags as the index — no separate cache store to keep consistent.
pub struct ImageCache {
    client: Arc<AwsClient>,
}

impl ImageCache {
    pub fn new(client: Arc<AwsClient>) -> Self {
        Self { client }
    }

    fn ec2_host(&self) -> String {
        format!("ec2.{}.amazonaws.com", self.client.region)
    }

    /// Returns the image id whose `pctl:fingerprint` tag matches, if any.
    pub async fn lookup(&self, fingerprint: &str) -> Result<Option<String>, CloudError> {
        let host = self.ec2_host();
        let xml = self
            .client
            .query_api(
                &host,
                "ec2",
                &[
                    ("Action", "DescribeImages"),
                    ("Version", "2016-11-15"),
                    ("Owner.1", "self"),
                    ("Filter.1.Name", &format!("tag:{FINGERPRINT_TAG_KEY}")),
                    ("Filter.1.Value.1", fingerprint),
                ],
            )
            .await?;

        let image_id = xml_all_texts(&xml, "imageId").into_iter().next();
        if let Some(id) = &image_id {
            info!(fingerprint, image_id = %id, "artifact cache hit");
        }
        Ok(image_id)
    }

    /// Tags a freshly baked image with its fingerprint so future lookups
    /// find it.
    pub async fn record(&self, image_id: &str, fingerprint: &str) -> Result<(), CloudError> {
        let host = self.ec2_host();
        self.client
            .query_api(
                &host,
                "ec2",
                &[
                    ("Action", "CreateTags"),
                    ("Version", "2016-11-15"),
                    ("ResourceId.1", image_id),
                    ("Tag.1.Key", FINGERPRINT_TAG_KEY),
                    ("Tag.1.Value", fingerprint),
                ],
            )
            .await?;
        info!(image_id, fingerprint, "recorded artifact in cache");
        Ok(())
    }
}
