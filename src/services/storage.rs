use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::core::config::Settings;

/// Object keys for achievement media all live under this prefix.
pub(crate) fn achievement_prefix(achievement_id: &str) -> String {
    format!("achievements/{achievement_id}/")
}

pub(crate) fn media_key(achievement_id: &str, sanitized_filename: &str) -> String {
    format!("{}{}_{}", achievement_prefix(achievement_id), uuid::Uuid::new_v4(), sanitized_filename)
}

/// Stored object metadata returned after a server-side upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredObject {
    pub(crate) size: i64,
    pub(crate) checksum: String,
}

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
    url_ttl: Duration,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let s3 = settings.s3();
        if s3.access_key.is_empty() || s3.secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            s3.access_key.clone(),
            s3.secret_key.clone(),
            None,
            None,
            "achievo-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(s3.endpoint.clone())
            .region(aws_config::Region::new(s3.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config).force_path_style(true).build();
        let client = Client::from_conf(s3_config);
        let url_ttl = Duration::from_secs(settings.storage().presigned_url_expire_minutes * 60);

        Ok(Some(Self { client, bucket: s3.bucket.clone(), url_ttl }))
    }

    pub(crate) fn url_ttl(&self) -> Duration {
        self.url_ttl
    }

    pub(crate) async fn presign_put(&self, key: &str, content_type: &str) -> anyhow::Result<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(self.url_ttl)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    pub(crate) async fn presign_get(&self, key: &str) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(self.url_ttl)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    pub(crate) async fn upload_bytes(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<StoredObject> {
        let size = bytes.len() as i64;
        let checksum = hex::encode(Sha256::digest(&bytes));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok(StoredObject { size, checksum })
    }

    /// Size of an object uploaded directly by the client, or `None` if it is missing.
    pub(crate) async fn object_size(&self, key: &str) -> anyhow::Result<Option<i64>> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => Ok(output.content_length()),
            Err(err) => {
                if err.as_service_error().is_some_and(|service| service.is_not_found()) {
                    Ok(None)
                } else {
                    Err(err.into())
                }
            }
        }
    }

    pub(crate) async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client.delete_object().bucket(&self.bucket).key(key).send().await?;
        Ok(())
    }

    /// Deletes each key, logging failures instead of returning them.
    pub(crate) async fn delete_objects_best_effort<I>(&self, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        for key in keys {
            if let Err(err) = self.delete_object(&key).await {
                tracing::warn!(error = %err, key = %key, "Failed to delete media object");
            }
        }
    }
}
