use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const KEY_PREFIX: &str = "resumes";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("object storage rejected upload of {key}: {message}")]
    Rejected { key: String, message: String },
}

/// Object storage seam. Returns the public URL of the stored object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, filename: &str, bytes: Bytes, content_type: &str) -> Result<String, UploadError>;
}

/// S3 (or MinIO) backed store. Objects are written under `resumes/`.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_url: &str) -> Self {
        Self {
            client,
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

pub fn object_key(filename: &str) -> String {
    format!("{KEY_PREFIX}/{filename}")
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, filename: &str, bytes: Bytes, content_type: &str) -> Result<String, UploadError> {
        let key = object_key(filename);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| UploadError::Rejected {
                key: key.clone(),
                message: e.to_string(),
            })?;

        info!("Uploaded artifact to s3://{}/{}", self.bucket, key);
        Ok(self.object_url(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_uses_resumes_prefix() {
        assert_eq!(object_key("Ada_CV.pdf"), "resumes/Ada_CV.pdf");
    }

    #[test]
    fn test_object_url_trims_trailing_slash() {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        let store = S3ObjectStore::new(
            aws_sdk_s3::Client::from_conf(config),
            "bucket".to_string(),
            "https://cdn.example.com/bucket/",
        );
        assert_eq!(
            store.object_url("resumes/a.pdf"),
            "https://cdn.example.com/bucket/resumes/a.pdf"
        );
    }
}
