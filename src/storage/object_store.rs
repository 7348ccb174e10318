//! Object storage client for the external provider
//!
//! Every durable write in the relay goes through this client; nothing is
//! persisted locally. Objects are served via the configured public URL.

use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::storage::build_provider_http_client;

/// Object storage client
///
/// Uploads objects to the provider bucket and returns public URLs.
pub struct ObjectStorage {
    /// S3-compatible client for the provider
    client: S3Client,
    /// Bucket name
    bucket: String,
    /// Public URL base
    /// e.g., "https://files.example.com"
    public_url: String,
}

/// Listing entry for a stored object
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Storage identifier (object key)
    pub key: String,
    /// Creation timestamp reported by the provider
    pub created_at: DateTime<Utc>,
}

/// One page of a prefix listing
///
/// `next` carries the provider continuation token when the listing is
/// truncated; callers must keep paging until it is `None`, since the
/// provider returns keys in lexicographic order, not newest-first.
#[derive(Debug)]
pub struct ObjectPage {
    pub objects: Vec<StoredObject>,
    pub next: Option<String>,
}

impl ObjectStorage {
    /// Create new object storage client
    ///
    /// # Arguments
    /// * `config` - Storage configuration
    /// * `provider` - Provider credentials
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub async fn new(
        config: &crate::config::StorageConfig,
        provider: &crate::config::ProviderConfig,
    ) -> Result<Self, AppError> {
        use aws_sdk_s3::config::BehaviorVersion;
        use aws_sdk_s3::config::{Credentials, Region};

        // Provider endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", provider.account_id);

        let credentials = Credentials::new(
            &provider.access_key_id,
            &provider.secret_access_key,
            None,
            None,
            "eventos-backend",
        );

        let http_client = build_provider_http_client();

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .http_client(http_client)
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        })
    }

    /// Upload an object
    ///
    /// # Arguments
    /// * `key` - Object key (path) within the bucket
    /// * `data` - Object contents
    /// * `content_type` - MIME type
    ///
    /// # Returns
    /// Public URL for the uploaded object
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload failed: {}", e)))?;

        Ok(self.get_public_url(key))
    }

    /// List one page of objects under a prefix
    ///
    /// # Arguments
    /// * `prefix` - Key prefix to list under
    /// * `page_size` - Maximum number of entries per page
    /// * `continuation` - Token from the previous page, if any
    ///
    /// # Returns
    /// Listing entries in whatever order the provider returned them,
    /// plus the continuation token for the next page when truncated
    pub async fn list_page(
        &self,
        prefix: &str,
        page_size: i32,
        continuation: Option<String>,
    ) -> Result<ObjectPage, AppError> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(page_size);
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let result = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to list objects: {}", e)))?;

        let mut objects = Vec::new();

        if let Some(contents) = result.contents {
            for object in contents {
                if let (Some(key), Some(modified)) = (object.key, object.last_modified) {
                    objects.push(StoredObject {
                        key: key.to_string(),
                        created_at: DateTime::from_timestamp(
                            modified.secs(),
                            modified.subsec_nanos(),
                        )
                        .unwrap_or_else(Utc::now),
                    });
                }
            }
        }

        let next = if result.is_truncated.unwrap_or(false) {
            result.next_continuation_token
        } else {
            None
        };

        Ok(ObjectPage { objects, next })
    }

    /// Get public URL for an object key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}
