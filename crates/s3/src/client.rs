//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ListingService trait from bv-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;

use bv_core::{
    BucketInfo, Error, ListPage, ListRequest, ListingService, ObjectRef, Profile, Result,
    StorageTier,
};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from a profile
    pub async fn new(profile: &Profile) -> Result<Self> {
        profile.validate()?;

        let timeout = profile.timeout_config();
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(profile.region.clone()))
            .timeout_config(
                aws_config::timeout::TimeoutConfig::builder()
                    .connect_timeout(timeout.connect())
                    .operation_timeout(timeout.read())
                    .build(),
            );

        if let Some((access_key, secret_key)) = profile.static_credentials() {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "bv-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &profile.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(profile.force_path_style())
            .build();

        tracing::debug!(
            profile = %profile.name,
            endpoint = profile.endpoint.as_deref().unwrap_or("aws"),
            region = %profile.region,
            "created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }
}

#[async_trait]
impl ListingService for S3Client {
    async fn list_page(&self, request: ListRequest) -> Result<ListPage> {
        let mut builder = self
            .inner
            .list_objects_v2()
            .bucket(&request.bucket)
            .delimiter(&request.delimiter)
            .max_keys(request.page_size);

        if !request.prefix.is_empty() {
            builder = builder.prefix(&request.prefix);
        }

        if let Some(token) = &request.continuation_token {
            builder = builder.continuation_token(token);
        }

        let output = builder
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("Bucket not found: {}", request.bucket)))?;

        Ok(page_from_output(output))
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "No buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| BucketInfo {
                name: b.name().unwrap_or_default().to_string(),
                created: b.creation_date().and_then(to_timestamp),
            })
            .collect();

        Ok(buckets)
    }
}

/// Convert a ListObjectsV2 response into a listing page
fn page_from_output(output: ListObjectsV2Output) -> ListPage {
    let folder_prefixes = output
        .common_prefixes()
        .iter()
        .filter_map(|p| p.prefix().map(str::to_string))
        .collect();

    let object_items = output
        .contents()
        .iter()
        .filter_map(|object| {
            let key = object.key()?;
            Some(ObjectRef {
                key: key.to_string(),
                size: object.size().unwrap_or(0).max(0) as u64,
                last_modified: object.last_modified().and_then(to_timestamp),
                storage_tier: object
                    .storage_class()
                    .map(|sc| StorageTier::from(sc.as_str()))
                    .unwrap_or_default(),
            })
        })
        .collect();

    ListPage {
        folder_prefixes,
        object_items,
        next_continuation_token: output.next_continuation_token().map(str::to_string),
        is_truncated: output.is_truncated().unwrap_or(false),
    }
}

fn to_timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(dt.secs(), dt.subsec_nanos() as i32).ok()
}

fn map_sdk_error<E, R>(err: SdkError<E, R>, not_found: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let detail = DisplayErrorContext(&err).to_string();
    classify_error(code.as_deref(), not_found, detail)
}

/// Map an S3 error code to the core error taxonomy
fn classify_error(code: Option<&str>, not_found: &str, detail: String) -> Error {
    match code {
        Some("NoSuchBucket" | "NotFound" | "NoSuchKey") => Error::NotFound(not_found.to_string()),
        Some(
            "AccessDenied"
            | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch"
            | "ExpiredToken"
            | "InvalidToken",
        ) => Error::Auth(detail),
        _ => Error::Network(detail),
    }
}
