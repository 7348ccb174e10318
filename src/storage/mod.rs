//! S3-compatible object storage module
//!
//! Handles:
//! - Relaying uploaded files to the provider bucket
//! - Writing and listing JSON backups

mod object_store;

pub use object_store::{ObjectPage, ObjectStorage, StoredObject};

pub(crate) fn build_provider_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
