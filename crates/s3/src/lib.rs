//! bv-s3: S3 SDK adapter for bucketview
//!
//! This crate provides the implementation of the ListingService trait
//! using the aws-sdk-s3 crate. It is the only crate that directly
//! depends on the AWS SDK.

pub mod client;

pub use client::S3Client;
