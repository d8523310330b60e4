#[allow(clippy::module_inception)]
mod bucket;
mod data_ref;
mod domain;

pub use bucket::{
    bucket_hash, parse_bucket, serialize_bucket, Bucket, BucketError, BucketMessage, SALT_SIZE,
};
pub use data_ref::{DataRef, FileHeader};
pub use domain::{parse_domain_record, serialize_domain_record, DomainRecord};
