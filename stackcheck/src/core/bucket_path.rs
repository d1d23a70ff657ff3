//! Bucket-relative template locations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `/`-delimited object location whose first segment is the bucket.
///
/// Everything after the first `/` is the object key, kept verbatim so that
/// splitting and rejoining is lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketPath {
    bucket: String,
    key: String,
}

impl BucketPath {
    /// Creates a bucket path from its parts.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Splits a raw `bucket/key/...` string.
    ///
    /// A string without any `/` is taken to be a bare bucket with an empty key.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackcheck::core::BucketPath;
    ///
    /// let path = BucketPath::parse("old-bucket/prefix/key.yaml");
    /// assert_eq!(path.bucket(), "old-bucket");
    /// assert_eq!(path.key(), "prefix/key.yaml");
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('/') {
            Some((bucket, key)) => Self::new(bucket, key),
            None => Self::new(raw, ""),
        }
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the object key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true if the key is empty.
    #[must_use]
    pub fn has_empty_key(&self) -> bool {
        self.key.is_empty()
    }

    /// Returns a copy of this path pointing into another bucket.
    #[must_use]
    pub fn rebucket(&self, bucket: impl Into<String>) -> Self {
        Self::new(bucket, self.key.clone())
    }

    /// Returns the final `/` segment of the full path.
    ///
    /// This is the template file name for keys like `prefix/vpc.yaml`, and
    /// the bucket itself when the key is empty.
    #[must_use]
    pub fn file_name(&self) -> &str {
        if self.key.is_empty() {
            return &self.bucket;
        }
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

impl fmt::Display for BucketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_key() {
        let path = BucketPath::parse("bucket/a/b/c.yaml");
        assert_eq!(path.bucket(), "bucket");
        assert_eq!(path.key(), "a/b/c.yaml");
        assert_eq!(path.to_string(), "bucket/a/b/c.yaml");
    }

    #[test]
    fn test_parse_without_separator() {
        let path = BucketPath::parse("lonely");
        assert_eq!(path.bucket(), "lonely");
        assert!(path.has_empty_key());
        assert_eq!(path.to_string(), "lonely/");
    }

    #[test]
    fn test_parse_keeps_empty_segments() {
        let path = BucketPath::parse("bucket//double/slash/");
        assert_eq!(path.key(), "/double/slash/");
        assert_eq!(path.to_string(), "bucket//double/slash/");
    }

    #[test]
    fn test_rebucket_preserves_key() {
        let path = BucketPath::parse("old-bucket/prefix/key.yaml").rebucket("test-artifacts");
        assert_eq!(path.to_string(), "test-artifacts/prefix/key.yaml");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(BucketPath::parse("b/prefix/vpc.yaml").file_name(), "vpc.yaml");
        assert_eq!(BucketPath::parse("b/vpc.yaml").file_name(), "vpc.yaml");
        assert_eq!(BucketPath::parse("vpc.yaml").file_name(), "vpc.yaml");
    }
}
