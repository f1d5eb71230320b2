//! Storage provider settings.
//!
//! Each named backend picks one provider with a `type` tag:
//!
//! ```toml
//! [backends.private]
//! type = "s3"
//! endpoint = "https://<account>.r2.cloudflarestorage.com"
//! bucket = "attachments"
//! access_key_id = "..."
//! secret_access_key = "..."
//! region = "auto"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a backend keeps its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Any S3-compatible object store (AWS, R2, MinIO, Spaces).
    S3 {
        /// Service endpoint.
        endpoint: String,
        /// Bucket holding the files.
        bucket: String,
        /// Access key id.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region, `auto` for R2.
        region: String,
    },
    /// Azure Blob Storage container.
    AzureBlob {
        /// Storage account.
        account: String,
        /// Account key.
        access_key: String,
        /// Container holding the files.
        container: String,
    },
    /// Directory on local disk, usually served by a web server.
    LocalFs {
        /// Directory all paths are relative to.
        root: PathBuf,
    },
    /// In-process memory. Contents vanish with the process.
    Memory,
}

impl StorageProvider {
    /// S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Azure Blob provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Local directory provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Short provider kind, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }

    /// Whether the provider can sign time-bounded download URLs.
    #[must_use]
    pub fn supports_presign(&self) -> bool {
        matches!(self, Self::S3 { .. } | Self::AzureBlob { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StorageProvider::s3("https://r2.example.com", "files", "key", "secret", "auto"), "s3")]
    #[case(StorageProvider::azure_blob("devaccount", "key", "files"), "azure_blob")]
    #[case(StorageProvider::local_fs("./var/files"), "local")]
    #[case(StorageProvider::Memory, "memory")]
    fn test_provider_kind(#[case] provider: StorageProvider, #[case] expected: &str) {
        assert_eq!(provider.kind(), expected);
    }

    #[test]
    fn test_presign_capability() {
        assert!(StorageProvider::s3("http://localhost:9000", "b", "k", "s", "us-east-1").supports_presign());
        assert!(StorageProvider::azure_blob("acct", "key", "files").supports_presign());
        assert!(!StorageProvider::local_fs("./var").supports_presign());
        assert!(!StorageProvider::Memory.supports_presign());
    }
}
