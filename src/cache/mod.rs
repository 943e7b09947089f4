// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Caching layer for compressed images
//!
//! Entries are keyed by a content hash of the input plus the compression
//! settings, so an unchanged image is never recompressed.

mod filesystem;
mod hash;

pub use filesystem::FilesystemCache;
pub use hash::ContentHasher;

use async_trait::async_trait;

use crate::errors::AssetflowError;

/// Trait for cache implementations
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get cached bytes for a key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AssetflowError>;

    /// Store bytes under a key
    async fn store(&self, key: &str, data: &[u8]) -> Result<(), AssetflowError>;

    /// Get cache statistics
    async fn stats(&self) -> Result<CacheStats, AssetflowError>;
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries
    pub entries: usize,
    /// Total size in bytes
    pub size_bytes: u64,
}

impl CacheStats {
    /// Format size for display
    pub fn formatted_size(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size_bytes >= GB {
            format!("{:.2} GB", self.size_bytes as f64 / GB as f64)
        } else if self.size_bytes >= MB {
            format!("{:.2} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.2} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", self.size_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_size() {
        let stats = |size_bytes| CacheStats {
            entries: 1,
            size_bytes,
        };
        assert_eq!(stats(512).formatted_size(), "512 bytes");
        assert_eq!(stats(2048).formatted_size(), "2.00 KB");
        assert_eq!(stats(3 * 1024 * 1024).formatted_size(), "3.00 MB");
    }
}
