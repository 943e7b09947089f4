// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Cache keys
//!
//! A key covers both the input bytes and the settings used to process them,
//! so changing e.g. the compression preset invalidates old entries.

use blake3::Hasher;

/// BLAKE3 hasher seeded with a settings tag
pub struct ContentHasher {
    hasher: Hasher,
}

impl ContentHasher {
    /// Start a key for output produced under `settings`
    pub fn with_settings(settings: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(settings.as_bytes());
        // ("ab", "c") and ("a", "bc") must not collide
        hasher.update(&[0]);
        Self { hasher }
    }

    /// Key for a file's bytes under `settings`
    pub fn key_for(settings: &str, data: &[u8]) -> String {
        let mut hasher = Self::with_settings(settings);
        hasher.update(data);
        hasher.finish()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Hex-encoded key
    pub fn finish(self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_matches_one_shot() {
        let mut hasher = ContentHasher::with_settings("oxipng-preset-2");
        hasher.update(b"\x89PNG");
        hasher.update(b"rest");

        assert_eq!(
            hasher.finish(),
            ContentHasher::key_for("oxipng-preset-2", b"\x89PNGrest")
        );
    }

    #[test]
    fn test_key_depends_on_settings() {
        let a = ContentHasher::key_for("preset-2", b"png");
        let b = ContentHasher::key_for("preset-3", b"png");
        assert_ne!(a, b);
        assert_ne!(
            ContentHasher::key_for("ab", b"c"),
            ContentHasher::key_for("a", b"bc")
        );
        assert_eq!(a.len(), 64);
    }
}
