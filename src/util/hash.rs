//! Hashing utilities for workspace addressing and build fingerprints.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

const RADIX_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Compute SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// 32-bit polynomial string hash over UTF-16 code units (`h = 31 * h + c`).
///
/// This is stable across processes and platforms, unlike `std`'s randomized
/// `DefaultHasher`, so it can address on-disk directories.
pub fn string_hash32(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Render a non-negative number in the given radix (2..=36), lowercase digits.
pub fn to_radix(mut value: u64, radix: u32) -> String {
    debug_assert!((2..=36).contains(&radix));
    if value == 0 {
        return "0".to_string();
    }

    let radix = radix as u64;
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(RADIX_DIGITS[(value % radix) as usize]);
        value /= radix;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Short, non-negative radix-32 token for a path string.
pub fn path_token(path: &str) -> String {
    to_radix(string_hash32(path).unsigned_abs() as u64, 32)
}

/// A hasher for building fingerprints from multiple components.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Create a new fingerprint builder.
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component to the fingerprint.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0"); // Separator
        self
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.txt");
        std::fs::write(&path, "hello").unwrap();

        let hash = sha256_file(&path).unwrap();
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_string_hash32_known_values() {
        assert_eq!(string_hash32(""), 0);
        assert_eq!(string_hash32("abc"), 96354);
        assert_eq!(string_hash32("/tmp/a/hello.kt"), -1301601318);
        assert_eq!(string_hash32("polygenelubricants"), i32::MIN);
    }

    #[test]
    fn test_to_radix() {
        assert_eq!(to_radix(0, 32), "0");
        assert_eq!(to_radix(31, 32), "v");
        assert_eq!(to_radix(32, 32), "10");
        assert_eq!(to_radix(96354, 32), "2u32");
        assert_eq!(to_radix(255, 16), "ff");
    }

    #[test]
    fn test_path_token_is_non_negative() {
        assert_eq!(path_token("abc"), "2u32");
        assert_eq!(path_token("/tmp/a/hello.kt"), "16p9n16");
        // i32::MIN has no positive i32 counterpart
        assert_eq!(path_token("polygenelubricants"), "2000000");
    }

    #[test]
    fn test_fingerprint() {
        let fp1 = {
            let mut fp = Fingerprint::new();
            fp.update_str("hello").update_str("world");
            fp.finish()
        };

        let fp2 = {
            let mut fp = Fingerprint::new();
            fp.update_str("hello");
            fp.update_str("world");
            fp.finish()
        };

        let fp3 = {
            let mut fp = Fingerprint::new();
            fp.update_str("hello").update_str("different");
            fp.finish()
        };

        assert_eq!(fp1, fp2);
        assert_ne!(fp1, fp3);
    }
}
