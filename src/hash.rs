//! Content fingerprints used to detect change between crawl runs

use sha2::{Digest, Sha256};

/// Returns the hex-encoded SHA-256 digest of a string
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Computes the content hash of an indexed document
///
/// The hash covers the extracted text. Documents without text (assets, or
/// pages that yielded nothing readable) are fingerprinted by their url so the
/// hash stays stable and distinct per document.
///
/// # Examples
///
/// ```
/// use normativa_crawler::hash::{content_hash, sha256_hex};
///
/// assert_eq!(content_hash("https://x.test/a.pdf", ""), sha256_hex("https://x.test/a.pdf"));
/// assert_eq!(content_hash("https://x.test/", "Ley 123"), sha256_hex("Ley 123"));
/// ```
pub fn content_hash(url: &str, text: &str) -> String {
    if text.is_empty() {
        sha256_hex(url)
    } else {
        sha256_hex(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_same_text_same_hash() {
        let a = content_hash("https://a.test/1", "Decreto Supremo 004");
        let b = content_hash("https://b.test/2", "Decreto Supremo 004");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_text_falls_back_to_url() {
        let a = content_hash("https://x.test/a.pdf", "");
        let b = content_hash("https://x.test/b.pdf", "");
        assert_ne!(a, b);
        assert_eq!(a, sha256_hex("https://x.test/a.pdf"));
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = content_hash("https://x.test/", "texto");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
