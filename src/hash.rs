//! Content hashing for style identity using blake3.
//!
//! A style is identified by its href (linked stylesheets) or by its literal
//! text (inline `<style>` blocks). Identical input always yields the same
//! [`ContentHash`], which is what lets the registry resolve it only once.

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash arbitrary bytes.
    #[inline]
    pub fn of<T: AsRef<[u8]> + ?Sized>(data: &T) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Hash an ordered sequence of parts, each terminated by `separator`.
    ///
    /// Streaming avoids building the joined string for long style lists.
    pub fn of_parts<'a, I>(parts: I, separator: &[u8]) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
            hasher.update(separator);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_display() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(format!("{}", hash), "abababababababab");
    }

    #[test]
    fn test_same_input_same_hash() {
        assert_eq!(ContentHash::of("/css/a.css"), ContentHash::of("/css/a.css"));
        assert_ne!(ContentHash::of("/css/a.css"), ContentHash::of("/css/b.css"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let original = ContentHash::of("body{color:red}");
        let recovered = ContentHash::from_hex(&original.to_hex()).unwrap();
        assert_eq!(original, recovered);
        assert!(ContentHash::from_hex("abcd").is_none());
    }

    #[test]
    fn test_parts_are_order_sensitive() {
        let a: &[u8] = b"a";
        let b: &[u8] = b"b";
        let ab = ContentHash::of_parts([a, b], b".");
        let ba = ContentHash::of_parts([b, a], b".");
        assert_ne!(ab, ba);
        assert_eq!(ab, ContentHash::of_parts([a, b], b"."));
    }

    #[test]
    fn test_parts_separator_prevents_concat_collision() {
        let ab: &[u8] = b"ab";
        let a: &[u8] = b"a";
        let b: &[u8] = b"b";
        assert_ne!(
            ContentHash::of_parts([ab], b"."),
            ContentHash::of_parts([a, b], b".")
        );
    }
}
