//! String interning keyed by 64-bit FNV-1a hashes.
//!
//! Call-site macros hash literals at compile time and register the hash with
//! a borrowed pointer; dynamic names and attribute values are hashed once at
//! runtime and stored as owned copies. Distinct strings hashing to the same
//! value are not resolved further: the most recent registration wins.

use std::borrow::Cow;
use std::collections::HashMap;

use parking_lot::Mutex;

pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a. `const` so literal hashes fold at compile time.
pub const fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// A call-site name: the literal, its compile-time hash, and where it was
/// written. The recording macros build one of these in a `static` per call
/// site.
#[derive(Debug)]
pub struct StaticStringSource {
    pub hash: u64,
    pub text: &'static str,
    pub module_path: &'static str,
    pub file: &'static str,
    pub line: u32,
}

/// Bidirectional hash-to-string table shared by the hot path (writers) and
/// the assembly worker (reader). A single mutex is enough: literals register
/// once and lookups are short.
pub struct StringInterner {
    table: Mutex<HashMap<u64, Cow<'static, str>>>,
}

impl StringInterner {
    pub fn new() -> Self {
        let mut table = HashMap::new();
        // Hash 0 is the reserved empty string, matching the invalid Id.
        table.insert(0, Cow::Borrowed(""));
        Self {
            table: Mutex::new(table),
        }
    }

    /// Registers a literal under its precomputed hash. Idempotent;
    /// re-registration under a colliding hash overwrites (last write wins).
    pub fn register_static(&self, hash: u64, text: &'static str) {
        self.table.lock().insert(hash, Cow::Borrowed(text));
    }

    /// Hashes a dynamic string and stores an owned copy. The first copy
    /// stored under a hash is kept.
    pub fn intern(&self, text: &str) -> u64 {
        let hash = fnv1a(text.as_bytes());
        let mut table = self.table.lock();
        table
            .entry(hash)
            .or_insert_with(|| Cow::Owned(text.to_owned()));
        hash
    }

    pub fn resolve(&self, hash: u64) -> Option<String> {
        self.table.lock().get(&hash).map(|text| text.to_string())
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
