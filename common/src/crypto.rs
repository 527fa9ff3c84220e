//! Blake2b hashing helpers

use blake2::{
    digest::{consts::U32, Digest, Update, VariableOutput},
    Blake2b, Blake2bVar,
};

use crate::{DatumHash, Hash};

/// 224-bit keyhash of raw bytes
pub fn keyhash_224(data: &[u8]) -> Hash<28> {
    let mut hasher = Blake2bVar::new(28).expect("28 is a valid blake2b output size");
    hasher.update(data);
    let mut out = [0u8; 28];
    hasher.finalize_variable(&mut out).expect("output buffer matches digest size");
    Hash::new(out)
}

/// 224-bit keyhash with a language tag prepended, as used for script hashes
pub fn keyhash_224_tagged(tag: u8, data: &[u8]) -> Hash<28> {
    let mut tagged = Vec::with_capacity(data.len() + 1);
    tagged.push(tag);
    tagged.extend_from_slice(data);
    keyhash_224(&tagged)
}

/// 256-bit hash of a serialised datum
pub fn datum_hash(data: &[u8]) -> DatumHash {
    let mut hasher = Blake2b::<U32>::new();
    Digest::update(&mut hasher, data);
    let out: [u8; 32] = hasher.finalize().into();
    Hash::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyhash_is_stable() {
        let h1 = keyhash_224(b"hello");
        let h2 = keyhash_224(b"hello");
        assert_eq!(h1, h2);
        assert_ne!(h1, keyhash_224(b"world"));
    }

    #[test]
    fn tagged_hash_differs_by_tag() {
        assert_ne!(keyhash_224_tagged(1, b"script"), keyhash_224_tagged(2, b"script"));
    }
}
