use crate::id::ObjectId;

/// Domain-separated BLAKE3 hash of a change meta revision:
/// "vetter\0meta\0" || version || parent (or 32 zero bytes) || payload
pub fn meta_hash(parent: Option<&ObjectId>, payload: &[u8]) -> ObjectId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"vetter\0meta\0");
    hasher.update(&[1u8]); // version
    match parent {
        Some(id) => hasher.update(id.as_bytes()),
        None => hasher.update(&[0u8; 32]),
    };
    hasher.update(payload);
    let hash = hasher.finalize();
    ObjectId::from_bytes(*hash.as_bytes())
}
