//! Request identity keys for stored entries.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the storage key of a request: SHA-256 over method and URL.
///
/// The fragment never reaches the origin, so it is not part of the identity.
pub fn compute_cache_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
