//! Stable entry identity.

use sha2::{Digest, Sha256};

use crate::types::Origin;

/// Fingerprint an (origin, origin-key) pair into a short stable id.
///
/// The id survives rescans as long as the discovery keeps its key, which is
/// what lets favorites and preferences reference entries across runs. Uses
/// the first 16 hex chars of a SHA-256 over `"<origin-slug>:<origin-key>"`.
pub fn entry_id(origin: Origin, origin_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(origin.slug().as_bytes());
    hasher.update(b":");
    hasher.update(origin_key.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_and_short() {
        let a = entry_id(Origin::DesktopShortcut, "/home/u/shortcuts/hl2.desktop");
        let b = entry_id(Origin::DesktopShortcut, "/home/u/shortcuts/hl2.desktop");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn id_depends_on_origin_and_key() {
        let desktop = entry_id(Origin::DesktopShortcut, "220");
        let steam = entry_id(Origin::SteamInstalled, "220");
        let other = entry_id(Origin::SteamInstalled, "400");
        assert_ne!(desktop, steam);
        assert_ne!(steam, other);
    }
}
