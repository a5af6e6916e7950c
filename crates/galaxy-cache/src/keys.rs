//! Cache key builders.
//!
//! Backends add their own namespace prefix on top of these.

use uuid::Uuid;

/// Key of the blacklist entry for an access token identifier.
pub fn access_blacklist(jti: Uuid) -> String {
    format!("blacklist:{jti}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_key() {
        let jti = Uuid::nil();
        assert_eq!(
            access_blacklist(jti),
            "blacklist:00000000-0000-0000-0000-000000000000"
        );
    }
}
