//! Avatar references
//!
//! Avatars are generated by an external image service from the entity name.
//! Only the URL is built here.

use url::form_urlencoded;

/// Default avatar service
pub const DEFAULT_AVATAR_BASE: &str = "https://api.dicebear.com/7.x";

/// Source of avatar URLs for entities that do not carry one
pub trait AvatarSource {
    fn dog_avatar(&self, name: &str) -> String;
    fn trainer_avatar(&self, name: &str) -> String;
}

/// Deterministic name-seeded avatars from a DiceBear-compatible service
#[derive(Debug, Clone)]
pub struct InitialsAvatars {
    base_url: String,
}

impl Default for InitialsAvatars {
    fn default() -> Self {
        Self::new(DEFAULT_AVATAR_BASE)
    }
}

impl InitialsAvatars {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, style: &str, name: &str) -> String {
        let seed: String = form_urlencoded::byte_serialize(name.trim().as_bytes()).collect();
        format!("{}/{style}/svg?seed={seed}", self.base_url)
    }
}

impl AvatarSource for InitialsAvatars {
    fn dog_avatar(&self, name: &str) -> String {
        self.url("thumbs", name)
    }

    fn trainer_avatar(&self, name: &str) -> String {
        self.url("initials", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_is_deterministic_and_encoded() {
        let avatars = InitialsAvatars::default();
        let first = avatars.dog_avatar("Señor Rex");
        assert_eq!(first, avatars.dog_avatar("Señor Rex"));
        assert!(first.starts_with("https://api.dicebear.com/7.x/thumbs/svg?seed="));
        assert!(!first.contains(' '));
    }

    #[test]
    fn test_trailing_slash_base() {
        let avatars = InitialsAvatars::new("https://avatars.local/");
        assert_eq!(
            avatars.trainer_avatar("Ana"),
            "https://avatars.local/initials/svg?seed=Ana"
        );
    }
}
