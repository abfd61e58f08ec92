//! Administrator identity loaded from environment variables.
//!
//! The bot has a single administrator configured through `ADMIN_USER_ID` in the `.env` file.
//! Without it, admin commands are refused for everyone.

/// Parses an administrator id from a raw environment value.
fn parse_admin_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Gets the configured administrator id, if any.
#[must_use]
pub fn get_admin_id() -> Option<i64> {
    std::env::var("ADMIN_USER_ID")
        .ok()
        .and_then(|raw| parse_admin_id(&raw))
}

/// Whether `user_id` is the configured administrator.
#[must_use]
pub fn is_admin(admin_id: Option<i64>, user_id: i64) -> bool {
    admin_id == Some(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_id() {
        assert_eq!(parse_admin_id(" 1106828306 "), Some(1_106_828_306));
        assert_eq!(parse_admin_id("not-a-number"), None);
    }

    #[test]
    fn test_is_admin_requires_configuration() {
        assert!(is_admin(Some(5), 5));
        assert!(!is_admin(Some(5), 6));
        assert!(!is_admin(None, 5));
    }
}
