//! User profile entity definitions

use serde::{Deserialize, Serialize};

/// Display-facing profile record backing the `user_info` table.
///
/// Profiles are created during registration and mutated through partial
/// field updates; they are never physically deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub avatar: String,
    pub intro: String,
    pub website: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request for updating profile display fields.
///
/// Empty strings are valid overwrite values, not "leave unchanged".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub nickname: String,
    pub avatar: String,
    pub intro: String,
    pub website: String,
}

/// Profile projection enriched with the user's liked-article and
/// liked-comment id sets. The like sets come from an external source and
/// are never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfoVO {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub article_like_set: Vec<String>,
    pub comment_like_set: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_vo_serializes_profile_fields_at_top_level() {
        let vo = UserInfoVO {
            profile: UserProfile {
                id: 7,
                email: "alice@example.com".to_string(),
                nickname: "alice".to_string(),
                avatar: "https://img.example.com/a.png".to_string(),
                intro: String::new(),
                website: String::new(),
                created_at: "2024-01-01T00:00:00+00:00".to_string(),
                updated_at: "2024-01-01T00:00:00+00:00".to_string(),
            },
            article_like_set: vec!["31".to_string()],
            comment_like_set: vec![],
        };

        let json = serde_json::to_value(&vo).unwrap();
        assert_eq!(json["nickname"], "alice");
        assert_eq!(json["article_like_set"][0], "31");
        assert!(json.get("profile").is_none());
    }
}
