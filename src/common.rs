use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// `YYYY-MM-DD` for `time::Date` fields.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        Date::parse(&text, FORMAT).map_err(serde::de::Error::custom)
    }
}

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims and lower-cases, then checks the shape.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("invalid email".into()));
    }
    Ok(email)
}

/// Trimmed copy of `value`, or `BadRequest("<field> is required")` when blank.
pub fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub fn ensure_owner(owner_id: Uuid, user_id: Uuid, message: &str) -> Result<(), AppError> {
    if owner_id != user_id {
        return Err(AppError::Unauthorized(message.to_string()));
    }
    Ok(())
}

/// Who may see a post or album.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    #[default]
    Public,
    Friends,
    OnlyMe,
}

impl Privacy {
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Friends => "friends",
            Privacy::OnlyMe => "only_me",
        }
    }

    /// Parses the stored column value. Unknown values are treated as the most
    /// restrictive setting.
    pub fn from_column(value: &str) -> Self {
        match value {
            "public" => Privacy::Public,
            "friends" => Privacy::Friends,
            _ => Privacy::OnlyMe,
        }
    }

    pub fn visible_to(self, owner_id: Uuid, viewer_id: Uuid, are_friends: bool) -> bool {
        if owner_id == viewer_id {
            return true;
        }
        match self {
            Privacy::Public => true,
            Privacy::Friends => are_friends,
            Privacy::OnlyMe => false,
        }
    }
}

/// SQL predicate matching rows whose `{owner}`/`privacy` columns are visible to
/// the viewer bound at `${viewer}`.
pub fn visibility_clause(alias: &str, owner_column: &str, viewer_param: usize) -> String {
    format!(
        "({alias}.{owner_column} = ${viewer_param} \
         OR {alias}.privacy = 'public' \
         OR ({alias}.privacy = 'friends' AND EXISTS (\
             SELECT 1 FROM friends f \
             WHERE f.user_id = ${viewer_param} AND f.friend_id = {alias}.{owner_column})))"
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "alice", "alice@", "@example.com", "a b@example.com", "alice@example"] {
            assert!(normalize_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn required_rejects_blank() {
        assert_eq!(required("  hi ", "content").unwrap(), "hi");
        let err = required("   ", "content").unwrap_err();
        assert_eq!(err.to_string(), "content is required");
    }

    #[test]
    fn ensure_owner_returns_forbidden_for_others() {
        let owner = Uuid::new_v4();
        assert!(ensure_owner(owner, owner, "nope").is_ok());
        let err = ensure_owner(owner, Uuid::new_v4(), "nope").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn privacy_rules() {
        let owner = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        assert!(Privacy::OnlyMe.visible_to(owner, owner, false));
        assert!(Privacy::Public.visible_to(owner, viewer, false));
        assert!(!Privacy::Friends.visible_to(owner, viewer, false));
        assert!(Privacy::Friends.visible_to(owner, viewer, true));
        assert!(!Privacy::OnlyMe.visible_to(owner, viewer, true));
    }

    #[test]
    fn privacy_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Privacy::OnlyMe).unwrap(), "\"only_me\"");
        let parsed: Privacy = serde_json::from_str("\"friends\"").unwrap();
        assert_eq!(parsed, Privacy::Friends);
        assert_eq!(Privacy::from_column(Privacy::OnlyMe.as_str()), Privacy::OnlyMe);
        assert_eq!(Privacy::default(), Privacy::Public);
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination::default();
        assert_eq!((p.limit(), p.offset()), (20, 0));
        let p = Pagination {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!((p.limit(), p.offset()), (100, 0));
        let p = Pagination {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!((p.limit(), p.offset()), (1, 40));
    }

    #[test]
    fn visibility_clause_binds_viewer() {
        let sql = visibility_clause("p", "author_id", 2);
        assert!(sql.contains("p.author_id = $2"));
        assert!(sql.contains("f.user_id = $2"));
    }

    #[test]
    fn iso_date_parses_calendar_dates() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(with = "iso_date")]
            d: time::Date,
        }
        let w: Wrapper = serde_json::from_str(r#"{"d":"1990-04-12"}"#).unwrap();
        assert_eq!(w.d.to_string(), "1990-04-12");
        assert!(serde_json::from_str::<Wrapper>(r#"{"d":"12/04/1990"}"#).is_err());
    }
}
