use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::dto::UserPublic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_column(value: &str) -> Self {
        match value {
            "accepted" => RequestStatus::Accepted,
            "rejected" => RequestStatus::Rejected,
            _ => RequestStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FriendRequestRow {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct FriendRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: RequestStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<FriendRequestRow> for FriendRequest {
    fn from(r: FriendRequestRow) -> Self {
        Self {
            id: r.id,
            from_user_id: r.from_user_id,
            to_user_id: r.to_user_id,
            status: RequestStatus::from_column(&r.status),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A pending request joined with its sender.
#[derive(Debug, FromRow)]
pub struct IncomingRequestRow {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_profile_picture_url: Option<String>,
    pub sender_cover_photo_url: Option<String>,
    pub sender_created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct IncomingRequest {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub from: UserPublic,
}

impl From<IncomingRequestRow> for IncomingRequest {
    fn from(r: IncomingRequestRow) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at,
            from: UserPublic {
                id: r.sender_id,
                name: r.sender_name,
                profile_picture_url: r.sender_profile_picture_url,
                cover_photo_url: r.sender_cover_photo_url,
                created_at: r.sender_created_at,
            },
        }
    }
}
