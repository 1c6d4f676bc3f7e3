use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::ActivityCounts;
use crate::posts::repo_types::PostSummary;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub posts: Vec<PostSummary>,
    #[serde(rename = "_count")]
    pub count: ActivityCounts,
}
