//! MongoDB document schemas for user records and sessions

mod session;
mod user;

pub use session::{SessionDoc, SESSION_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Bookkeeping fields shared by every document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(default)]
    pub is_deleted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}
