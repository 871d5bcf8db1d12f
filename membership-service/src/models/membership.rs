// membership-service/src/models/membership.rs
use crate::models::PublicUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declaration order is rank order, so `Owner > Admin > Member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Member = 0,
    Admin = 1,
    Owner = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    #[serde(rename = "INVITED")]
    Invited,
    #[serde(rename = "ACTIVE")]
    Active,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    pub container_id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MembershipRecord {
    // A fresh invitation: plain member, waiting for the invitee to accept
    pub fn invited(container_id: &str, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            container_id: container_id.to_string(),
            user_id: user_id.to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Invited,
            created_at: now,
            updated_at: now,
        }
    }

    // The creator's record, written together with the container
    pub fn owner(container_id: &str, user_id: &str) -> Self {
        Self {
            role: MemberRole::Owner,
            status: MemberStatus::Active,
            ..Self::invited(container_id, user_id)
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// A membership record as returned to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub user: PublicUser,
    pub role: MemberRole,
    pub status: MemberStatus,
}

// Request to invite an existing user into a container
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InviteMemberRequest {
    pub user_id: String,
}

// Request to change a member's role
#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateAccessRequest {
    pub role: MemberRole,
}
