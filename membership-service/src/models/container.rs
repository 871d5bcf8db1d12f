use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Boards and spaces share the same membership rules; the kind only tags
/// which route family a container belongs to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    #[serde(rename = "board")]
    #[display(fmt = "board")]
    Board,
    #[serde(rename = "space")]
    #[display(fmt = "space")]
    Space,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 2] = [ContainerKind::Board, ContainerKind::Space];

    // URL prefix the kind is served under
    pub fn scope_path(&self) -> &'static str {
        match self {
            ContainerKind::Board => "/boards",
            ContainerKind::Space => "/spaces",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: String,
    pub kind: ContainerKind,
    pub name: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl Container {
    pub fn new(kind: ContainerKind, name: String, owner_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            name,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateContainerRequest {
    pub name: String,
}
