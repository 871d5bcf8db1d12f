// membership-service/src/store/mod.rs
//! Persistence seams for users, containers and their membership records.
//!
//! Every method is one atomic step against the backing store: once it
//! returns, any later call (from any request) observes its effect.

use crate::models::{Container, MemberRole, MembershipRecord, ServiceError, User};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

pub trait UserStore {
    /// Fails with `Conflict` when the username is already taken.
    fn save_user(&self, user: &User) -> Result<(), ServiceError>;
    fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, ServiceError>;
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ServiceError>;
}

pub trait ContainerStore {
    /// Persists the container together with its owner's ACTIVE OWNER record.
    fn create_container(&self, container: &Container) -> Result<MembershipRecord, ServiceError>;
    fn find_container(&self, container_id: &str) -> Result<Option<Container>, ServiceError>;
}

pub trait MembershipStore {
    /// Adds an INVITED member record. `Conflict` if the pair already has one.
    fn create(&self, container_id: &str, user_id: &str) -> Result<MembershipRecord, ServiceError>;
    /// INVITED -> ACTIVE. Accepting an ACTIVE record returns it unchanged.
    fn accept(&self, container_id: &str, user_id: &str) -> Result<MembershipRecord, ServiceError>;
    fn update_role(
        &self,
        container_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<MembershipRecord, ServiceError>;
    fn list_by_container(&self, container_id: &str) -> Result<Vec<MembershipRecord>, ServiceError>;
    fn get(&self, container_id: &str, user_id: &str) -> Result<Option<MembershipRecord>, ServiceError>;

    fn is_active_member(&self, container_id: &str, user_id: &str) -> Result<bool, ServiceError> {
        Ok(self
            .get(container_id, user_id)?
            .map_or(false, |record| record.is_active()))
    }
}

pub trait Storage: UserStore + ContainerStore + MembershipStore + Send + Sync {}

impl<T> Storage for T where T: UserStore + ContainerStore + MembershipStore + Send + Sync {}

// Applies an accept to a record in place; shared by the backends
pub(crate) fn apply_accept(record: &mut MembershipRecord) -> bool {
    if record.is_active() {
        return false;
    }
    record.status = crate::models::MemberStatus::Active;
    record.updated_at = chrono::Utc::now();
    true
}

// Applies a role change in place; unchanged roles leave the record untouched
pub(crate) fn apply_role(record: &mut MembershipRecord, role: MemberRole) -> bool {
    if record.role == role {
        return false;
    }
    record.role = role;
    record.updated_at = chrono::Utc::now();
    true
}
