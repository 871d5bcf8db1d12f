use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, error};

use super::{apply_accept, apply_role, ContainerStore, MembershipStore, UserStore};
use crate::models::{Container, MemberRole, MembershipRecord, ServiceError, User};

#[derive(Default)]
struct StoreState {
    users: HashMap<String, User>,
    // username -> user id
    usernames: HashMap<String, String>,
    containers: HashMap<String, Container>,
    // container id -> (user id -> record)
    memberships: HashMap<String, BTreeMap<String, MembershipRecord>>,
}

/// In-process store. All state sits behind a single lock so each call is
/// one critical section.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, ServiceError> {
        self.state.read().map_err(|e| {
            error!("Memory store lock poisoned: {:?}", e);
            ServiceError::InternalServerError
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, ServiceError> {
        self.state.write().map_err(|e| {
            error!("Memory store lock poisoned: {:?}", e);
            ServiceError::InternalServerError
        })
    }
}

impl UserStore for MemoryStore {
    fn save_user(&self, user: &User) -> Result<(), ServiceError> {
        let mut state = self.write()?;

        if let Some(existing) = state.usernames.get(&user.username) {
            if existing != &user.id {
                return Err(ServiceError::Conflict("Username already taken".to_string()));
            }
        }

        state.usernames.insert(user.username.clone(), user.id.clone());
        state.users.insert(user.id.clone(), user.clone());
        debug!("Saved user {} in memory", user.id);
        Ok(())
    }

    fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.read()?.users.get(user_id).cloned())
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let state = self.read()?;
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned())
    }
}

impl ContainerStore for MemoryStore {
    fn create_container(&self, container: &Container) -> Result<MembershipRecord, ServiceError> {
        let mut state = self.write()?;

        if state.containers.contains_key(&container.id) {
            return Err(ServiceError::Conflict("Container already exists".to_string()));
        }

        let owner = MembershipRecord::owner(&container.id, &container.owner_id);
        state.containers.insert(container.id.clone(), container.clone());
        state
            .memberships
            .entry(container.id.clone())
            .or_default()
            .insert(owner.user_id.clone(), owner.clone());

        debug!("Created {} {} in memory", container.kind, container.id);
        Ok(owner)
    }

    fn find_container(&self, container_id: &str) -> Result<Option<Container>, ServiceError> {
        Ok(self.read()?.containers.get(container_id).cloned())
    }
}

impl MembershipStore for MemoryStore {
    fn create(&self, container_id: &str, user_id: &str) -> Result<MembershipRecord, ServiceError> {
        let mut state = self.write()?;
        let members = state.memberships.entry(container_id.to_string()).or_default();

        if members.contains_key(user_id) {
            return Err(ServiceError::Conflict(
                "User already has access to this container".to_string(),
            ));
        }

        let record = MembershipRecord::invited(container_id, user_id);
        members.insert(user_id.to_string(), record.clone());
        Ok(record)
    }

    fn accept(&self, container_id: &str, user_id: &str) -> Result<MembershipRecord, ServiceError> {
        let mut state = self.write()?;
        let record = state
            .memberships
            .get_mut(container_id)
            .and_then(|members| members.get_mut(user_id))
            .ok_or(ServiceError::NotFound)?;

        apply_accept(record);
        Ok(record.clone())
    }

    fn update_role(
        &self,
        container_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<MembershipRecord, ServiceError> {
        let mut state = self.write()?;
        let record = state
            .memberships
            .get_mut(container_id)
            .and_then(|members| members.get_mut(user_id))
            .ok_or(ServiceError::NotFound)?;

        apply_role(record, role);
        Ok(record.clone())
    }

    fn list_by_container(&self, container_id: &str) -> Result<Vec<MembershipRecord>, ServiceError> {
        Ok(self
            .read()?
            .memberships
            .get(container_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, container_id: &str, user_id: &str) -> Result<Option<MembershipRecord>, ServiceError> {
        Ok(self
            .read()?
            .memberships
            .get(container_id)
            .and_then(|members| members.get(user_id))
            .cloned())
    }
}
