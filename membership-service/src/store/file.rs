// membership-service/src/store/file.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{apply_accept, apply_role, ContainerStore, MembershipStore, UserStore};
use crate::models::{Container, MemberRole, MembershipRecord, ServiceError, User};

const USERS_DIR: &str = "users";
const CONTAINERS_DIR: &str = "containers";
const MEMBERSHIPS_DIR: &str = "memberships";

/// JSON documents on disk:
/// `users/<id>.json`, `containers/<id>.json`, `memberships/<container id>.json`.
pub struct FileStore {
    root: PathBuf,
    // serializes every read and write against the storage root
    guard: Mutex<()>,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        for dir in [USERS_DIR, CONTAINERS_DIR, MEMBERSHIPS_DIR] {
            let path = root.join(dir);
            if !path.exists() {
                info!("Creating storage directory {}", path.display());
                fs::create_dir_all(&path)?;
            }
        }
        Ok(Self {
            root,
            guard: Mutex::new(()),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, ServiceError> {
        self.guard.lock().map_err(|e| {
            error!("File store lock poisoned: {:?}", e);
            ServiceError::InternalServerError
        })
    }

    fn document_path(&self, dir: &str, id: &str) -> Result<PathBuf, ServiceError> {
        // ids come from URLs; keep them inside the storage root
        if id.is_empty() || id.contains(|c: char| matches!(c, '/' | '\\' | '.')) {
            warn!("Rejected storage id: {:?}", id);
            return Err(ServiceError::NotFound);
        }
        Ok(self.root.join(dir).join(format!("{}.json", id)))
    }

    fn read_memberships(&self, container_id: &str) -> Result<Vec<MembershipRecord>, ServiceError> {
        let path = self.document_path(MEMBERSHIPS_DIR, container_id)?;
        Ok(read_document(&path)?.unwrap_or_default())
    }

    fn write_memberships(
        &self,
        container_id: &str,
        records: &[MembershipRecord],
    ) -> Result<(), ServiceError> {
        let path = self.document_path(MEMBERSHIPS_DIR, container_id)?;
        write_document(&path, &records)
    }

    // Loads a container's records, lets `change` edit one of them and writes
    // the list back if it was modified
    fn modify_record<F>(
        &self,
        container_id: &str,
        user_id: &str,
        change: F,
    ) -> Result<MembershipRecord, ServiceError>
    where
        F: FnOnce(&mut MembershipRecord) -> bool,
    {
        let _guard = self.lock()?;
        let mut records = self.read_memberships(container_id)?;

        let record = records
            .iter_mut()
            .find(|record| record.user_id == user_id)
            .ok_or(ServiceError::NotFound)?;

        let changed = change(record);
        let updated = record.clone();
        if changed {
            self.write_memberships(container_id, &records)?;
        }
        Ok(updated)
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ServiceError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        error!("Failed to read {}: {:?}", path.display(), e);
        ServiceError::InternalServerError
    })?;

    let document = serde_json::from_str(&content).map_err(|e| {
        error!("Failed to parse {}: {:?}", path.display(), e);
        ServiceError::InternalServerError
    })?;

    Ok(Some(document))
}

// Writes next to the target and renames over it, so readers never see a
// half-written document
fn write_document<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<(), ServiceError> {
    let json = serde_json::to_string_pretty(document).map_err(|e| {
        error!("Failed to serialize {}: {:?}", path.display(), e);
        ServiceError::InternalServerError
    })?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)
        .and_then(|_| fs::rename(&tmp_path, path))
        .map_err(|e| {
            error!("Failed to write {}: {:?}", path.display(), e);
            ServiceError::InternalServerError
        })?;

    debug!("Wrote {}", path.display());
    Ok(())
}

impl UserStore for FileStore {
    fn save_user(&self, user: &User) -> Result<(), ServiceError> {
        let _guard = self.lock()?;

        if let Some(existing) = self.scan_username(&user.username)? {
            if existing.id != user.id {
                return Err(ServiceError::Conflict("Username already taken".to_string()));
            }
        }

        write_document(&self.document_path(USERS_DIR, &user.id)?, user)
    }

    fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, ServiceError> {
        let _guard = self.lock()?;
        read_document(&self.document_path(USERS_DIR, user_id)?)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let _guard = self.lock()?;
        self.scan_username(username)
    }
}

impl FileStore {
    // Caller must hold the guard
    fn scan_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let dir = self.root.join(USERS_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| {
            error!("Failed to read users directory: {:?}", e);
            ServiceError::InternalServerError
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                error!("Failed to read directory entry: {:?}", e);
                ServiceError::InternalServerError
            })?;

            let path = entry.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
                // an unreadable file could hide the username, so fail instead of skipping
                let user: Option<User> = read_document(&path)?;
                if let Some(user) = user.filter(|user| user.username == username) {
                    return Ok(Some(user));
                }
            }
        }

        Ok(None)
    }
}

impl ContainerStore for FileStore {
    fn create_container(&self, container: &Container) -> Result<MembershipRecord, ServiceError> {
        let _guard = self.lock()?;
        let container_path = self.document_path(CONTAINERS_DIR, &container.id)?;

        if container_path.exists() {
            return Err(ServiceError::Conflict("Container already exists".to_string()));
        }

        // membership list first: a container file never exists without its owner
        let owner = MembershipRecord::owner(&container.id, &container.owner_id);
        self.write_memberships(&container.id, std::slice::from_ref(&owner))?;
        write_document(&container_path, container)?;

        info!("✅ Stored {} {}", container.kind, container.id);
        Ok(owner)
    }

    fn find_container(&self, container_id: &str) -> Result<Option<Container>, ServiceError> {
        let _guard = self.lock()?;
        read_document(&self.document_path(CONTAINERS_DIR, container_id)?)
    }
}

impl MembershipStore for FileStore {
    fn create(&self, container_id: &str, user_id: &str) -> Result<MembershipRecord, ServiceError> {
        let _guard = self.lock()?;
        let mut records = self.read_memberships(container_id)?;

        if records.iter().any(|record| record.user_id == user_id) {
            return Err(ServiceError::Conflict(
                "User already has access to this container".to_string(),
            ));
        }

        let record = MembershipRecord::invited(container_id, user_id);
        records.push(record.clone());
        self.write_memberships(container_id, &records)?;
        Ok(record)
    }

    fn accept(&self, container_id: &str, user_id: &str) -> Result<MembershipRecord, ServiceError> {
        self.modify_record(container_id, user_id, apply_accept)
    }

    fn update_role(
        &self,
        container_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<MembershipRecord, ServiceError> {
        self.modify_record(container_id, user_id, |record| apply_role(record, role))
    }

    fn list_by_container(&self, container_id: &str) -> Result<Vec<MembershipRecord>, ServiceError> {
        let _guard = self.lock()?;
        self.read_memberships(container_id)
    }

    fn get(&self, container_id: &str, user_id: &str) -> Result<Option<MembershipRecord>, ServiceError> {
        let _guard = self.lock()?;
        Ok(self
            .read_memberships(container_id)?
            .into_iter()
            .find(|record| record.user_id == user_id))
    }
}
