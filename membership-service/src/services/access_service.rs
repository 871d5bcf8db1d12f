// membership-service/src/services/access_service.rs
//! Who may see or change a container's membership, and in which order the
//! members are listed.
//!
//! Reads require an ACTIVE membership of the container (any role); anyone else
//! gets `Forbidden` before the container or the target is even looked up.

use std::cmp::Ordering;

use log::{debug, error};

use crate::models::{
    Container, ContainerKind, MemberAccess, MemberRole, MembershipRecord, PublicUser, ServiceError,
};
use crate::store::Storage;

/// Identifies a container together with the route family it was addressed by.
#[derive(Debug, Clone, Copy)]
pub struct ContainerRef<'a> {
    pub kind: ContainerKind,
    pub id: &'a str,
}

impl<'a> ContainerRef<'a> {
    pub fn new(kind: ContainerKind, id: &'a str) -> Self {
        Self { kind, id }
    }
}

// Creates a container; the creator becomes its active owner in the same step
pub fn create_container(
    store: &dyn Storage,
    kind: ContainerKind,
    owner_id: &str,
    name: &str,
) -> Result<Container, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::BadRequest("Name must not be empty".to_string()));
    }

    if store.find_user_by_id(owner_id)?.is_none() {
        error!("❌ Owner does not exist: {}", owner_id);
        return Err(ServiceError::Unauthorized);
    }

    let container = Container::new(kind, name.to_string(), owner_id.to_string());
    store.create_container(&container)?;
    Ok(container)
}

pub fn list_members(
    store: &dyn Storage,
    container: ContainerRef<'_>,
    requester_id: &str,
) -> Result<Vec<MemberAccess>, ServiceError> {
    require_role(store, container, requester_id, MemberRole::Member)?;
    resolve_container(store, container)?;

    let mut members = store
        .list_by_container(container.id)?
        .iter()
        .map(|record| project(store, record))
        .collect::<Result<Vec<_>, _>>()?;

    order_members(&mut members);
    Ok(members)
}

pub fn get_access(
    store: &dyn Storage,
    container: ContainerRef<'_>,
    requester_id: &str,
    target_user_id: &str,
) -> Result<MemberAccess, ServiceError> {
    require_role(store, container, requester_id, MemberRole::Member)?;
    resolve_container(store, container)?;

    let record = store
        .get(container.id, target_user_id)?
        .ok_or(ServiceError::NotFound)?;
    project(store, &record)
}

// Invites an existing user as a plain member; owners and admins only
pub fn invite(
    store: &dyn Storage,
    container: ContainerRef<'_>,
    requester_id: &str,
    target_user_id: &str,
) -> Result<MemberAccess, ServiceError> {
    require_role(store, container, requester_id, MemberRole::Admin)?;
    resolve_container(store, container)?;

    if store.find_user_by_id(target_user_id)?.is_none() {
        return Err(ServiceError::NotFound);
    }

    let record = store.create(container.id, target_user_id)?;
    project(store, &record)
}

// Only the invited user can accept; accepting again is a no-op
pub fn accept(
    store: &dyn Storage,
    container: ContainerRef<'_>,
    requester_id: &str,
    target_user_id: &str,
) -> Result<MemberAccess, ServiceError> {
    if requester_id != target_user_id {
        return Err(ServiceError::Forbidden);
    }
    resolve_container(store, container)?;

    let record = store.accept(container.id, target_user_id)?;
    project(store, &record)
}

// Role changes are reserved to the owner, and ownership itself never moves
pub fn update_access(
    store: &dyn Storage,
    container: ContainerRef<'_>,
    requester_id: &str,
    target_user_id: &str,
    new_role: MemberRole,
) -> Result<MemberAccess, ServiceError> {
    require_role(store, container, requester_id, MemberRole::Owner)?;
    resolve_container(store, container)?;

    if new_role == MemberRole::Owner {
        return Err(ServiceError::BadRequest(
            "Ownership cannot be granted".to_string(),
        ));
    }

    let current = store
        .get(container.id, target_user_id)?
        .ok_or(ServiceError::NotFound)?;

    if current.role == MemberRole::Owner {
        return Err(ServiceError::BadRequest(
            "Cannot change the owner's role".to_string(),
        ));
    }

    let record = store.update_role(container.id, target_user_id, new_role)?;
    project(store, &record)
}

/// Role rank descending, then first name ascending (case-insensitive first),
/// then user id so equal names still land in a fixed order.
pub fn order_members(members: &mut [MemberAccess]) {
    members.sort_by(compare_members);
}

fn compare_members(a: &MemberAccess, b: &MemberAccess) -> Ordering {
    b.role
        .cmp(&a.role)
        .then_with(|| {
            a.user
                .first_name
                .to_lowercase()
                .cmp(&b.user.first_name.to_lowercase())
        })
        .then_with(|| a.user.first_name.cmp(&b.user.first_name))
        .then_with(|| a.user.id.cmp(&b.user.id))
}

fn require_role(
    store: &dyn Storage,
    container: ContainerRef<'_>,
    requester_id: &str,
    minimum: MemberRole,
) -> Result<MembershipRecord, ServiceError> {
    match store.get(container.id, requester_id) {
        Ok(Some(record)) if record.is_active() && record.role >= minimum => Ok(record),
        Ok(_) | Err(ServiceError::NotFound) => {
            debug!(
                "User {} lacks {:?} access to {} {}",
                requester_id, minimum, container.kind, container.id
            );
            Err(ServiceError::Forbidden)
        }
        Err(err) => Err(err),
    }
}

fn resolve_container(
    store: &dyn Storage,
    container: ContainerRef<'_>,
) -> Result<Container, ServiceError> {
    match store.find_container(container.id)? {
        Some(found) if found.kind == container.kind => Ok(found),
        _ => Err(ServiceError::NotFound),
    }
}

fn project(store: &dyn Storage, record: &MembershipRecord) -> Result<MemberAccess, ServiceError> {
    let user = store.find_user_by_id(&record.user_id)?.ok_or_else(|| {
        error!(
            "❌ Membership of {} references missing user {}",
            record.container_id, record.user_id
        );
        ServiceError::InternalServerError
    })?;

    Ok(MemberAccess {
        user: PublicUser::from(&user),
        role: record.role,
        status: record.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemberStatus, User};
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn add_user(store: &MemoryStore, first_name: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let user = User {
            username: format!("{}-{}", first_name.to_lowercase(), &id[..8]),
            id,
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        };
        crate::store::UserStore::save_user(store, &user).unwrap();
        user.id
    }

    fn join(store: &MemoryStore, container: ContainerRef<'_>, owner: &str, user: &str) {
        invite(store, container, owner, user).unwrap();
        accept(store, container, user, user).unwrap();
    }

    fn first_names(members: &[MemberAccess]) -> Vec<&str> {
        members.iter().map(|m| m.user.first_name.as_str()).collect()
    }

    #[test]
    fn members_are_ordered_by_role_then_first_name() {
        for kind in ContainerKind::ALL {
            let store = MemoryStore::new();
            let jeff = add_user(&store, "Jeff");
            let jon = add_user(&store, "Jon");
            let amanda = add_user(&store, "Amanda");
            let bjarke = add_user(&store, "Bjarke");

            let created = create_container(&store, kind, &jeff, "Planning").unwrap();
            let container = ContainerRef::new(kind, &created.id);

            for member in [&bjarke, &jon, &amanda] {
                join(&store, container, &jeff, member);
            }
            update_access(&store, container, &jeff, &jon, MemberRole::Admin).unwrap();

            let from_owner = list_members(&store, container, &jeff).unwrap();
            let from_admin = list_members(&store, container, &jon).unwrap();
            let from_member = list_members(&store, container, &amanda).unwrap();

            assert_eq!(from_owner, from_admin);
            assert_eq!(from_owner, from_member);
            assert_eq!(first_names(&from_owner), vec!["Jeff", "Jon", "Amanda", "Bjarke"]);
            assert_eq!(
                from_owner.iter().map(|m| m.role).collect::<Vec<_>>(),
                vec![MemberRole::Owner, MemberRole::Admin, MemberRole::Member, MemberRole::Member]
            );
        }
    }

    #[test]
    fn equal_names_fall_back_to_user_id() {
        let member = |id: &str, first_name: &str, role| MemberAccess {
            user: PublicUser {
                id: id.to_string(),
                username: id.to_string(),
                first_name: first_name.to_string(),
                last_name: String::new(),
            },
            role,
            status: MemberStatus::Active,
        };

        let mut members = vec![
            member("b", "anna", MemberRole::Member),
            member("c", "Zed", MemberRole::Member),
            member("a", "Anna", MemberRole::Member),
            member("d", "Anna", MemberRole::Member),
            member("e", "Yusuf", MemberRole::Admin),
        ];
        order_members(&mut members);

        let ids: Vec<&str> = members.iter().map(|m| m.user.id.as_str()).collect();
        assert_eq!(ids, vec!["e", "a", "d", "b", "c"]);
    }

    #[test]
    fn non_members_are_forbidden() {
        let store = MemoryStore::new();
        let owner = add_user(&store, "Jeff");
        let outsider = add_user(&store, "Eve");
        let invited = add_user(&store, "Ivan");

        let created = create_container(&store, ContainerKind::Space, &owner, "Private").unwrap();
        let container = ContainerRef::new(ContainerKind::Space, &created.id);
        invite(&store, container, &owner, &invited).unwrap();

        assert_eq!(list_members(&store, container, &outsider), Err(ServiceError::Forbidden));
        assert_eq!(get_access(&store, container, &outsider, &owner), Err(ServiceError::Forbidden));
        assert_eq!(
            get_access(&store, container, &outsider, "no-such-user"),
            Err(ServiceError::Forbidden)
        );
        // a pending invite does not grant read access yet
        assert_eq!(list_members(&store, container, &invited), Err(ServiceError::Forbidden));
    }

    #[test]
    fn unknown_container_is_forbidden_for_everyone() {
        let store = MemoryStore::new();
        let user = add_user(&store, "Jeff");
        let container = ContainerRef::new(ContainerKind::Board, "missing");

        assert_eq!(list_members(&store, container, &user), Err(ServiceError::Forbidden));
    }

    #[test]
    fn container_must_match_the_requested_kind() {
        let store = MemoryStore::new();
        let owner = add_user(&store, "Jeff");
        let board = create_container(&store, ContainerKind::Board, &owner, "Board").unwrap();

        let as_space = ContainerRef::new(ContainerKind::Space, &board.id);
        assert_eq!(list_members(&store, as_space, &owner), Err(ServiceError::NotFound));
    }

    #[test]
    fn get_access_is_the_same_for_every_member() {
        let store = MemoryStore::new();
        let owner = add_user(&store, "Jeff");
        let other = add_user(&store, "Other");
        let created = create_container(&store, ContainerKind::Board, &owner, "Shared").unwrap();
        let container = ContainerRef::new(ContainerKind::Board, &created.id);
        join(&store, container, &owner, &other);

        for target in [&owner, &other] {
            let seen_by_owner = get_access(&store, container, &owner, target).unwrap();
            let seen_by_other = get_access(&store, container, &other, target).unwrap();
            assert_eq!(seen_by_owner, seen_by_other);
        }

        assert_eq!(
            get_access(&store, container, &owner, "no-such-user"),
            Err(ServiceError::NotFound)
        );
    }

    #[test]
    fn only_the_owner_changes_roles() {
        let store = MemoryStore::new();
        let owner = add_user(&store, "Jeff");
        let admin = add_user(&store, "Jon");
        let member = add_user(&store, "Amanda");
        let created = create_container(&store, ContainerKind::Space, &owner, "Roles").unwrap();
        let container = ContainerRef::new(ContainerKind::Space, &created.id);
        join(&store, container, &owner, &admin);
        join(&store, container, &owner, &member);

        update_access(&store, container, &owner, &admin, MemberRole::Admin).unwrap();
        // same role again is fine
        let again = update_access(&store, container, &owner, &admin, MemberRole::Admin).unwrap();
        assert_eq!(again.role, MemberRole::Admin);

        assert_eq!(
            update_access(&store, container, &admin, &member, MemberRole::Admin),
            Err(ServiceError::Forbidden)
        );
        assert!(matches!(
            update_access(&store, container, &owner, &member, MemberRole::Owner),
            Err(ServiceError::BadRequest(_))
        ));
        assert!(matches!(
            update_access(&store, container, &owner, &owner, MemberRole::Member),
            Err(ServiceError::BadRequest(_))
        ));
        assert_eq!(
            update_access(&store, container, &owner, "no-such-user", MemberRole::Admin),
            Err(ServiceError::NotFound)
        );
    }

    #[test]
    fn invites_require_admin_and_accepts_require_the_invitee() {
        let store = MemoryStore::new();
        let owner = add_user(&store, "Jeff");
        let admin = add_user(&store, "Jon");
        let member = add_user(&store, "Amanda");
        let newcomer = add_user(&store, "Bjarke");
        let created = create_container(&store, ContainerKind::Board, &owner, "Invites").unwrap();
        let container = ContainerRef::new(ContainerKind::Board, &created.id);
        join(&store, container, &owner, &admin);
        join(&store, container, &owner, &member);
        update_access(&store, container, &owner, &admin, MemberRole::Admin).unwrap();

        assert_eq!(invite(&store, container, &member, &newcomer), Err(ServiceError::Forbidden));
        assert_eq!(invite(&store, container, &admin, "ghost"), Err(ServiceError::NotFound));

        let invited = invite(&store, container, &admin, &newcomer).unwrap();
        assert_eq!(invited.status, MemberStatus::Invited);
        assert_eq!(invited.role, MemberRole::Member);
        assert!(matches!(
            invite(&store, container, &owner, &newcomer),
            Err(ServiceError::Conflict(_))
        ));

        assert_eq!(accept(&store, container, &owner, &newcomer), Err(ServiceError::Forbidden));
        let accepted = accept(&store, container, &newcomer, &newcomer).unwrap();
        assert_eq!(accepted.status, MemberStatus::Active);
        assert_eq!(accept(&store, container, &newcomer, &newcomer), Ok(accepted));

        let outsider = add_user(&store, "Eve");
        assert_eq!(accept(&store, container, &outsider, &outsider), Err(ServiceError::NotFound));
    }

    #[test]
    fn invited_members_are_listed_with_their_status() {
        let store = MemoryStore::new();
        let owner = add_user(&store, "Jeff");
        let pending = add_user(&store, "Amanda");
        let created = create_container(&store, ContainerKind::Space, &owner, "Pending").unwrap();
        let container = ContainerRef::new(ContainerKind::Space, &created.id);
        invite(&store, container, &owner, &pending).unwrap();

        let members = list_members(&store, container, &owner).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].status, MemberStatus::Invited);
    }

    #[test]
    fn container_names_are_required() {
        let store = MemoryStore::new();
        let owner = add_user(&store, "Jeff");

        assert!(matches!(
            create_container(&store, ContainerKind::Board, &owner, "   "),
            Err(ServiceError::BadRequest(_))
        ));
    }
}
