// membership-service/src/routes/member_routes.rs
use crate::models::{
    ContainerKind, CreateContainerRequest, InviteMemberRequest, ServiceError, UpdateAccessRequest,
};
use crate::services::access_service::{self, ContainerRef};
use crate::utils::get_user_id_from_request;
use crate::AppState;
use actix_web::{get, post, put, web, HttpRequest, HttpResponse};
use log::{error, info, warn};

// Logs a refused or failed call before handing the error back to actix
fn refused<'a>(action: &'a str, user_id: &'a str) -> impl FnOnce(ServiceError) -> ServiceError + 'a {
    move |err| {
        match &err {
            ServiceError::InternalServerError => error!("❌ {} failed for user: {}", action, user_id),
            other => warn!("❌ {} refused for user: {} ({})", action, user_id, other),
        }
        err
    }
}

// Create a new board or space owned by the requester
#[post("")]
async fn create_container(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: web::Data<ContainerKind>,
    data: web::Json<CreateContainerRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    info!("📝 Creating new {}: {} for user: {}", kind.get_ref(), data.name, user_id);

    let container =
        access_service::create_container(state.store.as_ref(), **kind, &user_id, &data.name)
            .map_err(refused("Create container", &user_id))?;

    info!("✅ {} created successfully: {}", container.kind, container.id);

    Ok(HttpResponse::Ok().json(container))
}

// Get the ordered member list of a container
#[get("/{container_id}/members")]
async fn get_members(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: web::Data<ContainerKind>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let container_id = path.into_inner();

    info!("📋 Fetching members for {}: {}", kind.get_ref(), container_id);

    let container = ContainerRef::new(**kind, &container_id);
    let members = access_service::list_members(state.store.as_ref(), container, &user_id)
        .map_err(refused("List members", &user_id))?;

    info!("✅ Found {} members", members.len());

    Ok(HttpResponse::Ok().json(members))
}

// Invite an existing user into a container
#[post("/{container_id}/members")]
async fn invite_member(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: web::Data<ContainerKind>,
    path: web::Path<String>,
    data: web::Json<InviteMemberRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let container_id = path.into_inner();

    info!("📧 Inviting user: {} to {}: {}", data.user_id, kind.get_ref(), container_id);

    let container = ContainerRef::new(**kind, &container_id);
    let access = access_service::invite(state.store.as_ref(), container, &user_id, &data.user_id)
        .map_err(refused("Invite", &user_id))?;

    info!("✅ Invitation created for user: {}", data.user_id);

    Ok(HttpResponse::Ok().json(access))
}

// Get a single member's access record
#[get("/{container_id}/members/{user_id}")]
async fn get_member_access(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: web::Data<ContainerKind>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let (container_id, target_user_id) = path.into_inner();

    info!("🔍 Fetching access of user: {} in {}: {}", target_user_id, kind.get_ref(), container_id);

    let container = ContainerRef::new(**kind, &container_id);
    let access =
        access_service::get_access(state.store.as_ref(), container, &user_id, &target_user_id)
            .map_err(refused("Get access", &user_id))?;

    Ok(HttpResponse::Ok().json(access))
}

// Update a member's role
#[put("/{container_id}/members/{user_id}")]
async fn update_member_access(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: web::Data<ContainerKind>,
    path: web::Path<(String, String)>,
    data: web::Json<UpdateAccessRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let (container_id, target_user_id) = path.into_inner();

    info!("🔄 Updating role for user: {} in {}: {}", target_user_id, kind.get_ref(), container_id);

    let container = ContainerRef::new(**kind, &container_id);
    let access = access_service::update_access(
        state.store.as_ref(),
        container,
        &user_id,
        &target_user_id,
        data.role,
    )
    .map_err(refused("Update access", &user_id))?;

    info!("✅ User: {} now has role: {:?}", target_user_id, access.role);

    Ok(HttpResponse::Ok().json(access))
}

// Accept a pending invitation
#[post("/{container_id}/members/{user_id}/accept")]
async fn accept_invite(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: web::Data<ContainerKind>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;
    let (container_id, target_user_id) = path.into_inner();

    info!("🤝 User: {} accepting invite to {}: {}", user_id, kind.get_ref(), container_id);

    let container = ContainerRef::new(**kind, &container_id);
    let access =
        access_service::accept(state.store.as_ref(), container, &user_id, &target_user_id)
            .map_err(refused("Accept invite", &user_id))?;

    info!("✅ User: {} joined {}: {}", user_id, kind.get_ref(), container_id);

    Ok(HttpResponse::Ok().json(access))
}

// Boards and spaces are served by the same handlers, one scope per kind
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    for kind in ContainerKind::ALL {
        cfg.service(
            web::scope(kind.scope_path())
                .app_data(web::Data::new(kind))
                .service(create_container)
                .service(get_members)
                .service(invite_member)
                .service(get_member_access)
                .service(update_member_access)
                .service(accept_invite),
        );
    }
}
