use crate::models::{PublicUser, RegisterRequest, RegisterResponse, ServiceError, User};
use crate::utils::{get_user_id_from_request, jwt, password};
use crate::AppState;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info};
use serde_json::json;
use uuid::Uuid;

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().body("membership-service: board and space access API")
}

// Register a new user and hand back a token for it
#[post("/users")]
async fn register(
    state: web::Data<AppState>,
    data: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ServiceError> {
    let data = data.into_inner();
    info!("📝 Register request for username: {}", data.username);

    let required = [
        ("username", &data.username),
        ("firstName", &data.first_name),
        ("lastName", &data.last_name),
        ("email", &data.email),
        ("password", &data.password),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ServiceError::BadRequest(format!("'{}' must not be empty", field)));
    }

    let username = data.username.trim();
    if state.store.find_user_by_username(username)?.is_some() {
        error!("❌ Username already registered: {}", username);
        return Err(ServiceError::Conflict("Username already registered".to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        first_name: data.first_name.trim().to_string(),
        last_name: data.last_name.trim().to_string(),
        email: data.email.trim().to_string(),
        password_hash: password::hash_password(&data.password, state.auth.bcrypt_cost)?,
        created_at: Utc::now(),
    };

    state.store.save_user(&user)?;
    let token = jwt::generate_token(&user, &state.auth)?;

    info!("✅ User registered successfully: {}", user.id);

    Ok(HttpResponse::Ok()
        .append_header(("Authorization", format!("Bearer {}", token)))
        .json(RegisterResponse {
            user: PublicUser::from(&user),
            token,
        }))
}

// Get current user info (requires authentication)
#[get("/users/me")]
async fn me(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let user_id = get_user_id_from_request(&req)?;

    let user = match state.store.find_user_by_id(&user_id)? {
        Some(user) => user,
        None => {
            error!("❌ Token refers to unknown user: {}", user_id);
            return Err(ServiceError::Unauthorized);
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "user": PublicUser::from(&user),
        "email": user.email,
        "createdAt": user.created_at
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(register).service(me);
}
