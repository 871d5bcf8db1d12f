// Per-test API client: every test builds its own app and store
use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App, Error};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::models::{ContainerKind, PublicUser, RegisterResponse};
use crate::routes;
use crate::store::{FileStore, MemoryStore};
use crate::utils::auth_middleware::Authentication;
use crate::AppState;

fn test_auth() -> AuthSettings {
    AuthSettings {
        jwt_secret: "test-secret".to_string(),
        token_ttl_days: 1,
        bcrypt_cost: 4,
    }
}

pub fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState::new(Arc::new(MemoryStore::new()), test_auth()))
}

// Same app over a FileStore rooted at `root`
pub fn file_state(root: &Path) -> web::Data<AppState> {
    let store = FileStore::open(root).expect("file store");
    web::Data::new(AppState::new(Arc::new(store), test_auth()))
}

pub fn temp_storage_root() -> PathBuf {
    std::env::temp_dir().join(format!("membership-http-{}", Uuid::new_v4()))
}

pub async fn init_app(
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    init_app_with(test_state()).await
}

pub async fn init_app_with(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(Authentication)
            .configure(routes::init_routes),
    )
    .await
}

/// A registered user and the token to act as them.
pub struct ApiUser {
    pub user: PublicUser,
    pub token: String,
}

impl ApiUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    fn authorize(&self, req: test::TestRequest) -> test::TestRequest {
        req.insert_header(("Authorization", format!("Bearer {}", self.token)))
    }

    pub fn get(&self, uri: &str) -> Request {
        self.authorize(test::TestRequest::get().uri(uri)).to_request()
    }

    pub fn post(&self, uri: &str, body: Value) -> Request {
        self.authorize(test::TestRequest::post().uri(uri))
            .set_json(body)
            .to_request()
    }

    pub fn put(&self, uri: &str, body: Value) -> Request {
        self.authorize(test::TestRequest::put().uri(uri))
            .set_json(body)
            .to_request()
    }
}

// Sends a request and returns the status with the body parsed as JSON
// (Null when the body is not JSON)
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn register<S, B>(app: &S, first_name: &str, last_name: &str) -> ApiUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let username = format!("{}{}", first_name.to_lowercase(), &Uuid::new_v4().to_string()[..8]);
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({
            "username": username,
            "firstName": first_name,
            "lastName": last_name,
            "email": format!("{}@example.com", username),
            "password": "correct horse battery staple"
        }))
        .to_request();

    let response: RegisterResponse = test::call_and_read_body_json(app, req).await;
    ApiUser {
        user: response.user,
        token: response.token,
    }
}

pub fn members_uri(kind: ContainerKind, container_id: &str) -> String {
    format!("{}/{}/members", kind.scope_path(), container_id)
}

pub fn member_uri(kind: ContainerKind, container_id: &str, user_id: &str) -> String {
    format!("{}/{}", members_uri(kind, container_id), user_id)
}

pub async fn create_container<S, B>(app: &S, owner: &ApiUser, kind: ContainerKind) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let (status, body) = send(app, owner.post(kind.scope_path(), json!({ "name": "Planning" }))).await;
    assert_eq!(status, StatusCode::OK, "creating a {} should succeed", kind);
    body["id"].as_str().expect("container id").to_string()
}

// Invite + accept, the way a member normally joins
pub async fn add_member<S, B>(
    app: &S,
    owner: &ApiUser,
    kind: ContainerKind,
    container_id: &str,
    member: &ApiUser,
) where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let (status, _) = send(
        app,
        owner.post(&members_uri(kind, container_id), json!({ "userId": member.id() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "invite should succeed");

    let accept_uri = format!("{}/accept", member_uri(kind, container_id, member.id()));
    let (status, body) = send(app, member.post(&accept_uri, json!({}))).await;
    assert_eq!(status, StatusCode::OK, "accept should succeed");
    assert_eq!(body["status"], "ACTIVE");
}
