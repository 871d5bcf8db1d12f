// membership-service/src/routes/mod.rs
use actix_web::web;

pub mod member_routes;
pub mod user_routes;

// Register every route of the service
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    user_routes::init_routes(cfg);
    member_routes::init_routes(cfg);
}
