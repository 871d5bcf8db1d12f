use crate::config::AuthSettings;
use crate::models::{Claims, ServiceError, User};
use actix_web::{HttpMessage, HttpRequest};
use bcrypt::hash;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::error;

// JWT utility functions
pub mod jwt {
    use super::*;

    // Generate a new JWT token for a user
    pub fn generate_token(user: &User, auth: &AuthSettings) -> Result<String, ServiceError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::days(auth.token_ttl_days))
            .ok_or(ServiceError::InternalServerError)?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            exp: expiration,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            error!("❌ Failed to sign token: {:?}", e);
            ServiceError::InternalServerError
        })
    }

    // Validate and decode a JWT token
    pub fn decode_token(token: &str, auth: &AuthSettings) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ServiceError::Unauthorized)
    }

    // Extract JWT from Authorization header
    pub fn extract_token_from_header(auth_header: &str) -> Result<&str, ServiceError> {
        auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ServiceError::Unauthorized)
    }
}

// Password utility functions
pub mod password {
    use super::*;

    pub fn hash_password(password: &str, cost: u32) -> Result<String, ServiceError> {
        hash(password, cost).map_err(|e| {
            error!("❌ Failed to hash password: {:?}", e);
            ServiceError::InternalServerError
        })
    }
}

// Resolves the requester from the claims the authentication middleware attached
pub fn get_user_id_from_request(req: &HttpRequest) -> Result<String, ServiceError> {
    req.extensions()
        .get::<Claims>()
        .map(|claims| claims.sub.clone())
        .ok_or(ServiceError::Unauthorized)
}

// Middleware for JWT authentication
pub mod auth_middleware {
    use super::*;
    use crate::AppState;
    use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
    use actix_web::http::header;
    use actix_web::{web, Error};
    use futures::future::{ok, LocalBoxFuture, Ready};
    use log::warn;

    /// Attaches the bearer token's claims to the request. Requests without a
    /// valid token pass through untouched; handlers that need a requester
    /// reject them via `get_user_id_from_request`.
    pub struct Authentication;

    impl<S, B> Transform<S, ServiceRequest> for Authentication
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
        S::Future: 'static,
        B: 'static,
    {
        type Response = ServiceResponse<B>;
        type Error = Error;
        type Transform = AuthenticationMiddleware<S>;
        type InitError = ();
        type Future = Ready<Result<Self::Transform, Self::InitError>>;

        fn new_transform(&self, service: S) -> Self::Future {
            ok(AuthenticationMiddleware { service })
        }
    }

    pub struct AuthenticationMiddleware<S> {
        service: S,
    }

    impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
        S::Future: 'static,
        B: 'static,
    {
        type Response = ServiceResponse<B>;
        type Error = Error;
        type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

        forward_ready!(service);

        fn call(&self, req: ServiceRequest) -> Self::Future {
            if let Some(claims) = claims_from_request(&req) {
                req.extensions_mut().insert(claims);
            }

            let fut = self.service.call(req);
            Box::pin(async move { fut.await })
        }
    }

    fn claims_from_request(req: &ServiceRequest) -> Option<Claims> {
        let auth_header = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
        let state = req.app_data::<web::Data<AppState>>()?;
        let token = jwt::extract_token_from_header(auth_header).ok()?;

        match jwt::decode_token(token, &state.auth) {
            Ok(claims) => Some(claims),
            Err(_) => {
                warn!("⚠️ Rejected bearer token on {}", req.path());
                None
            }
        }
    }
}
