use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::user;

pub use crate::entities::user::Role;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // Subject (user ID)
    pub email: Option<String>,    // User's email
    pub role: Role,               // Account role
    pub business_id: Option<i64>, // Business owned by this account
    pub jti: String,              // JWT ID
    pub iat: i64,                 // Issued at time
    pub exp: i64,                 // Expiration time
    pub nbf: i64,                 // Not valid before time
    pub iss: String,              // Issuer
    pub aud: String,              // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: Option<String>,
    pub role: Role,
    pub business_id: Option<i64>,
    pub token_id: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when this account may mutate data belonging to the given business
    pub fn can_manage_business(&self, business_id: i64) -> bool {
        self.is_admin() || self.business_id == Some(business_id)
    }
}

/// The session contract exposed to clients: who am I, what can I manage
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    pub user_id: i64,
    pub role: Role,
    pub business_id: Option<i64>,
}

impl From<&AuthUser> for SessionInfo {
    fn from(user: &AuthUser) -> Self {
        Self {
            user_id: user.user_id,
            role: user.role,
            business_id: user.business_id,
        }
    }
}

/// Access/refresh token pair returned by login and refresh
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                self.to_string(),
            ),
            Self::InvalidToken(_) | Self::ExpiredToken => {
                (StatusCode::UNAUTHORIZED, "AUTH_INVALID_TOKEN", self.to_string())
            }
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                self.to_string(),
            ),
            Self::AccountDisabled => (
                StatusCode::FORBIDDEN,
                "AUTH_ACCOUNT_DISABLED",
                self.to_string(),
            ),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "AUTH_FORBIDDEN", self.to_string()),
            Self::ValidationFailed(_) => (
                StatusCode::BAD_REQUEST,
                "AUTH_VALIDATION_FAILED",
                self.to_string(),
            ),
            Self::Conflict(_) => (StatusCode::CONFLICT, "AUTH_CONFLICT", self.to_string()),
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal authentication error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
            refresh_token_expiration,
        }
    }
}

/// Issued refresh token bookkeeping; rotation invalidates the previous jti
#[derive(Clone, Debug)]
struct StoredRefreshToken {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

/// Authentication service that handles registration, login, and token validation
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
    refresh_tokens: Arc<RwLock<HashMap<String, StoredRefreshToken>>>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self {
            config,
            db,
            refresh_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a new owner account
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, AuthError> {
        input
            .validate()
            .map_err(|e| AuthError::ValidationFailed(e.to_string()))?;

        // Duplicate email is checked explicitly for a friendlier error than
        // the raw unique violation
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(input.email.to_lowercase()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        if existing.is_some() {
            return Err(AuthError::Conflict(format!(
                "An account with email {} already exists",
                input.email
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(format!("Password hashing failed: {}", e)))?
            .to_string();

        let account = user::ActiveModel {
            email: Set(input.email.to_lowercase()),
            password_hash: Set(password_hash),
            display_name: Set(input.display_name),
            role: Set(Role::Owner),
            business_id: Set(None),
            ..Default::default()
        };

        let account = account
            .insert(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        info!("Registered account {}", account.id);
        Ok(account)
    }

    /// Verifies credentials and issues a token pair
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let account = user::Entity::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let parsed_hash = PasswordHash::new(&account.password_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        self.generate_token(&account).await
    }

    /// Generates a JWT token pair for a user
    pub async fn generate_token(&self, account: &user::Model) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;
        let refresh_exp = now
            + ChronoDuration::from_std(self.config.refresh_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let access_jti = Uuid::new_v4().to_string();
        let refresh_jti = Uuid::new_v4().to_string();

        let access_claims = Claims {
            sub: account.id.to_string(),
            email: Some(account.email.clone()),
            role: account.role,
            business_id: account.business_id,
            jti: access_jti,
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        // Refresh token carries minimal data; role/business are reloaded on use
        let refresh_claims = Claims {
            sub: account.id.to_string(),
            email: None,
            role: account.role,
            business_id: None,
            jti: refresh_jti.clone(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &access_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        let refresh_token = encode(
            &Header::new(Algorithm::HS256),
            &refresh_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        self.refresh_tokens.write().await.insert(
            refresh_jti,
            StoredRefreshToken {
                user_id: account.id,
                expires_at: refresh_exp,
            },
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validates a JWT and returns its claims
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);
        validation.set_audience(&[self.config.jwt_audience.clone()]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        Ok(token_data.claims)
    }

    /// Exchanges a refresh token for a fresh pair.
    /// Each refresh token is single-use: the presented jti is retired.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.validate_token(refresh_token).await?;

        let stored = self.refresh_tokens.write().await.remove(&claims.jti);
        let stored = stored.ok_or_else(|| {
            warn!("Refresh token reuse or unknown jti");
            AuthError::InvalidToken("Refresh token is no longer valid".to_string())
        })?;

        if stored.expires_at < Utc::now() {
            return Err(AuthError::ExpiredToken);
        }

        // Reload so role and business linkage reflect current state
        let account = user::Entity::find_by_id(stored.user_id)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.generate_token(&account).await
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

fn auth_user_from_claims(claims: Claims) -> Result<AuthUser, AuthError> {
    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AuthError::InvalidToken("Malformed subject".to_string()))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        role: claims.role,
        business_id: claims.business_id,
        token_id: claims.jti,
    })
}

async fn extract_auth_from_parts(
    parts: &Parts,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MissingAuth)?;

    let claims = auth_service.validate_token(token).await?;
    auth_user_from_claims(claims)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // auth_middleware may already have resolved the user
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let auth_service = parts
            .extensions
            .get::<Arc<AuthService>>()
            .cloned()
            .ok_or_else(|| {
                AuthError::InternalError("Authentication service not available".to_string())
            })?;

        extract_auth_from_parts(parts, &auth_service).await
    }
}

/// Resolves the caller and stores it in request extensions
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    let (mut parts, body) = request.into_parts();
    let auth_result = extract_auth_from_parts(&parts, &auth_service).await;
    match auth_result {
        Ok(user) => {
            parts.extensions.insert(user);
            request = Request::from_parts(parts, body);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Rejects callers whose role does not match the required one
pub async fn role_middleware(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Response {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.role == required || user.is_admin() => next.run(request).await,
        Some(_) => AuthError::Forbidden(format!("Requires {} role", required)).into_response(),
        None => AuthError::MissingAuth.into_response(),
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: Role) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: Role) -> Self {
        self.layer(axum::middleware::from_fn_with_state(role, role_middleware))
            .with_auth()
    }
}

// ---- HTTP surface ----

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterInput {
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 80, message = "Display name is required"))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshInput {
    pub refresh_token: String,
}

async fn register_handler(
    State(auth): State<Arc<AuthService>>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse, AuthError> {
    let account = auth.register(input).await?;
    let tokens = auth.generate_token(&account).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

async fn login_handler(
    State(auth): State<Arc<AuthService>>,
    Json(input): Json<LoginInput>,
) -> Result<Json<TokenPair>, AuthError> {
    let tokens = auth.login(&input.email, &input.password).await?;
    Ok(Json(tokens))
}

async fn refresh_handler(
    State(auth): State<Arc<AuthService>>,
    Json(input): Json<RefreshInput>,
) -> Result<Json<TokenPair>, AuthError> {
    let tokens = auth.refresh(&input.refresh_token).await?;
    Ok(Json(tokens))
}

async fn session_handler(user: AuthUser) -> Json<SessionInfo> {
    Json(SessionInfo::from(&user))
}

/// Routes for registration, login, token refresh, and session introspection
pub fn auth_routes() -> Router<Arc<AuthService>> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/session", get(session_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        let config = AuthConfig::new(
            "test_secret_key_for_testing_purposes_only_0123456789abcdef".to_string(),
            "mainstreet-auth".to_string(),
            "mainstreet-api".to_string(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        );
        // The db connection is unused by the token paths under test
        let db = Arc::new(DatabaseConnection::Disconnected);
        AuthService::new(config, db)
    }

    fn test_account() -> user::Model {
        user::Model {
            id: 42,
            email: "owner@example.com".to_string(),
            password_hash: String::new(),
            display_name: "Owner".to_string(),
            role: Role::Owner,
            business_id: Some(7),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn token_round_trip_preserves_claims() {
        let service = test_service();
        let pair = service.generate_token(&test_account()).await.unwrap();

        let claims = service.validate_token(&pair.access_token).await.unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.business_id, Some(7));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let service = test_service();
        let pair = service.generate_token(&test_account()).await.unwrap();

        let mut tampered = pair.access_token.clone();
        tampered.push('x');
        assert!(service.validate_token(&tampered).await.is_err());
    }

    #[tokio::test]
    async fn refresh_token_is_single_use() {
        let service = test_service();
        let account = test_account();
        let pair = service.generate_token(&account).await.unwrap();

        // First use consumes the stored jti; reuse must fail even before the
        // DB lookup happens
        let jti = service
            .validate_token(&pair.refresh_token)
            .await
            .unwrap()
            .jti;
        assert!(service.refresh_tokens.write().await.remove(&jti).is_some());

        let err = service.refresh(&pair.refresh_token).await;
        assert!(err.is_err());
    }

    #[test]
    fn owner_can_manage_only_their_business() {
        let user = AuthUser {
            user_id: 1,
            email: None,
            role: Role::Owner,
            business_id: Some(5),
            token_id: "t".to_string(),
        };
        assert!(user.can_manage_business(5));
        assert!(!user.can_manage_business(6));

        let admin = AuthUser {
            user_id: 2,
            email: None,
            role: Role::Admin,
            business_id: None,
            token_id: "t".to_string(),
        };
        assert!(admin.can_manage_business(5));
    }
}
