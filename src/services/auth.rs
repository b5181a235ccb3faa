//! Authentication and registration service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};

use crate::{
    config::{AuthConfig, BootstrapAdmin},
    error::{AppError, AppResult},
    models::user::{NewUser, RegisterUser, User, UserClaims},
    repository::Repository,
};

/// Hash a password with argon2id and a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC hash string
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    fn token_ttl(&self) -> Duration {
        Duration::minutes(self.config.token_expiration_minutes)
    }

    /// Register a new (non-admin) user
    pub async fn register(&self, request: &RegisterUser) -> AppResult<User> {
        if self.repository.users.username_exists(&request.username).await? {
            tracing::warn!(username = %request.username, "Registration with existing username");
            return Err(AppError::Conflict("Username already registered".to_string()));
        }

        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(&NewUser {
                username: &request.username,
                email: &request.email,
                password_hash: &password_hash,
                is_admin: false,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue a bearer token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(IssuedToken, User)> {
        let invalid = || AppError::Authentication("Invalid username or password".to_string());

        let user = match self.repository.users.get_by_username(username).await? {
            Some(user) => user,
            None => {
                tracing::warn!(username = %username, "Login for unknown user");
                return Err(invalid());
            }
        };

        if !verify_password(password, &user.password_hash) {
            tracing::warn!(user_id = user.id, "Login with wrong password");
            return Err(invalid());
        }

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok((token, user))
    }

    /// Sign a token for `user`
    pub fn issue_token(&self, user: &User) -> AppResult<IssuedToken> {
        let ttl = self.token_ttl();
        let access_token = UserClaims::for_user(user, Utc::now(), ttl)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(IssuedToken {
            access_token,
            expires_in: ttl.num_seconds(),
        })
    }

    /// Validate a bearer token and load its subject
    pub async fn resolve(&self, token: &str) -> AppResult<User> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))?;

        let user = self
            .repository
            .users
            .get_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Authentication("Unknown token subject".to_string()))?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        Ok(user)
    }

    /// Create the configured admin account, or promote it if it already exists
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> AppResult<User> {
        if let Some(mut user) = self.repository.users.get_by_username(&admin.username).await? {
            if !user.is_admin {
                self.repository.users.promote_to_admin(user.id).await?;
                user.is_admin = true;
                tracing::info!(user_id = user.id, "Promoted bootstrap account to admin");
            }
            return Ok(user);
        }

        let password_hash = hash_password(&admin.password)?;
        let user = self
            .repository
            .users
            .create(&NewUser {
                username: &admin.username,
                email: &admin.email,
                password_hash: &password_hash,
                is_admin: true,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Created bootstrap admin");
        Ok(user)
    }
}
