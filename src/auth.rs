//! Authentication module.

use crate::error::{AppError, Result};
use crate::store::{NewUser, Session, Store, User, now_timestamp};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a secure random token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Minimal shape check for email addresses. Real validation happens when
/// mail is actually sent; this only rejects obvious garbage.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Authentication service.
pub struct AuthService {
    store: Store,
    session_duration_days: u32,
    registration_enabled: bool,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(store: Store, session_duration_days: u32, registration_enabled: bool) -> Self {
        Self {
            store,
            session_duration_days,
            registration_enabled,
        }
    }

    /// Register a new user account.
    pub fn register(&self, email: &str, password: &str, name: &str) -> Result<User> {
        if !self.registration_enabled {
            return Err(AppError::Forbidden("Registration is disabled".to_string()));
        }

        self.create_user(email, password, name, "user")
    }

    /// Create a new user (admin function).
    pub fn create_user(&self, email: &str, password: &str, name: &str, role: &str) -> Result<User> {
        if !is_valid_email(email) {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }

        if password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        if name.trim().is_empty() {
            return Err(AppError::Validation("Name must not be empty".to_string()));
        }

        if role != "admin" && role != "user" {
            return Err(AppError::Validation(
                "Role must be 'admin' or 'user'".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;

        self.store.create_user(&NewUser {
            email: email.to_string(),
            password_hash,
            name: name.to_string(),
            role: role.to_string(),
            is_blocked: false,
        })
    }

    /// Login and create a session. Returns the user and a bearer token.
    pub fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        if user.is_blocked {
            return Err(AppError::Forbidden("Account is blocked".to_string()));
        }

        let token = generate_token();
        let session = Session {
            token: token.clone(),
            user_id: user.id.clone(),
            expires_at: now_timestamp() + i64::from(self.session_duration_days) * 86400,
        };
        self.store.create_session(&session)?;

        Ok((user, token))
    }

    /// Validate a bearer token. Returns None for unknown, expired, or
    /// blocked accounts.
    pub fn validate_token(&self, token: &str) -> Result<Option<User>> {
        let Some(session) = self.store.get_session(token)? else {
            return Ok(None);
        };

        if session.expires_at < now_timestamp() {
            self.store.delete_session(token)?;
            return Ok(None);
        }

        let Some(user) = self.store.get_user(&session.user_id)? else {
            return Ok(None);
        };

        if user.is_blocked {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Logout: delete the session for a token.
    pub fn logout(&self, token: &str) -> Result<()> {
        self.store.delete_session(token)
    }

    /// Check if a user has the admin role.
    pub fn is_admin(&self, user: &User) -> bool {
        user.role == "admin"
    }
}
