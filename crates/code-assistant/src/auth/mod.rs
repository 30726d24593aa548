//! User registration, login and bearer-token authentication

mod extractor;
pub mod password;
pub mod token;

pub use extractor::{AuthUser, MaybeAuthUser};
pub use password::{hash_password, verify_password};
pub use token::{issue_token, verify_token, Claims};

use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::storage::Database;
use crate::types::User;

/// Shortest accepted password, in characters
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Login form (OAuth2 password flow field names)
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Account operations over the user table
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: Database, config: AuthConfig) -> Self {
        Self { db, config }
    }

    /// Create an account. Email and username must be unused.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let email = request.email.trim().to_lowercase();
        let username = request.username.trim().to_string();

        if email.is_empty() || !email.contains('@') {
            return Err(Error::bad_request("A valid email is required"));
        }
        if username.is_empty() {
            return Err(Error::bad_request("Username is required"));
        }
        if request.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(Error::bad_request(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }

        let iterations = self.config.password_iterations;
        let password = request.password;
        let hashed =
            tokio::task::spawn_blocking(move || hash_password(&password, iterations)).await??;

        let full_name = request
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let user = User::new(email, username, hashed, full_name);
        self.db.create_user(&user)?;

        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Check credentials and issue an access token. The username field also accepts an email.
    pub async fn login(&self, form: LoginForm) -> Result<TokenResponse> {
        let name = form.username.trim();
        let user = match self.db.get_user_by_username(name)? {
            Some(user) => Some(user),
            None => self.db.get_user_by_email(&name.to_lowercase())?,
        };
        let user = user.ok_or_else(|| Error::unauthorized("Incorrect username or password"))?;

        let stored = user.hashed_password.clone();
        let password = form.password;
        let valid =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?;
        if !valid {
            tracing::warn!("Failed login for {}", user.username);
            return Err(Error::unauthorized("Incorrect username or password"));
        }
        if !user.is_active {
            return Err(Error::unauthorized("Inactive user"));
        }

        Ok(TokenResponse {
            access_token: issue_token(user.id, &self.config.secret_key, self.config.token_ttl_minutes)?,
            token_type: "bearer".to_string(),
        })
    }

    /// Resolve a bearer token to an active user
    pub fn authenticate(&self, token: &str) -> Result<User> {
        let claims = verify_token(token, &self.config.secret_key)?;
        let user = self
            .db
            .get_user(claims.sub)?
            .ok_or_else(|| Error::unauthorized("Could not validate credentials"))?;
        if !user.is_active {
            return Err(Error::unauthorized("Inactive user"));
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let config = AuthConfig {
            password_iterations: 10,
            ..AuthConfig::default()
        };
        AuthService::new(Database::in_memory().unwrap(), config)
    }

    fn request(email: &str, username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            full_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_login_authenticate() {
        let auth = service();
        let user = auth.register(request("Ada@Example.com", "ada", "secret1")).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(user.hashed_password.starts_with("10$"));

        let token = auth
            .login(LoginForm {
                username: "ada".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(auth.authenticate(&token.access_token).unwrap().id, user.id);

        let by_email = auth
            .login(LoginForm {
                username: "ada@example.com".into(),
                password: "secret1".into(),
            })
            .await;
        assert!(by_email.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let auth = service();
        auth.register(request("a@b.c", "bob", "secret1")).await.unwrap();
        let result = auth
            .login(LoginForm {
                username: "bob".into(),
                password: "wrong".into(),
            })
            .await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_register_validation_and_conflicts() {
        let auth = service();
        assert!(matches!(
            auth.register(request("a@b.c", "carol", "12345")).await,
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            auth.register(request("not-an-email", "carol", "123456")).await,
            Err(Error::BadRequest(_))
        ));

        auth.register(request("a@b.c", "carol", "123456")).await.unwrap();
        assert!(matches!(
            auth.register(request("a@b.c", "dave", "123456")).await,
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            auth.register(request("x@y.z", "carol", "123456")).await,
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_unknown_user_token_rejected() {
        let auth = service();
        let token = issue_token(uuid::Uuid::new_v4(), &AuthConfig::default().secret_key, 5).unwrap();
        assert!(matches!(auth.authenticate(&token), Err(Error::Unauthorized(_))));
    }
}
