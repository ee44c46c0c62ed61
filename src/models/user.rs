use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

/// Public view of a user; what `/api/auth/me` and the auth responses return.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl SignupRequest {
    /// Lower-case the email, trim the free-text fields, and blank names become None.
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            username: self.username.trim().to_string(),
            password: self.password,
            first_name: trim_optional(self.first_name),
            last_name: trim_optional(self.last_name),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_normalizes_before_validation() {
        let json = r#"{"email":"  Ada@Example.COM ","username":"  ada  ","password":"secret1","firstName":"  "}"#;
        let req: SignupRequest = serde_json::from_str(json).unwrap();
        let req = req.normalized();
        assert_eq!(req.email, "ada@example.com");
        assert_eq!(req.username, "ada");
        assert!(req.first_name.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_signup_rejects_short_password_and_username() {
        let req = SignupRequest {
            email: "ada@example.com".into(),
            username: "ad".into(),
            password: "12345".into(),
            first_name: None,
            last_name: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_login_requires_valid_email() {
        let req = LoginRequest {
            email: "not-an-email".into(),
            password: "whatever".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            password_hash: "$argon2id$v=19$...".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let raw = serde_json::to_value(&user).unwrap();
        assert!(raw.get("password_hash").is_none());

        let profile: UserProfile = user.into();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["username"], "ada");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["role"], "USER");
    }
}
