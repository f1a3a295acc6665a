//! User administration through the façade.
//!
//! These endpoints require an administrator session; the server answers
//! 403 otherwise.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Result, StackError};
use crate::stack::Stack;
use crate::stack::browse::count_field;
use crate::users::{QUOTA_UNLIMITED, User};

/// Page size for user listings.
const USERS_PAGE_SIZE: u64 = 50;

const ACCESS_DENIED: &str =
    "Unable to list users, access denied. Please log in with the administrator account.";

impl Stack {
    /// List all users registered to this account.
    pub async fn users(&self) -> Result<Vec<User>> {
        let mut offset = 0u64;
        let mut users = Vec::new();

        loop {
            let page = self.users_page(offset, USERS_PAGE_SIZE, "").await?;
            let amount = count_field(&page, "amountUsers")?;

            if let Some(entries) = page.get("users").and_then(Value::as_array) {
                for entry in entries {
                    users.push(User::from_value(self.remote.clone(), entry)?);
                }
            }

            offset += USERS_PAGE_SIZE;
            if offset >= amount {
                break;
            }
        }

        Ok(users)
    }

    /// Look up a user by username.
    pub async fn user(&self, name: &str) -> Result<User> {
        let page = self.users_page(0, 1, name).await?;

        let entry = page
            .get("users")
            .and_then(Value::as_array)
            .and_then(|users| users.first())
            .ok_or_else(|| StackError::NotFound(format!("Unable to find user '{}'", name)))?;

        User::from_value(self.remote.clone(), entry)
    }

    /// Create a new user account.
    ///
    /// `disk_quota` is in bytes; `None` and zero both grant unlimited
    /// space. The
    /// created user is re-fetched by name so the returned object is
    /// authoritative.
    pub async fn create_user(
        &self,
        name: &str,
        username: &str,
        password: &str,
        disk_quota: Option<u64>,
    ) -> Result<User> {
        if self.enforce_password_policy && password.len() < 8 {
            return Err(StackError::InvalidArgument(
                "Password must be at least 8 characters long!".to_string(),
            ));
        }

        let quota = match disk_quota {
            Some(bytes) if bytes > 0 => bytes as i64,
            _ => QUOTA_UNLIMITED,
        };

        let action = json!({
            "action": "create",
            "user": {
                "username": username,
                "newUser": true,
                "isPublic": false,
                "password": password,
                "displayName": name,
                "quota": quota,
            },
        });

        let response = self
            .remote
            .api
            .post_json("/api/users/update", &json!([action]))
            .await?;

        let status = response.status();
        if status.as_u16() == 409 {
            return Err(StackError::ActionFailed {
                message: format!(
                    "Unable to create user '{}', either you don't have permission \
                     to do so or the user already exists!",
                    username
                ),
                response: None,
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StackError::Http {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let body: Value = response.json().await?;
        if body.get("status").and_then(Value::as_str) != Some("ok") {
            return Err(StackError::action_failed(
                &format!("Unable to create user '{}'", username),
                body,
            ));
        }

        debug!(username, "created user");
        self.user(username).await
    }

    /// Look up a user, creating it when it does not exist.
    ///
    /// Only a not-found result triggers creation; permission errors and
    /// transport failures propagate unchanged.
    pub async fn user_or_create_new(
        &self,
        name: &str,
        username: &str,
        password: &str,
        disk_quota: Option<u64>,
    ) -> Result<User> {
        match self.user(username).await {
            Ok(user) => Ok(user),
            Err(StackError::NotFound(_)) => {
                self.create_user(name, username, password, disk_quota).await
            }
            Err(err) => Err(err),
        }
    }

    /// Fetch one page from `/api/users`, mapping 403 to access denial.
    async fn users_page(&self, offset: u64, limit: u64, query: &str) -> Result<Value> {
        let params = [
            ("public", "false".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("query", query.to_string()),
        ];

        let response = self.remote.api.get("/api/users", &params).await?;

        let status = response.status();
        if status.as_u16() == 403 {
            return Err(StackError::AccessDenied(ACCESS_DENIED.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StackError::Http {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        Ok(response.json().await?)
    }
}
