//! STACK account users and their administration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Result, StackError};
use crate::stack::Remote;

/// Quota sentinel the server uses for "unlimited".
pub const QUOTA_UNLIMITED: i64 = -1;

fn default_quota() -> i64 {
    QUOTA_UNLIMITED
}

fn default_language() -> String {
    "nl_NL".to_string()
}

/// Typed property bag backing a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProps {
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
    pub is_premium: bool,
    /// Disk quota in bytes; [`QUOTA_UNLIMITED`] means no limit.
    pub quota: i64,
    pub used: u64,
    pub language: String,
    /// Staged password change, only serialized while pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for UserProps {
    fn default() -> Self {
        Self {
            username: String::new(),
            display_name: String::new(),
            is_admin: false,
            is_premium: false,
            quota: default_quota(),
            used: 0,
            language: default_language(),
            password: None,
        }
    }
}

/// A user account on the STACK instance.
///
/// Setters stage changes locally; nothing reaches the server until
/// [`User::save`] submits the full property set in one update action.
#[derive(Debug, Clone)]
pub struct User {
    remote: Arc<Remote>,
    props: UserProps,
}

impl User {
    pub(crate) fn from_value(remote: Arc<Remote>, value: &Value) -> Result<Self> {
        Ok(Self {
            remote,
            props: serde_json::from_value(value.clone())?,
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.props.display_name
    }

    /// Stage a new display name.
    pub fn set_name(&mut self, name: &str) {
        self.props.display_name = name.to_string();
    }

    pub fn username(&self) -> &str {
        &self.props.username
    }

    /// Stage a new username.
    pub fn set_username(&mut self, username: &str) {
        self.props.username = username.to_string();
    }

    pub fn is_admin(&self) -> bool {
        self.props.is_admin
    }

    pub fn is_premium(&self) -> bool {
        self.props.is_premium
    }

    /// Disk quota in bytes, `None` when unlimited.
    pub fn disk_quota(&self) -> Option<u64> {
        if self.props.quota > 0 {
            Some(self.props.quota as u64)
        } else {
            None
        }
    }

    /// Stage a new disk quota; `None` and zero both mean unlimited.
    pub fn set_disk_quota(&mut self, quota: Option<u64>) {
        self.props.quota = match quota {
            Some(bytes) if bytes > 0 => bytes as i64,
            _ => QUOTA_UNLIMITED,
        };
    }

    /// Bytes currently in use.
    pub fn disk_used(&self) -> u64 {
        self.props.used
    }

    pub fn language(&self) -> &str {
        &self.props.language
    }

    /// Stage a new interface language, e.g. `nl_NL` or `en_US`.
    pub fn set_language(&mut self, language: &str) {
        self.props.language = language.to_string();
    }

    /// Raw typed properties.
    pub fn props(&self) -> &UserProps {
        &self.props
    }

    /// Persist all staged changes in a single update action.
    pub async fn save(&mut self) -> Result<()> {
        let action = json!({
            "action": "update",
            "user": serde_json::to_value(&self.props)?,
        });
        let response = self.post_action(action).await?;

        if response.get("status").and_then(Value::as_str) != Some("ok") {
            return Err(StackError::action_failed(
                &format!("Unable to save user '{}'", self.username()),
                response,
            ));
        }

        // Don't resend the password on the next save.
        self.props.password = None;
        debug!(username = %self.username(), "saved user");
        Ok(())
    }

    /// Change the password immediately.
    ///
    /// Convenience over the stage-then-save discipline: the password is
    /// staged and persisted through the same single update action.
    pub async fn set_password(&mut self, password: &str) -> Result<()> {
        self.props.password = Some(password.to_string());
        self.save().await
    }

    /// Delete this user account.
    pub async fn delete(&self) -> Result<()> {
        let action = json!({
            "action": "delete",
            "user": serde_json::to_value(&self.props)?,
        });
        let response = self.post_action(action).await?;

        if response.get("status").and_then(Value::as_str) != Some("ok") {
            return Err(StackError::action_failed(
                &format!("Unable to delete user '{}'", self.username()),
                response,
            ));
        }

        debug!(username = %self.username(), "deleted user");
        Ok(())
    }

    async fn post_action(&self, action: Value) -> Result<Value> {
        let response = self
            .remote
            .api
            .post_json("/api/users/update", &json!([action]))
            .await?;

        let status = response.status();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Remote;

    fn test_user(value: Value) -> User {
        let remote = Arc::new(Remote::for_tests("https://example.stackstorage.com"));
        User::from_value(remote, &value).unwrap()
    }

    #[test]
    fn test_quota_sentinel() {
        let user = test_user(json!({"username": "bob", "quota": -1}));
        assert_eq!(user.disk_quota(), None);

        let user = test_user(json!({"username": "bob", "quota": 1024}));
        assert_eq!(user.disk_quota(), Some(1024));
    }

    #[test]
    fn test_set_disk_quota_maps_none_and_zero_to_sentinel() {
        let mut user = test_user(json!({"username": "bob"}));
        user.set_disk_quota(Some(2048));
        assert_eq!(user.props().quota, 2048);
        user.set_disk_quota(None);
        assert_eq!(user.props().quota, QUOTA_UNLIMITED);
        user.set_disk_quota(Some(0));
        assert_eq!(user.props().quota, QUOTA_UNLIMITED);
    }

    #[test]
    fn test_defaults() {
        let user = test_user(json!({"username": "bob"}));
        assert_eq!(user.language(), "nl_NL");
        assert!(!user.is_admin());
        assert_eq!(user.disk_used(), 0);
        assert_eq!(user.disk_quota(), None);
    }

    #[test]
    fn test_setters_stage_locally() {
        let mut user = test_user(json!({"username": "bob", "displayName": "Bob"}));
        user.set_name("Bobby");
        user.set_language("en_US");
        assert_eq!(user.name(), "Bobby");
        assert_eq!(user.language(), "en_US");
    }

    #[test]
    fn test_password_not_serialized_when_unset() {
        let user = test_user(json!({"username": "bob"}));
        let value = serde_json::to_value(user.props()).unwrap();
        assert!(value.get("password").is_none());
    }
}
