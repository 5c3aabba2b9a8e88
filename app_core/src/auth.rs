//! Users, sessions and region-scoped authorization.
//!
//! Password storage is PBKDF2-HMAC-SHA256 over a per-user random salt,
//! both transported as base64. Login failures look identical whether the
//! username exists or not.

use crate::{
    Core, CoreError, CoreResult, DbpRegion, DbpSession, DbpUser, utils::ids::new_id,
    utils::validation::FieldError,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeSet;
use subtle::ConstantTimeEq;
use tracing::instrument;
use uuid::Uuid;

const ITERATION_COUNT: u32 = 100_000;
const SALT_BYTES: usize = 16;
const SESSION_TOKEN_BYTES: usize = 128;
const HASH_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminLevel {
    /// administers the regions listed on the user
    Region,
    /// administers every region
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// base64 of 16 random bytes
    pub salt: String,
    /// base64 of PBKDF2-HMAC-SHA256(password, salt)
    pub hashed_password: String,
    pub admin_regions: BTreeSet<String>,
    pub admin_level: Option<AdminLevel>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        password: &str,
        admin_regions: BTreeSet<String>,
        admin_level: Option<AdminLevel>,
    ) -> Self {
        let (salt, hashed_password) = gen_password(password);
        User {
            id: new_id(),
            username: username.into(),
            salt,
            hashed_password,
            admin_regions,
            admin_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// opaque token, also the primary key
    pub id: String,
    pub user_id: Uuid,
}

/// Fresh salt and password hash, both base64.
pub fn gen_password(password: &str) -> (String, String) {
    let mut salt_bytes = [0u8; SALT_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt = BASE64.encode(salt_bytes);
    let hashed = hash_password(password, &salt);
    (salt, hashed)
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut out = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        ITERATION_COUNT,
        &mut out,
    );
    BASE64.encode(out)
}

/// Constant-time password check against the stored salt and hash.
pub fn verify_password(password: &str, salt: &str, hashed_password: &str) -> bool {
    let computed = hash_password(password, salt);
    computed
        .as_bytes()
        .ct_eq(hashed_password.as_bytes())
        .into()
}

fn gen_session_token() -> String {
    let mut token = [0u8; SESSION_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut token);
    BASE64.encode(token)
}

impl Core {
    /// Check credentials and issue a fresh session token, replacing any
    /// prior session of that user.
    #[instrument(name = "auth.login", skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> CoreResult<String> {
        let Some(user) = self.database.get_user_by_username(username).await? else {
            return Err(CoreError::Unauthorized);
        };
        if !verify_password(password, &user.salt, &user.hashed_password) {
            return Err(CoreError::Unauthorized);
        }

        let token = gen_session_token();
        self.database
            .replace_session_for_user(user.id, &token)
            .await?;
        Ok(token)
    }

    /// Destroy the session behind the request token.
    #[instrument(name = "auth.logout", skip_all)]
    pub async fn logout(&self, session_id: &str) -> CoreResult<()> {
        let user = self.require_user(Some(session_id)).await?;
        self.database.delete_session_for_user(user.id).await?;
        Ok(())
    }

    /// Resolve a request token to its user or fail with Unauthorized.
    pub async fn require_user(&self, session_id: Option<&str>) -> CoreResult<User> {
        let Some(session_id) = session_id else {
            return Err(CoreError::Unauthorized);
        };
        self.database
            .get_user_by_session(session_id)
            .await?
            .ok_or(CoreError::Unauthorized)
    }

    /// Region-scoped authorization: super admins pass everywhere, others
    /// only inside their own regions.
    pub fn require_region_admin(&self, user: &User, region: &str) -> CoreResult<()> {
        if user.admin_level == Some(AdminLevel::Super) || user.admin_regions.contains(region) {
            Ok(())
        } else {
            Err(CoreError::Unauthorized)
        }
    }

    /// Create a user administering the given regions. Unknown regions are
    /// dropped; at least one must survive.
    #[instrument(name = "auth.create_user", skip(self, password))]
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        region_ids: &[String],
        admin_level: Option<AdminLevel>,
    ) -> CoreResult<User> {
        let mut admin_regions = BTreeSet::new();
        for region_id in region_ids {
            if self.database.get_region(region_id).await?.is_some() {
                admin_regions.insert(region_id.clone());
            } else {
                tracing::warn!(region = %region_id, "ignoring unknown admin region");
            }
        }
        if admin_regions.is_empty() {
            return Err(FieldError::invalid("admin_regions", "no valid region for new user").into());
        }

        let user = User::new(username, password, admin_regions, admin_level);
        self.database.save_user(&user).await?;
        Ok(user)
    }

    /// Re-salt and re-hash the password of an existing user.
    #[instrument(name = "auth.change_password", skip(self, password))]
    pub async fn change_password(&self, username: &str, password: &str) -> CoreResult<()> {
        let Some(mut user) = self.database.get_user_by_username(username).await? else {
            return Err(CoreError::not_found("user"));
        };
        let (salt, hashed_password) = gen_password(password);
        user.salt = salt;
        user.hashed_password = hashed_password;
        self.database.save_user(&user).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let (salt, hash) = gen_password("rivals of aether");
        assert!(verify_password("rivals of aether", &salt, &hash));
        assert!(!verify_password("Rivals of aether", &salt, &hash));
        assert!(!verify_password("", &salt, &hash));
    }

    #[test]
    fn salts_are_unique_per_call() {
        let (salt_a, hash_a) = gen_password("secret");
        let (salt_b, hash_b) = gen_password("secret");
        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn transport_is_base64() {
        let (salt, hash) = gen_password("secret");
        assert!(BASE64.decode(&salt).is_ok());
        assert_eq!(BASE64.decode(&hash).unwrap().len(), HASH_BYTES);
    }

    #[test]
    fn session_tokens_are_long_and_distinct() {
        let a = gen_session_token();
        let b = gen_session_token();
        assert_ne!(a, b);
        assert_eq!(BASE64.decode(&a).unwrap().len(), SESSION_TOKEN_BYTES);
    }
}
