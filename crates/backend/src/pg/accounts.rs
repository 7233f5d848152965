//! Users, profiles and admin membership.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use sage_kitchen_core::account::{Identity, Password, Profile, SignUp};
use sage_kitchen_core::gateway::{GatewayError, GatewayResult, IdentityProvider, ProfileStore};
use sage_kitchen_core::{Email, UserId};

use super::{PgBackend, RepositoryError, classify};
use crate::password::{hash_password, verify_password};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    username: Option<String>,
    full_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    avatar_url: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            username: row.username,
            full_name: row.full_name,
            phone: row.phone,
            address: row.address,
            avatar_url: row.avatar_url,
        }
    }
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user and an empty profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<Identity, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: UserId = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, "email already registered", "user"))?;

        sqlx::query("INSERT INTO profiles (id, full_name) VALUES ($1, $2)")
            .bind(id)
            .bind(full_name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Identity {
            user_id: id,
            email: email.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn get_with_hash(&self, email: &Email) -> Result<Option<UserRow>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError> {
        self.get_with_hash(email)
            .await?
            .map(|row| {
                Ok(Identity {
                    user_id: row.id,
                    email: parse_email(&row.email)?,
                })
            })
            .transpose()
    }

    /// Whether the user is in `admins`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_admin(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM admins WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Add a user to `admins`. Returns `false` if they already were one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn grant_admin(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO admins (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
                .bind(user_id)
                .execute(self.pool)
                .await
                .map_err(|e| classify(e, "already an admin", "user"))?;
        Ok(result.rows_affected() > 0)
    }

    /// The user's profile, empty if none was saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn profile(&self, user_id: UserId) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT username, full_name, phone, address, avatar_url FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Profile::from).unwrap_or_default())
    }

    /// Insert or replace the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn upsert_profile(
        &self,
        user_id: UserId,
        profile: &Profile,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "INSERT INTO profiles (id, username, full_name, phone, address, avatar_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                 username = EXCLUDED.username, \
                 full_name = EXCLUDED.full_name, \
                 phone = EXCLUDED.phone, \
                 address = EXCLUDED.address, \
                 avatar_url = EXCLUDED.avatar_url, \
                 updated_at = now() \
             RETURNING username, full_name, phone, address, avatar_url",
        )
        .bind(user_id)
        .bind(&profile.username)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.avatar_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify(e, "profile conflict", "user"))?;
        Ok(row.into())
    }
}

#[async_trait]
impl IdentityProvider for PgBackend {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: SignUp) -> GatewayResult<Identity> {
        let hash = hash_password(request.password.expose())?;
        let identity = self
            .accounts()
            .create_user(&request.email, &hash, request.full_name.as_deref())
            .await?;
        tracing::info!(user_id = %identity.user_id, "User signed up");
        Ok(identity)
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &Email, password: &Password) -> GatewayResult<Identity> {
        let row = self
            .accounts()
            .get_with_hash(email)
            .await?
            .ok_or(GatewayError::InvalidCredentials)?;
        verify_password(password.expose(), &row.password_hash)?;
        Ok(Identity {
            user_id: row.id,
            email: parse_email(&row.email)?,
        })
    }

    #[instrument(skip(self))]
    async fn is_admin(&self, user_id: UserId) -> GatewayResult<bool> {
        Ok(self.accounts().is_admin(user_id).await?)
    }
}

#[async_trait]
impl ProfileStore for PgBackend {
    #[instrument(skip(self))]
    async fn profile(&self, user_id: UserId) -> GatewayResult<Profile> {
        Ok(self.accounts().profile(user_id).await?)
    }

    #[instrument(skip(self, profile))]
    async fn update_profile(&self, user_id: UserId, profile: Profile) -> GatewayResult<Profile> {
        Ok(self.accounts().upsert_profile(user_id, &profile).await?)
    }
}
