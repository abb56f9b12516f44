//! PostgreSQL Repository Implementation

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::user::{User, UserProfile};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, gender::Gender, user_password::UserPassword};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    user_id,
    email,
    password_hash,
    kakao_id,
    naver_id,
    is_email_valid,
    name,
    gender,
    age,
    oneliner,
    status,
    technology,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed credential store
///
/// Every call is bounded by `timeout` and reports `AuthError::StoreTimeout`.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, operation: F) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| AuthError::StoreTimeout)?
    }
}

/// SQLSTATE 23505 is the store's authoritative "email taken" signal
fn map_insert_error(err: sqlx::Error) -> AuthError {
    let unique_violation = matches!(
        &err,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation()
    );
    if unique_violation {
        return AuthError::AlreadyRegisteredEmail;
    }
    AuthError::Database(err)
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.bounded(async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                INSERT INTO users (
                    user_id,
                    email,
                    password_hash,
                    kakao_id,
                    naver_id,
                    is_email_valid,
                    name,
                    gender,
                    age,
                    oneliner,
                    status,
                    technology,
                    created_at,
                    updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(user.user_id.as_uuid())
            .bind(user.email.as_str())
            .bind(user.password_hash.as_ref().map(|h| h.as_phc_string()))
            .bind(user.kakao_id.as_deref())
            .bind(user.naver_id.as_deref())
            .bind(user.is_email_valid)
            .bind(&user.profile.name)
            .bind(user.profile.gender.as_str())
            .bind(user.profile.age)
            .bind(user.profile.oneliner.as_deref())
            .bind(&user.profile.status)
            .bind(user.profile.technology.as_deref())
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;

            tx.commit().await?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.bounded(async {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
            let row = sqlx::query_as::<_, UserRow>(&sql)
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

            row.map(UserRow::into_user).transpose()
        })
        .await
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.bounded(async {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
            let row = sqlx::query_as::<_, UserRow>(&sql)
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await?;

            row.map(UserRow::into_user).transpose()
        })
        .await
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        self.bounded(async {
            let updated = sqlx::query(
                r#"
                UPDATE users SET
                    kakao_id = $2,
                    naver_id = $3,
                    is_email_valid = $4,
                    name = $5,
                    gender = $6,
                    age = $7,
                    oneliner = $8,
                    status = $9,
                    technology = $10,
                    updated_at = $11
                WHERE user_id = $1
                "#,
            )
            .bind(user.user_id.as_uuid())
            .bind(user.kakao_id.as_deref())
            .bind(user.naver_id.as_deref())
            .bind(user.is_email_valid)
            .bind(&user.profile.name)
            .bind(user.profile.gender.as_str())
            .bind(user.profile.age)
            .bind(user.profile.oneliner.as_deref())
            .bind(&user.profile.status)
            .bind(user.profile.technology.as_deref())
            .bind(user.updated_at)
            .execute(&self.pool)
            .await?
            .rows_affected();

            if updated == 0 {
                return Err(AuthError::UserNotFound);
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        self.bounded(async {
            let deleted = sqlx::query("DELETE FROM users WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .execute(&self.pool)
                .await?
                .rows_affected();

            Ok(deleted > 0)
        })
        .await
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: Option<String>,
    kakao_id: Option<String>,
    naver_id: Option<String>,
    is_email_valid: bool,
    name: String,
    gender: String,
    age: Option<i32>,
    oneliner: Option<String>,
    status: String,
    technology: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password_hash = self
            .password_hash
            .map(UserPassword::from_phc_string)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid password_hash: {}", e)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            password_hash,
            kakao_id: self.kakao_id,
            naver_id: self.naver_id,
            is_email_valid: self.is_email_valid,
            profile: UserProfile {
                name: self.name,
                gender: Gender::from_db(&self.gender),
                age: self.age,
                oneliner: self.oneliner,
                status: self.status,
                technology: self.technology,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
