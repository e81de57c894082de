use async_trait::async_trait;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::PersonName;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, role, \
                            enabled, created_at, last_login";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_all(&self, query: &str, bind: Option<String>) -> Result<Vec<User>, UserError> {
        let mut query = sqlx::query_as::<_, UserRow>(query);
        if let Some(value) = bind {
            query = query.bind(value);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

/// `ILIKE` pattern matching `keyword` literally anywhere in the value.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(r.id),
            username: Username::new(r.username)?,
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            first_name: r.first_name.map(PersonName::new).transpose()?,
            last_name: r.last_name.map(PersonName::new).transpose()?,
            role: r.role.parse()?,
            enabled: r.enabled,
            created_at: r.created_at,
            last_login: r.last_login,
        })
    }
}

fn database_error(e: sqlx::Error) -> UserError {
    UserError::DatabaseError(e.to_string())
}

/// Map unique violations on username or email to their domain errors.
fn write_error(e: sqlx::Error, user: &User) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("users_username_key") {
                return UserError::UsernameAlreadyExists(user.username.to_string());
            }
            if db_err.constraint() == Some("users_email_key") {
                return UserError::EmailAlreadyExists(user.email.to_string());
            }
        }
    }
    database_error(e)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name,
                               role, enabled, created_at, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.first_name.as_ref().map(PersonName::as_str))
        .bind(user.last_name.as_ref().map(PersonName::as_str))
        .bind(user.role.as_str())
        .bind(user.enabled)
        .bind(user.created_at)
        .bind(user.last_login)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(User::try_from).transpose()
    }

    async fn exists_by_username(&self, username: &Username) -> Result<bool, UserError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, UserError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        self.fetch_all(
            &format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"),
            None,
        )
        .await
    }

    async fn search(&self, keyword: &str) -> Result<Vec<User>, UserError> {
        self.fetch_all(
            &format!(
                "SELECT {USER_COLUMNS} FROM users \
                 WHERE username ILIKE $1 ESCAPE '\\' \
                    OR email ILIKE $1 ESCAPE '\\' \
                    OR first_name ILIKE $1 ESCAPE '\\' \
                    OR last_name ILIKE $1 ESCAPE '\\' \
                 ORDER BY created_at"
            ),
            Some(contains_pattern(keyword)),
        )
        .await
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, UserError> {
        self.fetch_all(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at"),
            Some(role.as_str().to_string()),
        )
        .await
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, UserError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(count.max(0) as u64)
    }

    async fn find_by_enabled(&self, enabled: bool) -> Result<Vec<User>, UserError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE enabled = $1 ORDER BY created_at"
        ))
        .bind(enabled)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn find_created_after(&self, start: DateTime<Utc>) -> Result<Vec<User>, UserError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE created_at > $1 ORDER BY created_at"
        ))
        .bind(start)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        // last_login is owned by record_login and never written here.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4, role = $5, enabled = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(user.first_name.as_ref().map(PersonName::as_str))
        .bind(user.last_name.as_ref().map(PersonName::as_str))
        .bind(user.role.as_str())
        .bind(user.enabled)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), UserError> {
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let current = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT last_login FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(database_error)?
        .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        let last_login = current.max(Some(at));

        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id.0)
            .bind(last_login)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        tx.commit().await.map_err(database_error)?;

        tracing::debug!(user_id = %id, last_login = ?last_login, "Recorded login");
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
