use crate::db::models::DbUser;
use crate::db::sqlite::KomikStorage;
use crate::error::KomikError;
use crate::types::Role;
use chrono::Utc;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, username, password_hash, role, security_stamp, \
     avatar_url, is_email_verified, last_login_at, registered_at, updated_at";

/// Fields required to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Fresh random security stamp.
pub fn new_security_stamp() -> String {
    Uuid::new_v4().to_string()
}

impl KomikStorage {
    pub async fn insert_user(&self, user: NewUser) -> Result<DbUser, KomikError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, username, password_hash, role, security_stamp,
                is_email_verified, registered_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(new_security_stamp())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_user_by_id(&id)
            .await?
            .ok_or(KomikError::NotFound("User"))
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<DbUser>, KomikError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<DbUser>, KomikError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DbUser>, KomikError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// The first owner account, if any.
    pub async fn find_owner(&self) -> Result<Option<DbUser>, KomikError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY registered_at LIMIT 1"
        );
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(Role::Owner)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn count_users_with_role(&self, role: Role) -> Result<i64, KomikError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn touch_last_login(&self, id: &str) -> Result<(), KomikError> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the password hash and rotate the stamp. Returns the new stamp.
    pub async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<String, KomikError> {
        let stamp = new_security_stamp();
        let res = sqlx::query(
            "UPDATE users SET password_hash = ?, security_stamp = ?, updated_at = ? WHERE id = ?",
        )
        .bind(password_hash)
        .bind(&stamp)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(KomikError::NotFound("User"));
        }
        Ok(stamp)
    }

    /// Change role and rotate the stamp so tokens carrying the old role stop working.
    pub async fn update_role(&self, id: &str, role: Role) -> Result<DbUser, KomikError> {
        let res = sqlx::query(
            "UPDATE users SET role = ?, security_stamp = ?, updated_at = ? WHERE id = ?",
        )
        .bind(role)
        .bind(new_security_stamp())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(KomikError::NotFound("User"));
        }
        self.find_user_by_id(id)
            .await?
            .ok_or(KomikError::NotFound("User"))
    }

    /// Newest registrations first.
    pub async fn list_users(&self, limit: u32, offset: i64) -> Result<Vec<DbUser>, KomikError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY registered_at DESC, id LIMIT ? OFFSET ?"
        );
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(i64::from(limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn count_users(&self) -> Result<i64, KomikError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }
}
