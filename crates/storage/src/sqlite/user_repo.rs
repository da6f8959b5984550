use course_core::model::{Profile, User, UserId};

use super::SqliteRepository;
use super::mapping::{db_err, id_from_i64, id_i64, map_profile_row, map_user_row};
use crate::repository::{NewUserRecord, StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn find_user_by_subject(&self, subject: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT id, subject, email, created_at FROM users WHERE subject = ?1")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn insert_user(&self, user: NewUserRecord) -> Result<User, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query(
            r"
            INSERT INTO users (subject, email, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(&user.subject)
        .bind(&user.email)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        let rowid = res.last_insert_rowid();

        sqlx::query(
            r"
            INSERT INTO profiles (user_id, name, image)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(rowid)
        .bind(&user.name)
        .bind(user.image.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(User {
            id: UserId::new(id_from_i64("user_id", rowid)?),
            subject: user.subject,
            email: user.email,
            created_at: user.created_at,
        })
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, StorageError> {
        let row = sqlx::query("SELECT user_id, name, image FROM profiles WHERE user_id = ?1")
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO profiles (user_id, name, image)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                name = excluded.name,
                image = excluded.image
            ",
        )
        .bind(id_i64("user_id", profile.user_id.value())?)
        .bind(&profile.name)
        .bind(profile.image.as_deref())
        .execute(&self.pool)
        .await;

        // a missing user shows up as a foreign-key violation
        match res {
            Ok(_) => Ok(()),
            Err(e) => match db_err(e) {
                StorageError::MissingReference => Err(StorageError::NotFound),
                other => Err(other),
            },
        }
    }
}
