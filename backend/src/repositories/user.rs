//! User repository for database operations

use crate::policy::{Actor, Resource, Scope, Subject};
use crate::repositories::filter::{push_scope, push_search, Page};
use anyhow::Result;
use chrono::{DateTime, Utc};
use fitpro_shared::models::Role;
use fitpro_shared::types::{GymProfile, UserResponse, UserSummary};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

const USER_COLUMNS: &str = "users.id, users.name, users.email, users.password_hash, users.role, \
    users.avatar, users.is_active, users.trainer_id, users.age, users.weight, users.height, \
    users.gender, users.phone, users.goal, users.activity_level, users.medical_conditions, \
    users.created_at, users.updated_at";

/// Advisory lock key serialising administrator bootstrap
const ADMIN_BOOTSTRAP_LOCK: i64 = 0x6669_7470_726f_0001;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub trainer_id: Option<Uuid>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub goal: Option<String>,
    pub activity_level: Option<String>,
    pub medical_conditions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Stored role; unreadable values degrade to the least privileged role
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Client)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role(),
            is_active: self.is_active,
            trainer_id: self.trainer_id,
        }
    }

    pub fn subject(&self) -> Subject {
        Subject::User {
            id: self.id,
            trainer_id: self.trainer_id,
        }
    }

    pub fn profile(&self) -> GymProfile {
        GymProfile {
            age: self.age,
            weight: self.weight,
            height: self.height,
            gender: self.gender.as_deref().and_then(|g| g.parse().ok()),
            phone: self.phone.clone(),
            goal: self.goal.as_deref().and_then(|g| g.parse().ok()),
            activity_level: self.activity_level.as_deref().and_then(|a| a.parse().ok()),
            medical_conditions: self.medical_conditions.clone(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role(),
            avatar: self.avatar.clone(),
            is_active: self.is_active,
            trainer_id: self.trainer_id,
            profile: self.profile(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    /// Already normalized
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub trainer_id: Option<Uuid>,
    pub profile: GymProfile,
}

/// Filters for the user listing
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Insert a user
    pub async fn create<'e, E: PgExecutor<'e>>(executor: E, user: &NewUser) -> Result<UserRecord> {
        let profile = &user.profile;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, trainer_id,
                               age, weight, height, gender, phone, goal,
                               activity_level, medical_conditions)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.trainer_id)
        .bind(profile.age)
        .bind(profile.weight)
        .bind(profile.height)
        .bind(profile.gender.map(|g| g.as_str()))
        .bind(&profile.phone)
        .bind(profile.goal.map(|g| g.as_str()))
        .bind(profile.activity_level.map(|a| a.as_str()))
        .bind(&profile.medical_conditions)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Find user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(users.email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE users.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Check if email exists (case-insensitive)
    pub async fn email_exists<'e, E: PgExecutor<'e>>(executor: E, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Whether any administrator account exists
    pub async fn admin_exists<'e, E: PgExecutor<'e>>(executor: E) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(executor)
                .await?;

        Ok(exists)
    }

    /// Take the transaction-scoped administrator bootstrap lock
    pub async fn lock_admin_bootstrap<'e, E: PgExecutor<'e>>(executor: E) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ADMIN_BOOTSTRAP_LOCK)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// List users inside `scope`, newest first
    pub async fn list(
        pool: &PgPool,
        scope: Scope,
        filter: &UserFilter,
        page: Page,
    ) -> Result<(Vec<UserRecord>, i64)> {
        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            push_scope(qb, Resource::User, scope);
            if let Some(role) = filter.role {
                qb.push(" AND users.role = ").push_bind(role.as_str());
            }
            if let Some(is_active) = filter.is_active {
                qb.push(" AND users.is_active = ").push_bind(is_active);
            }
            push_search(qb, &["users.name", "users.email"], filter.search.as_deref());
        };

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_filters(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut query = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        push_filters(&mut query);
        query.push(" ORDER BY users.created_at DESC, users.id");
        page.push_limit(&mut query);
        let users = query.build_query_as::<UserRecord>().fetch_all(pool).await?;

        Ok((users, total))
    }

    /// Update the caller's own name and gym profile
    ///
    /// `None` leaves a column unchanged.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
        profile: &GymProfile,
    ) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                age = COALESCE($3, age),
                weight = COALESCE($4, weight),
                height = COALESCE($5, height),
                gender = COALESCE($6, gender),
                phone = COALESCE($7, phone),
                goal = COALESCE($8, goal),
                activity_level = COALESCE($9, activity_level),
                medical_conditions = COALESCE($10, medical_conditions),
                updated_at = NOW()
            WHERE users.id = $1 AND users.is_active
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(profile.age)
        .bind(profile.weight)
        .bind(profile.height)
        .bind(profile.gender.map(|g| g.as_str()))
        .bind(&profile.phone)
        .bind(profile.goal.map(|g| g.as_str()))
        .bind(profile.activity_level.map(|a| a.as_str()))
        .bind(&profile.medical_conditions)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Activate or deactivate a user inside `scope`
    pub async fn set_active(
        pool: &PgPool,
        id: Uuid,
        is_active: bool,
        scope: Scope,
    ) -> Result<Option<UserRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET is_active = ");
        qb.push_bind(is_active)
            .push(", updated_at = NOW() WHERE users.id = ")
            .push_bind(id);
        push_scope(&mut qb, Resource::User, scope);
        qb.push(format!(" RETURNING {USER_COLUMNS}"));

        let user = qb.build_query_as::<UserRecord>().fetch_optional(pool).await?;
        Ok(user)
    }

    /// Resolve user ids to summaries; unknown ids are absent from the map
    pub async fn summaries(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, UserSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, name, email FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, email)| (id, UserSummary { id, name, email }))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitpro_shared::models::{ActivityLevel, Gender};

    fn record(role: &str) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4(),
            name: "Ana García".to_string(),
            email: "ana@cliente.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: role.to_string(),
            avatar: None,
            is_active: true,
            trainer_id: None,
            age: Some(25),
            weight: Some(70.0),
            height: Some(175.0),
            gender: Some("female".to_string()),
            phone: None,
            goal: Some("tone".to_string()),
            activity_level: Some("beginner".to_string()),
            medical_conditions: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_actor_from_record() {
        let user = record("trainer");
        let actor = user.actor();
        assert_eq!(actor.id, user.id);
        assert_eq!(actor.role, Role::Trainer);
        assert!(actor.is_active);
    }

    #[test]
    fn test_unknown_role_degrades_to_client() {
        assert_eq!(record("superuser").role(), Role::Client);
    }

    #[test]
    fn test_response_carries_profile() {
        let response = record("client").to_response();
        assert_eq!(response.profile.age, Some(25));
        assert_eq!(response.profile.gender, Some(Gender::Female));
        assert_eq!(response.profile.activity_level, Some(ActivityLevel::Beginner));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["weight"], 70.0);
        assert!(json.get("password_hash").is_none());
        assert!(json.get("phone").is_none());
    }
}
