//! Routine repository
//!
//! Routines embed their ordered exercise slots as JSONB. Deletion only clears
//! `is_active`; inactive rows stay resolvable for assignments and events that
//! still reference them.

use crate::policy::{Resource, Scope, Subject};
use crate::repositories::filter::{push_active, push_scope, push_search, Page};
use anyhow::Result;
use chrono::{DateTime, Utc};
use fitpro_shared::models::Difficulty;
use fitpro_shared::types::{PlanSummary, RoutineExercise};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

const ROUTINE_COLUMNS: &str = "routines.id, routines.name, routines.description, \
    routines.duration, routines.difficulty, routines.exercises, routines.tags, \
    routines.created_by, routines.is_active, routines.created_at, routines.updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoutineRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub duration: String,
    pub difficulty: String,
    pub exercises: Json<Vec<RoutineExercise>>,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoutineRecord {
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty.parse().unwrap_or_default()
    }

    pub fn subject(&self, assignees: Vec<Uuid>) -> Subject {
        Subject::Plan {
            created_by: self.created_by,
            assignees,
        }
    }

    /// Slots sorted by their `order` field
    pub fn ordered_exercises(&self) -> Vec<RoutineExercise> {
        let mut slots = self.exercises.0.clone();
        slots.sort_by_key(|slot| slot.order);
        slots
    }
}

#[derive(Debug, Clone)]
pub struct NewRoutine {
    pub name: String,
    pub description: String,
    pub duration: String,
    pub difficulty: Difficulty,
    pub exercises: Vec<RoutineExercise>,
    pub tags: Vec<String>,
    pub created_by: Uuid,
}

/// Partial routine update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct RoutineChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub exercises: Option<Vec<RoutineExercise>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct RoutineFilter {
    pub search: Option<String>,
    pub difficulty: Option<Difficulty>,
}

pub struct RoutineRepository;

impl RoutineRepository {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        routine: &NewRoutine,
    ) -> Result<RoutineRecord> {
        let record = sqlx::query_as::<_, RoutineRecord>(&format!(
            r#"
            INSERT INTO routines (name, description, duration, difficulty, exercises, tags, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ROUTINE_COLUMNS}
            "#
        ))
        .bind(&routine.name)
        .bind(&routine.description)
        .bind(&routine.duration)
        .bind(routine.difficulty.as_str())
        .bind(Json(&routine.exercises))
        .bind(&routine.tags)
        .bind(routine.created_by)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Find an active routine
    pub async fn find_active(pool: &PgPool, id: Uuid) -> Result<Option<RoutineRecord>> {
        let routine = sqlx::query_as::<_, RoutineRecord>(&format!(
            "SELECT {ROUTINE_COLUMNS} FROM routines WHERE routines.id = $1 AND routines.is_active"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(routine)
    }

    /// List active routines inside `scope`, newest first
    pub async fn list(
        pool: &PgPool,
        scope: Scope,
        filter: &RoutineFilter,
        page: Page,
    ) -> Result<(Vec<RoutineRecord>, i64)> {
        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            push_active(qb, Resource::Routine);
            push_scope(qb, Resource::Routine, scope);
            if let Some(difficulty) = filter.difficulty {
                qb.push(" AND routines.difficulty = ")
                    .push_bind(difficulty.as_str());
            }
            push_search(
                qb,
                &["routines.name", "routines.description"],
                filter.search.as_deref(),
            );
        };

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM routines WHERE TRUE");
        push_filters(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut query =
            QueryBuilder::new(format!("SELECT {ROUTINE_COLUMNS} FROM routines WHERE TRUE"));
        push_filters(&mut query);
        query.push(" ORDER BY routines.created_at DESC, routines.id");
        page.push_limit(&mut query);
        let routines = query
            .build_query_as::<RoutineRecord>()
            .fetch_all(pool)
            .await?;

        Ok((routines, total))
    }

    /// Apply `changes` to an active routine inside `scope`
    ///
    /// Returns `None` when no row matched.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: &RoutineChanges,
        scope: Scope,
    ) -> Result<Option<RoutineRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE routines SET name = COALESCE(");
        qb.push_bind(changes.name.clone())
            .push(", name), description = COALESCE(")
            .push_bind(changes.description.clone())
            .push(", description), duration = COALESCE(")
            .push_bind(changes.duration.clone())
            .push(", duration), difficulty = COALESCE(")
            .push_bind(changes.difficulty.map(|d| d.as_str()))
            .push(", difficulty), exercises = COALESCE(")
            .push_bind(changes.exercises.clone().map(Json))
            .push(", exercises), tags = COALESCE(")
            .push_bind(changes.tags.clone())
            .push(", tags), updated_at = NOW() WHERE routines.id = ")
            .push_bind(id);
        push_active(&mut qb, Resource::Routine);
        push_scope(&mut qb, Resource::Routine, scope);
        qb.push(format!(" RETURNING {ROUTINE_COLUMNS}"));

        let routine = qb
            .build_query_as::<RoutineRecord>()
            .fetch_optional(pool)
            .await?;
        Ok(routine)
    }

    /// Resolve routine ids to summaries, inactive rows included
    pub async fn summaries(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, PlanSummary>> {
        plan_summaries(pool, "routines", ids).await
    }
}

/// Shared summary lookup for the two plan tables
pub(crate) async fn plan_summaries(
    pool: &PgPool,
    table: &str,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, PlanSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, (Uuid, String, String)>(&format!(
        "SELECT id, name, description FROM {table} WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, description)| {
            (
                id,
                PlanSummary {
                    id,
                    name,
                    description,
                },
            )
        })
        .collect())
}
