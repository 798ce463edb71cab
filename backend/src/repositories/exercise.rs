//! Exercise catalog repository

use crate::policy::{Resource, Scope};
use crate::repositories::filter::{push_scope, push_search, Page};
use anyhow::Result;
use chrono::{DateTime, Utc};
use fitpro_shared::models::Difficulty;
use fitpro_shared::types::{ExerciseResponse, ExerciseSummary, UserSummary};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

const EXERCISE_COLUMNS: &str = "exercises.id, exercises.name, exercises.sets, exercises.reps, \
    exercises.rest, exercises.image, exercises.instructions, exercises.muscle_groups, \
    exercises.equipment, exercises.difficulty, exercises.created_by, exercises.created_at, \
    exercises.updated_at";

/// Exercise record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExerciseRecord {
    pub id: Uuid,
    pub name: String,
    pub sets: i32,
    pub reps: String,
    pub rest: String,
    pub image: Option<String>,
    pub instructions: Option<String>,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub difficulty: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExerciseRecord {
    pub fn to_response(&self, created_by: Option<UserSummary>) -> ExerciseResponse {
        ExerciseResponse {
            id: self.id,
            name: self.name.clone(),
            sets: self.sets,
            reps: self.reps.clone(),
            rest: self.rest.clone(),
            image: self.image.clone(),
            instructions: self.instructions.clone(),
            muscle_groups: self.muscle_groups.clone(),
            equipment: self.equipment.clone(),
            difficulty: self.difficulty.parse().unwrap_or_default(),
            created_by,
            created_at: self.created_at,
        }
    }
}

/// Input for creating an exercise
#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub sets: i32,
    pub reps: String,
    pub rest: String,
    pub image: Option<String>,
    pub instructions: Option<String>,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub difficulty: Difficulty,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub search: Option<String>,
    pub muscle_group: Option<String>,
    pub difficulty: Option<Difficulty>,
}

pub struct ExerciseRepository;

impl ExerciseRepository {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        exercise: &NewExercise,
    ) -> Result<ExerciseRecord> {
        let record = sqlx::query_as::<_, ExerciseRecord>(&format!(
            r#"
            INSERT INTO exercises (name, sets, reps, rest, image, instructions,
                                   muscle_groups, equipment, difficulty, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {EXERCISE_COLUMNS}
            "#
        ))
        .bind(&exercise.name)
        .bind(exercise.sets)
        .bind(&exercise.reps)
        .bind(&exercise.rest)
        .bind(&exercise.image)
        .bind(&exercise.instructions)
        .bind(&exercise.muscle_groups)
        .bind(&exercise.equipment)
        .bind(exercise.difficulty.as_str())
        .bind(exercise.created_by)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ExerciseRecord>> {
        let exercise = sqlx::query_as::<_, ExerciseRecord>(&format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE exercises.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(exercise)
    }

    /// List exercises alphabetically
    pub async fn list(
        pool: &PgPool,
        scope: Scope,
        filter: &ExerciseFilter,
        page: Page,
    ) -> Result<(Vec<ExerciseRecord>, i64)> {
        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            push_scope(qb, Resource::Exercise, scope);
            if let Some(group) = filter.muscle_group.as_deref().map(str::trim) {
                if !group.is_empty() {
                    qb.push(
                        " AND EXISTS (SELECT 1 FROM unnest(exercises.muscle_groups) g \
                         WHERE LOWER(g) = LOWER(",
                    )
                    .push_bind(group.to_string())
                    .push("))");
                }
            }
            if let Some(difficulty) = filter.difficulty {
                qb.push(" AND exercises.difficulty = ")
                    .push_bind(difficulty.as_str());
            }
            push_search(
                qb,
                &["exercises.name", "exercises.instructions"],
                filter.search.as_deref(),
            );
        };

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM exercises WHERE TRUE");
        push_filters(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut query =
            QueryBuilder::new(format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE TRUE"));
        push_filters(&mut query);
        query.push(" ORDER BY exercises.name ASC, exercises.id");
        page.push_limit(&mut query);
        let exercises = query
            .build_query_as::<ExerciseRecord>()
            .fetch_all(pool)
            .await?;

        Ok((exercises, total))
    }

    /// Ids from `ids` that do not name an exercise
    pub async fn missing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashSet<Uuid> =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM exercises WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(pool)
                .await?
                .into_iter()
                .collect();

        Ok(ids.iter().filter(|id| !found.contains(id)).copied().collect())
    }

    pub async fn summaries(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, ExerciseSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String, Vec<String>, Vec<String>)>(
            "SELECT id, name, muscle_groups, equipment FROM exercises WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, muscle_groups, equipment)| {
                (
                    id,
                    ExerciseSummary {
                        id,
                        name,
                        muscle_groups,
                        equipment,
                    },
                )
            })
            .collect())
    }
}
