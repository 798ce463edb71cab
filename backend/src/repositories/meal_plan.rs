//! Meal plan repository

use crate::policy::{Resource, Scope, Subject};
use crate::repositories::filter::{push_active, push_scope, push_search, Page};
use crate::repositories::routine::plan_summaries;
use anyhow::Result;
use chrono::{DateTime, Utc};
use fitpro_shared::types::{Meal, MealPlanResponse, PlanSummary, UserSummary};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

const MEAL_PLAN_COLUMNS: &str = "meal_plans.id, meal_plans.name, meal_plans.description, \
    meal_plans.calories, meal_plans.duration, meal_plans.meals, meal_plans.tags, \
    meal_plans.created_by, meal_plans.is_active, meal_plans.created_at, meal_plans.updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MealPlanRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub calories: i32,
    /// Days
    pub duration: i32,
    pub meals: Json<Vec<Meal>>,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MealPlanRecord {
    pub fn subject(&self, assignees: Vec<Uuid>) -> Subject {
        Subject::Plan {
            created_by: self.created_by,
            assignees,
        }
    }

    pub fn to_response(&self, created_by: Option<UserSummary>) -> MealPlanResponse {
        MealPlanResponse {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            calories: self.calories,
            duration: self.duration,
            meals: self.meals.0.clone(),
            tags: self.tags.clone(),
            created_by,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMealPlan {
    pub name: String,
    pub description: String,
    pub calories: i32,
    pub duration: i32,
    pub meals: Vec<Meal>,
    pub tags: Vec<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct MealPlanChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub calories: Option<i32>,
    pub duration: Option<i32>,
    pub meals: Option<Vec<Meal>>,
    pub tags: Option<Vec<String>>,
}

pub struct MealPlanRepository;

impl MealPlanRepository {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        plan: &NewMealPlan,
    ) -> Result<MealPlanRecord> {
        let record = sqlx::query_as::<_, MealPlanRecord>(&format!(
            r#"
            INSERT INTO meal_plans (name, description, calories, duration, meals, tags, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MEAL_PLAN_COLUMNS}
            "#
        ))
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.calories)
        .bind(plan.duration)
        .bind(Json(&plan.meals))
        .bind(&plan.tags)
        .bind(plan.created_by)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    pub async fn find_active(pool: &PgPool, id: Uuid) -> Result<Option<MealPlanRecord>> {
        let plan = sqlx::query_as::<_, MealPlanRecord>(&format!(
            "SELECT {MEAL_PLAN_COLUMNS} FROM meal_plans \
             WHERE meal_plans.id = $1 AND meal_plans.is_active"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(plan)
    }

    pub async fn list(
        pool: &PgPool,
        scope: Scope,
        search: Option<&str>,
        page: Page,
    ) -> Result<(Vec<MealPlanRecord>, i64)> {
        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            push_active(qb, Resource::MealPlan);
            push_scope(qb, Resource::MealPlan, scope);
            push_search(qb, &["meal_plans.name", "meal_plans.description"], search);
        };

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM meal_plans WHERE TRUE");
        push_filters(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut query =
            QueryBuilder::new(format!("SELECT {MEAL_PLAN_COLUMNS} FROM meal_plans WHERE TRUE"));
        push_filters(&mut query);
        query.push(" ORDER BY meal_plans.created_at DESC, meal_plans.id");
        page.push_limit(&mut query);
        let plans = query
            .build_query_as::<MealPlanRecord>()
            .fetch_all(pool)
            .await?;

        Ok((plans, total))
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: &MealPlanChanges,
        scope: Scope,
    ) -> Result<Option<MealPlanRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE meal_plans SET name = COALESCE(");
        qb.push_bind(changes.name.clone())
            .push(", name), description = COALESCE(")
            .push_bind(changes.description.clone())
            .push(", description), calories = COALESCE(")
            .push_bind(changes.calories)
            .push(", calories), duration = COALESCE(")
            .push_bind(changes.duration)
            .push(", duration), meals = COALESCE(")
            .push_bind(changes.meals.clone().map(Json))
            .push(", meals), tags = COALESCE(")
            .push_bind(changes.tags.clone())
            .push(", tags), updated_at = NOW() WHERE meal_plans.id = ")
            .push_bind(id);
        push_active(&mut qb, Resource::MealPlan);
        push_scope(&mut qb, Resource::MealPlan, scope);
        qb.push(format!(" RETURNING {MEAL_PLAN_COLUMNS}"));

        let plan = qb
            .build_query_as::<MealPlanRecord>()
            .fetch_optional(pool)
            .await?;
        Ok(plan)
    }

    pub async fn summaries(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, PlanSummary>> {
        plan_summaries(pool, "meal_plans", ids).await
    }
}
