//! SQL rendering of policy scopes, search terms and pagination
//!
//! List queries and guarded writes append the actor's [`Scope`] as a
//! predicate so the database only ever returns or touches rows the policy
//! admits.

use crate::policy::{Deletion, Resource, Scope};
use anyhow::Result;
use fitpro_shared::errors::ValidationErrors;
use fitpro_shared::stats;
use fitpro_shared::types::{PaginationInfo, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Table backing a resource kind
pub fn table(resource: Resource) -> &'static str {
    match resource {
        Resource::User => "users",
        Resource::Exercise => "exercises",
        Resource::Routine => "routines",
        Resource::MealPlan => "meal_plans",
        Resource::Assignment => "assignments",
        Resource::CalendarEvent => "calendar_events",
    }
}

/// Append ` AND <predicate>` restricting rows of `resource` to `scope`
///
/// A scope that does not apply to the resource renders as `FALSE`.
pub fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, resource: Resource, scope: Scope) {
    let t = table(resource);
    qb.push(" AND ");

    match (resource, scope) {
        (_, Scope::All) => {
            qb.push("TRUE");
        }
        (Resource::User, Scope::AllExcept(id)) => {
            qb.push("users.id <> ").push_bind(id);
        }
        (Resource::User, Scope::SelfOnly(id)) => {
            qb.push("users.id = ").push_bind(id);
        }
        (Resource::User, Scope::SelfOrClientsOf(id)) => {
            qb.push("(users.id = ")
                .push_bind(id)
                .push(" OR users.trainer_id = ")
                .push_bind(id)
                .push(")");
        }
        (Resource::Exercise | Resource::Routine | Resource::MealPlan, Scope::CreatedBy(id)) => {
            qb.push(format!("{t}.created_by = ")).push_bind(id);
        }
        (Resource::Routine | Resource::MealPlan, Scope::CreatedByOrAssignedTo(id)) => {
            let column = plan_column(resource);
            qb.push(format!("({t}.created_by = "))
                .push_bind(id)
                .push(format!(
                    " OR EXISTS (SELECT 1 FROM assignments a WHERE a.{column} = {t}.id \
                     AND a.status <> 'cancelled' AND a.client_id = "
                ))
                .push_bind(id)
                .push("))");
        }
        (Resource::Assignment, Scope::TrainerIs(id)) => {
            qb.push("assignments.trainer_id = ").push_bind(id);
        }
        (Resource::Assignment, Scope::ClientIs(id)) => {
            qb.push("assignments.client_id = ").push_bind(id);
        }
        (Resource::CalendarEvent, Scope::EventParticipant(id)) => {
            qb.push("(calendar_events.user_id = ")
                .push_bind(id)
                .push(" OR calendar_events.trainer_id = ")
                .push_bind(id)
                .push(")");
        }
        (Resource::CalendarEvent, Scope::EventOwner(id)) => {
            qb.push("calendar_events.user_id = ").push_bind(id);
        }
        _ => {
            qb.push("FALSE");
        }
    }
}

/// Assignment column referencing a plan table
fn plan_column(resource: Resource) -> &'static str {
    match resource {
        Resource::MealPlan => "meal_plan_id",
        _ => "routine_id",
    }
}

/// Append ` AND <table>.is_active` for soft-deleted kinds
pub fn push_active(qb: &mut QueryBuilder<'_, Postgres>, resource: Resource) {
    if resource.deletion() == Deletion::Soft {
        qb.push(format!(" AND {}.is_active", table(resource)));
    }
}

/// Escape `LIKE` wildcards so user input matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Append a case-insensitive substring match over `columns`
///
/// Blank terms add nothing.
pub fn push_search(qb: &mut QueryBuilder<'_, Postgres>, columns: &[&str], term: Option<&str>) {
    let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
        return;
    };
    let pattern = format!("%{}%", escape_like(term));

    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("{column} ILIKE ")).push_bind(pattern.clone());
    }
    qb.push(")");
}

/// Validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    /// Highest page whose offset still fits in an `i64` at the largest page size
    pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

    /// `1 <= page <= MAX_PAGE` and `1 <= limit <= 100`
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> Result<Self, ValidationErrors> {
        let defaults = Self::default();
        let page = page.unwrap_or(defaults.page);
        let limit = limit.unwrap_or(defaults.limit);

        let mut errors = ValidationErrors::new();
        if page < 1 {
            errors.add("page", "Page must be at least 1");
        } else if page > Self::MAX_PAGE {
            errors.add("page", format!("Page must be at most {}", Self::MAX_PAGE));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            errors.add(
                "limit",
                format!("Limit must be between 1 and {}", MAX_PAGE_SIZE),
            );
        }
        errors.into_result()?;

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        stats::page_offset(self.page, self.limit)
    }

    pub fn push_limit(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" LIMIT ")
            .push_bind(self.limit)
            .push(" OFFSET ")
            .push_bind(self.offset());
    }

    pub fn info(&self, total_items: i64) -> PaginationInfo {
        PaginationInfo::new(self.page, self.limit, total_items)
    }
}

/// Delete a record inside `scope` following the resource's deletion strategy
///
/// Returns false when no row matched; the caller decides between not found
/// and forbidden with [`exists`].
pub async fn delete_scoped(
    pool: &PgPool,
    resource: Resource,
    id: Uuid,
    scope: Scope,
) -> Result<bool> {
    let t = table(resource);
    let mut qb = match resource.deletion() {
        Deletion::Soft => QueryBuilder::<Postgres>::new(format!(
            "UPDATE {t} SET is_active = FALSE, updated_at = NOW() WHERE {t}.is_active AND {t}.id = "
        )),
        Deletion::Hard => QueryBuilder::<Postgres>::new(format!("DELETE FROM {t} WHERE {t}.id = ")),
        strategy => anyhow::bail!("{} records cannot be deleted ({:?})", resource, strategy),
    };
    qb.push_bind(id);
    push_scope(&mut qb, resource, scope);

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Whether a live record with this id exists, ignoring scopes
pub async fn exists(pool: &PgPool, resource: Resource, id: Uuid) -> Result<bool> {
    let t = table(resource);
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT EXISTS(SELECT 1 FROM {t} WHERE {t}.id = "
    ));
    qb.push_bind(id);
    push_active(&mut qb, resource);
    qb.push(")");

    let found = qb.build_query_scalar::<bool>().fetch_one(pool).await?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(resource: Resource, scope: Scope) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM t WHERE TRUE");
        push_scope(&mut qb, resource, scope);
        qb.sql().to_string()
    }

    #[test]
    fn test_all_scope_renders_true() {
        assert!(rendered(Resource::Routine, Scope::All).ends_with(" AND TRUE"));
    }

    #[test]
    fn test_client_plan_scope_checks_assignments() {
        let id = Uuid::new_v4();
        let sql = rendered(Resource::MealPlan, Scope::CreatedByOrAssignedTo(id));
        assert!(sql.contains("meal_plans.created_by = $1"));
        assert!(sql.contains("a.meal_plan_id = meal_plans.id"));
        assert!(sql.contains("a.status <> 'cancelled'"));
        assert!(sql.contains("a.client_id = $2"));

        let sql = rendered(Resource::Routine, Scope::CreatedByOrAssignedTo(id));
        assert!(sql.contains("a.routine_id = routines.id"));
    }

    #[test]
    fn test_event_participant_scope() {
        let sql = rendered(Resource::CalendarEvent, Scope::EventParticipant(Uuid::new_v4()));
        assert!(sql.contains("(calendar_events.user_id = $1 OR calendar_events.trainer_id = $2)"));
    }

    #[test]
    fn test_mismatched_scope_fails_closed() {
        let sql = rendered(Resource::Routine, Scope::TrainerIs(Uuid::new_v4()));
        assert!(sql.ends_with(" AND FALSE"));
    }

    #[test]
    fn test_push_active_only_for_soft_deleted_kinds() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM routines WHERE TRUE");
        push_active(&mut qb, Resource::Routine);
        assert!(qb.sql().ends_with(" AND routines.is_active"));

        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM calendar_events WHERE TRUE");
        push_active(&mut qb, Resource::CalendarEvent);
        assert_eq!(qb.sql(), "SELECT 1 FROM calendar_events WHERE TRUE");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("fuerza"), "fuerza");
    }

    #[test]
    fn test_search_spans_columns() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM routines WHERE TRUE");
        push_search(&mut qb, &["routines.name", "routines.description"], Some(" hiit "));
        assert!(qb
            .sql()
            .ends_with(" AND (routines.name ILIKE $1 OR routines.description ILIKE $2)"));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM routines WHERE TRUE");
        push_search(&mut qb, &["routines.name"], Some("   "));
        push_search(&mut qb, &["routines.name"], None);
        assert_eq!(qb.sql(), "SELECT 1 FROM routines WHERE TRUE");
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(Page::from_query(None, None).unwrap(), Page::default());
        assert!(Page::from_query(Some(0), None).is_err());
        assert!(Page::from_query(None, Some(0)).is_err());
        assert!(Page::from_query(None, Some(101)).is_err());
        assert!(Page::from_query(Some(i64::MAX), Some(100)).is_err());
        assert!(Page::from_query(Some(Page::MAX_PAGE + 1), Some(1)).is_err());

        let last = Page::from_query(Some(Page::MAX_PAGE), Some(MAX_PAGE_SIZE)).unwrap();
        assert!(last.offset() > 0);

        let page = Page::from_query(Some(3), Some(20)).unwrap();
        assert_eq!(page.offset(), 40);
        assert_eq!(page.info(45).total_pages, 3);
    }
}
