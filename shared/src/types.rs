//! API request and response types

use crate::models::{
    ActivityLevel, AssignmentStatus, Difficulty, EventType, FitnessGoal, Gender, Role,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Pagination
// ============================================================================

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page metadata returned with every list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

impl PaginationInfo {
    pub fn new(current_page: i64, items_per_page: i64, total_items: i64) -> Self {
        Self {
            current_page,
            total_pages: crate::stats::total_pages(total_items, items_per_page),
            total_items,
            items_per_page,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

// ============================================================================
// Cross-reference summaries
// ============================================================================

/// Compact user reference embedded in other entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Compact routine or meal plan reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// Compact exercise reference embedded in routines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub id: Uuid,
    pub name: String,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
}

// ============================================================================
// Authentication and users
// ============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Gym profile fields as submitted by a client
///
/// Enumerated fields arrive as free text and are parsed during validation so
/// a bad value is reported against its field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GymProfileInput {
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub goal: Option<String>,
    pub activity_level: Option<String>,
    pub medical_conditions: Option<String>,
}

impl GymProfileInput {
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.weight.is_none()
            && self.height.is_none()
            && self.gender.is_none()
            && self.phone.is_none()
            && self.goal.is_none()
            && self.activity_level.is_none()
            && self.medical_conditions.is_none()
    }
}

/// Stored gym profile of a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GymProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<FitnessGoal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<String>,
}

/// Self-registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub trainer_id: Option<Uuid>,
    #[serde(flatten)]
    pub profile: GymProfileInput,
}

/// One-time administrator bootstrap request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub secret: String,
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_id: Option<Uuid>,
    #[serde(flatten)]
    pub profile: GymProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Successful login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
    pub expires_in: i64,
}

/// Bare acknowledgement, e.g. after logout or a delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Own profile update; gym fields apply to clients only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub profile: GymProfileInput,
}

/// Administrator activation toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetUserStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Exercises
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExerciseRequest {
    pub name: String,
    pub sets: i32,
    pub reps: String,
    pub rest: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseResponse {
    pub id: Uuid,
    pub name: String,
    pub sets: i32,
    pub reps: String,
    pub rest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub difficulty: Difficulty,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub muscle_group: Option<String>,
    pub difficulty: Option<String>,
}

// ============================================================================
// Routines
// ============================================================================

/// One exercise slot inside a routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineExercise {
    pub exercise_id: Uuid,
    pub sets: i32,
    pub reps: String,
    pub rest: String,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoutineRequest {
    pub name: String,
    pub description: String,
    pub duration: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub exercises: Vec<RoutineExercise>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRoutineRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub difficulty: Option<String>,
    pub exercises: Option<Vec<RoutineExercise>>,
    pub tags: Option<Vec<String>>,
}

/// Routine slot with its exercise resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineExerciseDetail {
    pub exercise_id: Uuid,
    pub exercise: Option<ExerciseSummary>,
    pub sets: i32,
    pub reps: String,
    pub rest: String,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub duration: String,
    pub difficulty: Difficulty,
    pub exercises: Vec<RoutineExerciseDetail>,
    pub tags: Vec<String>,
    pub created_by: Option<UserSummary>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters shared by the routine and meal plan listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub difficulty: Option<String>,
}

// ============================================================================
// Meal plans
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub time: String,
    #[serde(default)]
    pub foods: Vec<String>,
    pub calories: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMealPlanRequest {
    pub name: String,
    pub description: String,
    pub calories: i32,
    pub duration: i32,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMealPlanRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub calories: Option<i32>,
    pub duration: Option<i32>,
    pub meals: Option<Vec<Meal>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub calories: i32,
    pub duration: i32,
    pub meals: Vec<Meal>,
    pub tags: Vec<String>,
    pub created_by: Option<UserSummary>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Assignments
// ============================================================================

/// One progress log entry on an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub date: DateTime<Utc>,
    pub completion: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssignmentRequest {
    pub client_id: Uuid,
    /// Defaults to the calling trainer
    #[serde(default)]
    pub trainer_id: Option<Uuid>,
    #[serde(default)]
    pub routine_id: Option<Uuid>,
    #[serde(default)]
    pub meal_plan_id: Option<Uuid>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAssignmentRequest {
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAssignmentStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogProgressRequest {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub completion: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub trainer_id: Uuid,
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub client: Option<UserSummary>,
    pub trainer: Option<UserSummary>,
    pub routine: Option<PlanSummary>,
    pub meal_plan: Option<PlanSummary>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub progress: Vec<ProgressEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
}

// ============================================================================
// Calendar
// ============================================================================

pub const DEFAULT_REMINDER_MINUTES: i32 = 15;

/// Reminder lead time before an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_reminder_minutes")]
    pub minutes: i32,
}

fn default_reminder_minutes() -> i32 {
    DEFAULT_REMINDER_MINUTES
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            minutes: DEFAULT_REMINDER_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Owner of the event; defaults to the caller
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub trainer_id: Option<Uuid>,
    #[serde(default)]
    pub routine_id: Option<Uuid>,
    #[serde(default)]
    pub meal_plan_id: Option<Uuid>,
    #[serde(default)]
    pub assignment_id: Option<Uuid>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub reminder: Option<ReminderSettings>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub assignment_id: Option<Uuid>,
    pub duration: Option<i32>,
    pub reminder: Option<ReminderSettings>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEventCompletedRequest {
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventResponse {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub completed: bool,
    pub user_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub assignment_id: Option<Uuid>,
    pub user: Option<UserSummary>,
    pub trainer: Option<UserSummary>,
    pub routine: Option<PlanSummary>,
    pub meal_plan: Option<PlanSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    pub reminder: ReminderSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub completed: Option<bool>,
}

// ============================================================================
// Demo data
// ============================================================================

/// Result of a development data reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResponse {
    pub message: String,
    pub stats: SeedCounts,
    pub credentials: Vec<SeedCredential>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCounts {
    pub users: usize,
    pub exercises: usize,
    pub routines: usize,
    pub meal_plans: usize,
    pub assignments: usize,
    pub events: usize,
}

/// Login of a seeded demo account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCredential {
    pub role: Role,
    pub email: String,
    pub password: String,
}

// ============================================================================
// Dashboard
// ============================================================================

/// Role-specific dashboard payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DashboardStats {
    Admin(AdminStats),
    Trainer(TrainerStats),
    Client(ClientStats),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_trainers: i64,
    pub total_clients: i64,
    pub total_routines: i64,
    pub total_meal_plans: i64,
    pub total_assignments: i64,
    pub recent_users: Vec<RecentUser>,
    pub user_growth: UserGrowth,
    pub assignments_by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGrowth {
    pub last_month: i64,
    pub this_month: i64,
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: AssignmentStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerStats {
    pub my_clients: i64,
    pub my_routines: i64,
    pub my_meal_plans: i64,
    pub my_assignments: i64,
    pub recent_events: Vec<EventBrief>,
    pub clients_list: Vec<ClientBrief>,
    pub client_progress: Vec<ClientProgress>,
}

/// Calendar event line shown on dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBrief {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub completed: bool,
    pub user_id: Uuid,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientBrief {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProgress {
    pub assignment_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub progress_count: i64,
    pub last_progress: Option<ProgressEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientStats {
    pub my_assignments: Vec<AssignmentResponse>,
    pub completed_events: i64,
    pub upcoming_events: Vec<EventBrief>,
    pub total_events: i64,
    pub trainer: Option<UserSummary>,
    pub weekly_progress: Vec<WeekdayCount>,
    pub monthly_stats: MonthlyStats,
}

/// Event count for one weekday (1 = Sunday) and completion state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCount {
    pub day: i32,
    pub completed: bool,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub workout_events: i64,
    pub meal_events: i64,
    pub completion_rate: i64,
}
