//! Database repositories
//!
//! Provides data access layer for database operations. List queries and
//! guarded writes take the caller's policy scope and render it with
//! [`filter`].

pub mod assignment;
pub mod calendar;
pub mod exercise;
pub mod filter;
pub mod meal_plan;
pub mod routine;
pub mod stats;
pub mod user;

pub use assignment::{
    AssignmentChanges, AssignmentFilter, AssignmentRecord, AssignmentRepository, NewAssignment,
};
pub use calendar::{CalendarRepository, EventChanges, EventFilter, EventRecord, NewEvent};
pub use exercise::{ExerciseFilter, ExerciseRecord, ExerciseRepository, NewExercise};
pub use filter::Page;
pub use meal_plan::{MealPlanChanges, MealPlanRecord, MealPlanRepository, NewMealPlan};
pub use routine::{NewRoutine, RoutineChanges, RoutineFilter, RoutineRecord, RoutineRepository};
pub use stats::StatsRepository;
pub use user::{NewUser, UserFilter, UserRecord, UserRepository};
