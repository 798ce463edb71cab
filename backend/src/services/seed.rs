//! Development demo data
//!
//! Wipes every table and loads a small gym: one admin, two trainers with two
//! clients each, a handful of exercises, two routines, two meal plans, the
//! assignments linking them and a few calendar events. Everything runs in
//! one transaction so a failed seed leaves the previous data in place.

use crate::auth::PasswordService;
use crate::config::AppConfig;
use crate::db;
use crate::error::ApiError;
use crate::repositories::{
    AssignmentRepository, CalendarRepository, ExerciseRepository, MealPlanRepository,
    NewAssignment, NewEvent, NewExercise, NewMealPlan, NewRoutine, NewUser, RoutineRepository,
    UserRepository,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fitpro_shared::models::{AssignmentStatus, Difficulty, EventType, Role};
use fitpro_shared::types::{
    GymProfile, Meal, ReminderSettings, RoutineExercise, SeedCounts, SeedCredential, SeedResponse,
};
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

const ADMIN_PASSWORD: &str = "admin123";
const TRAINER_PASSWORD: &str = "trainer123";
const CLIENT_PASSWORD: &str = "client123";

/// (name, email, role)
const STAFF: [(&str, &str, Role); 3] = [
    ("Admin Principal", "admin@fitpro.com", Role::Admin),
    ("Carlos Martínez", "carlos@fitpro.com", Role::Trainer),
    ("María González", "maria@fitpro.com", Role::Trainer),
];

/// (name, email, index of the trainer in `STAFF`)
const CLIENTS: [(&str, &str, usize); 4] = [
    ("Ana García", "ana@cliente.com", 1),
    ("Luis Rodríguez", "luis@cliente.com", 1),
    ("Carmen López", "carmen@cliente.com", 2),
    ("Pedro Martín", "pedro@cliente.com", 2),
];

struct ExerciseSeed {
    name: &'static str,
    sets: i32,
    reps: &'static str,
    rest: &'static str,
    image: &'static str,
    instructions: &'static str,
    muscle_groups: &'static [&'static str],
    equipment: &'static [&'static str],
    difficulty: Difficulty,
    trainer: usize,
}

const EXERCISES: [ExerciseSeed; 5] = [
    ExerciseSeed {
        name: "Sentadillas",
        sets: 4,
        reps: "8-12",
        rest: "90s",
        image: "/person-doing-squats.png",
        instructions: "Mantén la espalda recta, baja hasta que los muslos estén paralelos al suelo.",
        muscle_groups: &["legs", "glutes"],
        equipment: &["bodyweight"],
        difficulty: Difficulty::Beginner,
        trainer: 1,
    },
    ExerciseSeed {
        name: "Press de Banca",
        sets: 4,
        reps: "8-10",
        rest: "120s",
        image: "/bench-press-exercise.png",
        instructions: "Baja la barra hasta el pecho de forma controlada, empuja con fuerza.",
        muscle_groups: &["chest", "arms"],
        equipment: &["barbell"],
        difficulty: Difficulty::Intermediate,
        trainer: 1,
    },
    ExerciseSeed {
        name: "Peso Muerto",
        sets: 3,
        reps: "6-8",
        rest: "180s",
        image: "/person-deadlift.png",
        instructions: "Mantén la espalda neutral durante todo el movimiento.",
        muscle_groups: &["back", "legs", "glutes"],
        equipment: &["barbell"],
        difficulty: Difficulty::Advanced,
        trainer: 1,
    },
    ExerciseSeed {
        name: "Burpees",
        sets: 5,
        reps: "15",
        rest: "30s",
        image: "/person-doing-burpees.jpg",
        instructions: "Movimiento explosivo completo: plancha, flexión, salto.",
        muscle_groups: &["cardio", "core"],
        equipment: &["bodyweight"],
        difficulty: Difficulty::Advanced,
        trainer: 2,
    },
    ExerciseSeed {
        name: "Flexiones",
        sets: 3,
        reps: "10-15",
        rest: "60s",
        image: "/push-ups.png",
        instructions: "Mantén el cuerpo recto, baja hasta casi tocar el suelo.",
        muscle_groups: &["chest", "arms", "core"],
        equipment: &["bodyweight"],
        difficulty: Difficulty::Beginner,
        trainer: 2,
    },
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Result<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| anyhow!("invalid seed date {year}-{month}-{day}"))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Slot `(exercise, sets, reps, rest, order)`
fn slot(exercise_id: Uuid, sets: i32, reps: &str, rest: &str, order: i32) -> RoutineExercise {
    RoutineExercise {
        exercise_id,
        sets,
        reps: reps.to_string(),
        rest: rest.to_string(),
        order,
    }
}

fn meal(name: &str, time: &str, foods: &[&str], calories: i32) -> Meal {
    Meal {
        name: name.to_string(),
        time: time.to_string(),
        foods: strings(foods),
        calories,
    }
}

fn credentials() -> Vec<SeedCredential> {
    STAFF
        .iter()
        .map(|&(_, email, role)| (role, email))
        .chain(CLIENTS.iter().map(|&(_, email, _)| (Role::Client, email)))
        .map(|(role, email)| SeedCredential {
            role,
            email: email.to_string(),
            password: match role {
                Role::Admin => ADMIN_PASSWORD,
                Role::Trainer => TRAINER_PASSWORD,
                Role::Client => CLIENT_PASSWORD,
            }
            .to_string(),
        })
        .collect()
}

pub struct SeedService;

impl SeedService {
    /// Replace all data with the demo gym; refused unless `RUST_ENV=development`
    pub async fn run(pool: &PgPool) -> Result<SeedResponse, ApiError> {
        if !AppConfig::is_declared_development() {
            return Err(ApiError::Forbidden(
                "Demo data is only available in development".to_string(),
            ));
        }

        let (admin_hash, trainer_hash, client_hash) = tokio::try_join!(
            PasswordService::hash_async(ADMIN_PASSWORD.to_string()),
            PasswordService::hash_async(TRAINER_PASSWORD.to_string()),
            PasswordService::hash_async(CLIENT_PASSWORD.to_string()),
        )
        .map_err(ApiError::Internal)?;

        let mut tx = pool.begin().await?;
        warn!("Seeding demo data, existing records will be removed");
        db::reset_data(&mut tx).await.map_err(ApiError::Internal)?;

        let stats = Self::load(&mut tx, [admin_hash, trainer_hash, client_hash])
            .await
            .map_err(ApiError::Internal)?;
        tx.commit().await?;

        info!(
            users = stats.users,
            exercises = stats.exercises,
            routines = stats.routines,
            meal_plans = stats.meal_plans,
            assignments = stats.assignments,
            events = stats.events,
            "Demo data seeded"
        );

        Ok(SeedResponse {
            message: "Database seeded successfully".to_string(),
            stats,
            credentials: credentials(),
        })
    }

    /// `hashes` are the admin, trainer and client password hashes
    async fn load(conn: &mut PgConnection, hashes: [String; 3]) -> Result<SeedCounts> {
        let [admin_hash, trainer_hash, client_hash] = hashes;
        let mut counts = SeedCounts::default();

        let mut staff = Vec::with_capacity(STAFF.len());
        for (name, email, role) in STAFF {
            let user = UserRepository::create(
                &mut *conn,
                &NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash: match role {
                        Role::Admin => admin_hash.clone(),
                        _ => trainer_hash.clone(),
                    },
                    role,
                    trainer_id: None,
                    profile: GymProfile::default(),
                },
            )
            .await
            .with_context(|| format!("seeding user {email}"))?;
            staff.push(user.id);
        }

        let mut clients = Vec::with_capacity(CLIENTS.len());
        for (name, email, trainer) in CLIENTS {
            let user = UserRepository::create(
                &mut *conn,
                &NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash: client_hash.clone(),
                    role: Role::Client,
                    trainer_id: Some(staff[trainer]),
                    profile: GymProfile::default(),
                },
            )
            .await
            .with_context(|| format!("seeding user {email}"))?;
            clients.push(user.id);
        }
        counts.users = staff.len() + clients.len();
        let (carlos, maria) = (staff[1], staff[2]);

        let mut exercises = Vec::with_capacity(EXERCISES.len());
        for seed in &EXERCISES {
            let exercise = ExerciseRepository::create(
                &mut *conn,
                &NewExercise {
                    name: seed.name.to_string(),
                    sets: seed.sets,
                    reps: seed.reps.to_string(),
                    rest: seed.rest.to_string(),
                    image: Some(seed.image.to_string()),
                    instructions: Some(seed.instructions.to_string()),
                    muscle_groups: strings(seed.muscle_groups),
                    equipment: strings(seed.equipment),
                    difficulty: seed.difficulty,
                    created_by: staff[seed.trainer],
                },
            )
            .await
            .with_context(|| format!("seeding exercise {}", seed.name))?;
            exercises.push(exercise.id);
        }
        counts.exercises = exercises.len();

        let routines = [
            NewRoutine {
                name: "Fuerza Total".to_string(),
                description: "Rutina completa de fuerza para todo el cuerpo".to_string(),
                duration: "60 min".to_string(),
                difficulty: Difficulty::Intermediate,
                exercises: vec![
                    slot(exercises[0], 4, "8-12", "90s", 1),
                    slot(exercises[1], 4, "8-10", "120s", 2),
                    slot(exercises[2], 3, "6-8", "180s", 3),
                ],
                tags: strings(&["fuerza", "fullbody"]),
                created_by: carlos,
            },
            NewRoutine {
                name: "Cardio HIIT".to_string(),
                description: "Entrenamiento de alta intensidad para quemar grasa".to_string(),
                duration: "30 min".to_string(),
                difficulty: Difficulty::Advanced,
                exercises: vec![
                    slot(exercises[3], 5, "15", "30s", 1),
                    slot(exercises[4], 4, "12", "45s", 2),
                ],
                tags: strings(&["cardio", "hiit", "quema-grasa"]),
                created_by: maria,
            },
        ];
        let mut routine_ids = Vec::with_capacity(routines.len());
        for routine in &routines {
            routine_ids.push(RoutineRepository::create(&mut *conn, routine).await?.id);
        }
        counts.routines = routine_ids.len();

        let meal_plans = [
            NewMealPlan {
                name: "Plan Definición".to_string(),
                description: "Plan bajo en calorías para definición muscular".to_string(),
                calories: 2000,
                duration: 30,
                meals: vec![
                    meal("Desayuno", "08:00", &["3 claras de huevo", "Avena 50g", "Plátano", "Café"], 400),
                    meal("Almuerzo", "13:00", &["Pechuga de pollo 200g", "Arroz integral 100g", "Brócoli", "Ensalada"], 600),
                    meal("Cena", "20:00", &["Salmón 150g", "Batata 150g", "Espárragos", "Aceite de oliva"], 700),
                ],
                tags: strings(&["definicion", "bajo-calorias"]),
                created_by: carlos,
            },
            NewMealPlan {
                name: "Plan Volumen".to_string(),
                description: "Plan alto en calorías para ganancia muscular".to_string(),
                calories: 3000,
                duration: 60,
                meals: vec![
                    meal("Desayuno", "07:30", &["4 huevos enteros", "Avena 80g", "2 plátanos", "Mantequilla de maní"], 700),
                    meal("Almuerzo", "12:30", &["Carne roja 250g", "Arroz blanco 150g", "Aguacate", "Verduras"], 900),
                    meal("Cena", "20:30", &["Pollo 200g", "Pasta 150g", "Queso", "Ensalada con aceite"], 1000),
                ],
                tags: strings(&["volumen", "alto-calorias"]),
                created_by: maria,
            },
        ];
        let mut meal_plan_ids = Vec::with_capacity(meal_plans.len());
        for plan in &meal_plans {
            meal_plan_ids.push(MealPlanRepository::create(&mut *conn, plan).await?.id);
        }
        counts.meal_plans = meal_plan_ids.len();

        // (client, trainer, routine, meal plan, start day in January 2025)
        let assignments = [
            (clients[0], carlos, routine_ids[0], meal_plan_ids[0], 1),
            (clients[1], carlos, routine_ids[1], meal_plan_ids[1], 5),
            (clients[2], maria, routine_ids[1], meal_plan_ids[0], 10),
        ];
        for (client_id, trainer_id, routine_id, meal_plan_id, day) in assignments {
            AssignmentRepository::create(
                &mut *conn,
                &NewAssignment {
                    client_id,
                    trainer_id,
                    routine_id: Some(routine_id),
                    meal_plan_id: Some(meal_plan_id),
                    start_date: at(2025, 1, day, 0, 0)?,
                    end_date: None,
                    status: AssignmentStatus::Active,
                    notes: None,
                },
            )
            .await?;
            counts.assignments += 1;
        }

        let ana = clients[0];
        let event = |title: &str, date, event_type, completed, user_id| NewEvent {
            title: title.to_string(),
            description: None,
            date,
            event_type,
            completed,
            user_id,
            trainer_id: None,
            routine_id: None,
            meal_plan_id: None,
            assignment_id: None,
            duration: None,
            reminder: ReminderSettings::default(),
        };
        let events = [
            NewEvent {
                trainer_id: Some(carlos),
                routine_id: Some(routine_ids[0]),
                duration: Some(60),
                ..event("Entrenamiento de Fuerza", at(2025, 1, 15, 10, 0)?, EventType::Workout, true, ana)
            },
            NewEvent {
                meal_plan_id: Some(meal_plan_ids[0]),
                ..event("Plan Alimenticio", at(2025, 1, 15, 8, 0)?, EventType::Meal, true, ana)
            },
            NewEvent {
                trainer_id: Some(carlos),
                routine_id: Some(routine_ids[1]),
                duration: Some(30),
                ..event("Entrenamiento HIIT", at(2025, 1, 16, 16, 0)?, EventType::Workout, false, clients[1])
            },
            NewEvent {
                trainer_id: Some(carlos),
                duration: Some(30),
                ..event("Evaluación Mensual", at(2025, 1, 30, 9, 0)?, EventType::Assessment, false, ana)
            },
        ];
        for event in &events {
            CalendarRepository::create(&mut *conn, event).await?;
        }
        counts.events = events.len();

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_cover_every_seeded_user() {
        let creds = credentials();
        assert_eq!(creds.len(), STAFF.len() + CLIENTS.len());
        assert_eq!(creds[0].role, Role::Admin);
        assert_eq!(creds[0].password, ADMIN_PASSWORD);
        assert!(creds
            .iter()
            .filter(|c| c.role == Role::Client)
            .all(|c| c.password == CLIENT_PASSWORD));
    }

    #[test]
    fn test_clients_reference_trainers() {
        for (_, _, trainer) in CLIENTS {
            assert_eq!(STAFF[trainer].2, Role::Trainer);
        }
        for seed in &EXERCISES {
            assert_eq!(STAFF[seed.trainer].2, Role::Trainer);
        }
    }

    #[test]
    fn test_seed_dates_are_utc() {
        let date = at(2025, 1, 15, 10, 0).unwrap();
        assert_eq!(date.to_rfc3339(), "2025-01-15T10:00:00+00:00");
        assert!(at(2025, 2, 30, 0, 0).is_err());
    }
}
