//! Role-based authorization
//!
//! Every access decision goes through [`Policy`]. For a `(role, resource,
//! action)` triple it yields a [`Scope`]: the set of records the actor may
//! touch. The same scope is checked in memory against a loaded record
//! ([`Scope::admits`]) and rendered into SQL for list queries and guarded
//! writes (`repositories::filter`), so both paths agree by construction.

use fitpro_shared::models::Role;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Authenticated caller, reloaded from the database on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub is_active: bool,
    pub trainer_id: Option<Uuid>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_client(&self) -> bool {
        self.role == Role::Client
    }
}

/// Entity kinds guarded by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
    Exercise,
    Routine,
    MealPlan,
    Assignment,
    CalendarEvent,
}

impl Resource {
    /// How a delete request is carried out for this kind
    pub fn deletion(self) -> Deletion {
        match self {
            Resource::Routine | Resource::MealPlan => Deletion::Soft,
            Resource::Assignment | Resource::CalendarEvent => Deletion::Hard,
            Resource::User => Deletion::DeactivateOnly,
            Resource::Exercise => Deletion::Unsupported,
        }
    }

    /// Human-readable name used in error messages
    pub fn label(self) -> &'static str {
        match self {
            Resource::User => "User",
            Resource::Exercise => "Exercise",
            Resource::Routine => "Routine",
            Resource::MealPlan => "Meal plan",
            Resource::Assignment => "Assignment",
            Resource::CalendarEvent => "Calendar event",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Deletion strategy of a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// Flip `is_active` to false; the row stays readable by reference
    Soft,
    /// Remove the row
    Hard,
    /// Never deleted, only deactivated through a status change
    DeactivateOnly,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    List,
    Create,
    Update,
    Delete,
    SetStatus,
    LogProgress,
}

/// Visibility predicate over records of one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No restriction
    All,
    /// Any record except the actor's own user row
    AllExcept(Uuid),
    SelfOnly(Uuid),
    /// The actor's own row and the clients that reference them as trainer
    SelfOrClientsOf(Uuid),
    CreatedBy(Uuid),
    /// Created by the actor, or referenced by a non-cancelled assignment to them
    CreatedByOrAssignedTo(Uuid),
    TrainerIs(Uuid),
    ClientIs(Uuid),
    /// New assignment naming the actor as trainer for one of their own clients
    OwnClientsOf(Uuid),
    /// Event owned by the actor or naming them as trainer
    EventParticipant(Uuid),
    EventOwner(Uuid),
}

/// Authorization-relevant facts about a concrete record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    User {
        id: Uuid,
        trainer_id: Option<Uuid>,
    },
    Exercise {
        created_by: Option<Uuid>,
    },
    /// Routine or meal plan
    Plan {
        created_by: Uuid,
        /// Clients holding a non-cancelled assignment to the plan
        assignees: Vec<Uuid>,
    },
    Assignment {
        trainer_id: Uuid,
        client_id: Uuid,
    },
    /// Assignment about to be created
    NewAssignment {
        trainer_id: Uuid,
        client_trainer_id: Option<Uuid>,
    },
    Event {
        user_id: Uuid,
        trainer_id: Option<Uuid>,
    },
}

impl Scope {
    /// Whether `subject` falls inside this scope
    ///
    /// Mismatched scope/subject pairs are never admitted.
    pub fn admits(&self, subject: &Subject) -> bool {
        match (*self, subject) {
            (Scope::All, _) => true,
            (Scope::AllExcept(actor), Subject::User { id, .. }) => *id != actor,
            (Scope::SelfOnly(actor), Subject::User { id, .. }) => *id == actor,
            (Scope::SelfOrClientsOf(actor), Subject::User { id, trainer_id }) => {
                *id == actor || *trainer_id == Some(actor)
            }
            (Scope::CreatedBy(actor), Subject::Exercise { created_by }) => {
                *created_by == Some(actor)
            }
            (Scope::CreatedBy(actor), Subject::Plan { created_by, .. }) => *created_by == actor,
            (
                Scope::CreatedByOrAssignedTo(actor),
                Subject::Plan {
                    created_by,
                    assignees,
                },
            ) => *created_by == actor || assignees.contains(&actor),
            (Scope::TrainerIs(actor), Subject::Assignment { trainer_id, .. }) => {
                *trainer_id == actor
            }
            (Scope::ClientIs(actor), Subject::Assignment { client_id, .. }) => *client_id == actor,
            (
                Scope::OwnClientsOf(actor),
                Subject::NewAssignment {
                    trainer_id,
                    client_trainer_id,
                },
            ) => *trainer_id == actor && *client_trainer_id == Some(actor),
            (Scope::EventParticipant(actor), Subject::Event { user_id, trainer_id }) => {
                *user_id == actor || *trainer_id == Some(actor)
            }
            (Scope::EventOwner(actor), Subject::Event { user_id, .. }) => *user_id == actor,
            _ => false,
        }
    }
}

/// Authorization failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("You do not have permission to perform this action on this {}", .0.label().to_lowercase())]
    Forbidden(Resource),

    #[error("{0} not found")]
    TargetNotFound(Resource),
}

/// Authorization policy table
pub struct Policy;

impl Policy {
    /// Scope the actor may act within, or `Forbidden` when the role may not
    /// perform the action at all
    pub fn scope(actor: &Actor, resource: Resource, action: Action) -> Result<Scope, PolicyError> {
        use Action::*;

        if !actor.is_active {
            return Err(PolicyError::Unauthenticated);
        }

        let id = actor.id;
        let forbidden = Err(PolicyError::Forbidden(resource));

        match (resource, action, actor.role) {
            // Users
            (Resource::User, Read | List, Role::Admin) => Ok(Scope::All),
            (Resource::User, Read | List, Role::Trainer) => Ok(Scope::SelfOrClientsOf(id)),
            (Resource::User, Read | List, Role::Client) => Ok(Scope::SelfOnly(id)),
            (Resource::User, Update, _) => Ok(Scope::SelfOnly(id)),
            (Resource::User, SetStatus, Role::Admin) => Ok(Scope::AllExcept(id)),
            (Resource::User, _, _) => forbidden,

            // Exercises form a shared catalog
            (Resource::Exercise, Read | List | Create, _) => Ok(Scope::All),
            (Resource::Exercise, _, _) => forbidden,

            // Routines and meal plans
            (Resource::Routine | Resource::MealPlan, Read | List, Role::Admin) => Ok(Scope::All),
            (Resource::Routine | Resource::MealPlan, Read | List, Role::Trainer) => {
                Ok(Scope::CreatedBy(id))
            }
            (Resource::Routine | Resource::MealPlan, Read | List, Role::Client) => {
                Ok(Scope::CreatedByOrAssignedTo(id))
            }
            (Resource::Routine, Create, _) => Ok(Scope::All),
            (Resource::MealPlan, Create, Role::Admin | Role::Trainer) => Ok(Scope::All),
            (Resource::Routine | Resource::MealPlan, Update | Delete, Role::Admin) => Ok(Scope::All),
            (Resource::Routine | Resource::MealPlan, Update | Delete, _) => Ok(Scope::CreatedBy(id)),
            (Resource::Routine | Resource::MealPlan, _, _) => forbidden,

            // Assignments
            (Resource::Assignment, _, Role::Admin) => Ok(Scope::All),
            (Resource::Assignment, Read | List | LogProgress, Role::Trainer) => {
                Ok(Scope::TrainerIs(id))
            }
            (Resource::Assignment, Read | List | LogProgress, Role::Client) => {
                Ok(Scope::ClientIs(id))
            }
            (Resource::Assignment, Create, Role::Trainer) => Ok(Scope::OwnClientsOf(id)),
            (Resource::Assignment, Update | SetStatus | Delete, Role::Trainer) => {
                Ok(Scope::TrainerIs(id))
            }
            (Resource::Assignment, _, _) => forbidden,

            // Calendar events
            (Resource::CalendarEvent, LogProgress, _) => forbidden,
            (Resource::CalendarEvent, _, Role::Admin) => Ok(Scope::All),
            (Resource::CalendarEvent, Create, Role::Trainer) => Ok(Scope::All),
            (Resource::CalendarEvent, Create | List, Role::Client) => Ok(Scope::EventOwner(id)),
            (Resource::CalendarEvent, _, _) => Ok(Scope::EventParticipant(id)),
        }
    }

    /// Decide whether the actor may perform `action` on `subject`
    pub fn authorize(
        actor: &Actor,
        resource: Resource,
        action: Action,
        subject: &Subject,
    ) -> Result<(), PolicyError> {
        let scope = Self::scope(actor, resource, action)?;
        if scope.admits(subject) {
            Ok(())
        } else {
            Err(PolicyError::Forbidden(resource))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            is_active: true,
            trainer_id: None,
        }
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Trainer), Just(Role::Client)]
    }

    #[rstest]
    #[case(Role::Admin, Resource::MealPlan, Action::Create, true)]
    #[case(Role::Trainer, Resource::MealPlan, Action::Create, true)]
    #[case(Role::Client, Resource::MealPlan, Action::Create, false)]
    #[case(Role::Client, Resource::Routine, Action::Create, true)]
    #[case(Role::Client, Resource::Exercise, Action::Create, true)]
    #[case(Role::Client, Resource::Assignment, Action::Create, false)]
    #[case(Role::Client, Resource::Assignment, Action::Update, false)]
    #[case(Role::Client, Resource::Assignment, Action::SetStatus, false)]
    #[case(Role::Client, Resource::Assignment, Action::Delete, false)]
    #[case(Role::Client, Resource::Assignment, Action::LogProgress, true)]
    #[case(Role::Trainer, Resource::User, Action::SetStatus, false)]
    #[case(Role::Admin, Resource::Exercise, Action::Update, false)]
    #[case(Role::Admin, Resource::Exercise, Action::Delete, false)]
    #[case(Role::Client, Resource::CalendarEvent, Action::Create, true)]
    fn test_action_permitted(
        #[case] role: Role,
        #[case] resource: Resource,
        #[case] action: Action,
        #[case] allowed: bool,
    ) {
        let actor = actor(role);
        assert_eq!(Policy::scope(&actor, resource, action).is_ok(), allowed);
    }

    #[rstest]
    #[case(Role::Admin, Resource::User, Action::List)]
    #[case(Role::Trainer, Resource::User, Action::List)]
    #[case(Role::Client, Resource::User, Action::List)]
    #[case(Role::Admin, Resource::Routine, Action::List)]
    #[case(Role::Trainer, Resource::Routine, Action::List)]
    #[case(Role::Client, Resource::MealPlan, Action::List)]
    #[case(Role::Trainer, Resource::Assignment, Action::List)]
    #[case(Role::Client, Resource::Assignment, Action::List)]
    #[case(Role::Trainer, Resource::CalendarEvent, Action::List)]
    #[case(Role::Client, Resource::CalendarEvent, Action::List)]
    #[case(Role::Client, Resource::CalendarEvent, Action::Read)]
    fn test_list_scopes(#[case] role: Role, #[case] resource: Resource, #[case] action: Action) {
        let actor = actor(role);
        let id = actor.id;
        let expected = match (role, resource, action) {
            (Role::Admin, _, _) => Scope::All,
            (Role::Trainer, Resource::User, _) => Scope::SelfOrClientsOf(id),
            (Role::Client, Resource::User, _) => Scope::SelfOnly(id),
            (Role::Trainer, Resource::Routine | Resource::MealPlan, _) => Scope::CreatedBy(id),
            (Role::Client, Resource::Routine | Resource::MealPlan, _) => {
                Scope::CreatedByOrAssignedTo(id)
            }
            (Role::Trainer, Resource::Assignment, _) => Scope::TrainerIs(id),
            (Role::Client, Resource::Assignment, _) => Scope::ClientIs(id),
            (Role::Trainer, Resource::CalendarEvent, _) => Scope::EventParticipant(id),
            (Role::Client, Resource::CalendarEvent, Action::List) => Scope::EventOwner(id),
            (Role::Client, Resource::CalendarEvent, _) => Scope::EventParticipant(id),
            _ => unreachable!(),
        };
        assert_eq!(Policy::scope(&actor, resource, action).unwrap(), expected);
    }

    #[test]
    fn test_inactive_actor_is_unauthenticated() {
        let mut admin = actor(Role::Admin);
        admin.is_active = false;
        assert_eq!(
            Policy::scope(&admin, Resource::Exercise, Action::List),
            Err(PolicyError::Unauthenticated)
        );
    }

    #[test]
    fn test_admin_cannot_change_own_status() {
        let admin = actor(Role::Admin);
        let own = Subject::User {
            id: admin.id,
            trainer_id: None,
        };
        let other = Subject::User {
            id: Uuid::new_v4(),
            trainer_id: None,
        };
        assert!(Policy::authorize(&admin, Resource::User, Action::SetStatus, &own).is_err());
        assert!(Policy::authorize(&admin, Resource::User, Action::SetStatus, &other).is_ok());
    }

    #[test]
    fn test_trainer_sees_own_clients_only() {
        let trainer = actor(Role::Trainer);
        let own_client = Subject::User {
            id: Uuid::new_v4(),
            trainer_id: Some(trainer.id),
        };
        let foreign_client = Subject::User {
            id: Uuid::new_v4(),
            trainer_id: Some(Uuid::new_v4()),
        };
        assert!(Policy::authorize(&trainer, Resource::User, Action::Read, &own_client).is_ok());
        assert_eq!(
            Policy::authorize(&trainer, Resource::User, Action::Read, &foreign_client),
            Err(PolicyError::Forbidden(Resource::User))
        );
    }

    #[test]
    fn test_routine_mutation_requires_ownership() {
        let trainer_a = actor(Role::Trainer);
        let trainer_b = actor(Role::Trainer);
        let admin = actor(Role::Admin);
        let routine = Subject::Plan {
            created_by: trainer_a.id,
            assignees: vec![],
        };

        for action in [Action::Update, Action::Delete] {
            assert!(Policy::authorize(&trainer_a, Resource::Routine, action, &routine).is_ok());
            assert!(Policy::authorize(&trainer_b, Resource::Routine, action, &routine).is_err());
            assert!(Policy::authorize(&admin, Resource::Routine, action, &routine).is_ok());
        }
    }

    #[test]
    fn test_assigned_client_may_read_but_not_edit_plan() {
        let client = actor(Role::Client);
        let plan = Subject::Plan {
            created_by: Uuid::new_v4(),
            assignees: vec![client.id],
        };
        assert!(Policy::authorize(&client, Resource::MealPlan, Action::Read, &plan).is_ok());
        assert!(Policy::authorize(&client, Resource::MealPlan, Action::Update, &plan).is_err());
    }

    #[test]
    fn test_trainer_assigns_only_own_clients() {
        let trainer = actor(Role::Trainer);
        let own = Subject::NewAssignment {
            trainer_id: trainer.id,
            client_trainer_id: Some(trainer.id),
        };
        let foreign_client = Subject::NewAssignment {
            trainer_id: trainer.id,
            client_trainer_id: Some(Uuid::new_v4()),
        };
        let other_trainer = Subject::NewAssignment {
            trainer_id: Uuid::new_v4(),
            client_trainer_id: Some(trainer.id),
        };
        let create = |s: &Subject| Policy::authorize(&trainer, Resource::Assignment, Action::Create, s);
        assert!(create(&own).is_ok());
        assert!(create(&foreign_client).is_err());
        assert!(create(&other_trainer).is_err());
    }

    #[test]
    fn test_client_creates_events_for_self_only() {
        let client = actor(Role::Client);
        let own = Subject::Event {
            user_id: client.id,
            trainer_id: None,
        };
        let other = Subject::Event {
            user_id: Uuid::new_v4(),
            trainer_id: None,
        };
        let create = |s: &Subject| Policy::authorize(&client, Resource::CalendarEvent, Action::Create, s);
        assert!(create(&own).is_ok());
        assert_eq!(
            create(&other),
            Err(PolicyError::Forbidden(Resource::CalendarEvent))
        );

        let trainer = actor(Role::Trainer);
        assert!(Policy::authorize(&trainer, Resource::CalendarEvent, Action::Create, &other).is_ok());
    }

    #[test]
    fn test_deletion_strategies() {
        assert_eq!(Resource::Routine.deletion(), Deletion::Soft);
        assert_eq!(Resource::MealPlan.deletion(), Deletion::Soft);
        assert_eq!(Resource::Assignment.deletion(), Deletion::Hard);
        assert_eq!(Resource::CalendarEvent.deletion(), Deletion::Hard);
        assert_eq!(Resource::User.deletion(), Deletion::DeactivateOnly);
    }

    #[test]
    fn test_mismatched_subject_is_denied() {
        let scope = Scope::CreatedBy(Uuid::new_v4());
        let event = Subject::Event {
            user_id: Uuid::new_v4(),
            trainer_id: None,
        };
        assert!(!scope.admits(&event));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Single-event access holds iff admin, owner or referenced trainer
        #[test]
        fn prop_event_access_rule(
            role in role_strategy(),
            owner_is_actor in any::<bool>(),
            trainer_is_actor in any::<bool>(),
            has_trainer in any::<bool>(),
            action in prop_oneof![
                Just(Action::Read),
                Just(Action::Update),
                Just(Action::Delete),
                Just(Action::SetStatus),
            ],
        ) {
            let actor = actor(role);
            let user_id = if owner_is_actor { actor.id } else { Uuid::new_v4() };
            let trainer_id = match (has_trainer, trainer_is_actor) {
                (false, _) => None,
                (true, true) => Some(actor.id),
                (true, false) => Some(Uuid::new_v4()),
            };
            let subject = Subject::Event { user_id, trainer_id };

            let expected = role == Role::Admin
                || user_id == actor.id
                || trainer_id == Some(actor.id);
            let decision = Policy::authorize(&actor, Resource::CalendarEvent, action, &subject);

            prop_assert_eq!(decision.is_ok(), expected);
            if !expected {
                prop_assert_eq!(decision, Err(PolicyError::Forbidden(Resource::CalendarEvent)));
            }
        }

        /// A client only ever sees plans they created or were assigned
        #[test]
        fn prop_client_plan_visibility(
            created_by_actor in any::<bool>(),
            assigned in any::<bool>(),
            other_assignees in 0usize..4,
            meal_plan in any::<bool>(),
        ) {
            let client = actor(Role::Client);
            let created_by = if created_by_actor { client.id } else { Uuid::new_v4() };
            let mut assignees: Vec<Uuid> = (0..other_assignees).map(|_| Uuid::new_v4()).collect();
            if assigned {
                assignees.push(client.id);
            }
            let resource = if meal_plan { Resource::MealPlan } else { Resource::Routine };
            let subject = Subject::Plan { created_by, assignees };

            let visible = Policy::authorize(&client, resource, Action::List, &subject).is_ok();
            prop_assert_eq!(visible, created_by_actor || assigned);
        }

        /// Deactivated actors are rejected before any table lookup
        #[test]
        fn prop_inactive_actor_always_unauthenticated(role in role_strategy()) {
            let mut actor = actor(role);
            actor.is_active = false;
            for resource in [
                Resource::User,
                Resource::Exercise,
                Resource::Routine,
                Resource::MealPlan,
                Resource::Assignment,
                Resource::CalendarEvent,
            ] {
                prop_assert_eq!(
                    Policy::scope(&actor, resource, Action::Read),
                    Err(PolicyError::Unauthenticated)
                );
            }
        }
    }
}
