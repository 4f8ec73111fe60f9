//! Assignee selection for configured tasks.

use super::{AccessDecision, PermissionEvaluator};
use crate::access::domain::RoleAssignment;
use crate::task::domain::{ActorId, Permission, Task, TaskAction};
use chrono::{DateTime, Utc};

const WORKING_PERMISSIONS: [Permission; 2] = [Permission::Own, Permission::Execute];

/// Assignment transition decided for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentDecision {
    /// The current assignee (or lack of one) stays in place.
    Keep,
    /// The task goes to this actor.
    Assign(ActorId),
    /// The task is left without an assignee.
    Unassign,
}

impl AssignmentDecision {
    /// Returns the assignee after applying the decision.
    #[must_use]
    pub fn resulting_assignee(&self, previous: Option<&ActorId>) -> Option<ActorId> {
        match self {
            Self::Keep => previous.cloned(),
            Self::Assign(actor) => Some(actor.clone()),
            Self::Unassign => None,
        }
    }

    /// Maps the decision onto the audit action recorded on the task.
    #[must_use]
    pub fn audit_action(&self, previous: Option<&ActorId>) -> TaskAction {
        match (previous, self.resulting_assignee(previous)) {
            (None, Some(_)) => TaskAction::AutoAssign,
            (Some(_), None) => TaskAction::AutoUnassign,
            (Some(before), Some(after)) if *before != after => TaskAction::AutoUnassignAssign,
            _ => TaskAction::Configure,
        }
    }
}

/// Picks an assignee among the actors holding roles on the task's case.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAssignmentResolver {
    evaluator: PermissionEvaluator,
}

impl AutoAssignmentResolver {
    /// Creates a resolver backed by `evaluator`.
    #[must_use]
    pub const fn new(evaluator: PermissionEvaluator) -> Self {
        Self { evaluator }
    }

    /// Decides the assignment for `task` given the case's role assignments.
    ///
    /// An eligible current assignee is never displaced. Otherwise the
    /// candidate matching an auto-assignable grant with the lowest priority
    /// wins; ties go to the candidate supplied first.
    #[must_use]
    pub fn resolve(
        &self,
        task: &Task,
        candidates: &[RoleAssignment],
        now: DateTime<Utc>,
    ) -> AssignmentDecision {
        if let Some(current) = task.assignee() {
            if self.is_eligible(task, candidates, current, now) {
                return AssignmentDecision::Keep;
            }
        }

        let mut seen: Vec<&ActorId> = Vec::new();
        let mut best: Option<(u32, &ActorId)> = None;
        for assignment in candidates {
            let actor = assignment.actor_id();
            if seen.contains(&actor) {
                continue;
            }
            seen.push(actor);

            let Some(rank) = self.auto_assign_rank(task, candidates, actor, now) else {
                continue;
            };
            if best.is_none_or(|(top, _)| rank < top) {
                best = Some((rank, actor));
            }
        }

        best.map_or(AssignmentDecision::Unassign, |(_, actor)| {
            AssignmentDecision::Assign(actor.clone())
        })
    }

    fn is_eligible(
        &self,
        task: &Task,
        assignments: &[RoleAssignment],
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> bool {
        matches!(
            self.evaluator.evaluate(task, assignments, actor, now),
            AccessDecision::Granted(permissions) if permissions.contains_any(&WORKING_PERMISSIONS)
        )
    }

    /// Returns the best priority among the auto-assignable grants the actor
    /// matches, or `None` when the actor cannot be auto-assigned.
    fn auto_assign_rank(
        &self,
        task: &Task,
        assignments: &[RoleAssignment],
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Option<u32> {
        if !self.is_eligible(task, assignments, actor, now) {
            return None;
        }
        self.evaluator
            .matched_grants(task, assignments, actor, now)?
            .into_iter()
            .filter(|grant| grant.is_auto_assignable())
            .map(|grant| grant.assignment_priority().unwrap_or(u32::MAX))
            .min()
    }
}
