//! Permission evaluation for an actor against a task's role grants.

use crate::access::domain::{GrantType, RoleAssignment, RoleType};
use crate::task::domain::{ActorId, Permission, PermissionSet, Task, TaskRoleGrant};
use chrono::{DateTime, Utc};

/// Result of evaluating an actor's access to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// No grant applies, or an exclusion matched.
    Denied,
    /// The union of every matching grant.
    Granted(PermissionSet),
}

impl AccessDecision {
    /// Returns whether access was granted.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// Returns the effective permissions, empty when denied.
    #[must_use]
    pub const fn permissions(self) -> PermissionSet {
        match self {
            Self::Denied => PermissionSet::empty(),
            Self::Granted(permissions) => permissions,
        }
    }

    /// Returns whether the decision grants at least one of `permissions`.
    #[must_use]
    pub fn permits_any(self, permissions: &[Permission]) -> bool {
        self.permissions().contains_any(permissions)
    }
}

/// How strictly scope attributes must line up with the task's case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeRule {
    CaseType,
    Case,
}

/// Stateless evaluator reconciling role assignments with task role grants.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    /// Creates an evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluates what `actor` may do to `task`.
    ///
    /// Assignments belonging to other actors, outside their validity window
    /// at `now`, or cleared below the task's classification are ignored. A
    /// single matching exclusion denies access outright; otherwise the
    /// permissions of every matching grant are combined.
    #[must_use]
    pub fn evaluate(
        &self,
        task: &Task,
        assignments: &[RoleAssignment],
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        match self.matched_grants(task, assignments, actor, now) {
            Some(grants) if !grants.is_empty() => AccessDecision::Granted(
                grants
                    .iter()
                    .fold(PermissionSet::empty(), |acc, grant| acc.union(grant.permissions())),
            ),
            _ => AccessDecision::Denied,
        }
    }

    /// Returns the grants matched by the actor's non-excluded assignments.
    ///
    /// Returns `None` when an exclusion matched. A grant matched by several
    /// assignments appears once per match.
    #[must_use]
    pub fn matched_grants<'t>(
        &self,
        task: &'t Task,
        assignments: &[RoleAssignment],
        actor: &ActorId,
        now: DateTime<Utc>,
    ) -> Option<Vec<&'t TaskRoleGrant>> {
        let applicable: Vec<&RoleAssignment> = assignments
            .iter()
            .filter(|assignment| assignment.actor_id() == actor)
            .filter(|assignment| assignment.is_valid_at(now))
            .filter(|assignment| {
                assignment
                    .classification()
                    .covers(task.security_classification())
            })
            .collect();

        let (exclusions, grants): (Vec<&RoleAssignment>, Vec<&RoleAssignment>) = applicable
            .into_iter()
            .partition(|assignment| assignment.grant_type() == GrantType::Excluded);

        let excluded = exclusions
            .iter()
            .any(|assignment| task.roles().iter().any(|grant| matches(task, grant, assignment)));
        if excluded {
            return None;
        }

        Some(
            grants
                .iter()
                .flat_map(|assignment| {
                    task.roles()
                        .iter()
                        .filter(move |grant| matches(task, grant, assignment))
                })
                .collect(),
        )
    }
}

fn matches(task: &Task, grant: &TaskRoleGrant, assignment: &RoleAssignment) -> bool {
    if grant.role_name() != assignment.role_name() {
        return false;
    }
    if let Some(category) = grant.role_category() {
        if assignment.role_category() != Some(category) {
            return false;
        }
    }
    match assignment.grant_type() {
        GrantType::Standard | GrantType::Organisation => {
            scope_matches(task, assignment, ScopeRule::CaseType)
        }
        GrantType::Specific => scope_matches(task, assignment, ScopeRule::Case),
        GrantType::Challenged => {
            scope_matches(task, assignment, ScopeRule::CaseType)
                && !grant.authorisations().is_disjoint(assignment.authorisations())
        }
        GrantType::Excluded => match assignment.role_type() {
            RoleType::Case => scope_matches(task, assignment, ScopeRule::Case),
            RoleType::Organisation => scope_matches(task, assignment, ScopeRule::CaseType),
        },
    }
}

fn scope_matches(task: &Task, assignment: &RoleAssignment, rule: ScopeRule) -> bool {
    let scope = assignment.scope();
    let case = task.case();
    let jurisdiction = scope
        .jurisdiction
        .as_deref()
        .is_none_or(|jurisdiction| jurisdiction == case.jurisdiction());
    let case_type = scope
        .case_type
        .as_deref()
        .is_none_or(|case_type| case_type == case.case_type());
    let region = match (scope.region.as_deref(), task.attributes().region.as_deref()) {
        (Some(required), Some(actual)) => required == actual,
        _ => true,
    };
    let case_id = match rule {
        ScopeRule::CaseType => true,
        ScopeRule::Case => scope.case_id.as_ref() == Some(case.case_id()),
    };
    jurisdiction && case_type && region && case_id
}
