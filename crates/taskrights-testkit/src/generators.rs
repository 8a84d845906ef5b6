//! Proptest generators for property-based testing.

use proptest::prelude::*;

use taskrights_core::{Actor, Grantee, ResourceRecord, ResourceRef, Right, TeamId, UserId};
use taskrights_store::{GrantStoreExt, Store};

/// Number of teams in a generated scenario.
pub const TEAMS: usize = 3;

/// The user whose access a scenario checks.
pub const ACTOR: UserId = UserId(10);
/// Creates the resources when the actor does not own them.
pub const CREATOR: UserId = UserId(11);

pub const PROJECT: ResourceRef = ResourceRef::project(1);
pub const BUCKET: ResourceRef = ResourceRef::bucket(1);

/// Generate a valid right.
pub fn right() -> impl Strategy<Value = Right> {
    prop::sample::select(Right::ALL.to_vec())
}

/// Generate a right or its absence.
pub fn maybe_right() -> impl Strategy<Value = Option<Right>> {
    prop::option::of(right())
}

/// Generate a raw right value, mostly near the valid range.
pub fn raw_right() -> impl Strategy<Value = i64> {
    prop_oneof![-2i64..=4, any::<i64>()]
}

/// Generate a grantee among the given number of users and teams.
pub fn grantee(users: i64, teams: i64) -> impl Strategy<Value = Grantee> {
    prop_oneof![
        (1..=users).prop_map(|id| Grantee::User(UserId(id))),
        (1..=teams).prop_map(|id| Grantee::Team(TeamId(id))),
    ]
}

/// One bucket inside one project, and who holds what on each.
///
/// The actor is checked against the bucket.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Whether the actor created (and so owns) both resources.
    pub owner: bool,
    /// Whether the actor is in team `i + 1`.
    pub memberships: Vec<bool>,
    pub project_user: Option<Right>,
    pub bucket_user: Option<Right>,
    /// Grant for team `i + 1` on the project.
    pub project_teams: Vec<Option<Right>>,
    /// Grant for team `i + 1` on the bucket.
    pub bucket_teams: Vec<Option<Right>>,
    pub wanted: Right,
}

impl Scenario {
    /// The decision, computed directly from the grant table.
    pub fn expected(&self) -> bool {
        if self.owner {
            return true;
        }
        let at_bucket = self.held(self.bucket_user, &self.bucket_teams);
        let at_project = self.held(self.project_user, &self.project_teams);
        Right::held_satisfies(at_bucket, self.wanted)
            || Right::held_satisfies(at_project, self.wanted)
    }

    fn held(&self, user: Option<Right>, teams: &[Option<Right>]) -> Option<Right> {
        teams
            .iter()
            .zip(&self.memberships)
            .filter(|(_, member)| **member)
            .fold(user, |best, (team, _)| Right::strongest(best, *team))
    }

    /// Write the scenario into an empty store and return the actor.
    pub async fn seed<S: Store + ?Sized>(&self, store: &S) -> taskrights_store::Result<Actor> {
        store.insert_user(ACTOR, "actor").await?;
        store.insert_user(CREATOR, "creator").await?;
        for (i, member) in self.memberships.iter().enumerate() {
            let team = team(i);
            store.insert_team(team, &format!("team-{}", team.0)).await?;
            if *member {
                store.add_team_member(team, ACTOR).await?;
            }
        }

        let owner = if self.owner { ACTOR } else { CREATOR };
        store
            .insert_resource(&ResourceRecord::top_level(PROJECT, owner))
            .await?;
        store
            .insert_resource(&ResourceRecord::nested(BUCKET, owner, PROJECT))
            .await?;

        for (resource, user, teams) in [
            (PROJECT, self.project_user, &self.project_teams),
            (BUCKET, self.bucket_user, &self.bucket_teams),
        ] {
            if let Some(right) = user {
                store.grant_to_user(&resource, ACTOR, right).await?;
            }
            for (i, right) in teams.iter().enumerate() {
                if let Some(right) = right {
                    store.grant_to_team(&resource, team(i), *right).await?;
                }
            }
        }

        Ok(Actor::user(ACTOR, store.teams_of(ACTOR).await?))
    }
}

fn team(index: usize) -> TeamId {
    TeamId(index as i64 + 1)
}

/// Generate a scenario.
pub fn scenario() -> impl Strategy<Value = Scenario> {
    (
        any::<bool>(),
        prop::collection::vec(any::<bool>(), TEAMS),
        maybe_right(),
        maybe_right(),
        prop::collection::vec(maybe_right(), TEAMS),
        prop::collection::vec(maybe_right(), TEAMS),
        right(),
    )
        .prop_map(
            |(owner, memberships, project_user, bucket_user, project_teams, bucket_teams, wanted)| {
                Scenario {
                    owner,
                    memberships,
                    project_user,
                    bucket_user,
                    project_teams,
                    bucket_teams,
                    wanted,
                }
            },
        )
}

impl Arbitrary for Scenario {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        scenario().boxed()
    }
}
