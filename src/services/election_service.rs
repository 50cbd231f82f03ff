use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::store::models::ssg::{Candidate, Election, SsgEvent, VoteRecord};
use crate::store::Store;

#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    #[error("Election not found")]
    ElectionNotFound,
    #[error("Candidate not found")]
    CandidateNotFound,
    #[error("End date must be after start date")]
    InvalidDateRange,
    #[error("Title, school year, start date, and end date are required")]
    MissingFields,
    #[error("User is already a candidate for this position")]
    DuplicateCandidate,
    #[error("Voting is not currently active for this election")]
    NotActive,
    #[error("You have already voted in this election")]
    AlreadyVoted,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateElection {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub school_year: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nominate {
    pub election_id: Uuid,
    pub user_id: Uuid,
    pub position: String,
    pub full_name: String,
    pub grade_level: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSsgEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    pub school_year: String,
}

/// A member surfaced by the SSG roster view: anyone who stood as a
/// candidate, plus users directly holding the SSG role.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SsgMember {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub lrn: Option<String>,
    pub position: String,
}

pub struct ElectionService {
    store: Arc<Store>,
}

impl ElectionService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create_election(
        &self,
        request: CreateElection,
    ) -> Result<Election, ElectionError> {
        if request.title.is_empty() || request.school_year.is_empty() {
            return Err(ElectionError::MissingFields);
        }
        if request.start_date >= request.end_date {
            return Err(ElectionError::InvalidDateRange);
        }

        let election = Election {
            id: Uuid::new_v4(),
            title: request.title,
            description: request.description,
            school_year: request.school_year,
            candidates: Vec::new(),
            is_active: true,
            start_date: request.start_date,
            end_date: request.end_date,
        };

        {
            let mut doc = self.store.ssg().await;
            doc.elections.push(election.clone());
            doc.commit();
        }
        self.store.checkpoint().await;

        tracing::info!(election = %election.id, title = %election.title, "election created");
        Ok(election)
    }

    pub async fn nominate(
        &self,
        actor: Uuid,
        request: Nominate,
    ) -> Result<Candidate, ElectionError> {
        let candidate = {
            let mut doc = self.store.ssg().await;
            let election = doc
                .election_mut(request.election_id)
                .ok_or(ElectionError::ElectionNotFound)?;

            if election
                .candidates
                .iter()
                .any(|c| c.user == request.user_id && c.position == request.position)
            {
                return Err(ElectionError::DuplicateCandidate);
            }

            let candidate = Candidate {
                id: Uuid::new_v4(),
                user: request.user_id,
                full_name: request.full_name,
                grade_level: request.grade_level,
                position: request.position,
                votes: 0,
                created_by: actor,
            };
            election.candidates.push(candidate.clone());
            doc.commit();
            candidate
        };
        self.store.checkpoint().await;

        Ok(candidate)
    }

    /// Cast a vote. The already-voted check, the counter increment, and the
    /// vote record append all happen under the aggregate lock, so two
    /// concurrent votes by the same voter cannot both pass.
    pub async fn vote(
        &self,
        voter: Uuid,
        election_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Election, ElectionError> {
        let now = Utc::now();
        let election = {
            let mut doc = self.store.ssg().await;
            let election = doc
                .election(election_id)
                .ok_or(ElectionError::ElectionNotFound)?;

            if !election.is_open(now) {
                return Err(ElectionError::NotActive);
            }
            if election.candidate(candidate_id).is_none() {
                return Err(ElectionError::CandidateNotFound);
            }
            if doc.has_voted(election_id, voter) {
                return Err(ElectionError::AlreadyVoted);
            }

            let election = doc
                .election_mut(election_id)
                .ok_or(ElectionError::ElectionNotFound)?;
            let candidate = election
                .candidate_mut(candidate_id)
                .ok_or(ElectionError::CandidateNotFound)?;
            candidate.votes += 1;

            doc.votes.push(VoteRecord {
                election_id,
                candidate_id,
                voter,
                cast_at: now,
            });
            doc.commit();

            doc.election(election_id)
                .cloned()
                .ok_or(ElectionError::ElectionNotFound)?
        };
        self.store.checkpoint().await;

        tracing::info!(%election_id, %candidate_id, %voter, "vote recorded");
        Ok(election)
    }

    /// Candidates of an election, highest vote count first. Ties keep
    /// nomination order.
    pub async fn tally(&self, election_id: Uuid) -> Result<Vec<Candidate>, ElectionError> {
        let doc = self.store.ssg().await;
        let election = doc
            .election(election_id)
            .ok_or(ElectionError::ElectionNotFound)?;

        let mut standings = election.candidates.clone();
        standings.sort_by_key(|c| std::cmp::Reverse(c.votes));
        Ok(standings)
    }

    pub async fn elections(&self) -> Vec<Election> {
        self.store.ssg().await.elections.clone()
    }

    pub async fn members(&self) -> Vec<SsgMember> {
        let mut members: Vec<SsgMember> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        let elections = self.elections().await;
        for election in &elections {
            for candidate in &election.candidates {
                if !seen.insert(candidate.user) {
                    continue;
                }
                let user = self.store.user(candidate.user).await;
                members.push(SsgMember {
                    id: candidate.user,
                    full_name: user
                        .as_ref()
                        .filter(|u| !u.full_name.is_empty())
                        .map(|u| u.full_name.clone())
                        .unwrap_or_else(|| candidate.full_name.clone()),
                    email: user.as_ref().map(|u| u.email.clone()),
                    lrn: user.as_ref().and_then(|u| u.lrn.clone()),
                    position: candidate.position.clone(),
                });
            }
        }

        for user in self.store.users_with_role(&Role::Ssg).await {
            if !seen.insert(user.id) {
                continue;
            }
            members.push(SsgMember {
                id: user.id,
                full_name: user.full_name.clone(),
                email: Some(user.email.clone()),
                lrn: user.lrn.clone(),
                position: "SSG Member".to_string(),
            });
        }

        members
    }

    pub async fn create_event(
        &self,
        actor: Uuid,
        request: CreateSsgEvent,
    ) -> Result<SsgEvent, ElectionError> {
        if request.title.is_empty() || request.school_year.is_empty() {
            return Err(ElectionError::MissingFields);
        }

        let event = SsgEvent {
            id: Uuid::new_v4(),
            title: request.title,
            description: request.description,
            date: request.date,
            location: request.location,
            school_year: request.school_year,
            created_by: actor,
        };

        {
            let mut doc = self.store.ssg().await;
            doc.events.push(event.clone());
            doc.commit();
        }
        self.store.checkpoint().await;

        Ok(event)
    }

    pub async fn events(&self) -> Vec<SsgEvent> {
        let mut events = self.store.ssg().await.events.clone();
        events.sort_by_key(|e| e.date);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_window() -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now - Duration::hours(1), now + Duration::hours(1))
    }

    fn service() -> (Arc<Store>, ElectionService) {
        let store = Arc::new(Store::in_memory());
        (store.clone(), ElectionService::new(store))
    }

    async fn seeded_election(svc: &ElectionService) -> (Election, Candidate, Candidate) {
        let (start, end) = open_window();
        let election = svc
            .create_election(CreateElection {
                title: "SSG Election 2025".to_string(),
                description: None,
                school_year: "2025-2026".to_string(),
                start_date: start,
                end_date: end,
            })
            .await
            .unwrap();

        let actor = Uuid::new_v4();
        let first = svc
            .nominate(
                actor,
                Nominate {
                    election_id: election.id,
                    user_id: Uuid::new_v4(),
                    position: "President".to_string(),
                    full_name: "Juan Dela Cruz".to_string(),
                    grade_level: 10,
                },
            )
            .await
            .unwrap();
        let second = svc
            .nominate(
                actor,
                Nominate {
                    election_id: election.id,
                    user_id: Uuid::new_v4(),
                    position: "President".to_string(),
                    full_name: "Maria Clara".to_string(),
                    grade_level: 11,
                },
            )
            .await
            .unwrap();

        (election, first, second)
    }

    #[tokio::test]
    async fn election_requires_ordered_dates() {
        let (_, svc) = service();
        let now = Utc::now();
        let result = svc
            .create_election(CreateElection {
                title: "Backwards".to_string(),
                description: None,
                school_year: "2025-2026".to_string(),
                start_date: now,
                end_date: now - Duration::hours(1),
            })
            .await;
        assert!(matches!(result, Err(ElectionError::InvalidDateRange)));
    }

    #[tokio::test]
    async fn duplicate_nomination_for_same_position_conflicts() {
        let (_, svc) = service();
        let (election, first, _) = seeded_election(&svc).await;

        let duplicate = svc
            .nominate(
                Uuid::new_v4(),
                Nominate {
                    election_id: election.id,
                    user_id: first.user,
                    position: "President".to_string(),
                    full_name: first.full_name.clone(),
                    grade_level: 10,
                },
            )
            .await;
        assert!(matches!(duplicate, Err(ElectionError::DuplicateCandidate)));

        // the same user may run for a different position
        let other_position = svc
            .nominate(
                Uuid::new_v4(),
                Nominate {
                    election_id: election.id,
                    user_id: first.user,
                    position: "Secretary".to_string(),
                    full_name: first.full_name.clone(),
                    grade_level: 10,
                },
            )
            .await;
        assert!(other_position.is_ok());
    }

    #[tokio::test]
    async fn one_vote_per_voter_per_election() {
        let (store, svc) = service();
        let (election, first, second) = seeded_election(&svc).await;
        let voter = Uuid::new_v4();

        let after = svc.vote(voter, election.id, first.id).await.unwrap();
        assert_eq!(after.candidate(first.id).unwrap().votes, 1);

        // any further vote by the same voter conflicts, for any candidate
        assert!(matches!(
            svc.vote(voter, election.id, second.id).await,
            Err(ElectionError::AlreadyVoted)
        ));
        assert!(matches!(
            svc.vote(voter, election.id, first.id).await,
            Err(ElectionError::AlreadyVoted)
        ));

        // counters stay consistent with the vote records
        let doc = store.ssg().await;
        let recorded = doc
            .votes
            .iter()
            .filter(|v| v.election_id == election.id && v.candidate_id == first.id)
            .count() as u64;
        assert_eq!(doc.election(election.id).unwrap().candidate(first.id).unwrap().votes, recorded);
    }

    #[tokio::test]
    async fn voting_outside_window_fails_regardless_of_prior_votes() {
        let (_, svc) = service();
        let now = Utc::now();
        let election = svc
            .create_election(CreateElection {
                title: "Closed".to_string(),
                description: None,
                school_year: "2025-2026".to_string(),
                start_date: now - Duration::hours(3),
                end_date: now - Duration::hours(1),
            })
            .await
            .unwrap();
        let candidate = svc
            .nominate(
                Uuid::new_v4(),
                Nominate {
                    election_id: election.id,
                    user_id: Uuid::new_v4(),
                    position: "President".to_string(),
                    full_name: "Juan Dela Cruz".to_string(),
                    grade_level: 10,
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            svc.vote(Uuid::new_v4(), election.id, candidate.id).await,
            Err(ElectionError::NotActive)
        ));
    }

    #[tokio::test]
    async fn deactivated_election_rejects_votes() {
        let (store, svc) = service();
        let (election, first, _) = seeded_election(&svc).await;

        {
            let mut doc = store.ssg().await;
            doc.election_mut(election.id).unwrap().is_active = false;
            doc.commit();
        }

        assert!(matches!(
            svc.vote(Uuid::new_v4(), election.id, first.id).await,
            Err(ElectionError::NotActive)
        ));
    }

    #[tokio::test]
    async fn tally_orders_by_votes_with_stable_ties() {
        let (_, svc) = service();
        let (election, first, second) = seeded_election(&svc).await;

        // two votes for the runner-up listed second
        svc.vote(Uuid::new_v4(), election.id, second.id).await.unwrap();
        svc.vote(Uuid::new_v4(), election.id, second.id).await.unwrap();
        svc.vote(Uuid::new_v4(), election.id, first.id).await.unwrap();

        let standings = svc.tally(election.id).await.unwrap();
        assert_eq!(standings[0].id, second.id);
        assert_eq!(standings[1].id, first.id);

        // equal counts fall back to nomination order
        svc.vote(Uuid::new_v4(), election.id, first.id).await.unwrap();
        let standings = svc.tally(election.id).await.unwrap();
        assert_eq!(standings[0].id, first.id);
        assert_eq!(standings[0].votes, standings[1].votes);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_by_one_voter_land_exactly_once() {
        let (store, svc) = service();
        let (election, first, _) = seeded_election(&svc).await;
        let voter = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let election_id = election.id;
            let candidate_id = first.id;
            handles.push(tokio::spawn(async move {
                ElectionService::new(store)
                    .vote(voter, election_id, candidate_id)
                    .await
                    .is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);

        let doc = store.ssg().await;
        assert_eq!(doc.votes.len(), 1);
        assert_eq!(
            doc.election(election.id).unwrap().candidate(first.id).unwrap().votes,
            1
        );
    }
}
