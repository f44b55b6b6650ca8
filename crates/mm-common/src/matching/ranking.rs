use serde::Serialize;
use tracing::debug;

use super::{
    scoring::score_validated,
    validation::{validate_mentor, validate_team},
    MatchFactors, MatchingError, Weights,
};
use crate::model::{Mentor, Team};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMentor {
    pub mentor: Mentor,
    pub score: u8,
    pub factors: MatchFactors,
}

/// Scores every approved mentor in `candidates` against `team`, best first.
///
/// Validation of the team, the weights and every approved candidate happens
/// before any scoring, so the call either ranks the whole pool or fails.
/// Equal scores keep their candidate-pool order.
pub fn rank(team: &Team, candidates: &[Mentor], weights: Option<&Weights>) -> Result<Vec<RankedMentor>, MatchingError> {
    let weights = weights.copied().unwrap_or_default();
    weights.validate()?;
    validate_team(team)?;

    let eligible: Vec<&Mentor> = candidates.iter().filter(|mentor| mentor.approved).collect();
    for mentor in &eligible {
        validate_mentor(mentor)?;
    }

    let mut ranked: Vec<RankedMentor> = eligible
        .into_iter()
        .map(|mentor| {
            let result = score_validated(team, mentor, &weights);
            RankedMentor {
                mentor: mentor.clone(),
                score: result.score,
                factors: result.factors,
            }
        })
        .collect();

    // `sort_by` is stable, which keeps ties in pool order.
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    debug!(
        team_id = %team.id,
        pool = candidates.len(),
        ranked = ranked.len(),
        "ranked mentors"
    );

    Ok(ranked)
}
