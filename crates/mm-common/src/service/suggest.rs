use tracing::{info, instrument};

use super::{MentorshipService, ServiceError};
use crate::api::mentor_request::MentorFilter;
use crate::matching::{rank, RankedMentor};

impl MentorshipService {
    /// Ranks every approved mentor in the store against the team.
    #[instrument(skip(self))]
    pub async fn suggest_mentors(&self, team_id: &str) -> Result<Vec<RankedMentor>, ServiceError> {
        let team = self.get_team(team_id).await?;
        let pool = self.store.list_mentors(&MentorFilter::approved_only()).await?;
        let ranked = rank(&team, &pool, Some(&self.weights))?;

        info!(
            team_id = %team.id,
            candidates = pool.len(),
            top_score = ranked.first().map(|r| r.score),
            "suggested mentors"
        );
        Ok(ranked)
    }
}
