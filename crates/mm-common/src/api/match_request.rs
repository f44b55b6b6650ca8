use serde::Deserialize;

use crate::matching::MatchFactors;
use crate::model::{Match, MatchStatus, Session};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    pub team_id: String,
    pub mentor_id: String,
    pub score: u8,
    pub factors: MatchFactors,
    #[serde(default)]
    pub status: Option<MatchStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    pub score: Option<u8>,
    pub factors: Option<MatchFactors>,
    pub status: Option<MatchStatus>,
}

impl MatchUpdate {
    pub fn apply(self, record: &mut Match) {
        if let Some(score) = self.score {
            record.score = score;
        }
        if let Some(factors) = self.factors {
            record.factors = factors;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}

/// Narrows matches or sessions to one team and/or one mentor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantFilter {
    pub team_id: Option<String>,
    pub mentor_id: Option<String>,
}

impl ParticipantFilter {
    fn accepts(&self, team_id: &str, mentor_id: &str) -> bool {
        self.team_id.as_deref().map_or(true, |id| id == team_id)
            && self.mentor_id.as_deref().map_or(true, |id| id == mentor_id)
    }

    pub fn matches(&self, record: &Match) -> bool {
        self.accepts(&record.team_id, &record.mentor_id)
    }

    pub fn matches_session(&self, session: &Session) -> bool {
        self.accepts(&session.team_id, &session.mentor_id)
    }
}
