use serde::Serialize;

use super::{
    factors::{area_factor, language_factor, modality_factor, region_factor, schedule_factor},
    validation::{validate_mentor, validate_team},
    MatchFactors, MatchingError, Weights,
};
use crate::model::{Mentor, Team};

/// Guards round-half-up against sums like 67.4999999999 that are 67.5 in exact arithmetic.
const ROUNDING_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    pub score: u8,
    pub factors: MatchFactors,
}

/// Computes the five factors without validating inputs.
pub fn compute_factors(team: &Team, mentor: &Mentor) -> MatchFactors {
    MatchFactors {
        area: area_factor(&team.steam_areas, &mentor.skills_tech, &mentor.skills_non_tech),
        schedule: schedule_factor(&team.availability, &mentor.availability),
        language: language_factor(&team.languages, &mentor.languages),
        modality: modality_factor(team.modality, mentor.modality),
        region: region_factor(&team.region, &mentor.regions, mentor.modality),
    }
}

pub fn round_half_up(value: f64) -> u8 {
    (value + 0.5 + ROUNDING_EPSILON).floor().clamp(0.0, 100.0) as u8
}

/// Weighted compatibility of `mentor` for `team`. `None` uses the default weights.
pub fn score(team: &Team, mentor: &Mentor, weights: Option<&Weights>) -> Result<MatchScore, MatchingError> {
    let weights = weights.copied().unwrap_or_default();
    weights.validate()?;
    validate_team(team)?;
    validate_mentor(mentor)?;

    Ok(score_validated(team, mentor, &weights))
}

pub(crate) fn score_validated(team: &Team, mentor: &Mentor, weights: &Weights) -> MatchScore {
    let factors = compute_factors(team, mentor);
    MatchScore {
        score: round_half_up(factors.weighted_total(weights)),
        factors,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::model::{AvailabilitySlot, Mentor, MentorLinks, MentorPreferences, Modality, Team, Weekday};

    pub fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    pub fn team() -> Team {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Team {
            id: "team-1".into(),
            name: "RoboLions".into(),
            school: "EE Central".into(),
            region: "Sul".into(),
            needs: vec![],
            languages: strings(&["pt-BR"]),
            availability: vec![AvailabilitySlot {
                day: Weekday::Mon,
                slots: strings(&["08:00-10:00", "10:00-12:00"]),
            }],
            modality: Modality::Hybrid,
            steam_areas: strings(&["programacao", "cad"]),
            coach_contact: "coach@example.com".into(),
            notes: None,
            user_id: "user-1".into(),
            created_at: at,
            updated_at: at,
        }
    }

    pub fn mentor(id: &str) -> Mentor {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Mentor {
            id: id.into(),
            user_id: format!("user-{id}"),
            skills_tech: strings(&["programacao", "eletronica"]),
            skills_non_tech: vec![],
            languages: strings(&["pt-BR", "en-US"]),
            timezone: "America/Sao_Paulo".into(),
            availability: vec![AvailabilitySlot {
                day: Weekday::Mon,
                slots: strings(&["08:00-10:00"]),
            }],
            modality: Modality::Hybrid,
            regions: strings(&["Sul"]),
            preferences: MentorPreferences::default(),
            bio: String::new(),
            links: MentorLinks::default(),
            approved: true,
            created_at: at,
            updated_at: at,
        }
    }
}
