use crate::model::{AvailabilitySlot, Mentor, Team};

use super::MatchingError;

fn reject_blank(owner: &str, field: &str, values: &[String]) -> Result<(), MatchingError> {
    if values.iter().any(|value| value.trim().is_empty()) {
        return Err(MatchingError::Validation(format!(
            "{owner} {field} must not contain blank entries"
        )));
    }
    Ok(())
}

fn reject_blank_slots(owner: &str, availability: &[AvailabilitySlot]) -> Result<(), MatchingError> {
    for entry in availability {
        if entry.slots.iter().any(|slot| slot.trim().is_empty()) {
            return Err(MatchingError::Validation(format!(
                "{owner} availability for `{}` contains a blank slot",
                entry.day.as_ref()
            )));
        }
    }
    Ok(())
}

pub fn validate_team(team: &Team) -> Result<(), MatchingError> {
    if team.region.trim().is_empty() {
        return Err(MatchingError::Validation(format!(
            "team {} has no region",
            team.id
        )));
    }

    let owner = format!("team {}", team.id);
    reject_blank(&owner, "steamAreas", &team.steam_areas)?;
    reject_blank(&owner, "languages", &team.languages)?;
    reject_blank_slots(&owner, &team.availability)
}

pub fn validate_mentor(mentor: &Mentor) -> Result<(), MatchingError> {
    let owner = format!("mentor {}", mentor.id);
    reject_blank(&owner, "skillsTech", &mentor.skills_tech)?;
    reject_blank(&owner, "skillsNonTech", &mentor.skills_non_tech)?;
    reject_blank(&owner, "languages", &mentor.languages)?;
    reject_blank(&owner, "regions", &mentor.regions)?;
    reject_blank_slots(&owner, &mentor.availability)
}
