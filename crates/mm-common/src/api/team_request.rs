use serde::Deserialize;

use crate::model::{AvailabilitySlot, Modality, Team};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    pub school: String,
    pub region: String,
    #[serde(default)]
    pub needs: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
    pub modality: Modality,
    #[serde(default)]
    pub steam_areas: Vec<String>,
    pub coach_contact: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub user_id: String,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub school: Option<String>,
    pub region: Option<String>,
    pub needs: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub availability: Option<Vec<AvailabilitySlot>>,
    pub modality: Option<Modality>,
    pub steam_areas: Option<Vec<String>>,
    pub coach_contact: Option<String>,
    pub notes: Option<String>,
}

impl TeamUpdate {
    pub fn apply(self, team: &mut Team) {
        if let Some(name) = self.name {
            team.name = name;
        }
        if let Some(school) = self.school {
            team.school = school;
        }
        if let Some(region) = self.region {
            team.region = region;
        }
        if let Some(needs) = self.needs {
            team.needs = needs;
        }
        if let Some(languages) = self.languages {
            team.languages = languages;
        }
        if let Some(availability) = self.availability {
            team.availability = availability;
        }
        if let Some(modality) = self.modality {
            team.modality = modality;
        }
        if let Some(steam_areas) = self.steam_areas {
            team.steam_areas = steam_areas;
        }
        if let Some(coach_contact) = self.coach_contact {
            team.coach_contact = coach_contact;
        }
        if self.notes.is_some() {
            team.notes = self.notes;
        }
    }
}
