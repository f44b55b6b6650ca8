use serde::Deserialize;

use crate::model::{AvailabilitySlot, Mentor, MentorLinks, MentorPreferences, Modality};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMentor {
    pub user_id: String,
    #[serde(default)]
    pub skills_tech: Vec<String>,
    #[serde(default)]
    pub skills_non_tech: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub timezone: String,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
    pub modality: Modality,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub preferences: MentorPreferences,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub links: MentorLinks,
    /// New mentors are approved unless the caller says otherwise.
    #[serde(default)]
    pub approved: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorUpdate {
    pub skills_tech: Option<Vec<String>>,
    pub skills_non_tech: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub timezone: Option<String>,
    pub availability: Option<Vec<AvailabilitySlot>>,
    pub modality: Option<Modality>,
    pub regions: Option<Vec<String>>,
    pub preferences: Option<MentorPreferences>,
    pub bio: Option<String>,
    pub links: Option<MentorLinks>,
    pub approved: Option<bool>,
}

impl MentorUpdate {
    pub fn apply(self, mentor: &mut Mentor) {
        if let Some(skills_tech) = self.skills_tech {
            mentor.skills_tech = skills_tech;
        }
        if let Some(skills_non_tech) = self.skills_non_tech {
            mentor.skills_non_tech = skills_non_tech;
        }
        if let Some(languages) = self.languages {
            mentor.languages = languages;
        }
        if let Some(timezone) = self.timezone {
            mentor.timezone = timezone;
        }
        if let Some(availability) = self.availability {
            mentor.availability = availability;
        }
        if let Some(modality) = self.modality {
            mentor.modality = modality;
        }
        if let Some(regions) = self.regions {
            mentor.regions = regions;
        }
        if let Some(preferences) = self.preferences {
            mentor.preferences = preferences;
        }
        if let Some(bio) = self.bio {
            mentor.bio = bio;
        }
        if let Some(links) = self.links {
            mentor.links = links;
        }
        if let Some(approved) = self.approved {
            mentor.approved = approved;
        }
    }
}

/// Enumerated mentor list filters; every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MentorFilter {
    pub region: Option<String>,
    pub language: Option<String>,
    /// Matches technical or non-technical skills.
    pub skill: Option<String>,
    pub approved: Option<bool>,
}

impl MentorFilter {
    pub fn approved_only() -> Self {
        Self {
            approved: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, mentor: &Mentor) -> bool {
        self.region
            .as_deref()
            .map_or(true, |region| mentor.regions.iter().any(|r| r == region))
            && self
                .language
                .as_deref()
                .map_or(true, |language| mentor.languages.iter().any(|l| l == language))
            && self.skill.as_deref().map_or(true, |skill| mentor.has_skill(skill))
            && self.approved.map_or(true, |approved| mentor.approved == approved)
    }
}
