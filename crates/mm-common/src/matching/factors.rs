//! The five compatibility factors. Each returns a value in [0, 100].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::model::{AvailabilitySlot, Modality, Weekday};

pub const FULL: f64 = 100.0;
pub const HALF: f64 = 50.0;
pub const NONE: f64 = 0.0;

type WeeklySlots<'a> = BTreeMap<Weekday, BTreeSet<&'a str>>;

fn distinct(values: &[String]) -> BTreeSet<&str> {
    values.iter().map(String::as_str).collect()
}

/// Share of `required` present in `offered`, as a percentage. Empty requirement scores 0.
fn coverage(required: &BTreeSet<&str>, offered: &HashSet<&str>) -> f64 {
    if required.is_empty() {
        return NONE;
    }

    let matched = required.iter().filter(|item| offered.contains(*item)).count();
    FULL * matched as f64 / required.len() as f64
}

/// Duplicate days merge, duplicate slot labels collapse.
pub fn weekly_slots(availability: &[AvailabilitySlot]) -> WeeklySlots<'_> {
    let mut weekly: WeeklySlots<'_> = BTreeMap::new();
    for entry in availability {
        weekly
            .entry(entry.day)
            .or_default()
            .extend(entry.slots.iter().map(String::as_str));
    }
    weekly
}

/// Fraction of the team's STEAM areas covered by the union of the mentor's
/// technical and non-technical skills.
pub fn area_factor(team_areas: &[String], skills_tech: &[String], skills_non_tech: &[String]) -> f64 {
    let skills: HashSet<&str> = skills_tech
        .iter()
        .chain(skills_non_tech)
        .map(String::as_str)
        .collect();

    coverage(&distinct(team_areas), &skills)
}

/// Fraction of the team's requested weekly slots the mentor also offers.
///
/// A team day the mentor never listed still counts all of its slots as unmatched.
pub fn schedule_factor(team: &[AvailabilitySlot], mentor: &[AvailabilitySlot]) -> f64 {
    let team_week = weekly_slots(team);
    let mentor_week = weekly_slots(mentor);
    let empty = BTreeSet::new();

    let mut total_slots = 0usize;
    let mut matched_slots = 0usize;
    for (day, requested) in &team_week {
        let offered = mentor_week.get(day).unwrap_or(&empty);
        total_slots += requested.len();
        matched_slots += requested.intersection(offered).count();
    }

    if total_slots == 0 {
        return NONE;
    }

    FULL * matched_slots as f64 / total_slots as f64
}

pub fn language_factor(team_languages: &[String], mentor_languages: &[String]) -> f64 {
    let spoken: HashSet<&str> = mentor_languages.iter().map(String::as_str).collect();
    coverage(&distinct(team_languages), &spoken)
}

pub fn modality_factor(team: Modality, mentor: Modality) -> f64 {
    if team == mentor {
        FULL
    } else if team == Modality::Hybrid || mentor == Modality::Hybrid {
        HALF
    } else {
        NONE
    }
}

/// Online mentors serve every region; otherwise the team region must be served.
pub fn region_factor(team_region: &str, mentor_regions: &[String], mentor_modality: Modality) -> f64 {
    if mentor_modality == Modality::Online {
        return FULL;
    }

    if mentor_regions.iter().any(|region| region == team_region) {
        FULL
    } else {
        NONE
    }
}
