use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{CalendarProvider, Session};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub team_id: String,
    pub mentor_id: String,
    pub title: String,
    #[serde(rename = "dateISO")]
    pub date_iso: DateTime<Utc>,
    pub duration_min: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub meeting_url: Option<String>,
    #[serde(default)]
    pub calendar_provider: Option<CalendarProvider>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub title: Option<String>,
    #[serde(rename = "dateISO")]
    pub date_iso: Option<DateTime<Utc>>,
    pub duration_min: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    pub meeting_url: Option<String>,
    pub calendar_provider: Option<CalendarProvider>,
}

impl SessionUpdate {
    pub fn apply(self, session: &mut Session) {
        if let Some(title) = self.title {
            session.title = title;
        }
        if let Some(date_iso) = self.date_iso {
            session.date_iso = date_iso;
        }
        if let Some(duration_min) = self.duration_min {
            session.duration_min = duration_min;
        }
        if let Some(tags) = self.tags {
            session.tags = tags;
        }
        if self.notes.is_some() {
            session.notes = self.notes;
        }
        if self.meeting_url.is_some() {
            session.meeting_url = self.meeting_url;
        }
        if self.calendar_provider.is_some() {
            session.calendar_provider = self.calendar_provider;
        }
    }
}
