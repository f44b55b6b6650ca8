use serde::Deserialize;

use crate::model::{User, UserRole};

/// Self-registration payload. Carries a plaintext password, so it has no `Debug`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub role: UserRole,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub consent: bool,
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Profile fields a user may change on their own account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(locale) = self.locale {
            user.locale = locale;
        }
        if let Some(timezone) = self.timezone {
            user.timezone = timezone;
        }
        if let Some(avatar_url) = self.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
    }
}
