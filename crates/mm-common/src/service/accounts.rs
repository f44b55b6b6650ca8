use chrono::Utc;
use tracing::{info, instrument, warn};

use super::{not_found, MentorshipService, ServiceError};
use crate::api::account_request::{Credentials, NewUser, ProfileUpdate};
use crate::ids;
use crate::model::{User, UserAccount, UserRole, DEFAULT_LOCALE, DEFAULT_TIMEZONE};
use crate::store::StoreError;

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MIN_NAME_CHARS: usize = 2;

const INVALID_CREDENTIALS: &str = "invalid email or password";
const EMAIL_TAKEN: &str = "email already registered";

/// Trims and lowercases `raw`, then checks it has the shape `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String, ServiceError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, _)| !host.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ServiceError::Validation(format!("invalid email: {raw}")));
    }
    Ok(email)
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().chars().count() < MIN_NAME_CHARS {
        return Err(ServiceError::Validation(format!(
            "name must have at least {MIN_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ServiceError::Validation(format!(
            "password must have at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

async fn hash_password(password: String, cost: u32) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| ServiceError::Internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| ServiceError::Internal(format!("failed to hash password: {err}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| ServiceError::Internal(format!("password check task failed: {err}")))?
        .map_err(|err| ServiceError::Internal(format!("failed to verify password: {err}")))
}

impl MentorshipService {
    /// Creates a team or mentor account. Admins are provisioned out of band.
    #[instrument(skip(self, request), fields(role = request.role.as_ref()))]
    pub async fn register_user(&self, request: NewUser) -> Result<User, ServiceError> {
        if request.role == UserRole::Admin {
            return Err(ServiceError::Validation(
                "admin accounts cannot be self-registered".into(),
            ));
        }
        if !request.consent {
            return Err(ServiceError::Validation("consent is required".into()));
        }
        validate_name(&request.name)?;
        validate_password(&request.password)?;
        let email = normalize_email(&request.email)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict(EMAIL_TAKEN.into()));
        }

        let password_hash = hash_password(request.password, self.password_cost).await?;
        let now = Utc::now();
        let account = UserAccount {
            user: User {
                id: ids::generate("user"),
                role: request.role,
                name: request.name.trim().to_string(),
                email,
                phone: request.phone,
                verified_email: false,
                verified_phone: false,
                locale: request.locale.unwrap_or_else(|| DEFAULT_LOCALE.into()),
                timezone: request.timezone.unwrap_or_else(|| DEFAULT_TIMEZONE.into()),
                avatar_url: None,
                created_at: now,
                updated_at: now,
            },
            password_hash,
        };

        match self.store.insert_user(&account).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(ServiceError::Conflict(EMAIL_TAKEN.into())),
            Err(err) => return Err(err.into()),
        }
        info!(user_id = %account.user.id, "user registered");
        Ok(account.user)
    }

    /// Unknown emails and wrong passwords fail the same way.
    #[instrument(skip(self, credentials))]
    pub async fn authenticate(&self, credentials: Credentials) -> Result<User, ServiceError> {
        let email = credentials.email.trim().to_lowercase();
        let Some(account) = self.store.find_user_by_email(&email).await? else {
            warn!("login for unknown email");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !verify_password(credentials.password, account.password_hash).await? {
            warn!(user_id = %account.user.id, "login with wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        Ok(account.user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ServiceError> {
        self.store
            .get_user(id)
            .await?
            .map(|account| account.user)
            .ok_or_else(|| not_found("user", id))
    }

    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<User, ServiceError> {
        let mut account = self
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| not_found("user", id))?;
        update.apply(&mut account.user);
        validate_name(&account.user.name)?;
        account.user.updated_at = Utc::now();

        if !self.store.update_user(&account).await? {
            return Err(not_found("user", id));
        }
        Ok(account.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::service;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            role: UserRole::Mentor,
            name: "Ana Souza".into(),
            email: email.into(),
            password: "segredo123".into(),
            phone: None,
            locale: None,
            timezone: None,
            consent: true,
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn normalizes_and_checks_email_shape() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
        for bad in ["", "ana", "@example.com", "ana@", "ana@example", "ana@.com", "a b@example.com"] {
            assert!(normalize_email(bad).is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn registers_with_defaults_and_logs_in() {
        let svc = service();
        let user = svc.register_user(new_user(" Ana@Example.com")).await.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.locale, DEFAULT_LOCALE);
        assert_eq!(user.timezone, DEFAULT_TIMEZONE);
        assert!(!user.verified_email);

        let stored = svc.store().get_user(&user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "segredo123");

        let logged_in = svc
            .authenticate(credentials("ANA@example.com", "segredo123"))
            .await
            .unwrap();
        assert_eq!(logged_in, user);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let svc = service();
        svc.register_user(new_user("ana@example.com")).await.unwrap();
        let err = svc
            .register_user(new_user("ANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn rejects_weak_or_incomplete_registrations() {
        let svc = service();

        let mut short_password = new_user("a@example.com");
        short_password.password = "12345".into();
        let mut no_consent = new_user("b@example.com");
        no_consent.consent = false;
        let mut admin = new_user("c@example.com");
        admin.role = UserRole::Admin;
        let mut short_name = new_user("d@example.com");
        short_name.name = " A ".into();

        for request in [short_password, no_consent, admin, short_name] {
            assert!(matches!(
                svc.register_user(request).await,
                Err(ServiceError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let svc = service();
        svc.register_user(new_user("ana@example.com")).await.unwrap();

        let wrong = svc
            .authenticate(credentials("ana@example.com", "errada123"))
            .await
            .unwrap_err();
        let unknown = svc
            .authenticate(credentials("bia@example.com", "segredo123"))
            .await
            .unwrap_err();
        assert!(matches!(&wrong, ServiceError::Unauthorized(_)));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn profile_updates_keep_credentials() {
        let svc = service();
        let user = svc.register_user(new_user("ana@example.com")).await.unwrap();

        let updated = svc
            .update_profile(
                &user.id,
                ProfileUpdate {
                    locale: Some("en-US".into()),
                    phone: Some("+55 11 99999-0000".into()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.locale, "en-US");
        assert_eq!(updated.name, user.name);
        assert_eq!(svc.get_user(&user.id).await.unwrap(), updated);

        svc.authenticate(credentials("ana@example.com", "segredo123"))
            .await
            .unwrap();

        let blank = ProfileUpdate {
            name: Some("".into()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            svc.update_profile(&user.id, blank).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.get_user("user-missing").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
