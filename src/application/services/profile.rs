//! Profile management
//!
//! Profiles are named tokens stored in `config.toml`. Tokens are validated
//! against the API before they are saved.

use tracing::{debug, info};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::{Profile, Settings};
use crate::infrastructure::api::ApiFactory;

/// A profile as shown to the user (token omitted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub name: String,
    pub email: String,
    pub default: bool,
}

impl ProfileSummary {
    fn from_entry(name: &str, profile: &Profile) -> Self {
        Self {
            name: name.to_string(),
            email: profile.email.clone(),
            default: profile.default,
        }
    }
}

/// Service for creating and maintaining profiles.
pub struct ProfileService {
    api_factory: ApiFactory,
}

impl ProfileService {
    pub fn new(api_factory: ApiFactory) -> Self {
        Self { api_factory }
    }

    /// Check the token against the API and return the login it belongs to.
    pub fn validate_token(&self, token: &str, endpoint: &str) -> ApplicationResult<String> {
        if token.trim().is_empty() {
            return Err(ApplicationError::EmptyToken);
        }
        let api = (self.api_factory)(token, endpoint)?;
        let token_info = api.token_self()?;
        debug!("validate_token: token belongs to user {}", token_info.user_id);
        let user = api.current_user()?;
        Ok(user.login)
    }

    /// Create a profile. The first profile always becomes the default.
    pub fn create(
        &self,
        settings: &mut Settings,
        name: &str,
        token: &str,
        make_default: bool,
        endpoint: &str,
    ) -> ApplicationResult<ProfileSummary> {
        if settings.file.profile.contains_key(name) {
            return Err(ApplicationError::ProfileExists(name.to_string()));
        }
        let email = self.validate_token(token, endpoint)?;

        let is_default = make_default || settings.file.default_profile().is_none();
        if is_default {
            clear_default(settings);
        }
        settings.file.profile.insert(
            name.to_string(),
            Profile {
                default: is_default,
                email,
                token: token.trim().to_string(),
            },
        );
        settings.save()?;
        info!("created profile {}", name);
        self.summary(settings, name)
    }

    /// Replace a profile's token and/or make it the default.
    pub fn update(
        &self,
        settings: &mut Settings,
        name: &str,
        token: Option<&str>,
        make_default: bool,
        endpoint: &str,
    ) -> ApplicationResult<ProfileSummary> {
        if !settings.file.profile.contains_key(name) {
            return Err(ApplicationError::ProfileNotFound(name.to_string()));
        }
        let email = match token {
            Some(token) => Some(self.validate_token(token, endpoint)?),
            None => None,
        };
        if make_default {
            clear_default(settings);
        }
        let profile = settings
            .file
            .profile
            .get_mut(name)
            .ok_or_else(|| ApplicationError::ProfileNotFound(name.to_string()))?;
        if let (Some(token), Some(email)) = (token, email) {
            profile.token = token.trim().to_string();
            profile.email = email;
        }
        if make_default {
            profile.default = true;
        }
        settings.save()?;
        self.summary(settings, name)
    }

    /// All profiles, sorted by name.
    pub fn list(&self, settings: &Settings) -> Vec<ProfileSummary> {
        settings
            .file
            .profile
            .iter()
            .map(|(name, p)| ProfileSummary::from_entry(name, p))
            .collect()
    }

    /// Make `name` the default profile.
    pub fn switch(&self, settings: &mut Settings, name: &str) -> ApplicationResult<ProfileSummary> {
        if !settings.file.profile.contains_key(name) {
            return Err(ApplicationError::ProfileNotFound(name.to_string()));
        }
        clear_default(settings);
        if let Some(profile) = settings.file.profile.get_mut(name) {
            profile.default = true;
        }
        settings.save()?;
        self.summary(settings, name)
    }

    /// Remove a profile, returning it. Removing the default leaves no default.
    pub fn delete(&self, settings: &mut Settings, name: &str) -> ApplicationResult<ProfileSummary> {
        let removed = settings
            .file
            .profile
            .remove(name)
            .ok_or_else(|| ApplicationError::ProfileNotFound(name.to_string()))?;
        settings.save()?;
        Ok(ProfileSummary::from_entry(name, &removed))
    }

    /// Token of `name`, or of the default profile when no name is given.
    pub fn token(&self, settings: &Settings, name: Option<&str>) -> ApplicationResult<String> {
        let profile = match name {
            Some(name) => settings
                .file
                .profile
                .get(name)
                .ok_or_else(|| ApplicationError::ProfileNotFound(name.to_string()))?,
            None => {
                settings
                    .file
                    .default_profile()
                    .ok_or(ApplicationError::NoToken)?
                    .1
            }
        };
        Ok(profile.token.clone())
    }

    fn summary(&self, settings: &Settings, name: &str) -> ApplicationResult<ProfileSummary> {
        settings
            .file
            .profile
            .get(name)
            .map(|p| ProfileSummary::from_entry(name, p))
            .ok_or_else(|| ApplicationError::ProfileNotFound(name.to_string()))
    }
}

fn clear_default(settings: &mut Settings) {
    for profile in settings.file.profile.values_mut() {
        profile.default = false;
    }
}
