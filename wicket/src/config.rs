//! Gateway configuration
//!
//! | Variable                         | Field                    | Default                                         |
//! | -------------------------------- | ------------------------ | ----------------------------------------------- |
//! | `WICKET_SESSION_LIFETIME_SECS`   | `session_lifetime`       | 30 days (at most 400 days)                      |
//! | `WICKET_STATE_LIFETIME_SECS`     | `state_lifetime`         | 10 minutes (also the maximum)                   |
//! | `WICKET_TICKET_LIFETIME_SECS`    | `ticket_lifetime`        | 24 hours (at most 7 days)                       |
//! | `WICKET_PROVIDER_TIMEOUT_SECS`   | `provider_timeout`       | 10 seconds                                      |
//! | `WICKET_DISPATCH_TIMEOUT_SECS`   | `dispatch_timeout`       | 10 seconds                                      |
//! | `WICKET_LINK_BASE_URL`           | `link_base_url`          | `http://localhost:3000/api/auth/callback/email` |
//! | `WICKET_LINK_BY_VERIFIED_EMAIL`  | `link_by_verified_email` | `false`                                         |
use chrono::Duration;
use wicket_auth_magic_link::MagicLinkConfig;
use wicket_auth_oauth::{OAuthConfig, max_state_lifetime};
use wicket_core::SessionManagerConfig;
use wicket_mailer::MailerConfig;

use crate::GatewayBuilderError;

fn max_session_lifetime() -> Duration {
    Duration::days(400)
}

fn max_ticket_lifetime() -> Duration {
    Duration::days(7)
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub session_lifetime: Duration,
    pub state_lifetime: Duration,
    pub ticket_lifetime: Duration,
    pub provider_timeout: std::time::Duration,
    pub dispatch_timeout: std::time::Duration,
    pub link_base_url: String,
    pub link_by_verified_email: bool,
    pub email_from: String,
    pub app_name: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let magic_link = MagicLinkConfig::default();
        Self {
            session_lifetime: Duration::days(30),
            state_lifetime: max_state_lifetime(),
            ticket_lifetime: magic_link.ticket_lifetime,
            provider_timeout: std::time::Duration::from_secs(10),
            dispatch_timeout: magic_link.dispatch_timeout,
            link_base_url: magic_link.link_base_url,
            link_by_verified_email: false,
            email_from: magic_link.from_address,
            app_name: magic_link.app_name,
        }
    }
}

impl GatewayConfig {
    /// Read overrides from `WICKET_*` environment variables.
    pub fn from_env() -> Result<Self, GatewayBuilderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`GatewayConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayBuilderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let secs = |name: &str| -> Result<Option<i64>, GatewayBuilderError> {
            match lookup(name) {
                Some(value) => value.trim().parse::<i64>().map(Some).map_err(|_| {
                    GatewayBuilderError::InvalidConfiguration(format!(
                        "{name} must be a number of seconds, got {value:?}"
                    ))
                }),
                None => Ok(None),
            }
        };
        let lifetime = |name: &str| -> Result<Option<Duration>, GatewayBuilderError> {
            match secs(name)? {
                Some(s) => Duration::try_seconds(s).map(Some).ok_or_else(|| {
                    GatewayBuilderError::InvalidConfiguration(format!("{name} is out of range"))
                }),
                None => Ok(None),
            }
        };

        if let Some(d) = lifetime("WICKET_SESSION_LIFETIME_SECS")? {
            config.session_lifetime = d;
        }
        if let Some(d) = lifetime("WICKET_STATE_LIFETIME_SECS")? {
            config.state_lifetime = d;
        }
        if let Some(d) = lifetime("WICKET_TICKET_LIFETIME_SECS")? {
            config.ticket_lifetime = d;
        }
        if let Some(s) = secs("WICKET_PROVIDER_TIMEOUT_SECS")? {
            config.provider_timeout = std::time::Duration::from_secs(s.max(0) as u64);
        }
        if let Some(s) = secs("WICKET_DISPATCH_TIMEOUT_SECS")? {
            config.dispatch_timeout = std::time::Duration::from_secs(s.max(0) as u64);
        }
        if let Some(url) = lookup("WICKET_LINK_BASE_URL") {
            config.link_base_url = url;
        }
        if let Some(flag) = lookup("WICKET_LINK_BY_VERIFIED_EMAIL") {
            config.link_by_verified_email = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(GatewayBuilderError::InvalidConfiguration(format!(
                        "WICKET_LINK_BY_VERIFIED_EMAIL must be true or false, got {other:?}"
                    )));
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    /// Values above ten minutes are capped.
    pub fn with_state_lifetime(mut self, lifetime: Duration) -> Self {
        self.state_lifetime = lifetime;
        self
    }

    pub fn with_ticket_lifetime(mut self, lifetime: Duration) -> Self {
        self.ticket_lifetime = lifetime;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_link_base_url(mut self, url: impl Into<String>) -> Self {
        self.link_base_url = url.into();
        self
    }

    pub fn with_link_by_verified_email(mut self, enabled: bool) -> Self {
        self.link_by_verified_email = enabled;
        self
    }

    /// Take the sender and product name from a mailer configuration.
    pub fn with_mailer_identity(mut self, mailer: &MailerConfig) -> Self {
        self.email_from = mailer.sender();
        self.app_name = mailer.app_name.clone();
        self
    }

    pub(crate) fn validate(&self) -> Result<(), GatewayBuilderError> {
        if self.session_lifetime <= Duration::zero() {
            return Err(GatewayBuilderError::InvalidConfiguration(
                "session lifetime must be positive".to_string(),
            ));
        }
        if self.state_lifetime <= Duration::zero() || self.ticket_lifetime <= Duration::zero() {
            return Err(GatewayBuilderError::InvalidConfiguration(
                "state and ticket lifetimes must be positive".to_string(),
            ));
        }
        if self.session_lifetime > max_session_lifetime() {
            return Err(GatewayBuilderError::InvalidConfiguration(format!(
                "session lifetime may not exceed {} days",
                max_session_lifetime().num_days()
            )));
        }
        if self.ticket_lifetime > max_ticket_lifetime() {
            return Err(GatewayBuilderError::InvalidConfiguration(format!(
                "ticket lifetime may not exceed {} days",
                max_ticket_lifetime().num_days()
            )));
        }
        if !(self.link_base_url.starts_with("https://") || self.link_base_url.starts_with("http://"))
        {
            return Err(GatewayBuilderError::InvalidConfiguration(format!(
                "link base URL must be an http(s) URL, got {:?}",
                self.link_base_url
            )));
        }
        Ok(())
    }

    pub(crate) fn session_manager(&self) -> SessionManagerConfig {
        SessionManagerConfig {
            session_lifetime: self.session_lifetime,
            link_by_verified_email: self.link_by_verified_email,
        }
    }

    pub(crate) fn oauth(&self) -> OAuthConfig {
        OAuthConfig {
            state_lifetime: self.state_lifetime,
            provider_timeout: self.provider_timeout,
        }
    }

    pub(crate) fn magic_link(&self) -> MagicLinkConfig {
        MagicLinkConfig {
            ticket_lifetime: self.ticket_lifetime,
            link_base_url: self.link_base_url.clone(),
            dispatch_timeout: self.dispatch_timeout,
            from_address: self.email_from.clone(),
            app_name: self.app_name.clone(),
        }
    }
}
