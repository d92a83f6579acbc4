// src/config/secrets.rs
//! Credentials and opt-in flags, read from the environment exactly once.

use std::env;
use std::fmt;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OWNER_APPROVED: &str = "OWNER_APPROVED";
pub const ENV_REDDIT_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_REDDIT_SECRET: &str = "REDDIT_SECRET";
pub const ENV_REDDIT_USER_AGENT: &str = "REDDIT_USER_AGENT";

#[derive(Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    /// Site owner has authorized crawling of their domain.
    pub owner_approved: bool,
    pub reddit: Option<RedditCredentials>,
}

#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub secret: String,
    pub user_agent: String,
}

impl Secrets {
    pub fn from_env() -> Self {
        let non_empty = |name: &str| {
            env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let reddit = match (non_empty(ENV_REDDIT_CLIENT_ID), non_empty(ENV_REDDIT_SECRET)) {
            (Some(client_id), Some(secret)) => Some(RedditCredentials {
                client_id,
                secret,
                user_agent: non_empty(ENV_REDDIT_USER_AGENT)
                    .unwrap_or_else(|| "LunarDream/1.0".to_string()),
            }),
            _ => None,
        };

        Self {
            openai_api_key: non_empty(ENV_OPENAI_API_KEY),
            owner_approved: non_empty(ENV_OWNER_APPROVED).as_deref() == Some("1"),
            reddit,
        }
    }
}

// Never print key material; lengths only.
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field(
                "openai_key_len",
                &self.openai_api_key.as_ref().map_or(0, String::len),
            )
            .field("owner_approved", &self.owner_approved)
            .field("reddit", &self.reddit.is_some())
            .finish()
    }
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id_len", &self.client_id.len())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn reads_flags_and_ignores_blank_values() {
        env::set_var(ENV_OPENAI_API_KEY, "  ");
        env::set_var(ENV_OWNER_APPROVED, "1");
        env::set_var(ENV_REDDIT_CLIENT_ID, "cid");
        env::remove_var(ENV_REDDIT_SECRET);

        let s = Secrets::from_env();
        assert!(s.openai_api_key.is_none());
        assert!(s.owner_approved);
        assert!(s.reddit.is_none(), "secret missing → no reddit creds");

        env::set_var(ENV_REDDIT_SECRET, "sec");
        env::remove_var(ENV_REDDIT_USER_AGENT);
        let s = Secrets::from_env();
        assert_eq!(s.reddit.unwrap().user_agent, "LunarDream/1.0");

        for k in [
            ENV_OPENAI_API_KEY,
            ENV_OWNER_APPROVED,
            ENV_REDDIT_CLIENT_ID,
            ENV_REDDIT_SECRET,
        ] {
            env::remove_var(k);
        }
    }

    #[test]
    fn debug_output_hides_key() {
        let s = Secrets {
            openai_api_key: Some("sk-very-secret".into()),
            ..Secrets::default()
        };
        let out = format!("{s:?}");
        assert!(!out.contains("sk-very-secret"));
        assert!(out.contains("openai_key_len: 14"));
    }
}
