//! Process configuration, loaded once at startup into an immutable value.

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::env;

/// Eligibility window for the activity filter of the ranking pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    /// how many days back from `now` a player must have competed
    pub day_limit: i64,
    /// minimum number of qualifying tournaments inside the window
    pub num_tourneys: usize,
}

impl Default for ActivityWindow {
    fn default() -> Self {
        ActivityWindow {
            day_limit: 60,
            num_tourneys: 2,
        }
    }
}

/// Global default window plus optional per-region overrides. Regions with
/// unusual tournament cadence get their own window through configuration
/// instead of code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityConfig {
    pub default: ActivityWindow,
    pub overrides: BTreeMap<String, ActivityWindow>,
}

impl ActivityConfig {
    pub fn for_region(&self, region: &str) -> ActivityWindow {
        self.overrides
            .get(region)
            .copied()
            .unwrap_or(self.default)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// regular expression deciding which origins get CORS headers
    pub allowed_origins: String,
    pub session_cookie: String,
    pub activity: ActivityConfig,
}

impl AppConfig {
    /// Read configuration from the environment. `.env` loading (dotenvy)
    /// is the caller's business.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set. Hint: did you run dotenv()?")?;
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| r"^https?://localhost(:[0-9]+)?$".to_string());
        let session_cookie =
            env::var("SESSION_COOKIE").unwrap_or_else(|_| "session_id".to_string());

        let mut activity = ActivityConfig::default();
        if let Ok(day_limit) = env::var("ACTIVITY_DAY_LIMIT") {
            activity.default.day_limit = day_limit
                .parse()
                .context("ACTIVITY_DAY_LIMIT must be an integer number of days")?;
        }
        if let Ok(num_tourneys) = env::var("ACTIVITY_NUM_TOURNEYS") {
            activity.default.num_tourneys = num_tourneys
                .parse()
                .context("ACTIVITY_NUM_TOURNEYS must be an integer")?;
        }
        if let Ok(overrides) = env::var("ACTIVITY_OVERRIDES") {
            activity.overrides = parse_activity_overrides(&overrides)?;
        }

        Ok(AppConfig {
            database_url,
            allowed_origins,
            session_cookie,
            activity,
        })
    }

    /// Configuration for tests: no database URL, permissive origins.
    pub fn for_testing() -> Self {
        AppConfig {
            database_url: String::new(),
            allowed_origins: r"^https?://localhost(:[0-9]+)?$".to_string(),
            session_cookie: "session_id".to_string(),
            activity: ActivityConfig::default(),
        }
    }
}

/// Format: `region=days:tourneys` entries separated by commas, e.g.
/// `westchester=1500:1,nyc=90:3`.
fn parse_activity_overrides(raw: &str) -> Result<BTreeMap<String, ActivityWindow>> {
    let mut overrides = BTreeMap::new();
    for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
        let Some((region, window)) = entry.split_once('=') else {
            bail!("activity override '{entry}' is missing '='");
        };
        let Some((days, tourneys)) = window.split_once(':') else {
            bail!("activity override '{entry}' is missing ':'");
        };
        overrides.insert(
            region.trim().to_string(),
            ActivityWindow {
                day_limit: days
                    .trim()
                    .parse()
                    .with_context(|| format!("bad day limit in override '{entry}'"))?,
                num_tourneys: tourneys
                    .trim()
                    .parse()
                    .with_context(|| format!("bad tournament count in override '{entry}'"))?,
            },
        );
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window() {
        let activity = ActivityConfig::default();
        assert_eq!(activity.for_region("norcal").day_limit, 60);
        assert_eq!(activity.for_region("norcal").num_tourneys, 2);
    }

    #[test]
    fn override_parsing() {
        let overrides = parse_activity_overrides("westchester=1500:1, nyc=90:3").unwrap();
        assert_eq!(
            overrides["westchester"],
            ActivityWindow {
                day_limit: 1500,
                num_tourneys: 1
            }
        );
        assert_eq!(
            overrides["nyc"],
            ActivityWindow {
                day_limit: 90,
                num_tourneys: 3
            }
        );
    }

    #[test]
    fn override_takes_precedence_per_region() {
        let mut activity = ActivityConfig::default();
        activity.overrides.insert(
            "nyc".to_string(),
            ActivityWindow {
                day_limit: 90,
                num_tourneys: 3,
            },
        );
        assert_eq!(activity.for_region("nyc").num_tourneys, 3);
        assert_eq!(activity.for_region("norcal").num_tourneys, 2);
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        assert!(parse_activity_overrides("nyc90:3").is_err());
        assert!(parse_activity_overrides("nyc=90").is_err());
        assert!(parse_activity_overrides("nyc=ninety:3").is_err());
        assert!(parse_activity_overrides("").unwrap().is_empty());
    }
}
