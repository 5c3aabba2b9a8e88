// scraper port

use crate::AliasMatch;
use chrono::{DateTime, Utc};

/// A bracket scraper for one external provider. Concrete implementations
/// (tio file, challonge URL, smashgg URL, raw JSON payload) do their
/// fetching and parsing up front; the core consumes only these accessors.
pub trait Scraper: Send + Sync {
    fn name(&self) -> String;
    fn date(&self) -> DateTime<Utc>;
    /// opaque source payload, preserved on the tournament for audit
    fn raw(&self) -> String;
    /// participant aliases, original casing preserved
    fn players(&self) -> Vec<String>;
    fn matches(&self) -> Vec<AliasMatch>;
    fn url(&self) -> Option<String>;
}
