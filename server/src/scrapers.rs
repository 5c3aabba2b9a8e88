//! Concrete scrapers living behind the core's scraper port.
//!
//! Provider scrapers (tio, challonge, smashgg) are external collaborators;
//! the built-in one handles `other`-type submissions whose `data` field is
//! already a JSON bracket export.

use crate::dto;
use app_core::{AliasMatch, CoreError, Scraper, SourceType};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawBracket {
    name: String,
    /// MM/DD/YY
    date: String,
    players: Vec<String>,
    matches: Vec<RawMatch>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    winner: String,
    loser: String,
}

/// Scraper over a JSON bracket payload submitted directly by an organizer.
pub struct JsonScraper {
    raw: String,
    name: String,
    date: DateTime<Utc>,
    players: Vec<String>,
    matches: Vec<AliasMatch>,
    url: Option<String>,
}

impl JsonScraper {
    pub fn new(data: &str) -> Result<Self, CoreError> {
        let bracket: RawBracket = serde_json::from_str(data)
            .map_err(|e| CoreError::Upstream(format!("invalid bracket payload: {e}")))?;
        let date = dto::decode_date(&bracket.date).ok_or_else(|| {
            CoreError::Upstream(format!("invalid bracket date '{}'", bracket.date))
        })?;
        Ok(JsonScraper {
            raw: data.to_string(),
            name: bracket.name,
            date,
            players: bracket.players,
            matches: bracket
                .matches
                .into_iter()
                .map(|m| AliasMatch {
                    winner: m.winner,
                    loser: m.loser,
                })
                .collect(),
            url: bracket.url,
        })
    }
}

impl Scraper for JsonScraper {
    fn name(&self) -> String {
        self.name.clone()
    }
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
    fn raw(&self) -> String {
        self.raw.clone()
    }
    fn players(&self) -> Vec<String> {
        self.players.clone()
    }
    fn matches(&self) -> Vec<AliasMatch> {
        self.matches.clone()
    }
    fn url(&self) -> Option<String> {
        self.url.clone()
    }
}

/// Dispatch on the submitted source type. Providers without a wired
/// scraper surface as upstream failures, message preserved for the admin.
pub fn scraper_for(source_type: SourceType, data: &str) -> Result<JsonScraper, CoreError> {
    match source_type {
        SourceType::Other => JsonScraper::new(data),
        provider => Err(CoreError::Upstream(format!(
            "no scraper configured for source type '{provider}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRACKET: &str = r#"{
        "name": "Weekly 12",
        "date": "10/16/13",
        "players": ["gar", "sfat"],
        "matches": [{"winner": "gar", "loser": "sfat"}],
        "url": "https://example.com/weekly-12"
    }"#;

    #[test]
    fn parses_json_bracket() {
        let scraper = JsonScraper::new(BRACKET).unwrap();
        assert_eq!(scraper.name(), "Weekly 12");
        assert_eq!(scraper.players(), vec!["gar", "sfat"]);
        assert_eq!(scraper.matches().len(), 1);
        assert_eq!(scraper.raw(), BRACKET);
        assert_eq!(
            scraper.url().as_deref(),
            Some("https://example.com/weekly-12")
        );
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(
            JsonScraper::new("not json"),
            Err(CoreError::Upstream(_))
        ));
        assert!(matches!(
            JsonScraper::new(r#"{"name": "x", "date": "2013-10-16", "players": [], "matches": []}"#),
            Err(CoreError::Upstream(_))
        ));
    }

    #[test]
    fn providers_without_scrapers_are_upstream_errors() {
        for provider in [SourceType::Tio, SourceType::Challonge, SourceType::Smashgg] {
            assert!(matches!(
                scraper_for(provider, "{}"),
                Err(CoreError::Upstream(_))
            ));
        }
        assert!(scraper_for(SourceType::Other, BRACKET).is_ok());
    }
}
