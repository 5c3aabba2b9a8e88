//! Scraped tournaments awaiting alias-to-player resolution.

use crate::{
    Match, Scraper, SourceType, Tournament,
    utils::ids::new_id,
    utils::validation::{FieldError, ValidationErrors, ValidationResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// One admin-editable resolution of a bracket alias to a player.
/// `player_id = None` means "create a new player on finalize".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasMapping {
    pub player_alias: String,
    pub player_id: Option<Uuid>,
}

/// A match as scraped: winner and loser are raw alias strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasMatch {
    pub winner: String,
    pub loser: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTournament {
    pub id: Uuid,
    pub name: String,
    pub source_type: SourceType,
    pub date: DateTime<Utc>,
    pub regions: BTreeSet<String>,
    pub raw: String,
    /// raw participant aliases as scraped, original casing preserved
    pub aliases: Vec<String>,
    pub alias_matches: Vec<AliasMatch>,
    pub alias_mappings: Vec<AliasMapping>,
}

impl PendingTournament {
    /// Capture a scraped bracket. Mappings start empty; the alias
    /// resolution service seeds them afterwards.
    pub fn from_scraper(
        source_type: SourceType,
        scraper: &dyn Scraper,
        regions: impl IntoIterator<Item = String>,
    ) -> Self {
        PendingTournament {
            id: new_id(),
            name: scraper.name(),
            source_type,
            date: scraper.date(),
            regions: regions.into_iter().collect(),
            raw: scraper.raw(),
            aliases: scraper.players(),
            alias_matches: scraper.matches(),
            alias_mappings: Vec::new(),
        }
    }

    /// Invariants:
    /// - the set of aliases appearing in matches equals `aliases`
    /// - every mapping key is one of `aliases`
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();

        let alias_set: BTreeSet<&str> = self.aliases.iter().map(String::as_str).collect();
        let match_aliases: BTreeSet<&str> = self
            .alias_matches
            .iter()
            .flat_map(|m| [m.winner.as_str(), m.loser.as_str()])
            .collect();
        if alias_set != match_aliases {
            errors.add(FieldError::invalid(
                "aliases",
                "set of aliases differs from set of aliases in matches",
            ));
        }

        for mapping in &self.alias_mappings {
            if !alias_set.contains(mapping.player_alias.as_str()) {
                errors.add(FieldError::invalid(
                    "alias_mappings",
                    format!(
                        "mapping for alias '{}' not in tournament",
                        mapping.player_alias
                    ),
                ));
            }
        }

        errors.into_result()
    }

    pub fn get_alias_mapping(&self, alias: &str) -> Option<&AliasMapping> {
        self.alias_mappings
            .iter()
            .find(|m| m.player_alias == alias)
    }

    /// Idempotent upsert of one mapping entry. The alias must be a
    /// participant of this tournament.
    pub fn set_alias_mapping(
        &mut self,
        alias: &str,
        player_id: Option<Uuid>,
    ) -> ValidationResult<()> {
        if !self.aliases.iter().any(|a| a == alias) {
            return Err(FieldError::invalid(
                "alias_mappings",
                format!("alias '{alias}' not in tournament"),
            )
            .into());
        }

        if let Some(mapping) = self
            .alias_mappings
            .iter_mut()
            .find(|m| m.player_alias == alias)
        {
            mapping.player_id = player_id;
        } else {
            self.alias_mappings.push(AliasMapping {
                player_alias: alias.to_string(),
                player_id,
            });
        }
        Ok(())
    }

    pub fn delete_alias_mapping(&mut self, alias: &str) {
        self.alias_mappings.retain(|m| m.player_alias != alias);
    }

    /// Build the canonical tournament from a fully resolved alias map.
    /// Two aliases resolving to the same player are rejected; `orig_ids`
    /// is snapshotted from the resulting player set.
    pub fn clone_into_tournament(
        &self,
        resolved: &BTreeMap<String, Uuid>,
    ) -> ValidationResult<Tournament> {
        let mut errors = ValidationErrors::new();

        let mut players = BTreeSet::new();
        for alias in &self.aliases {
            match resolved.get(alias) {
                Some(player_id) => {
                    if !players.insert(*player_id) {
                        errors.add(FieldError::invalid(
                            "players",
                            format!("alias '{alias}' maps to an already mapped player"),
                        ));
                    }
                }
                None => {
                    errors.add(FieldError::invalid(
                        "alias_mappings",
                        format!("alias '{alias}' has no mapped player"),
                    ));
                }
            }
        }
        errors.into_result()?;

        let matches = self
            .alias_matches
            .iter()
            .map(|m| {
                // both sides are in `aliases` per validate(), so resolved
                // lookups cannot miss here
                Match::new(resolved[&m.winner], resolved[&m.loser])
            })
            .collect();

        let tournament = Tournament {
            id: new_id(),
            name: self.name.clone(),
            source_type: self.source_type,
            date: self.date,
            regions: self.regions.clone(),
            raw: self.raw.clone(),
            orig_ids: players.clone(),
            players,
            matches,
        };
        tournament.validate()?;
        Ok(tournament)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pending(aliases: &[&str], matches: &[(&str, &str)]) -> PendingTournament {
        PendingTournament {
            id: Uuid::now_v7(),
            name: "Weekly".into(),
            source_type: SourceType::Tio,
            date: Utc.with_ymd_and_hms(2013, 10, 16, 0, 0, 0).unwrap(),
            regions: BTreeSet::from(["norcal".to_string()]),
            raw: String::new(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            alias_matches: matches
                .iter()
                .map(|(w, l)| AliasMatch {
                    winner: w.to_string(),
                    loser: l.to_string(),
                })
                .collect(),
            alias_mappings: Vec::new(),
        }
    }

    #[test]
    fn aliases_must_cover_matches() {
        assert!(pending(&["a", "b"], &[("a", "b")]).validate().is_ok());
        assert!(pending(&["a", "b", "c"], &[("a", "b")]).validate().is_err());
        assert!(pending(&["a"], &[("a", "b")]).validate().is_err());
    }

    #[test]
    fn mapping_keys_must_be_participants() {
        let mut pt = pending(&["a", "b"], &[("a", "b")]);
        pt.set_alias_mapping("a", None).unwrap();
        assert!(pt.validate().is_ok());

        assert!(pt.set_alias_mapping("ghost", None).is_err());

        // a stale entry is caught by validate as well
        pt.alias_mappings.push(AliasMapping {
            player_alias: "ghost".into(),
            player_id: None,
        });
        assert!(pt.validate().is_err());
    }

    #[test]
    fn set_alias_mapping_is_idempotent() {
        let mut pt = pending(&["a", "b"], &[("a", "b")]);
        let player = Uuid::now_v7();
        pt.set_alias_mapping("a", Some(player)).unwrap();
        pt.set_alias_mapping("a", Some(player)).unwrap();
        assert_eq!(pt.alias_mappings.len(), 1);

        pt.set_alias_mapping("a", None).unwrap();
        assert_eq!(pt.alias_mappings.len(), 1);
        assert_eq!(pt.get_alias_mapping("a").unwrap().player_id, None);

        pt.delete_alias_mapping("a");
        assert!(pt.get_alias_mapping("a").is_none());
    }

    #[test]
    fn resolves_into_canonical_tournament() {
        let pt = pending(&["a", "b"], &[("a", "b")]);
        let (pa, pb) = (Uuid::now_v7(), Uuid::now_v7());
        let resolved = BTreeMap::from([("a".to_string(), pa), ("b".to_string(), pb)]);

        let t = pt.clone_into_tournament(&resolved).unwrap();
        assert_eq!(t.players, BTreeSet::from([pa, pb]));
        assert_eq!(t.orig_ids, t.players);
        assert_eq!(t.matches, vec![Match::new(pa, pb)]);
        assert_eq!(t.name, pt.name);
        assert_eq!(t.date, pt.date);
    }

    #[test]
    fn duplicate_resolution_is_rejected() {
        let pt = pending(&["a", "b"], &[("a", "b")]);
        let shared = Uuid::now_v7();
        let resolved = BTreeMap::from([("a".to_string(), shared), ("b".to_string(), shared)]);
        assert!(pt.clone_into_tournament(&resolved).is_err());
    }

    #[test]
    fn unresolved_alias_is_rejected() {
        let pt = pending(&["a", "b"], &[("a", "b")]);
        let resolved = BTreeMap::from([("a".to_string(), Uuid::now_v7())]);
        assert!(pt.clone_into_tournament(&resolved).is_err());
    }
}
