//! Canonical tournaments: finalized brackets whose matches reference
//! stable player ids.

use crate::{
    CoreError,
    utils::validation::{FieldError, ValidationErrors, ValidationResult},
};
use chrono::{DateTime, Utc};
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, str::FromStr};
use uuid::Uuid;

/// Origin of a scraped bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// tio
    Tio,
    /// challonge
    Challonge,
    /// smashgg
    Smashgg,
    /// other
    Other,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Tio => "tio",
            SourceType::Challonge => "challonge",
            SourceType::Smashgg => "smashgg",
            SourceType::Other => "other",
        }
    }
}

impl FromStr for SourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tio" => Ok(SourceType::Tio),
            "challonge" => Ok(SourceType::Challonge),
            "smashgg" => Ok(SourceType::Smashgg),
            "other" => Ok(SourceType::Other),
            unknown => Err(CoreError::Parsing(format!(
                "unknown source type '{unknown}'"
            ))),
        }
    }
}

/// A decided two-player match inside a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub winner: Uuid,
    pub loser: Uuid,
}

impl Match {
    pub fn new(winner: Uuid, loser: Uuid) -> Self {
        Match { winner, loser }
    }

    pub fn contains_player(&self, player_id: Uuid) -> bool {
        self.winner == player_id || self.loser == player_id
    }

    pub fn contains_players(&self, a: Uuid, b: Uuid) -> bool {
        self.contains_player(a) && self.contains_player(b)
    }

    pub fn did_player_win(&self, player_id: Uuid) -> bool {
        self.winner == player_id
    }

    pub fn get_opposing_player(&self, player_id: Uuid) -> Option<Uuid> {
        if self.winner == player_id {
            Some(self.loser)
        } else if self.loser == player_id {
            Some(self.winner)
        } else {
            None
        }
    }

    fn replace_player(&mut self, remove: Uuid, add: Uuid) {
        if self.winner == remove {
            self.winner = add;
        }
        if self.loser == remove {
            self.loser = add;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: Uuid,
    pub name: String,
    pub source_type: SourceType,
    pub date: DateTime<Utc>,
    pub regions: BTreeSet<String>,
    /// opaque scraper payload, preserved for audit; excluded from listings
    pub raw: String,
    /// live participants; rewritten by merge/unmerge
    pub players: BTreeSet<Uuid>,
    pub matches: Vec<Match>,
    /// snapshot of `players` at first save; the immutable ground truth of
    /// who originally competed, consulted when a merge is unwound
    pub orig_ids: BTreeSet<Uuid>,
}

impl Tournament {
    /// Structural invariants:
    /// - the set of ids appearing in matches equals `players`
    /// - no match pairs a player against themselves
    /// - `orig_ids` has the same cardinality as `players`
    ///
    /// The no-merged-participant invariant needs player records and is
    /// enforced by the services that hold them.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();

        let mut match_ids = BTreeSet::new();
        for m in &self.matches {
            match_ids.insert(m.winner);
            match_ids.insert(m.loser);
            if m.winner == m.loser {
                errors.add(FieldError::invalid(
                    "matches",
                    "tournament contains match where player plays themself",
                ));
            }
        }
        if match_ids != self.players {
            errors.add(FieldError::invalid(
                "players",
                "set of players differs from set of players in matches",
            ));
        }

        if self.orig_ids.len() != self.players.len() {
            errors.add(FieldError::invalid(
                "orig_ids",
                "different number of orig_ids and players",
            ));
        }

        errors.into_result()
    }

    /// Swap one live participant for another, in `players` and in every
    /// match. `orig_ids` is deliberately left untouched.
    pub fn replace_player(&mut self, remove: Uuid, add: Uuid) {
        if self.players.remove(&remove) {
            self.players.insert(add);
        }
        for m in &mut self.matches {
            m.replace_player(remove, add);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tournament_with(players: &[Uuid], matches: Vec<Match>) -> Tournament {
        Tournament {
            id: Uuid::now_v7(),
            name: "Weekly".into(),
            source_type: SourceType::Other,
            date: Utc.with_ymd_and_hms(2013, 10, 16, 0, 0, 0).unwrap(),
            regions: BTreeSet::from(["norcal".to_string()]),
            raw: String::new(),
            players: players.iter().copied().collect(),
            matches,
            orig_ids: players.iter().copied().collect(),
        }
    }

    #[test]
    fn source_type_round_trips() {
        for s in ["tio", "challonge", "smashgg", "other"] {
            assert_eq!(s.parse::<SourceType>().unwrap().as_str(), s);
        }
        assert!("bracketmaker".parse::<SourceType>().is_err());
    }

    #[test]
    fn players_must_match_match_participants() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let valid = tournament_with(&[a, b], vec![Match::new(a, b)]);
        assert!(valid.validate().is_ok());

        let missing_player = tournament_with(&[a, b, c], vec![Match::new(a, b)]);
        assert!(missing_player.validate().is_err());
    }

    #[test]
    fn self_play_is_rejected() {
        let a = Uuid::now_v7();
        let t = tournament_with(&[a], vec![Match::new(a, a)]);
        assert!(t.validate().is_err());
    }

    #[test]
    fn orig_ids_cardinality_checked() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let mut t = tournament_with(&[a, b], vec![Match::new(a, b)]);
        t.orig_ids.remove(&b);
        assert!(t.validate().is_err());
    }

    #[test]
    fn replace_player_rewrites_matches_but_not_orig_ids() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let mut t = tournament_with(&[a, b], vec![Match::new(a, b), Match::new(b, a)]);
        let orig = t.orig_ids.clone();

        t.replace_player(b, c);
        assert!(t.players.contains(&c));
        assert!(!t.players.contains(&b));
        assert_eq!(t.matches[0], Match::new(a, c));
        assert_eq!(t.matches[1], Match::new(c, a));
        assert_eq!(t.orig_ids, orig);
    }

    #[test]
    fn match_helpers() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let m = Match::new(a, b);
        assert!(m.contains_player(a));
        assert!(!m.contains_player(c));
        assert!(m.contains_players(b, a));
        assert!(m.did_player_win(a));
        assert_eq!(m.get_opposing_player(a), Some(b));
        assert_eq!(m.get_opposing_player(c), None);
    }
}
