//! Player identity: display name, aliases, region membership, per-region
//! ratings and the merge relationship.

use crate::{
    Rating,
    utils::{
        ids::new_id,
        normalize::normalize_alias,
        validation::{FieldError, ValidationErrors, ValidationResult},
    },
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    /// display name
    pub name: String,
    /// lowercase strings this player is recognized by in bracket input;
    /// always contains the lowercased display name
    pub aliases: BTreeSet<String>,
    /// region ids this player belongs to
    pub regions: BTreeSet<String>,
    /// region id -> rating
    pub ratings: BTreeMap<String, Rating>,
    pub merged: bool,
    pub merge_parent: Option<Uuid>,
    /// ids of players absorbed into this one, transitively
    pub merge_children: BTreeSet<Uuid>,
}

impl Player {
    /// New player known only by its display name, with no match history.
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        let name = name.into();
        let mut aliases = BTreeSet::new();
        aliases.insert(normalize_alias(&name));
        let mut regions = BTreeSet::new();
        regions.insert(region.into());
        Player {
            id: new_id(),
            name,
            aliases,
            regions,
            ratings: BTreeMap::new(),
            merged: false,
            merge_parent: None,
            merge_children: BTreeSet::new(),
        }
    }

    pub fn get_rating(&self, region: &str) -> Option<Rating> {
        self.ratings.get(region).copied()
    }

    /// Insert or overwrite the rating for one region.
    pub fn update_rating(&mut self, region: impl Into<String>, rating: Rating) {
        self.ratings.insert(region.into(), rating);
    }

    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add(FieldError::required("name"));
        }

        // merged <=> merge_parent set
        if self.merged && self.merge_parent.is_none() {
            errors.add(FieldError::invalid(
                "merge_parent",
                "player is merged but has no parent",
            ));
        }
        if self.merge_parent.is_some() && !self.merged {
            errors.add(FieldError::invalid(
                "merged",
                "player has merge_parent but is not merged",
            ));
        }

        if self.merge_children.contains(&self.id) {
            errors.add(FieldError::invalid(
                "merge_children",
                "player cannot absorb itself",
            ));
        }

        if !self.aliases.contains(&normalize_alias(&self.name)) {
            errors.add(FieldError::invalid(
                "aliases",
                "aliases must contain the player's name",
            ));
        }
        for alias in &self.aliases {
            if *alias != normalize_alias(alias) {
                errors.add(FieldError::invalid(
                    "aliases",
                    format!("alias '{alias}' is not in canonical lowercase form"),
                ));
            }
        }

        errors.into_result()
    }
}
