//! Player roster selection: how many players, and which character each one is.

use crate::catalog::{self, CharacterRecord};
use crate::defaults;
use crate::store::{read_json, KeyValueStore};
use log::{debug, info, warn};
use std::fmt;

/// Which flavour of the app is running. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Head-to-head, always two players.
    Pair,
    /// Two to six players.
    #[default]
    Multiplayer,
}

impl Variant {
    /// Pick the variant from a page query string such as `?mode=pair`.
    pub fn from_query(search: &str) -> Self {
        let pair = search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| key == "mode" && matches!(value, "pair" | "duo"));
        if pair {
            Variant::Pair
        } else {
            Variant::Multiplayer
        }
    }

    /// Player counts this variant accepts.
    pub fn player_counts(self) -> std::ops::RangeInclusive<usize> {
        match self {
            Variant::Pair => defaults::PAIR_PLAYERS..=defaults::PAIR_PLAYERS,
            Variant::Multiplayer => defaults::MIN_PLAYERS..=defaults::MAX_PLAYERS,
        }
    }

    /// Count preset before any user choice, if the variant fixes one.
    pub fn fixed_count(self) -> Option<usize> {
        match self {
            Variant::Pair => Some(defaults::PAIR_PLAYERS),
            Variant::Multiplayer => None,
        }
    }
}

/// Result of a pick. Rejections leave the selector untouched; the view only
/// uses them to decide whether to play the shake cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Added,
    AlreadySelected,
    RosterFull,
    UnknownCharacter,
    NoPlayerCount,
    Locked,
}

impl Selection {
    pub fn is_accepted(self) -> bool {
        self == Selection::Added
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    NoPlayerCount,
    Incomplete { selected: usize, required: usize },
    AlreadyConfirmed,
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::NoPlayerCount => write!(f, "Choose the number of players first"),
            RosterError::Incomplete { selected, required } => write!(
                f,
                "Roster incomplete: {} of {} players selected",
                selected, required
            ),
            RosterError::AlreadyConfirmed => {
                write!(f, "Roster already confirmed; change players to pick a new one")
            }
        }
    }
}

impl std::error::Error for RosterError {}

/// Collects a roster from the catalog, in click order.
#[derive(Debug, Clone)]
pub struct RosterSelector {
    variant: Variant,
    catalog: Vec<CharacterRecord>,
    player_count: Option<usize>,
    selection: Vec<CharacterRecord>,
    confirmed: bool,
}

impl RosterSelector {
    pub fn new(variant: Variant) -> Self {
        Self::with_catalog(variant, catalog::catalog().to_vec())
    }

    pub fn with_catalog(variant: Variant, catalog: Vec<CharacterRecord>) -> Self {
        Self {
            variant,
            catalog,
            player_count: variant.fixed_count(),
            selection: Vec::new(),
            confirmed: false,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn catalog(&self) -> &[CharacterRecord] {
        &self.catalog
    }

    pub fn player_count(&self) -> Option<usize> {
        self.player_count
    }

    pub fn selection(&self) -> &[CharacterRecord] {
        &self.selection
    }

    pub fn is_selected(&self, id: u32) -> bool {
        self.selection.iter().any(|record| record.id == id)
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Set the expected roster size. Ignored when `n` is outside the
    /// variant's range, once picking has started, or after confirmation.
    pub fn choose_player_count(&mut self, n: usize) -> bool {
        if self.confirmed || !self.selection.is_empty() {
            debug!("Ignoring player count {}: selection already in progress", n);
            return false;
        }
        if !self.variant.player_counts().contains(&n) {
            debug!("Ignoring player count {}: outside {:?}", n, self.variant.player_counts());
            return false;
        }
        self.player_count = Some(n);
        true
    }

    pub fn select_character(&mut self, id: u32) -> Selection {
        if self.confirmed {
            return Selection::Locked;
        }
        let Some(required) = self.player_count else {
            return Selection::NoPlayerCount;
        };
        if self.is_selected(id) {
            return Selection::AlreadySelected;
        }
        if self.selection.len() >= required {
            return Selection::RosterFull;
        }
        match catalog::find(&self.catalog, id) {
            Some(record) => {
                self.selection.push(record.clone());
                Selection::Added
            }
            None => Selection::UnknownCharacter,
        }
    }

    /// Drop a pick before the roster is confirmed. Returns whether anything changed.
    pub fn deselect_character(&mut self, id: u32) -> bool {
        if self.confirmed {
            return false;
        }
        let before = self.selection.len();
        self.selection.retain(|record| record.id != id);
        self.selection.len() != before
    }

    /// Lock in the roster and write it to `store`.
    ///
    /// A failed write is logged; the confirmed roster is still returned so the
    /// match can go on in memory. A roster that is already locked stays as it
    /// is until [`reset_roster`](Self::reset_roster).
    pub fn confirm_roster(
        &mut self,
        store: &dyn KeyValueStore,
    ) -> Result<Vec<CharacterRecord>, RosterError> {
        if self.confirmed {
            return Err(RosterError::AlreadyConfirmed);
        }
        let required = self.player_count.ok_or(RosterError::NoPlayerCount)?;
        if self.selection.len() != required {
            return Err(RosterError::Incomplete {
                selected: self.selection.len(),
                required,
            });
        }

        match serde_json::to_string(&self.selection) {
            Ok(json) => {
                if let Err(e) = store.set(defaults::ROSTER_KEY, &json) {
                    warn!("Roster not saved: {}", e);
                }
            }
            Err(e) => warn!("Roster not serialized: {}", e),
        }

        self.confirmed = true;
        info!(
            "Roster confirmed: {}",
            self.selection
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(self.selection.clone())
    }

    /// Forget the roster, both in memory and in `store`.
    pub fn reset_roster(&mut self, store: &dyn KeyValueStore) {
        self.selection.clear();
        self.player_count = self.variant.fixed_count();
        self.confirmed = false;
        if let Err(e) = store.remove(defaults::ROSTER_KEY) {
            warn!("Stored roster not cleared: {}", e);
        }
    }

    /// Restore a roster confirmed in an earlier session.
    ///
    /// Anything that does not form a valid roster for this variant is treated
    /// as if nothing were stored.
    pub fn load_persisted(&mut self, store: &dyn KeyValueStore) -> Option<Vec<CharacterRecord>> {
        let value = read_json(store, defaults::ROSTER_KEY)?;
        let roster: Vec<CharacterRecord> = match serde_json::from_value(value) {
            Ok(roster) => roster,
            Err(e) => {
                debug!("Stored roster has an unexpected shape: {}", e);
                return None;
            }
        };

        if !self.variant.player_counts().contains(&roster.len()) {
            debug!("Stored roster of {} does not fit {:?}", roster.len(), self.variant);
            return None;
        }
        let mut ids = std::collections::HashSet::new();
        if !roster.iter().all(|record| ids.insert(record.id)) {
            debug!("Stored roster repeats a character");
            return None;
        }

        self.player_count = Some(roster.len());
        self.selection = roster.clone();
        self.confirmed = true;
        Some(roster)
    }
}
