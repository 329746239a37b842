//! Score ledger: per-slot scores, the undo history, name overrides and settings.
//!
//! Every mutation returns a [`LedgerChange`] describing what happened, so the
//! view can react (pulse a score, shake a button) without the ledger knowing
//! anything about the DOM.

use crate::catalog::CharacterRecord;
use crate::defaults;
use crate::settings::{RedBallCount, Settings};
use crate::store::{read_json, KeyValueStore, StoreError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// One scoring action, with the whole score table as it was before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub slot: usize,
    pub delta: i32,
    pub previous_scores: Vec<i32>,
}

/// What a mutation did, for whoever renders the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    Scored { slot: usize, score: i32 },
    ScoresReset,
    FullReset,
    NameChanged { slot: usize },
    SettingsChanged(Settings),
}

/// Outcome of [`ScoreLedger::undo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Undo {
    Undone { slot: usize, delta: i32 },
    NothingToUndo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    SlotOutOfRange { slot: usize, player_count: usize },
    /// No roster has been confirmed yet, so there is nothing to score.
    NoActiveMatch,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::SlotOutOfRange { slot, player_count } => write!(
                f,
                "Slot {} does not exist in a {}-player match",
                slot, player_count
            ),
            LedgerError::NoActiveMatch => write!(f, "No match in progress"),
        }
    }
}

impl std::error::Error for LedgerError {}

#[derive(Serialize)]
struct PersistedLedger<'a> {
    scores: &'a [i32],
    history: &'a [HistoryEntry],
    names: &'a [String],
    settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLedger {
    roster: Vec<CharacterRecord>,
    scores: Vec<i32>,
    history: Vec<HistoryEntry>,
    names: Vec<String>,
    settings: Settings,
}

impl ScoreLedger {
    /// Fresh ledger for `roster`: every slot at zero, nothing to undo.
    pub fn initialize(roster: &[CharacterRecord]) -> Self {
        let player_count = roster.len();
        Self {
            roster: roster.to_vec(),
            scores: vec![0; player_count],
            history: Vec::new(),
            names: vec![String::new(); player_count],
            settings: Settings::default(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.scores.len()
    }

    pub fn roster(&self) -> &[CharacterRecord] {
        &self.roster
    }

    pub fn scores(&self) -> &[i32] {
        &self.scores
    }

    pub fn score(&self, slot: usize) -> Option<i32> {
        self.scores.get(slot).copied()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// The typed-in name for `slot`, falling back to the character's name.
    pub fn display_name(&self, slot: usize) -> Option<&str> {
        let name = self.names.get(slot)?.trim();
        if name.is_empty() {
            self.roster.get(slot).map(|record| record.name.as_str())
        } else {
            Some(name)
        }
    }

    fn check_slot(&self, slot: usize) -> Result<(), LedgerError> {
        if slot < self.player_count() {
            Ok(())
        } else {
            Err(LedgerError::SlotOutOfRange {
                slot,
                player_count: self.player_count(),
            })
        }
    }

    /// Add `delta` (possibly negative) to `slot`. Scores have no floor.
    pub fn add_score(&mut self, slot: usize, delta: i32) -> Result<LedgerChange, LedgerError> {
        self.check_slot(slot)?;
        self.history.push(HistoryEntry {
            slot,
            delta,
            previous_scores: self.scores.clone(),
        });
        let score = &mut self.scores[slot];
        *score = score.saturating_add(delta);
        debug!("Slot {} {:+} -> {}", slot, delta, *score);
        Ok(LedgerChange::Scored {
            slot,
            score: *score,
        })
    }

    /// Roll back the most recent scoring action by restoring its snapshot.
    pub fn undo(&mut self) -> Undo {
        match self.history.pop() {
            Some(entry) => {
                self.scores = entry.previous_scores;
                debug!("Undid {:+} for slot {}", entry.delta, entry.slot);
                Undo::Undone {
                    slot: entry.slot,
                    delta: entry.delta,
                }
            }
            None => Undo::NothingToUndo,
        }
    }

    /// Zero the scores for a new frame; names go back to the characters'
    /// names, settings stay.
    pub fn reset_scores_only(&mut self) -> LedgerChange {
        self.scores.iter_mut().for_each(|score| *score = 0);
        self.history.clear();
        self.names = self.roster.iter().map(|record| record.name.clone()).collect();
        LedgerChange::ScoresReset
    }

    /// Start over completely: zero scores, blank names, default settings.
    pub fn full_reset(&mut self) -> LedgerChange {
        self.scores.iter_mut().for_each(|score| *score = 0);
        self.history.clear();
        self.names.iter_mut().for_each(String::clear);
        self.settings = Settings::default();
        LedgerChange::FullReset
    }

    pub fn set_name(&mut self, slot: usize, name: &str) -> Result<LedgerChange, LedgerError> {
        self.check_slot(slot)?;
        self.names[slot] = name.to_string();
        Ok(LedgerChange::NameChanged { slot })
    }

    pub fn set_reds(&mut self, reds: RedBallCount) -> LedgerChange {
        self.settings.reds = reds;
        LedgerChange::SettingsChanged(self.settings)
    }

    pub fn set_respot(&mut self, respot: bool) -> LedgerChange {
        self.settings.respot = respot;
        LedgerChange::SettingsChanged(self.settings)
    }

    /// Write the ledger under the score key.
    pub fn persist(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(&PersistedLedger {
            scores: &self.scores,
            history: &self.history,
            names: &self.names,
            settings: self.settings,
        })
        .map_err(|e| StoreError::Write {
            key: defaults::SCORE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        store.set(defaults::SCORE_KEY, &json)
    }

    /// Rebuild a ledger for `roster` from whatever the store holds.
    ///
    /// Never fails: missing or malformed data gives a fresh ledger.
    pub fn restore(store: &dyn KeyValueStore, roster: &[CharacterRecord]) -> Self {
        match read_json(store, defaults::SCORE_KEY) {
            Some(value) => {
                let ledger = Self::from_json_lenient(&value, roster);
                info!(
                    "Restored scores {:?} with {} undo steps",
                    ledger.scores,
                    ledger.history.len()
                );
                ledger
            }
            None => Self::initialize(roster),
        }
    }

    /// Read each field on its own so one bad field does not discard the rest.
    ///
    /// Also understands the two-player layout used by earlier releases
    /// (`{"a": .., "b": ..}` scores, `playerAName`, `redsCount`, `respotColors`).
    pub fn from_json_lenient(value: &Value, roster: &[CharacterRecord]) -> Self {
        let mut ledger = Self::initialize(roster);
        let player_count = ledger.player_count();

        if let Some(scores) = lenient_scores(value.get("scores"), player_count) {
            ledger.scores = scores;
        }

        if let Some(entries) = value.get("history").and_then(Value::as_array) {
            ledger.history = entries
                .iter()
                .filter_map(|entry| lenient_history_entry(entry, player_count))
                .collect();
            if ledger.history.len() != entries.len() {
                debug!(
                    "Dropped {} unreadable history entries",
                    entries.len() - ledger.history.len()
                );
            }
        }

        match value.get("names").and_then(Value::as_array) {
            Some(names) => {
                for (slot, name) in ledger.names.iter_mut().enumerate() {
                    if let Some(stored) = names.get(slot).and_then(Value::as_str) {
                        *name = stored.to_string();
                    }
                }
            }
            None => {
                for (slot, name) in ledger.names.iter_mut().enumerate() {
                    let key = format!("player{}Name", slot_letter(slot).to_ascii_uppercase());
                    if let Some(stored) = value.get(&key).and_then(Value::as_str) {
                        *name = stored.to_string();
                    }
                }
            }
        }

        ledger.settings = match value.get("settings") {
            Some(settings) => Settings::from_json_lenient(Some(settings)),
            None => {
                let legacy = json!({
                    "reds": value.get("redsCount").cloned().unwrap_or(Value::Null),
                    "respot": value.get("respotColors").cloned().unwrap_or(Value::Null),
                });
                Settings::from_json_lenient(Some(&legacy))
            }
        };

        ledger
    }
}

fn slot_letter(slot: usize) -> char {
    (b'a' + (slot % 26) as u8) as char
}

/// A stored score as `i32`. Out-of-range integers and floats (`1e12`) are
/// pinned to the nearest bound; fractions are truncated.
fn clamp_score(value: &Value) -> Option<i32> {
    let wide = match value.as_i64() {
        Some(v) => v,
        None => value.as_f64().filter(|f| f.is_finite())? as i64,
    };
    Some(wide.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Scores for exactly `player_count` slots from an array, a `{"0": ..}` map
/// or a `{"a": ..}` map. Missing slots read as zero, extras are dropped.
fn lenient_scores(value: Option<&Value>, player_count: usize) -> Option<Vec<i32>> {
    match value? {
        Value::Array(items) => Some(
            (0..player_count)
                .map(|slot| items.get(slot).and_then(clamp_score).unwrap_or(0))
                .collect(),
        ),
        Value::Object(map) => Some(
            (0..player_count)
                .map(|slot| {
                    map.get(&slot.to_string())
                        .or_else(|| map.get(slot_letter(slot).to_string().as_str()))
                        .and_then(clamp_score)
                        .unwrap_or(0)
                })
                .collect(),
        ),
        _ => None,
    }
}

fn lenient_history_entry(value: &Value, player_count: usize) -> Option<HistoryEntry> {
    let slot = match value.get("slot").or_else(|| value.get("player"))? {
        Value::Number(n) => usize::try_from(n.as_u64()?).ok()?,
        Value::String(s) => {
            let mut chars = s.chars();
            let letter = chars.next()?;
            if chars.next().is_some() || !letter.is_ascii_lowercase() {
                return None;
            }
            (letter as u8 - b'a') as usize
        }
        _ => return None,
    };
    if slot >= player_count {
        return None;
    }
    let delta = value
        .get("delta")
        .or_else(|| value.get("points"))
        .and_then(clamp_score)?;
    let previous_scores = lenient_scores(value.get("previousScores"), player_count)?;
    Some(HistoryEntry {
        slot,
        delta,
        previous_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::catalog;
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    fn roster(n: usize) -> Vec<CharacterRecord> {
        catalog()[..n].to_vec()
    }

    #[test]
    fn initialize_creates_dense_zeroed_slots() {
        let ledger = ScoreLedger::initialize(&roster(3));
        assert_eq!(ledger.player_count(), 3);
        assert_eq!(ledger.scores(), &[0, 0, 0]);
        assert_eq!(ledger.score(2), Some(0));
        assert_eq!(ledger.score(3), None);
        assert!(!ledger.has_history());
    }

    #[test]
    fn worked_example() {
        let mut ledger = ScoreLedger::initialize(&roster(2));
        assert_eq!(
            ledger.add_score(0, 7),
            Ok(LedgerChange::Scored { slot: 0, score: 7 })
        );
        assert_eq!(ledger.scores(), &[7, 0]);
        ledger.add_score(1, -4).unwrap();
        assert_eq!(ledger.scores(), &[7, -4]);
        assert_eq!(ledger.undo(), Undo::Undone { slot: 1, delta: -4 });
        assert_eq!(ledger.scores(), &[7, 0]);
        assert_eq!(ledger.undo(), Undo::Undone { slot: 0, delta: 7 });
        assert_eq!(ledger.scores(), &[0, 0]);
        assert_eq!(ledger.undo(), Undo::NothingToUndo);
        assert_eq!(ledger.scores(), &[0, 0]);
    }

    #[test]
    fn undo_everything_returns_to_zero() {
        let mut ledger = ScoreLedger::initialize(&roster(4));
        let moves = [(0, 1), (1, 7), (2, -4), (3, 5), (0, 6), (2, 2), (1, -7), (3, 4)];
        for (slot, delta) in moves {
            ledger.add_score(slot, delta).unwrap();
        }
        assert_ne!(ledger.scores(), &[0, 0, 0, 0]);
        let mut undone = 0;
        while ledger.undo() != Undo::NothingToUndo {
            undone += 1;
        }
        assert_eq!(undone, moves.len());
        assert_eq!(ledger.scores(), &[0, 0, 0, 0]);
    }

    #[test]
    fn single_undo_restores_previous_value() {
        let mut ledger = ScoreLedger::initialize(&roster(2));
        ledger.add_score(1, 5).unwrap();
        ledger.add_score(1, 3).unwrap();
        ledger.undo();
        assert_eq!(ledger.score(1), Some(5));
    }

    #[test]
    fn scores_saturate_and_undo_restores_the_snapshot() {
        let mut ledger = ScoreLedger::initialize(&roster(2));
        ledger.add_score(0, i32::MAX).unwrap();
        assert_eq!(
            ledger.add_score(0, i32::MAX),
            Ok(LedgerChange::Scored { slot: 0, score: i32::MAX })
        );
        ledger.add_score(1, i32::MIN).unwrap();
        ledger.add_score(1, -1).unwrap();
        assert_eq!(ledger.scores(), &[i32::MAX, i32::MIN]);

        ledger.undo();
        ledger.undo();
        assert_eq!(ledger.scores(), &[i32::MAX, 0]);
        ledger.undo();
        assert_eq!(ledger.score(0), Some(i32::MAX));
        ledger.undo();
        assert_eq!(ledger.score(0), Some(0));
    }

    #[test]
    fn restore_pins_out_of_range_scores() {
        let value = json!({"scores": [9_999_999_999i64, -9_999_999_999i64, 1e12, 2.9]});
        let ledger = ScoreLedger::from_json_lenient(&value, &roster(4));
        assert_eq!(ledger.scores(), &[i32::MAX, i32::MIN, i32::MAX, 2]);

        let value = json!({
            "scores": [0, 0],
            "history": [{"slot": 1, "delta": 1e15, "previousScores": [0, -1e15]}]
        });
        let ledger = ScoreLedger::from_json_lenient(&value, &roster(2));
        assert_eq!(
            ledger.history(),
            &[HistoryEntry { slot: 1, delta: i32::MAX, previous_scores: vec![0, i32::MIN] }]
        );
    }

    #[test]
    fn scores_can_go_negative() {
        let mut ledger = ScoreLedger::initialize(&roster(2));
        ledger.add_score(0, -7).unwrap();
        assert_eq!(ledger.score(0), Some(-7));
    }

    #[test]
    fn out_of_range_slot_changes_nothing() {
        let mut ledger = ScoreLedger::initialize(&roster(2));
        assert_eq!(
            ledger.add_score(2, 1),
            Err(LedgerError::SlotOutOfRange { slot: 2, player_count: 2 })
        );
        assert!(!ledger.has_history());
        assert!(ledger.set_name(5, "x").is_err());
    }

    #[test]
    fn reset_scores_only_keeps_settings_and_restores_names() {
        let mut ledger = ScoreLedger::initialize(&roster(2));
        ledger.add_score(0, 4).unwrap();
        ledger.set_name(0, "Ronnie").unwrap();
        ledger.set_reds(RedBallCount::Six);
        assert_eq!(ledger.reset_scores_only(), LedgerChange::ScoresReset);
        assert_eq!(ledger.scores(), &[0, 0]);
        assert!(!ledger.has_history());
        assert_eq!(ledger.names(), &["Akash".to_string(), "Akhil".to_string()]);
        assert_eq!(ledger.settings().reds, RedBallCount::Six);
    }

    #[test]
    fn full_reset_clears_names_and_settings() {
        let mut ledger = ScoreLedger::initialize(&roster(2));
        ledger.add_score(1, 4).unwrap();
        ledger.set_name(1, "Judd").unwrap();
        ledger.set_respot(true);
        assert_eq!(ledger.full_reset(), LedgerChange::FullReset);
        assert_eq!(ledger.scores(), &[0, 0]);
        assert!(ledger.names().iter().all(String::is_empty));
        assert_eq!(ledger.settings(), Settings::default());
        assert_eq!(ledger.display_name(1), Some("Akhil"));
    }

    #[test]
    fn display_name_prefers_override() {
        let mut ledger = ScoreLedger::initialize(&roster(2));
        assert_eq!(ledger.display_name(0), Some("Akash"));
        ledger.set_name(0, "  Mark  ").unwrap();
        assert_eq!(ledger.display_name(0), Some("Mark"));
        ledger.set_name(0, "   ").unwrap();
        assert_eq!(ledger.display_name(0), Some("Akash"));
        assert_eq!(ledger.display_name(9), None);
    }

    #[test]
    fn persist_then_restore_round_trips() {
        let store = MemoryStore::new();
        let mut ledger = ScoreLedger::initialize(&roster(2));
        ledger.add_score(0, 5).unwrap();
        ledger.add_score(1, -2).unwrap();
        ledger.set_reds(RedBallCount::Ten);
        ledger.set_respot(true);
        ledger.set_name(1, "Shaun").unwrap();
        ledger.persist(&store).unwrap();

        let restored = ScoreLedger::restore(&store, &roster(2));
        assert_eq!(restored.scores(), &[5, -2]);
        assert_eq!(
            restored.settings(),
            Settings { reds: RedBallCount::Ten, respot: true }
        );
        assert_eq!(restored, ledger);
    }

    #[test]
    fn restore_without_data_is_fresh() {
        let store = MemoryStore::new();
        assert_eq!(
            ScoreLedger::restore(&store, &roster(3)),
            ScoreLedger::initialize(&roster(3))
        );
        let store = MemoryStore::new().with_entry(defaults::SCORE_KEY, "][");
        assert_eq!(
            ScoreLedger::restore(&store, &roster(3)),
            ScoreLedger::initialize(&roster(3))
        );
    }

    #[test]
    fn restore_normalizes_key_set() {
        let short = json!({"scores": [3]});
        let ledger = ScoreLedger::from_json_lenient(&short, &roster(3));
        assert_eq!(ledger.scores(), &[3, 0, 0]);

        let long = json!({"scores": {"0": 1, "1": 2, "2": 3, "7": 9}});
        let ledger = ScoreLedger::from_json_lenient(&long, &roster(2));
        assert_eq!(ledger.scores(), &[1, 2]);
    }

    #[test]
    fn restore_keeps_good_fields_next_to_bad_ones() {
        let value = json!({
            "scores": "not a map",
            "history": 12,
            "names": ["Steve", 4],
            "settings": {"reds": 6, "respot": "maybe"}
        });
        let ledger = ScoreLedger::from_json_lenient(&value, &roster(2));
        assert_eq!(ledger.scores(), &[0, 0]);
        assert!(!ledger.has_history());
        assert_eq!(ledger.names(), &["Steve".to_string(), String::new()]);
        assert_eq!(
            ledger.settings(),
            Settings { reds: RedBallCount::Six, respot: false }
        );
    }

    #[test]
    fn restore_reads_legacy_pair_layout() {
        let value = json!({
            "scores": {"a": 12, "b": 4},
            "history": [
                {"player": "a", "points": 5, "previousScores": {"a": 7, "b": 4}},
                {"player": "z", "points": 1, "previousScores": {"a": 0, "b": 0}}
            ],
            "playerAName": "Jimmy",
            "playerBName": "",
            "redsCount": "10",
            "respotColors": true
        });
        let mut ledger = ScoreLedger::from_json_lenient(&value, &roster(2));
        assert_eq!(ledger.scores(), &[12, 4]);
        assert_eq!(ledger.history().len(), 1);
        assert_eq!(ledger.display_name(0), Some("Jimmy"));
        assert_eq!(ledger.display_name(1), Some("Akhil"));
        assert_eq!(ledger.settings(), Settings { reds: RedBallCount::Ten, respot: true });

        assert_eq!(ledger.undo(), Undo::Undone { slot: 0, delta: 5 });
        assert_eq!(ledger.scores(), &[7, 4]);
    }

    #[test]
    fn restored_history_is_undoable() {
        let store = MemoryStore::new();
        let mut ledger = ScoreLedger::initialize(&roster(3));
        ledger.add_score(2, 6).unwrap();
        ledger.add_score(0, 1).unwrap();
        ledger.persist(&store).unwrap();

        let mut restored = ScoreLedger::restore(&store, &roster(3));
        restored.undo();
        restored.undo();
        assert_eq!(restored.scores(), &[0, 0, 0]);
        assert_eq!(restored.undo(), Undo::NothingToUndo);
    }

    #[test]
    fn persist_reports_write_failure() {
        let store = MemoryStore::read_only();
        let ledger = ScoreLedger::initialize(&roster(2));
        assert!(matches!(ledger.persist(&store), Err(StoreError::Write { .. })));
    }

    /// A player count and a list of `(slot, delta)` moves valid for it.
    fn match_moves() -> impl Strategy<Value = (usize, Vec<(usize, i32)>)> {
        (defaults::MIN_PLAYERS..=defaults::MAX_PLAYERS).prop_flat_map(|players| {
            (
                Just(players),
                prop::collection::vec((0..players, -200i32..200), 0..40),
            )
        })
    }

    proptest! {
        #[test]
        fn undoing_every_move_returns_to_zero((players, moves) in match_moves()) {
            let mut ledger = ScoreLedger::initialize(&roster(players));
            for &(slot, delta) in &moves {
                ledger.add_score(slot, delta).unwrap();
            }
            let mut undone = 0;
            while ledger.undo() != Undo::NothingToUndo {
                undone += 1;
            }
            let zeros = vec![0; players];
            prop_assert_eq!(undone, moves.len());
            prop_assert_eq!(ledger.scores(), zeros.as_slice());
        }

        #[test]
        fn undo_drops_only_the_last_move(
            (players, moves) in match_moves(),
            pick in any::<prop::sample::Index>(),
            first in -200i32..200,
            second in -200i32..200,
        ) {
            let slot = pick.index(players);
            let mut ledger = ScoreLedger::initialize(&roster(players));
            for &(s, delta) in &moves {
                ledger.add_score(s, delta).unwrap();
            }
            ledger.add_score(slot, first).unwrap();
            let after_first = ledger.scores().to_vec();
            ledger.add_score(slot, second).unwrap();

            prop_assert_eq!(ledger.undo(), Undo::Undone { slot, delta: second });
            prop_assert_eq!(ledger.scores(), after_first.as_slice());
            prop_assert_eq!(ledger.history().len(), moves.len() + 1);
        }
    }
}
