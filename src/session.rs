//! Application state for one browser tab.
//!
//! A [`Session`] owns the roster selector, the ledger of the match in progress
//! and a handle to the durable store. Each mutation is applied and then
//! persisted straight away; a failing store is logged and otherwise ignored
//! so the match carries on in memory.

use crate::catalog::CharacterRecord;
use crate::defaults;
use crate::ledger::{LedgerChange, LedgerError, ScoreLedger, Undo};
use crate::roster::{RosterError, RosterSelector, Selection, Variant};
use crate::settings::RedBallCount;
use crate::store::KeyValueStore;
use log::{info, warn};
use std::rc::Rc;

/// Which screen the app should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ChoosingCount,
    Selecting,
    Scoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    Uninitialized,
    Active,
}

pub struct Session {
    store: Rc<dyn KeyValueStore>,
    roster: RosterSelector,
    ledger: Option<ScoreLedger>,
}

impl Session {
    /// Resume whatever `store` holds, or start at roster selection.
    pub fn start(variant: Variant, store: Rc<dyn KeyValueStore>) -> Self {
        Self::with_selector(RosterSelector::new(variant), store)
    }

    pub fn with_selector(mut roster: RosterSelector, store: Rc<dyn KeyValueStore>) -> Self {
        let ledger = roster
            .load_persisted(store.as_ref())
            .map(|players| ScoreLedger::restore(store.as_ref(), &players));
        if ledger.is_some() {
            info!("Resuming saved match");
        }
        Self {
            store,
            roster,
            ledger,
        }
    }

    pub fn variant(&self) -> Variant {
        self.roster.variant()
    }

    pub fn roster(&self) -> &RosterSelector {
        &self.roster
    }

    pub fn ledger(&self) -> Option<&ScoreLedger> {
        self.ledger.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.ledger.is_some() {
            Phase::Scoring
        } else if self.roster.player_count().is_none() {
            Phase::ChoosingCount
        } else {
            Phase::Selecting
        }
    }

    pub fn ledger_state(&self) -> LedgerState {
        match self.ledger {
            Some(_) => LedgerState::Active,
            None => LedgerState::Uninitialized,
        }
    }

    /// Whether leaving the page would throw away undoable actions.
    pub fn has_history(&self) -> bool {
        self.ledger.as_ref().is_some_and(ScoreLedger::has_history)
    }

    fn persist(&self) {
        if let Some(ledger) = &self.ledger {
            if let Err(e) = ledger.persist(self.store.as_ref()) {
                warn!("Could not save to storage: {}", e);
            }
        }
    }

    pub fn choose_player_count(&mut self, n: usize) -> bool {
        self.roster.choose_player_count(n)
    }

    pub fn select_character(&mut self, id: u32) -> Selection {
        self.roster.select_character(id)
    }

    pub fn deselect_character(&mut self, id: u32) -> bool {
        self.roster.deselect_character(id)
    }

    /// Confirm the picks and open a fresh ledger, replacing any scores
    /// saved for an earlier roster. A match in progress is left alone.
    pub fn confirm_roster(&mut self) -> Result<&ScoreLedger, RosterError> {
        if self.ledger.is_some() {
            return Err(RosterError::AlreadyConfirmed);
        }
        let players: Vec<CharacterRecord> = self.roster.confirm_roster(self.store.as_ref())?;
        let ledger = ScoreLedger::initialize(&players);
        if let Err(e) = ledger.persist(self.store.as_ref()) {
            warn!("Could not save to storage: {}", e);
        }
        Ok(self.ledger.insert(ledger))
    }

    /// Drop the roster and the match, back to choosing players.
    pub fn change_players(&mut self) {
        self.roster.reset_roster(self.store.as_ref());
        self.ledger = None;
        if let Err(e) = self.store.remove(defaults::SCORE_KEY) {
            warn!("Stored scores not cleared: {}", e);
        }
        info!("Roster cleared");
    }

    pub fn add_score(&mut self, slot: usize, delta: i32) -> Result<LedgerChange, LedgerError> {
        let ledger = self.ledger.as_mut().ok_or(LedgerError::NoActiveMatch)?;
        let change = ledger.add_score(slot, delta)?;
        self.persist();
        Ok(change)
    }

    pub fn undo(&mut self) -> Undo {
        let Some(ledger) = self.ledger.as_mut() else {
            return Undo::NothingToUndo;
        };
        let outcome = ledger.undo();
        if outcome != Undo::NothingToUndo {
            self.persist();
        }
        outcome
    }

    pub fn reset_scores_only(&mut self) -> Option<LedgerChange> {
        let change = self.ledger.as_mut()?.reset_scores_only();
        self.persist();
        Some(change)
    }

    pub fn full_reset(&mut self) -> Option<LedgerChange> {
        let change = self.ledger.as_mut()?.full_reset();
        self.persist();
        info!("Match reset");
        Some(change)
    }

    pub fn set_name(&mut self, slot: usize, name: &str) -> Result<LedgerChange, LedgerError> {
        let ledger = self.ledger.as_mut().ok_or(LedgerError::NoActiveMatch)?;
        let change = ledger.set_name(slot, name)?;
        self.persist();
        Ok(change)
    }

    pub fn set_reds(&mut self, reds: RedBallCount) -> Option<LedgerChange> {
        let change = self.ledger.as_mut()?.set_reds(reds);
        self.persist();
        Some(change)
    }

    pub fn set_respot(&mut self, respot: bool) -> Option<LedgerChange> {
        let change = self.ledger.as_mut()?.set_respot(respot);
        self.persist();
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::store::MemoryStore;

    fn fresh(variant: Variant) -> (Rc<MemoryStore>, Session) {
        let memory = Rc::new(MemoryStore::new());
        let store: Rc<dyn KeyValueStore> = memory.clone();
        (memory, Session::start(variant, store))
    }

    fn start_trio(session: &mut Session) {
        assert!(session.choose_player_count(3));
        for id in [1, 2, 3] {
            assert!(session.select_character(id).is_accepted());
        }
        session.confirm_roster().unwrap();
    }

    #[test]
    fn phases_follow_the_setup_flow() {
        let (_, mut session) = fresh(Variant::Multiplayer);
        assert_eq!(session.phase(), Phase::ChoosingCount);
        assert_eq!(session.ledger_state(), LedgerState::Uninitialized);
        session.choose_player_count(3);
        assert_eq!(session.phase(), Phase::Selecting);
        for id in [1, 2, 3] {
            session.select_character(id);
        }
        session.confirm_roster().unwrap();
        assert_eq!(session.phase(), Phase::Scoring);
        assert_eq!(session.ledger_state(), LedgerState::Active);
        assert_eq!(session.ledger().unwrap().scores(), &[0, 0, 0]);
    }

    #[test]
    fn pair_variant_skips_count_choice() {
        let (_, session) = fresh(Variant::Pair);
        assert_eq!(session.phase(), Phase::Selecting);
    }

    #[test]
    fn scoring_before_roster_is_rejected() {
        let (memory, mut session) = fresh(Variant::Multiplayer);
        assert_eq!(session.add_score(0, 1), Err(LedgerError::NoActiveMatch));
        assert_eq!(session.undo(), Undo::NothingToUndo);
        assert_eq!(session.full_reset(), None);
        assert!(memory.is_empty());
    }

    #[test]
    fn every_mutation_is_persisted() {
        let (memory, mut session) = fresh(Variant::Multiplayer);
        start_trio(&mut session);
        session.add_score(2, 7).unwrap();
        session.set_name(0, "Ding").unwrap();
        session.set_reds(RedBallCount::Ten);
        session.set_respot(true);

        let store: Rc<dyn KeyValueStore> = memory.clone();
        let resumed = Session::start(Variant::Multiplayer, store);
        assert_eq!(resumed.phase(), Phase::Scoring);
        let ledger = resumed.ledger().unwrap();
        assert_eq!(ledger.scores(), &[0, 0, 7]);
        assert_eq!(ledger.display_name(0), Some("Ding"));
        assert_eq!(ledger.settings(), Settings { reds: RedBallCount::Ten, respot: true });
        assert!(resumed.has_history());
    }

    #[test]
    fn undo_is_persisted() {
        let (memory, mut session) = fresh(Variant::Pair);
        session.select_character(4);
        session.select_character(5);
        session.confirm_roster().unwrap();
        session.add_score(0, 3).unwrap();
        session.add_score(0, 4).unwrap();
        assert_eq!(session.undo(), Undo::Undone { slot: 0, delta: 4 });

        let store: Rc<dyn KeyValueStore> = memory.clone();
        let resumed = Session::start(Variant::Pair, store);
        assert_eq!(resumed.ledger().unwrap().scores(), &[3, 0]);
    }

    #[test]
    fn confirming_a_new_roster_discards_old_scores() {
        let (memory, mut session) = fresh(Variant::Multiplayer);
        start_trio(&mut session);
        session.add_score(1, 5).unwrap();

        session.change_players();
        assert_eq!(session.phase(), Phase::ChoosingCount);
        assert_eq!(session.ledger_state(), LedgerState::Uninitialized);
        assert!(memory.is_empty());

        start_trio(&mut session);
        assert_eq!(session.ledger().unwrap().scores(), &[0, 0, 0]);
        assert!(!session.has_history());
    }

    #[test]
    fn confirming_again_keeps_the_match_in_progress() {
        let (memory, mut session) = fresh(Variant::Pair);
        session.select_character(1);
        session.select_character(2);
        session.confirm_roster().unwrap();
        session.add_score(0, 7).unwrap();
        session.set_reds(RedBallCount::Six);
        let saved = memory.get(defaults::SCORE_KEY).unwrap();

        assert_eq!(session.confirm_roster().err(), Some(RosterError::AlreadyConfirmed));
        let ledger = session.ledger().unwrap();
        assert_eq!(ledger.scores(), &[7, 0]);
        assert_eq!(ledger.history().len(), 1);
        assert_eq!(ledger.settings().reds, RedBallCount::Six);
        assert_eq!(memory.get(defaults::SCORE_KEY).unwrap(), saved);

        let store: Rc<dyn KeyValueStore> = memory.clone();
        let mut resumed = Session::start(Variant::Pair, store);
        assert_eq!(resumed.confirm_roster().err(), Some(RosterError::AlreadyConfirmed));
        assert_eq!(resumed.ledger().unwrap().scores(), &[7, 0]);
    }

    #[test]
    fn confirm_overwrites_scores_left_from_another_roster() {
        let stale = r#"{"scores":[40,12],"history":[]}"#;
        let memory = Rc::new(MemoryStore::new().with_entry(defaults::SCORE_KEY, stale));
        let store: Rc<dyn KeyValueStore> = memory.clone();
        let mut session = Session::start(Variant::Pair, store);
        assert_eq!(session.phase(), Phase::Selecting);
        session.select_character(6);
        session.select_character(7);
        session.confirm_roster().unwrap();
        assert_eq!(session.ledger().unwrap().scores(), &[0, 0]);
    }

    #[test]
    fn write_failures_do_not_stop_the_match() {
        let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::read_only());
        let mut session = Session::start(Variant::Pair, store);
        session.select_character(1);
        session.select_character(2);
        session.confirm_roster().unwrap();
        session.add_score(1, 6).unwrap();
        session.add_score(0, 2).unwrap();
        session.undo();
        assert_eq!(session.ledger().unwrap().scores(), &[0, 6]);
        session.change_players();
        assert_eq!(session.ledger_state(), LedgerState::Uninitialized);
    }

    #[test]
    fn resets_keep_the_roster() {
        let (_, mut session) = fresh(Variant::Multiplayer);
        start_trio(&mut session);
        session.add_score(0, 1).unwrap();
        session.set_respot(true);

        assert_eq!(session.reset_scores_only(), Some(LedgerChange::ScoresReset));
        assert!(session.ledger().unwrap().settings().respot);
        assert_eq!(session.phase(), Phase::Scoring);

        assert_eq!(session.full_reset(), Some(LedgerChange::FullReset));
        assert!(!session.ledger().unwrap().settings().respot);
        assert_eq!(session.roster().selection().len(), 3);
    }
}
