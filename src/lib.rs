//! Snooker score counter core: roster selection, the score ledger and its
//! persistence. Everything here is DOM-free and runs natively; the Yew front
//! end in `main.rs` renders it.

pub mod catalog;
pub mod ledger;
pub mod roster;
pub mod session;
pub mod settings;
pub mod store;

pub use catalog::CharacterRecord;
pub use ledger::{HistoryEntry, LedgerChange, LedgerError, ScoreLedger, Undo};
pub use roster::{RosterError, RosterSelector, Selection, Variant};
pub use session::{LedgerState, Phase, Session};
pub use settings::{RedBallCount, Settings};
pub use store::{KeyValueStore, LocalStore, MemoryStore, StoreError};

/// Game constants and storage keys.
pub mod defaults {
    /// Storage key for the confirmed roster.
    pub const ROSTER_KEY: &str = "snookerRoster";
    /// Storage key for scores, history, names and settings.
    pub const SCORE_KEY: &str = "snookerScoreData";

    pub const PAIR_PLAYERS: usize = 2;
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 6;

    /// Ball colours and their values, lowest first.
    pub const BALLS: [(&str, i32); 7] = [
        ("red", 1),
        ("yellow", 2),
        ("green", 3),
        ("brown", 4),
        ("blue", 5),
        ("pink", 6),
        ("black", 7),
    ];

    /// Penalty values a foul can award.
    pub const FOUL_POINTS: [i32; 4] = [4, 5, 6, 7];
}
