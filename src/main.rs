//! Main module for the snooker score counter using Yew.
//! Wires UI components, the session state and cosmetic side effects.

use gloo_timers::future::TimeoutFuture;
use log::{debug, info, warn};
use snooker_score::{
    KeyValueStore, LedgerChange, LocalStore, MemoryStore, Phase, RedBallCount, Session, Undo,
    Variant,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use yew::prelude::*;

mod components;
mod config;
mod console_log;
mod hooks;
mod utils;

use components::{CharacterGrid, Controls, CountPicker, PlayerPanel, SettingsBar};
use config::*;
use hooks::{use_attention_cue, use_window_event, AttentionCue};
use utils::{shortcut_for, Shortcut};

type SharedSession = Rc<RefCell<Session>>;

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// Local storage if the browser allows it, otherwise an in-memory store that
/// lasts for this tab only.
fn open_store() -> Rc<dyn KeyValueStore> {
    match LocalStore::open() {
        Ok(store) => Rc::new(store),
        Err(e) => {
            warn!("{}; scores will not survive a reload", e);
            Rc::new(MemoryStore::new())
        }
    }
}

fn current_variant() -> Variant {
    let search = gloo_utils::window().location().search().unwrap_or_default();
    Variant::from_query(&search)
}

/// Shake the undo button; on success also pulse the restored score.
fn handle_undo(
    session: &SharedSession,
    undo_cue: &AttentionCue,
    pulse_cue: &AttentionCue,
    pulsed_slot: &UseStateHandle<Option<usize>>,
) {
    let outcome = session.borrow_mut().undo();
    match outcome {
        Undo::Undone { slot, .. } => {
            pulsed_slot.set(Some(slot));
            pulse_cue.trigger.emit(());
        }
        Undo::NothingToUndo => debug!("Nothing to undo"),
    }
    undo_cue.trigger.emit(());
}

/// Fade the board out, reset it, then fade back in. The reset itself is
/// synchronous; the timers only sequence the animation.
fn run_new_match(session: SharedSession, fading: UseStateHandle<bool>, refresh: UseForceUpdateHandle) {
    wasm_bindgen_futures::spawn_local(async move {
        fading.set(true);
        TimeoutFuture::new(FADE_MS).await;
        session.borrow_mut().full_reset();
        refresh.force_update();
        TimeoutFuture::new(FADE_MS).await;
        fading.set(false);
    });
}

// ──────────────────────────────────────────────────────────────────────────────

/// Primary application component wiring session state, effects and UI elements.
#[function_component(Main)]
fn main_component() -> Html {
    let session: SharedSession = use_mut_ref(|| Session::start(current_variant(), open_store()));
    let refresh = use_force_update();
    let fading = use_state(|| false);
    let roster_cue = use_attention_cue(SHAKE_MS);
    let undo_cue = use_attention_cue(SHAKE_MS);
    let pulse_cue = use_attention_cue(PULSE_MS);
    let pulsed_slot = use_state(|| None::<usize>);

    // --- Roster callbacks ---
    let on_choose_count = {
        let session = session.clone();
        let refresh = refresh.clone();
        let roster_cue = roster_cue.clone();
        Callback::from(move |n: usize| {
            if session.borrow_mut().choose_player_count(n) {
                refresh.force_update();
            } else {
                roster_cue.trigger.emit(());
            }
        })
    };

    let on_toggle = {
        let session = session.clone();
        let refresh = refresh.clone();
        let roster_cue = roster_cue.clone();
        Callback::from(move |id: u32| {
            let outcome = {
                let mut session = session.borrow_mut();
                if session.roster().is_selected(id) {
                    session.deselect_character(id);
                    None
                } else {
                    Some(session.select_character(id))
                }
            };
            match outcome {
                Some(outcome) if !outcome.is_accepted() => {
                    debug!("Pick of character {} rejected: {:?}", id, outcome);
                    roster_cue.trigger.emit(());
                }
                _ => refresh.force_update(),
            }
        })
    };

    let on_confirm = {
        let session = session.clone();
        let refresh = refresh.clone();
        let roster_cue = roster_cue.clone();
        Callback::from(move |_: ()| {
            let result = session.borrow_mut().confirm_roster().map(|ledger| ledger.player_count());
            match result {
                Ok(players) => {
                    info!("Match started with {} players", players);
                    refresh.force_update();
                }
                Err(e) => {
                    debug!("{}", e);
                    roster_cue.trigger.emit(());
                }
            }
        })
    };

    let on_change_players = {
        let session = session.clone();
        let refresh = refresh.clone();
        Callback::from(move |_: ()| {
            session.borrow_mut().change_players();
            refresh.force_update();
        })
    };

    // --- Scoring callbacks ---
    let on_score = {
        let session = session.clone();
        let refresh = refresh.clone();
        let pulse_cue = pulse_cue.clone();
        let pulsed_slot = pulsed_slot.clone();
        Callback::from(move |(slot, delta): (usize, i32)| {
            let change = session.borrow_mut().add_score(slot, delta);
            match change {
                Ok(LedgerChange::Scored { slot, .. }) => {
                    pulsed_slot.set(Some(slot));
                    pulse_cue.trigger.emit(());
                    refresh.force_update();
                }
                Ok(_) => refresh.force_update(),
                Err(e) => warn!("{}", e),
            }
        })
    };

    let on_undo = {
        let session = session.clone();
        let refresh = refresh.clone();
        let undo_cue = undo_cue.clone();
        let pulse_cue = pulse_cue.clone();
        let pulsed_slot = pulsed_slot.clone();
        Callback::from(move |_: ()| {
            handle_undo(&session, &undo_cue, &pulse_cue, &pulsed_slot);
            refresh.force_update();
        })
    };

    let on_name = {
        let session = session.clone();
        let refresh = refresh.clone();
        Callback::from(move |(slot, name): (usize, String)| {
            if let Err(e) = session.borrow_mut().set_name(slot, &name) {
                warn!("{}", e);
            }
            refresh.force_update();
        })
    };

    let on_reds = {
        let session = session.clone();
        let refresh = refresh.clone();
        Callback::from(move |reds: RedBallCount| {
            session.borrow_mut().set_reds(reds);
            refresh.force_update();
        })
    };

    let on_respot = {
        let session = session.clone();
        let refresh = refresh.clone();
        Callback::from(move |respot: bool| {
            session.borrow_mut().set_respot(respot);
            refresh.force_update();
        })
    };

    let on_reset_scores = {
        let session = session.clone();
        let refresh = refresh.clone();
        Callback::from(move |_: ()| {
            session.borrow_mut().reset_scores_only();
            refresh.force_update();
        })
    };

    let on_new_match = {
        let session = session.clone();
        let fading = fading.clone();
        let refresh = refresh.clone();
        Callback::from(move |_: ()| {
            run_new_match(session.clone(), fading.clone(), refresh.clone());
        })
    };

    // --- Global keyboard shortcuts: Ctrl/Cmd+Z undo, Ctrl/Cmd+R reset ---
    {
        let session = session.clone();
        let refresh = refresh.clone();
        let undo_cue = undo_cue.clone();
        let pulse_cue = pulse_cue.clone();
        let pulsed_slot = pulsed_slot.clone();
        let fading = fading.clone();
        use_window_event(
            "keydown",
            Callback::from(move |e: web_sys::Event| {
                let Some(key) = e.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let Some(shortcut) = shortcut_for(&key.key(), key.ctrl_key(), key.meta_key()) else {
                    return;
                };
                if session.borrow().phase() != Phase::Scoring {
                    return;
                }
                e.prevent_default();
                match shortcut {
                    Shortcut::Undo => {
                        handle_undo(&session, &undo_cue, &pulse_cue, &pulsed_slot);
                        refresh.force_update();
                    }
                    Shortcut::Reset => {
                        let confirmed = gloo_utils::window()
                            .confirm_with_message(RESET_PROMPT)
                            .unwrap_or(false);
                        if confirmed {
                            run_new_match(session.clone(), fading.clone(), refresh.clone());
                        }
                    }
                }
            }),
        );
    }

    // --- Warn before leaving while there is something to undo ---
    {
        let session = session.clone();
        use_window_event(
            "beforeunload",
            Callback::from(move |e: web_sys::Event| {
                if session.borrow().has_history() {
                    e.prevent_default();
                    if let Some(unload) = e.dyn_ref::<web_sys::BeforeUnloadEvent>() {
                        unload.set_return_value("");
                    }
                }
            }),
        );
    }

    let session_ref = session.borrow();
    let body = match session_ref.phase() {
        Phase::ChoosingCount => html! {
            <CountPicker
                counts={session_ref.variant().player_counts().collect::<Vec<_>>()}
                on_choose={on_choose_count}
            />
        },
        Phase::Selecting => {
            let roster = session_ref.roster();
            let on_back = (session_ref.variant() == Variant::Multiplayer).then(|| on_change_players.clone());
            html! {
                <CharacterGrid
                    characters={roster.catalog().to_vec()}
                    selected={roster.selection().iter().map(|r| r.id).collect::<Vec<_>>()}
                    required={roster.player_count().unwrap_or_default()}
                    shake={roster_cue.active}
                    {on_toggle}
                    {on_confirm}
                    {on_back}
                />
            }
        }
        Phase::Scoring => match session_ref.ledger() {
            Some(ledger) => html! {
                <>
                    <SettingsBar settings={ledger.settings()} {on_reds} {on_respot} />
                    <div class={classes!("players", format!("players-{}", ledger.player_count()))}>
                        { ledger.roster().iter().enumerate().map(|(slot, record)| html! {
                            <PlayerPanel
                                key={record.id}
                                {slot}
                                record={record.clone()}
                                name={ledger.names().get(slot).cloned().unwrap_or_default()}
                                score={ledger.score(slot).unwrap_or_default()}
                                pulse={pulse_cue.active && *pulsed_slot == Some(slot)}
                                on_score={on_score.clone()}
                                on_name={on_name.clone()}
                            />
                        }).collect::<Html>() }
                    </div>
                    <Controls
                        undo_shake={undo_cue.active}
                        {on_undo}
                        {on_reset_scores}
                        {on_new_match}
                        {on_change_players}
                    />
                </>
            },
            None => html! {},
        },
    };

    html! {
        <div class={classes!("container", (*fading).then_some("reset-animation"))}>
            <h1>{ "Snooker Score Counter" }</h1>
            { body }
        </div>
    }
}

/// Entry point: installs logging and the panic hook, then renders the app.
fn main() {
    console_error_panic_hook::set_once();
    console_log::init(LOG_LEVEL);
    yew::Renderer::<Main>::new().render();
}
