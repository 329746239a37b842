//! Pure Yew view components for the scoreboard UI.
//!
//! Components only render props and emit callbacks; all state lives in the
//! [`snooker_score::Session`] owned by the app component.

use crate::utils::{format_delta, parse_reds, score_class};
use snooker_score::defaults::{BALLS, FOUL_POINTS};
use snooker_score::{CharacterRecord, RedBallCount, Settings};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// Buttons for choosing how many players take part.
#[derive(Properties, PartialEq)]
pub struct CountPickerProps {
    pub counts: Vec<usize>,
    pub on_choose: Callback<usize>,
}

#[function_component(CountPicker)]
pub fn count_picker(props: &CountPickerProps) -> Html {
    html! {
        <div class="count-picker">
            <h2>{ "How many players?" }</h2>
            <div class="count-buttons">
                { props.counts.iter().map(|&n| {
                    let on_choose = props.on_choose.clone();
                    html! {
                        <button class="count-btn" onclick={Callback::from(move |_| on_choose.emit(n))}>
                            { n }
                        </button>
                    }
                }).collect::<Html>() }
            </div>
        </div>
    }
}

/// Character grid used while building the roster.
#[derive(Properties, PartialEq)]
pub struct CharacterGridProps {
    pub characters: Vec<CharacterRecord>,
    /// Ids in pick order.
    pub selected: Vec<u32>,
    pub required: usize,
    pub shake: bool,
    pub on_toggle: Callback<u32>,
    pub on_confirm: Callback<()>,
    /// Present when the player count may be chosen again.
    #[prop_or_default]
    pub on_back: Option<Callback<()>>,
}

#[function_component(CharacterGrid)]
pub fn character_grid(props: &CharacterGridProps) -> Html {
    let complete = props.selected.len() == props.required;
    let on_confirm = props.on_confirm.reform(|_: MouseEvent| ());

    html! {
        <div class="roster-picker">
            <h2>{ format!("Choose {} players ({}/{})", props.required, props.selected.len(), props.required) }</h2>
            <div class={classes!("character-grid", props.shake.then_some("shake"))}>
                { props.characters.iter().map(|record| {
                    let order = props.selected.iter().position(|&id| id == record.id);
                    render_character_card(record, order, props.on_toggle.clone())
                }).collect::<Html>() }
            </div>
            <div class="roster-actions">
                if let Some(on_back) = &props.on_back {
                    <button class="btn-secondary" onclick={on_back.reform(|_: MouseEvent| ())}>
                        { "Back" }
                    </button>
                }
                <button class="btn-primary" disabled={!complete} onclick={on_confirm}>
                    { "Start Match" }
                </button>
            </div>
        </div>
    }
}

/// One portrait tile; `order` is the 0-based pick position if selected.
fn render_character_card(
    record: &CharacterRecord,
    order: Option<usize>,
    on_toggle: Callback<u32>,
) -> Html {
    let id = record.id;
    html! {
        <button
            class={classes!("character-card", record.color.clone(), order.map(|_| "selected"))}
            onclick={Callback::from(move |_| on_toggle.emit(id))}
        >
            <div class="portrait" style={record.portrait_style()}></div>
            <span class="character-name">{ record.name.clone() }</span>
            if let Some(order) = order {
                <span class="pick-order">{ order + 1 }</span>
            }
        </button>
    }
}

/// Score panel for one slot.
#[derive(Properties, PartialEq)]
pub struct PlayerPanelProps {
    pub slot: usize,
    pub record: CharacterRecord,
    /// Raw override text; empty shows the character's name as placeholder.
    pub name: String,
    pub score: i32,
    pub pulse: bool,
    pub on_score: Callback<(usize, i32)>,
    pub on_name: Callback<(usize, String)>,
}

#[function_component(PlayerPanel)]
pub fn player_panel(props: &PlayerPanelProps) -> Html {
    let slot = props.slot;
    let oninput = {
        let on_name = props.on_name.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_name.emit((slot, input.value()));
        })
    };
    let score_button = |class: &'static str, delta: i32, title: String| {
        let on_score = props.on_score.clone();
        html! {
            <button class={class} title={title} onclick={Callback::from(move |_| on_score.emit((slot, delta)))}>
                { format_delta(delta) }
            </button>
        }
    };

    html! {
        <div class={classes!("player-panel", props.record.color.clone())}>
            <div class="portrait" style={props.record.portrait_style()}></div>
            <input
                type="text"
                class="player-name"
                value={props.name.clone()}
                placeholder={props.record.name.clone()}
                {oninput}
            />
            <div class={classes!(score_class(props.score), props.pulse.then_some("score-update"))}>
                { props.score }
            </div>
            <div class="ball-buttons">
                { BALLS.iter().map(|&(color, value)| {
                    score_button("score-btn", value, color.to_string())
                }).collect::<Html>() }
            </div>
            <div class="foul-buttons">
                { FOUL_POINTS.iter().map(|&value| {
                    score_button("foul-btn", value, format!("Foul {}", value))
                }).collect::<Html>() }
            </div>
        </div>
    }
}

/// Reds select and respot toggle.
#[derive(Properties, PartialEq)]
pub struct SettingsBarProps {
    pub settings: Settings,
    pub on_reds: Callback<RedBallCount>,
    pub on_respot: Callback<bool>,
}

#[function_component(SettingsBar)]
pub fn settings_bar(props: &SettingsBarProps) -> Html {
    let current = props.settings.reds;
    let on_reds = {
        let on_reds = props.on_reds.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            on_reds.emit(parse_reds(&select.value(), current));
        })
    };
    let on_respot = {
        let on_respot = props.on_respot.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_respot.emit(input.checked());
        })
    };

    html! {
        <div class="settings-bar">
            <label>
                { "Reds: " }
                <select id="reds-count" onchange={on_reds}>
                    { RedBallCount::ALL.iter().map(|reds| html! {
                        <option value={reds.to_string()} selected={*reds == current}>
                            { reds.to_string() }
                        </option>
                    }).collect::<Html>() }
                </select>
            </label>
            <label class="checkbox-group">
                <input type="checkbox" id="respot-toggle" checked={props.settings.respot} onchange={on_respot} />
                { "Respot colours" }
            </label>
        </div>
    }
}

/// Undo and the various resets.
#[derive(Properties, PartialEq)]
pub struct ControlsProps {
    pub undo_shake: bool,
    pub on_undo: Callback<()>,
    pub on_reset_scores: Callback<()>,
    pub on_new_match: Callback<()>,
    pub on_change_players: Callback<()>,
}

#[function_component(Controls)]
pub fn controls(props: &ControlsProps) -> Html {
    html! {
        <div class="controls">
            <button id="undo-btn" class={classes!("btn-secondary", props.undo_shake.then_some("shake"))}
                onclick={props.on_undo.reform(|_: MouseEvent| ())}>
                { "Undo" }
            </button>
            <button class="btn-secondary" onclick={props.on_reset_scores.reform(|_: MouseEvent| ())}>
                { "Reset Scores" }
            </button>
            <button id="reset-btn" class="btn-danger" onclick={props.on_new_match.reform(|_: MouseEvent| ())}>
                { "New Match" }
            </button>
            <button class="btn-secondary" onclick={props.on_change_players.reform(|_: MouseEvent| ())}>
                { "Change Players" }
            </button>
        </div>
    }
}
