use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use yew::prelude::*;

/// A CSS class that switches itself off again after a fixed time.
#[derive(Clone)]
pub struct AttentionCue {
    /// Whether the cue class should currently be applied.
    pub active: bool,
    /// Turn the cue on, restarting the countdown if it is already running.
    pub trigger: Callback<()>,
}

/// Custom hook for short cosmetic animations (shake, pulse).
#[hook]
pub fn use_attention_cue(duration_ms: u32) -> AttentionCue {
    let active = use_state(|| false);
    // Replacing the handle drops (and thereby cancels) the previous timer.
    let timer = use_mut_ref(|| None::<Timeout>);

    let trigger = {
        let active = active.clone();
        Callback::from(move |_: ()| {
            active.set(true);
            let active_off = active.clone();
            *timer.borrow_mut() = Some(Timeout::new(duration_ms, move || {
                active_off.set(false);
            }));
        })
    };

    AttentionCue {
        active: *active,
        trigger,
    }
}

/// Subscribe `callback` to a `window` event for the lifetime of the component.
///
/// The callback is captured on mount; give it only handles that stay valid
/// across renders (state handles, shared refs).
#[hook]
pub fn use_window_event(event: &'static str, callback: Callback<web_sys::Event>) {
    use_effect_with((), move |_| {
        let listener =
            Closure::<dyn Fn(web_sys::Event)>::new(move |e: web_sys::Event| callback.emit(e));
        let window = gloo_utils::window();
        if let Err(e) =
            window.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
        {
            log::warn!("Could not listen for '{}': {:?}", event, e);
        }

        move || {
            if let Err(e) = window
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            {
                log::warn!("Could not stop listening for '{}': {:?}", event, e);
            }
        }
    });
}
