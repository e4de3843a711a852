//! Keyboard sampling and per-tick intent dispatch

use crate::network::LinkClosed;
use crate::screen::{MenuAction, Screen, UiEvent};
use log::debug;
use macroquad::prelude::*;
use shared::skins::SkinKind;
use shared::Intent;

/// Carries intents to the simulator.
///
/// The session implements the level-triggered wire form; an edge-triggered
/// transport only has to implement this trait.
pub trait IntentTransport {
    fn dispatch(&mut self, intent: Intent) -> Result<(), LinkClosed>;
}

/// Source of the local directional control, sampled once per tick.
pub trait ControlSource {
    fn sample(&mut self) -> Intent;
}

/// W/S or the arrow keys.
#[derive(Debug, Default)]
pub struct KeyboardControls;

impl ControlSource for KeyboardControls {
    fn sample(&mut self) -> Intent {
        let up = is_key_down(KeyCode::W) || is_key_down(KeyCode::Up);
        let down = is_key_down(KeyCode::S) || is_key_down(KeyCode::Down);
        Intent::from_controls(up, down)
    }
}

/// Forwards the sampled intent every tick the game is active.
#[derive(Debug, Default)]
pub struct InputDispatcher {
    tokens_sent: u64,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick<C, T>(&mut self, controls: &mut C, transport: &mut T) -> Result<Intent, LinkClosed>
    where
        C: ControlSource + ?Sized,
        T: IntentTransport + ?Sized,
    {
        let intent = controls.sample();
        transport.dispatch(intent)?;
        if intent != Intent::None {
            self.tokens_sent += 1;
        }
        Ok(intent)
    }

    pub fn tokens_sent(&self) -> u64 {
        self.tokens_sent
    }
}

/// Maps key presses to screen events for the active screen.
pub struct InputManager {
    // Previous frame key states for edge detection
    prev_enter: bool,
    prev_escape: bool,
    prev_backspace: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            prev_enter: false,
            prev_escape: false,
            prev_backspace: false,
        }
    }

    pub fn poll(&mut self, screen: Screen) -> Vec<UiEvent> {
        let mut events = Vec::new();

        if is_quit_requested() {
            events.push(UiEvent::Quit);
        }

        let enter = is_key_down(KeyCode::Enter) || is_key_down(KeyCode::KpEnter);
        let escape = is_key_down(KeyCode::Escape);
        let backspace = is_key_down(KeyCode::Backspace);

        let enter_pressed = enter && !self.prev_enter;
        let escape_pressed = escape && !self.prev_escape;
        let backspace_pressed = backspace && !self.prev_backspace;

        self.prev_enter = enter;
        self.prev_escape = escape;
        self.prev_backspace = backspace;

        // Drain typed characters every frame so they never pile up between screens.
        let mut typed = Vec::new();
        while let Some(c) = get_char_pressed() {
            typed.push(c);
        }

        match screen {
            Screen::Menu => {
                if enter_pressed || is_key_pressed(KeyCode::P) {
                    events.push(UiEvent::Menu(MenuAction::Play));
                } else if is_key_pressed(KeyCode::S) {
                    events.push(UiEvent::Menu(MenuAction::Settings));
                } else if is_key_pressed(KeyCode::H) {
                    events.push(UiEvent::Menu(MenuAction::Shop));
                } else if escape_pressed || is_key_pressed(KeyCode::Q) {
                    events.push(UiEvent::Menu(MenuAction::Exit));
                }
            }
            Screen::Settings => {
                events.extend(
                    typed
                        .into_iter()
                        .filter(|c| !c.is_control())
                        .map(UiEvent::TypeChar),
                );
                if backspace_pressed {
                    events.push(UiEvent::Backspace);
                }
                if is_key_pressed(KeyCode::Left) {
                    events.push(cycle(SkinKind::Ball, -1));
                }
                if is_key_pressed(KeyCode::Right) {
                    events.push(cycle(SkinKind::Ball, 1));
                }
                if is_key_pressed(KeyCode::Up) {
                    events.push(cycle(SkinKind::Paddle, -1));
                }
                if is_key_pressed(KeyCode::Down) {
                    events.push(cycle(SkinKind::Paddle, 1));
                }
                if enter_pressed {
                    events.push(UiEvent::Confirm);
                } else if escape_pressed {
                    events.push(UiEvent::Back);
                }
            }
            Screen::Shop => {
                if is_key_pressed(KeyCode::Key1) {
                    events.push(UiEvent::SwitchTab(SkinKind::Ball));
                }
                if is_key_pressed(KeyCode::Key2) {
                    events.push(UiEvent::SwitchTab(SkinKind::Paddle));
                }
                if is_key_pressed(KeyCode::Left) {
                    events.push(UiEvent::Highlight(-1));
                }
                if is_key_pressed(KeyCode::Right) {
                    events.push(UiEvent::Highlight(1));
                }
                if escape_pressed || enter_pressed {
                    events.push(UiEvent::Back);
                }
            }
            Screen::Connecting => {
                if escape_pressed {
                    events.push(UiEvent::Back);
                }
            }
            Screen::Playing => {
                if is_key_pressed(KeyCode::K) {
                    events.push(UiEvent::Restart);
                }
            }
        }

        if !events.is_empty() {
            debug!("UI events on {:?}: {:?}", screen, events);
        }
        events
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

fn cycle(kind: SkinKind, step: isize) -> UiEvent {
    UiEvent::CycleSkin { kind, step }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Held(Intent);

    impl ControlSource for Held {
        fn sample(&mut self) -> Intent {
            self.0
        }
    }

    #[derive(Default)]
    struct Recorder {
        wire: Vec<u8>,
        closed: bool,
    }

    impl IntentTransport for Recorder {
        fn dispatch(&mut self, intent: Intent) -> Result<(), LinkClosed> {
            if self.closed {
                return Err(LinkClosed);
            }
            if let Some(token) = intent.token() {
                self.wire.extend_from_slice(token);
            }
            Ok(())
        }
    }

    #[test]
    fn test_held_up_sends_every_tick() {
        let mut dispatcher = InputDispatcher::new();
        let mut controls = Held(Intent::MoveUp);
        let mut transport = Recorder::default();

        for _ in 0..5 {
            dispatcher.tick(&mut controls, &mut transport).unwrap();
        }

        assert_eq!(transport.wire, b"UPUPUPUPUP");
        assert_eq!(dispatcher.tokens_sent(), 5);
    }

    #[test]
    fn test_neutral_sends_nothing() {
        let mut dispatcher = InputDispatcher::new();
        let mut transport = Recorder::default();

        for _ in 0..3 {
            let intent = dispatcher.tick(&mut Held(Intent::None), &mut transport).unwrap();
            assert_eq!(intent, Intent::None);
        }

        assert!(transport.wire.is_empty());
        assert_eq!(dispatcher.tokens_sent(), 0);
    }

    #[test]
    fn test_closed_transport_reports_link_loss() {
        let mut dispatcher = InputDispatcher::new();
        let mut transport = Recorder {
            closed: true,
            ..Recorder::default()
        };

        let result = dispatcher.tick(&mut Held(Intent::MoveDown), &mut transport);
        assert_eq!(result, Err(LinkClosed));
        assert_eq!(dispatcher.tokens_sent(), 0);
    }
}
