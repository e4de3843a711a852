//! Screen state machine
//!
//! [`ScreenMachine`] is pure: it consumes [`ScreenEvent`]s and returns
//! [`Effect`]s for the tick loop to carry out. It never touches the network,
//! the window or the audio device, so every transition is testable in
//! isolation.
//!
//! The in-game phase is not stored. [`play_phase`] derives it from the latest
//! snapshot on every tick.

use crate::audio::SoundCue;
use shared::skins::{self, SkinKind};
use shared::{PlayerIdentity, Snapshot, DISCONNECT_WINNER};

pub const MAX_NAME_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Settings,
    Shop,
    Connecting,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayPhase {
    /// Connected, no snapshot received yet.
    Waiting,
    Countdown(i32),
    Active,
    Terminal(Outcome),
}

impl PlayPhase {
    /// Whether simulator sound events are audible in this phase.
    ///
    /// The final snapshot of a decided match still carries its `score` cue.
    pub fn plays_sound_events(self) -> bool {
        matches!(
            self,
            PlayPhase::Active | PlayPhase::Terminal(Outcome::Won | Outcome::Lost)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    Settings,
    Shop,
    Exit,
}

/// Local UI input, already mapped from raw keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Menu(MenuAction),
    Back,
    Confirm,
    Restart,
    TypeChar(char),
    Backspace,
    CycleSkin { kind: SkinKind, step: isize },
    SwitchTab(SkinKind),
    Highlight(isize),
    /// Window closed.
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    Ui(UiEvent),
    Connected { local_id: i32 },
    ConnectFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Connect(PlayerIdentity),
    CancelConnect,
    CloseSession,
    Cue(SoundCue),
    Quit,
}

/// Derives the in-game phase from the latest snapshot.
pub fn play_phase(latest: Option<&Snapshot>, local_id: i32) -> PlayPhase {
    let Some(snapshot) = latest else {
        return PlayPhase::Waiting;
    };

    match (snapshot.active_countdown(), snapshot.winner) {
        (Some(count), _) => PlayPhase::Countdown(count),
        (_, Some(DISCONNECT_WINNER)) => PlayPhase::Terminal(Outcome::Disconnected),
        (_, Some(winner)) if winner == local_id => PlayPhase::Terminal(Outcome::Won),
        (_, Some(_)) => PlayPhase::Terminal(Outcome::Lost),
        (_, None) => PlayPhase::Active,
    }
}

/// Name and skins being edited on the settings screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub name: String,
    pub ball_skin: &'static str,
    pub paddle_skin: &'static str,
}

impl SettingsForm {
    fn from_identity(identity: &PlayerIdentity) -> Self {
        Self {
            name: identity.display_name.clone(),
            ball_skin: skins::cycle(SkinKind::Ball, &identity.ball_skin_id, 0).id,
            paddle_skin: skins::cycle(SkinKind::Paddle, &identity.paddle_skin_id, 0).id,
        }
    }

    fn apply_to(&self, identity: &mut PlayerIdentity) {
        identity.display_name = self.name.trim().to_string();
        identity.ball_skin_id = self.ball_skin.to_string();
        identity.paddle_skin_id = self.paddle_skin.to_string();
    }
}

/// Tab and highlighted skins on the shop screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopView {
    pub tab: SkinKind,
    pub ball_skin: &'static str,
    pub paddle_skin: &'static str,
}

impl ShopView {
    pub fn highlighted(&self) -> &'static str {
        match self.tab {
            SkinKind::Ball => self.ball_skin,
            SkinKind::Paddle => self.paddle_skin,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenMachine {
    screen: Screen,
    identity: PlayerIdentity,
    settings: SettingsForm,
    shop: ShopView,
    local_id: Option<i32>,
    last_error: Option<String>,
}

impl ScreenMachine {
    pub fn new() -> Self {
        let identity = PlayerIdentity::new("");
        Self {
            screen: Screen::Menu,
            settings: SettingsForm::from_identity(&identity),
            shop: ShopView {
                tab: SkinKind::Ball,
                ball_skin: skins::DEFAULT_BALL_SKIN,
                paddle_skin: skins::DEFAULT_PADDLE_SKIN,
            },
            identity,
            local_id: None,
            last_error: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Identity draft that the next connect will send.
    pub fn identity(&self) -> &PlayerIdentity {
        &self.identity
    }

    pub fn settings(&self) -> &SettingsForm {
        &self.settings
    }

    pub fn shop(&self) -> &ShopView {
        &self.shop
    }

    pub fn local_id(&self) -> Option<i32> {
        self.local_id
    }

    /// Reason of the last failed connect, shown on the settings screen.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The in-game phase, or `None` outside the playing screen.
    pub fn phase(&self, latest: Option<&Snapshot>) -> Option<PlayPhase> {
        match (self.screen, self.local_id) {
            (Screen::Playing, Some(local_id)) => Some(play_phase(latest, local_id)),
            _ => None,
        }
    }

    pub fn handle(&mut self, event: ScreenEvent, latest: Option<&Snapshot>) -> Vec<Effect> {
        use ScreenEvent::{ConnectFailed, Connected, Ui};

        let click = Effect::Cue(SoundCue::MenuClick);

        match (self.screen, event) {
            (Screen::Connecting | Screen::Playing, Ui(UiEvent::Quit)) => {
                vec![Effect::CancelConnect, Effect::CloseSession, Effect::Quit]
            }
            (_, Ui(UiEvent::Quit)) => vec![Effect::Quit],

            (Screen::Menu, Ui(UiEvent::Menu(MenuAction::Play | MenuAction::Settings))) => {
                self.enter_settings();
                vec![click]
            }
            (Screen::Menu, Ui(UiEvent::Menu(MenuAction::Shop))) => {
                self.enter_shop();
                vec![click]
            }
            (Screen::Menu, Ui(UiEvent::Menu(MenuAction::Exit))) => vec![Effect::Quit],
            (Screen::Menu, _) => vec![],

            (Screen::Settings, Ui(UiEvent::Back)) => {
                self.settings.apply_to(&mut self.identity);
                self.screen = Screen::Menu;
                vec![click]
            }
            (Screen::Settings, Ui(UiEvent::Confirm)) => {
                if self.settings.name.trim().is_empty() {
                    self.last_error = Some("Enter a name first".to_string());
                    return vec![];
                }
                self.settings.apply_to(&mut self.identity);
                self.last_error = None;
                self.screen = Screen::Connecting;
                vec![click, Effect::Connect(self.identity.clone())]
            }
            (Screen::Settings, Ui(UiEvent::TypeChar(c))) => {
                if !c.is_control() && self.settings.name.chars().count() < MAX_NAME_LEN {
                    self.settings.name.push(c);
                }
                vec![]
            }
            (Screen::Settings, Ui(UiEvent::Backspace)) => {
                self.settings.name.pop();
                vec![]
            }
            (Screen::Settings, Ui(UiEvent::CycleSkin { kind, step })) => {
                match kind {
                    SkinKind::Ball => {
                        self.settings.ball_skin = skins::cycle(kind, self.settings.ball_skin, step).id
                    }
                    SkinKind::Paddle => {
                        self.settings.paddle_skin =
                            skins::cycle(kind, self.settings.paddle_skin, step).id
                    }
                }
                vec![]
            }
            (Screen::Settings, _) => vec![],

            (Screen::Shop, Ui(UiEvent::Back)) => {
                self.identity.ball_skin_id = self.shop.ball_skin.to_string();
                self.identity.paddle_skin_id = self.shop.paddle_skin.to_string();
                self.screen = Screen::Menu;
                vec![click]
            }
            (Screen::Shop, Ui(UiEvent::SwitchTab(tab))) => {
                self.shop.tab = tab;
                vec![]
            }
            (Screen::Shop, Ui(UiEvent::Highlight(step))) => {
                let next = skins::cycle(self.shop.tab, self.shop.highlighted(), step).id;
                match self.shop.tab {
                    SkinKind::Ball => self.shop.ball_skin = next,
                    SkinKind::Paddle => self.shop.paddle_skin = next,
                }
                vec![]
            }
            (Screen::Shop, _) => vec![],

            (Screen::Connecting, Connected { local_id }) => {
                self.local_id = Some(local_id);
                self.screen = Screen::Playing;
                vec![click]
            }
            (Screen::Connecting, ConnectFailed(reason)) => {
                self.last_error = Some(reason);
                self.screen = Screen::Settings;
                vec![]
            }
            (Screen::Connecting, Ui(UiEvent::Back)) => {
                self.screen = Screen::Settings;
                vec![Effect::CancelConnect, click]
            }
            (Screen::Connecting, _) => vec![],

            (Screen::Playing, Ui(UiEvent::Restart)) => {
                match self.phase(latest) {
                    Some(PlayPhase::Terminal(_)) => {
                        self.local_id = None;
                        self.screen = Screen::Menu;
                        vec![Effect::CloseSession, click]
                    }
                    _ => vec![],
                }
            }
            (Screen::Playing, _) => vec![],
        }
    }

    fn enter_settings(&mut self) {
        self.settings = SettingsForm::from_identity(&self.identity);
        self.screen = Screen::Settings;
    }

    fn enter_shop(&mut self) {
        self.shop.ball_skin = skins::cycle(SkinKind::Ball, &self.identity.ball_skin_id, 0).id;
        self.shop.paddle_skin = skins::cycle(SkinKind::Paddle, &self.identity.paddle_skin_id, 0).id;
        self.screen = Screen::Shop;
    }
}

impl Default for ScreenMachine {
    fn default() -> Self {
        Self::new()
    }
}
