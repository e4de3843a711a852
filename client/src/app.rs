//! Per-tick glue between input, the screen machine, the session and audio
//!
//! [`App::step`] never waits on the network: connect attempts run as tasks on
//! the tokio runtime and report back over a oneshot that is polled each tick,
//! and snapshots are read from the latest-wins cell.

use crate::audio::{CuePlayer, CueTracker};
use crate::config::ClientConfig;
use crate::input::{ControlSource, InputDispatcher};
use crate::network::{connect_with_retry, ConnectFailure, Session};
use crate::screen::{Effect, PlayPhase, Screen, ScreenEvent, ScreenMachine, UiEvent};
use log::{debug, info};
use shared::Snapshot;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

struct PendingConnect {
    result: oneshot::Receiver<Result<Session, ConnectFailure>>,
    task: JoinHandle<()>,
}

pub struct App {
    config: ClientConfig,
    runtime: Handle,
    machine: ScreenMachine,
    session: Option<Session>,
    pending: Option<PendingConnect>,
    dispatcher: InputDispatcher,
    cues: CueTracker,
    audio: Box<dyn CuePlayer>,
    running: bool,
}

impl App {
    pub fn new(config: ClientConfig, runtime: Handle, audio: Box<dyn CuePlayer>) -> Self {
        Self {
            config,
            runtime,
            machine: ScreenMachine::new(),
            session: None,
            pending: None,
            dispatcher: InputDispatcher::new(),
            cues: CueTracker::new(),
            audio,
            running: true,
        }
    }

    /// Advances one tick. Returns `false` once the client should exit.
    pub fn step<C>(&mut self, events: Vec<UiEvent>, controls: &mut C) -> bool
    where
        C: ControlSource + ?Sized,
    {
        self.poll_connect();

        for event in events {
            let latest = self.latest();
            let effects = self.machine.handle(ScreenEvent::Ui(event), latest.as_deref());
            self.apply(effects);
        }

        let latest = self.latest();
        if let Some(phase) = self.machine.phase(latest.as_deref()) {
            let event = latest.as_deref().and_then(|s| s.sound_event.as_deref());
            if let Some(cue) = self.cues.observe(event) {
                if phase.plays_sound_events() {
                    self.audio.play(cue);
                }
            }

            if phase == PlayPhase::Active {
                self.dispatch_intent(controls);
            }
        }

        self.running
    }

    pub fn screen(&self) -> Screen {
        self.machine.screen()
    }

    pub fn machine(&self) -> &ScreenMachine {
        &self.machine
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.session.as_ref().and_then(Session::latest)
    }

    pub fn phase(&self) -> Option<PlayPhase> {
        self.machine.phase(self.latest().as_deref())
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn tokens_sent(&self) -> u64 {
        self.dispatcher.tokens_sent()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Closes any live session and stops pending connects.
    pub fn shutdown(&mut self) {
        self.apply(vec![Effect::CancelConnect, Effect::CloseSession]);
    }

    fn dispatch_intent<C>(&mut self, controls: &mut C)
    where
        C: ControlSource + ?Sized,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_outbound_open() {
            return;
        }
        if let Err(e) = self.dispatcher.tick(controls, session) {
            // The receive path publishes the disconnect snapshot on its way out.
            debug!("Intent not sent: {}", e);
        }
    }

    fn poll_connect(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        let outcome = match pending.result.try_recv() {
            Err(TryRecvError::Empty) => return,
            other => other,
        };
        self.pending = None;

        let event = match outcome {
            Ok(Ok(session)) => {
                let local_id = session.local_id();
                self.session = Some(session);
                self.cues.reset();
                ScreenEvent::Connected { local_id }
            }
            Ok(Err(failure)) => ScreenEvent::ConnectFailed(failure.to_string()),
            Err(_) => ScreenEvent::ConnectFailed("connect task ended unexpectedly".to_string()),
        };

        let effects = self.machine.handle(event, None);
        self.apply(effects);

        if self.machine.screen() != Screen::Playing {
            if let Some(mut stale) = self.session.take() {
                stale.close();
            }
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Connect(identity) => {
                    if let Some(previous) = self.pending.take() {
                        previous.task.abort();
                    }
                    info!(
                        "Joining {} as {:?}",
                        self.config.server, identity.display_name
                    );

                    let (tx, rx) = oneshot::channel();
                    let config = self.config.clone();
                    let task = self.runtime.spawn(async move {
                        let result = connect_with_retry(&config, &identity).await;
                        // A cancelled attempt drops the session here, closing it.
                        let _ = tx.send(result);
                    });
                    self.pending = Some(PendingConnect { result: rx, task });
                }
                Effect::CancelConnect => {
                    if let Some(pending) = self.pending.take() {
                        info!("Connect attempt cancelled");
                        pending.task.abort();
                    }
                }
                Effect::CloseSession => {
                    if let Some(mut session) = self.session.take() {
                        session.close();
                    }
                    self.cues.reset();
                }
                Effect::Cue(cue) => self.audio.play(cue),
                Effect::Quit => {
                    if self.running {
                        info!("Exiting");
                    }
                    self.running = false;
                }
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
