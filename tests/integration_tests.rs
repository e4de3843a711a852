//! Integration tests for the client against a loopback stand-in simulator
//!
//! These tests drive the real tick loop logic (`App::step`) over real TCP.

use assert_approx_eq::assert_approx_eq;
use client::app::App;
use client::audio::{CuePlayer, SoundCue};
use client::config::{ClientConfig, RetryPolicy};
use client::input::ControlSource;
use client::screen::{MenuAction, Outcome, PlayPhase, Screen, UiEvent};
use shared::{Intent, PREAMBLE_LEN};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::time::{sleep, timeout};

struct Held(Intent);

impl ControlSource for Held {
    fn sample(&mut self) -> Intent {
        self.0
    }
}

#[derive(Clone, Default)]
struct RecordingAudio(Arc<Mutex<Vec<SoundCue>>>);

impl RecordingAudio {
    fn played(&self, cue: SoundCue) -> usize {
        self.0.lock().unwrap().iter().filter(|&&c| c == cue).count()
    }
}

impl CuePlayer for RecordingAudio {
    fn play(&mut self, cue: SoundCue) {
        self.0.lock().unwrap().push(cue);
    }
}

/// The simulator side of one accepted player.
struct FakeSimulator {
    stream: BufReader<TcpStream>,
    identity: serde_json::Value,
}

impl FakeSimulator {
    async fn accept(listener: &TcpListener, player_index: i32) -> Self {
        let (socket, _) = listener.accept().await.unwrap();
        let mut stream = BufReader::new(socket);

        let preamble = format!("{:<width$}", player_index, width = PREAMBLE_LEN);
        stream.get_mut().write_all(preamble.as_bytes()).await.unwrap();

        let mut line = String::new();
        stream.read_line(&mut line).await.unwrap();
        let identity = serde_json::from_str(&line).unwrap();

        Self { stream, identity }
    }

    async fn push(&mut self, json: &str) {
        let socket = self.stream.get_mut();
        socket.write_all(json.as_bytes()).await.unwrap();
        socket.write_all(b"\n").await.unwrap();
    }
}

fn test_config(server: String) -> ClientConfig {
    ClientConfig {
        server,
        connect_timeout: Duration::from_millis(500),
        retry: RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
        },
        ..ClientConfig::default()
    }
}

fn join_events(name: &str) -> Vec<UiEvent> {
    let mut events = vec![UiEvent::Menu(MenuAction::Play)];
    events.extend(name.chars().map(UiEvent::TypeChar));
    events.push(UiEvent::Confirm);
    events
}

/// Ticks the app with neutral input until `done` holds.
async fn tick_until<F: Fn(&App) -> bool>(app: &mut App, done: F) {
    for _ in 0..400 {
        app.step(vec![], &mut Held(Intent::None));
        if done(app) {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("app never reached the expected state");
}

async fn joined_app(audio: RecordingAudio, player_index: i32) -> (App, FakeSimulator) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let mut app = App::new(test_config(addr), Handle::current(), Box::new(audio));
    app.step(join_events("ana"), &mut Held(Intent::None));
    assert_eq!(app.screen(), Screen::Connecting);

    let simulator = FakeSimulator::accept(&listener, player_index).await;
    tick_until(&mut app, |app| app.screen() == Screen::Playing).await;

    (app, simulator)
}

/// CONNECTION LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    /// Handshake assigns the padded index and sends the identity line
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn handshake_assigns_local_identity() {
        let (app, simulator) = joined_app(RecordingAudio::default(), 3).await;

        assert_eq!(app.machine().local_id(), Some(3));
        assert_eq!(app.phase(), Some(PlayPhase::Waiting));
        assert_eq!(simulator.identity["name"], "ana");
        assert_eq!(simulator.identity["ball_skin"], "ball_white");
        assert_eq!(simulator.identity["paddle_skin"], "paddle_magenta");
    }

    /// Refused connections give up after the configured attempts
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refused_connect_returns_to_settings() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let mut app = App::new(
            test_config(addr),
            Handle::current(),
            Box::new(RecordingAudio::default()),
        );
        let started = Instant::now();
        app.step(join_events("ana"), &mut Held(Intent::None));

        tick_until(&mut app, |app| app.screen() == Screen::Settings).await;
        assert!(app.machine().last_error().unwrap().contains("refused"));
        assert!(!app.has_session());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(app.is_running());
    }

    /// A malformed preamble is a connect failure, not a crash
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn malformed_preamble_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                socket.write_all(&[b'?'; PREAMBLE_LEN]).await.unwrap();
            }
        });

        let mut app = App::new(
            test_config(addr),
            Handle::current(),
            Box::new(RecordingAudio::default()),
        );
        app.step(join_events("ana"), &mut Held(Intent::None));

        tick_until(&mut app, |app| app.screen() == Screen::Settings).await;
        assert!(app.machine().last_error().unwrap().contains("preamble"));
    }

    /// Losing the stream mid-game ends on the disconnect screen
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stream_loss_becomes_terminal_disconnect() {
        let (mut app, mut simulator) = joined_app(RecordingAudio::default(), 0).await;

        simulator
            .push(r#"{"paddles":{"0":250,"1":250},"ball":{"x":400,"y":300},"scores":[1,2]}"#)
            .await;
        tick_until(&mut app, |app| app.phase() == Some(PlayPhase::Active)).await;

        drop(simulator);
        tick_until(&mut app, |app| {
            app.phase() == Some(PlayPhase::Terminal(Outcome::Disconnected))
        })
        .await;

        assert!(app.is_running());
        assert_eq!(app.latest().unwrap().scores, (1, 2));
    }

    /// Restart from the end screen tears the session down
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn restart_returns_to_menu() {
        let (mut app, mut simulator) = joined_app(RecordingAudio::default(), 1).await;

        // Ignored while the match is undecided.
        app.step(vec![UiEvent::Restart], &mut Held(Intent::None));
        assert_eq!(app.screen(), Screen::Playing);

        simulator.push(r#"{"scores":[5,3],"winner":1}"#).await;
        tick_until(&mut app, |app| {
            app.phase() == Some(PlayPhase::Terminal(Outcome::Won))
        })
        .await;

        app.step(vec![UiEvent::Restart], &mut Held(Intent::None));
        assert_eq!(app.screen(), Screen::Menu);
        assert!(!app.has_session());
        assert!(app.latest().is_none());

        // The simulator sees the client hang up.
        let mut rest = Vec::new();
        let read = timeout(Duration::from_secs(2), simulator.stream.read_to_end(&mut rest)).await;
        assert!(read.is_ok());
    }
}

/// STATE SYNCHRONIZATION TESTS
mod sync_tests {
    use super::*;

    /// Phases follow the pushed snapshots in arrival order
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn phases_follow_snapshots() {
        let (mut app, mut simulator) = joined_app(RecordingAudio::default(), 0).await;

        simulator.push(r#"{"countdown":3}"#).await;
        tick_until(&mut app, |app| app.phase() == Some(PlayPhase::Countdown(3))).await;

        simulator.push("").await;
        simulator.push("not json at all").await;
        simulator
            .push(r#"{"paddles":{"0":100,"1":200},"ball":{"x":10,"y":20},"scores":[0,0]}"#)
            .await;
        tick_until(&mut app, |app| app.phase() == Some(PlayPhase::Active)).await;

        let latest = app.latest().unwrap();
        assert_approx_eq!(latest.paddle_y(1).unwrap(), 200.0);
        assert_approx_eq!(latest.ball.y, 20.0);

        simulator.push(r#"{"scores":[2,5],"winner":1}"#).await;
        tick_until(&mut app, |app| {
            app.phase() == Some(PlayPhase::Terminal(Outcome::Lost))
        })
        .await;
    }

    /// Holding up for five active ticks puts five tokens on the wire
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn held_direction_sends_token_per_tick() {
        let (mut app, mut simulator) = joined_app(RecordingAudio::default(), 0).await;

        simulator.push(r#"{"scores":[0,0]}"#).await;
        tick_until(&mut app, |app| app.phase() == Some(PlayPhase::Active)).await;

        for _ in 0..5 {
            app.step(vec![], &mut Held(Intent::MoveUp));
        }
        for _ in 0..3 {
            app.step(vec![], &mut Held(Intent::None));
        }
        app.step(vec![], &mut Held(Intent::MoveDown));

        let mut wire = vec![0u8; 14];
        timeout(Duration::from_secs(2), simulator.stream.read_exact(&mut wire))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(wire, b"UPUPUPUPUPDOWN");
        assert_eq!(app.tokens_sent(), 6);
    }

    /// No intent is sent before the match is active
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn no_tokens_during_countdown() {
        let (mut app, mut simulator) = joined_app(RecordingAudio::default(), 0).await;

        simulator.push(r#"{"countdown":2}"#).await;
        tick_until(&mut app, |app| app.phase() == Some(PlayPhase::Countdown(2))).await;

        for _ in 0..5 {
            app.step(vec![], &mut Held(Intent::MoveUp));
        }

        let mut byte = [0u8; 1];
        let read = timeout(Duration::from_millis(100), simulator.stream.read(&mut byte)).await;
        assert!(read.is_err(), "no bytes expected while counting down");
        assert_eq!(app.tokens_sent(), 0);
    }

    /// A repeated sound event plays once; a new occurrence plays again
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sound_event_plays_once_per_occurrence() {
        let audio = RecordingAudio::default();
        let (mut app, mut simulator) = joined_app(audio.clone(), 0).await;

        simulator.push(r#"{"scores":[0,0],"sound_event":"wall_hit"}"#).await;
        tick_until(&mut app, |app| app.phase() == Some(PlayPhase::Active)).await;

        simulator
            .push(r#"{"scores":[0,0],"ball":{"x":5,"y":5},"sound_event":"wall_hit"}"#)
            .await;
        tick_until(&mut app, |app| {
            app.latest().is_some_and(|s| s.ball.x == 5.0)
        })
        .await;
        for _ in 0..5 {
            app.step(vec![], &mut Held(Intent::None));
        }
        assert_eq!(audio.played(SoundCue::WallHit), 1);

        simulator.push(r#"{"scores":[1,0],"sound_event":"score"}"#).await;
        tick_until(&mut app, |app| app.latest().is_some_and(|s| s.scores == (1, 0))).await;
        app.step(vec![], &mut Held(Intent::None));
        assert_eq!(audio.played(SoundCue::Score), 1);
    }

    /// The deciding point's cue is heard on the end screen
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn final_score_cue_plays_with_winner() {
        let audio = RecordingAudio::default();
        let (mut app, mut simulator) = joined_app(audio.clone(), 0).await;

        simulator.push(r#"{"scores":[4,4]}"#).await;
        tick_until(&mut app, |app| app.phase() == Some(PlayPhase::Active)).await;

        simulator
            .push(r#"{"scores":[5,4],"winner":0,"sound_event":"score"}"#)
            .await;
        tick_until(&mut app, |app| {
            app.phase() == Some(PlayPhase::Terminal(Outcome::Won))
        })
        .await;
        app.step(vec![], &mut Held(Intent::None));

        assert_eq!(audio.played(SoundCue::Score), 1);
    }
}
