//! # Paddle Game Client Library
//!
//! Client side of a two-player networked paddle game. The simulator is
//! authoritative: it pushes complete game state, and the client renders the
//! most recent state it has seen and streams the local player's control
//! intent back.
//!
//! ## Architecture Overview
//!
//! Two execution contexts exist while a game is running:
//!
//! ### Tick Loop
//! The macroquad frame loop samples the keyboard, feeds the resulting UI
//! events through the screen state machine, reads the latest snapshot,
//! dispatches the movement intent and draws the active screen. It never
//! awaits network I/O.
//!
//! ### Receive Path
//! A tokio task per session reads the stream, cuts it into newline-delimited
//! frames, decodes each into a snapshot and replaces the content of the
//! shared snapshot cell. When the stream ends it publishes a terminal
//! "connection lost" snapshot so the player always reaches an end screen.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! - Connect with timeout, fixed-width handshake and bounded retry
//! - Session ownership of the receive and send tasks
//! - Idempotent close that unblocks a pending read
//!
//! ### Snapshot Module (`snapshot`)
//! - Latest-wins single slot between the receive path and the tick loop
//!
//! ### Screen Module (`screen`)
//! - Explicit screen enum and one exhaustive transition function
//! - In-game phase derived from the latest snapshot every tick
//!
//! ### Input Module (`input`)
//! - Keyboard to UI event mapping
//! - Level-triggered intent dispatch behind the `IntentTransport` trait
//!
//! ### Audio Module (`audio`)
//! - One-shot sound cues from snapshot events and menu actions
//!
//! ### Rendering Module (`rendering`)
//! - Menu, settings, shop, connecting and in-game screens
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::app::App;
//! use client::audio::SilentAudio;
//! use client::config::ClientConfig;
//! use client::input::KeyboardControls;
//! use client::screen::{MenuAction, UiEvent};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = tokio::runtime::Runtime::new()?;
//! let mut app = App::new(
//!     ClientConfig::default(),
//!     runtime.handle().clone(),
//!     Box::new(SilentAudio),
//! );
//!
//! // One tick: open the settings screen from the menu.
//! app.step(vec![UiEvent::Menu(MenuAction::Play)], &mut KeyboardControls);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod audio;
pub mod config;
pub mod input;
pub mod network;
pub mod rendering;
pub mod screen;
pub mod snapshot;
