use clap::Parser;
use client::app::App;
use client::audio::MacroquadAudio;
use client::config::{ClientConfig, RetryPolicy};
use client::input::{InputManager, KeyboardControls};
use client::rendering::Renderer;
use log::{error, info};
use macroquad::prelude::*;
use shared::framing::DEFAULT_MAX_FRAME_LEN;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulator address to connect to
    #[arg(short = 's', long, default_value = shared::DEFAULT_SERVER)]
    server: String,

    /// Give up on one connect attempt after this many milliseconds
    #[arg(long, default_value = "3000")]
    connect_timeout_ms: u64,

    /// Connect attempts before showing the error
    #[arg(long, default_value = "3")]
    max_attempts: u32,

    /// Delay before the first retry, doubled for every further retry
    #[arg(long, default_value = "500")]
    retry_delay_ms: u64,

    /// Upper bound for the retry delay
    #[arg(long, default_value = "4000")]
    max_retry_delay_ms: u64,

    /// Largest accepted snapshot message in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LEN)]
    max_frame_bytes: usize,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: u32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: u32,

    /// Directory holding <cue>.wav sound files
    #[arg(long, default_value = "assets/sounds")]
    assets: PathBuf,

    /// Sound volume between 0 and 1
    #[arg(long, default_value = "0.8")]
    volume: f32,

    /// Disable sound
    #[arg(long)]
    mute: bool,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server: self.server.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                initial_delay: Duration::from_millis(self.retry_delay_ms),
                max_delay: Duration::from_millis(self.max_retry_delay_ms),
            },
            max_frame_len: self.max_frame_bytes,
            width: self.width as f32,
            height: self.height as f32,
            assets_dir: self.assets.clone(),
            volume: self.volume,
            muted: self.mute,
        }
    }
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Ping-Pong".to_owned(),
        window_width: args.width as i32,
        window_height: args.height as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    if let Err(e) = run(Args::parse()).await {
        error!("Client stopped: {}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.client_config();

    info!("Starting client...");
    info!("Simulator: {}", config.server);
    info!("Controls: W/S or Up/Down to move, K to restart after a match");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let audio = MacroquadAudio::load(&config.assets_dir, config.volume, config.muted).await;
    let mut renderer = Renderer::new(config.width, config.height);
    let mut input = InputManager::new();
    let mut controls = KeyboardControls;
    let mut app = App::new(config, runtime.handle().clone(), Box::new(audio));

    prevent_quit();

    loop {
        let events = input.poll(app.screen());
        if !app.step(events, &mut controls) {
            break;
        }

        renderer.render(&app, get_time());
        next_frame().await;
    }

    app.shutdown();
    drop(app);
    runtime.shutdown_timeout(Duration::from_millis(500));

    Ok(())
}
