use crate::app::App;
use crate::screen::{Outcome, PlayPhase, Screen, ScreenMachine};
use macroquad::prelude::*;
use shared::skins::{self, SkinKind};
use shared::{Snapshot, BALL_RADIUS, PADDLE_HEIGHT, PADDLE_MARGIN, PADDLE_WIDTH};

const SHOP_COINS: u32 = 500;
const OPPONENT_COLOR: Color = Color::new(1.0, 68.0 / 255.0, 68.0 / 255.0, 1.0);

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: f32, height: f32) -> Self {
        Renderer { width, height }
    }

    pub fn render(&mut self, app: &App, time: f64) {
        let machine = app.machine();

        match app.screen() {
            Screen::Menu => self.draw_menu(),
            Screen::Settings => self.draw_settings(machine),
            Screen::Shop => self.draw_shop(machine),
            Screen::Connecting => self.draw_connecting(&app.config().server, time),
            Screen::Playing => {
                let latest = app.latest();
                match app.phase() {
                    Some(PlayPhase::Waiting) | None => self.draw_waiting(time),
                    Some(PlayPhase::Countdown(count)) => self.draw_countdown(count),
                    Some(PlayPhase::Active) => {
                        if let Some(snapshot) = latest.as_deref() {
                            self.draw_game(snapshot, machine);
                        }
                    }
                    Some(PlayPhase::Terminal(outcome)) => {
                        self.draw_terminal(outcome, latest.as_deref())
                    }
                }
            }
        }
    }

    fn draw_menu(&mut self) {
        clear_background(Color::from_rgba(30, 10, 50, 255));
        self.draw_centered("PING-PONG", 120.0, 80.0, Color::from_rgba(255, 100, 200, 255));

        let items = [
            "[Enter] Play",
            "[S] Settings",
            "[H] Shop",
            "[Esc] Exit",
        ];
        for (i, label) in items.iter().enumerate() {
            self.draw_centered(label, 240.0 + i as f32 * 70.0, 36.0, WHITE);
        }
    }

    fn draw_settings(&mut self, machine: &ScreenMachine) {
        clear_background(Color::from_rgba(20, 10, 30, 255));
        let form = machine.settings();

        self.draw_centered("PLAYER SETTINGS", 80.0, 56.0, Color::from_rgba(255, 200, 100, 255));

        draw_text("Name:", 100.0, 170.0, 32.0, WHITE);
        draw_rectangle_lines(100.0, 185.0, 400.0, 44.0, 2.0, WHITE);
        draw_text(&form.name, 110.0, 217.0, 32.0, WHITE);

        let ball = skins::find(SkinKind::Ball, form.ball_skin);
        let paddle = skins::find(SkinKind::Paddle, form.paddle_skin);
        let accent = Color::from_rgba(255, 200, 100, 255);
        draw_text(
            &format!("Ball: {}  (Left/Right)", ball.map_or(form.ball_skin, |s| s.name)),
            100.0,
            290.0,
            28.0,
            accent,
        );
        draw_text(
            &format!("Paddle: {}  (Up/Down)", paddle.map_or(form.paddle_skin, |s| s.name)),
            100.0,
            330.0,
            28.0,
            accent,
        );

        if let Some(error) = machine.last_error() {
            draw_text(error, 100.0, 400.0, 24.0, Color::from_rgba(255, 100, 100, 255));
        }

        self.draw_centered("[Enter] Play   [Esc] Back", self.height - 40.0, 28.0, GRAY);
    }

    fn draw_shop(&mut self, machine: &ScreenMachine) {
        clear_background(Color::from_rgba(20, 20, 40, 255));
        let shop = machine.shop();

        self.draw_centered("SKIN SHOP", 60.0, 56.0, Color::from_rgba(255, 200, 100, 255));

        let tabs = [(SkinKind::Ball, "[1] Balls"), (SkinKind::Paddle, "[2] Paddles")];
        for (i, (kind, label)) in tabs.iter().enumerate() {
            let color = if *kind == shop.tab { WHITE } else { GRAY };
            draw_text(label, 50.0 + i as f32 * 200.0, 120.0, 32.0, color);
        }

        for (i, skin) in skins::catalog(shop.tab).iter().enumerate() {
            let x = 50.0 + (i % 3) as f32 * 240.0;
            let y = 160.0 + (i / 3) as f32 * 170.0;
            let (r, g, b) = skin.color;

            draw_rectangle(x, y, 200.0, 130.0, Color::from_rgba(80, 80, 100, 255));
            match shop.tab {
                SkinKind::Ball => draw_circle(x + 100.0, y + 45.0, 20.0, Color::from_rgba(r, g, b, 255)),
                SkinKind::Paddle => {
                    draw_rectangle(x + 90.0, y + 10.0, 20.0, 70.0, Color::from_rgba(r, g, b, 255))
                }
            }
            draw_text(skin.name, x + 8.0, y + 105.0, 22.0, WHITE);
            draw_text(&format!("{} coins", skin.price), x + 8.0, y + 124.0, 20.0, GOLD);

            if skin.id == shop.highlighted() {
                draw_rectangle_lines(x, y, 200.0, 130.0, 3.0, GREEN);
            }
        }

        draw_text(&format!("Coins: {}", SHOP_COINS), 20.0, self.height - 20.0, 28.0, GOLD);
        draw_text("[Esc] Back", self.width - 150.0, self.height - 20.0, 28.0, GRAY);
    }

    fn draw_connecting(&mut self, server: &str, time: f64) {
        clear_background(BLACK);
        let dots = ".".repeat((time * 2.0) as usize % 4);
        self.draw_centered(
            &format!("Connecting to {}{}", server, dots),
            self.height / 2.0,
            36.0,
            WHITE,
        );
        self.draw_centered("[Esc] Cancel", self.height / 2.0 + 60.0, 24.0, GRAY);
    }

    fn draw_waiting(&mut self, time: f64) {
        clear_background(Color::from_rgba(20, 20, 40, 255));
        let color = Color::from_rgba(200, 200, 255, 255);
        self.draw_centered("Waiting for players...", self.height / 2.0, 36.0, color);

        let dots = ".".repeat((time * 2.0) as usize % 4);
        self.draw_centered(&dots, self.height / 2.0 + 100.0, 48.0, color);
    }

    fn draw_countdown(&mut self, count: i32) {
        clear_background(BLACK);
        self.draw_centered(&count.to_string(), self.height / 2.0, 120.0, WHITE);
    }

    fn draw_game(&mut self, snapshot: &Snapshot, machine: &ScreenMachine) {
        clear_background(Color::from_rgba(30, 30, 30, 255));

        let identity = machine.identity();
        let local_id = machine.local_id();
        let own_paddle = skin_color(SkinKind::Paddle, &identity.paddle_skin_id);
        let ball_color = skin_color(SkinKind::Ball, &identity.ball_skin_id);

        draw_line(self.width / 2.0, 0.0, self.width / 2.0, self.height, 2.0, DARKGRAY);

        let columns = [PADDLE_MARGIN, self.width - PADDLE_MARGIN - PADDLE_WIDTH];
        for (player, x) in columns.iter().enumerate() {
            if let Some(y) = snapshot.paddle_y(player as u8) {
                let color = if local_id == Some(player as i32) {
                    own_paddle
                } else {
                    OPPONENT_COLOR
                };
                draw_rectangle(*x, y, PADDLE_WIDTH, PADDLE_HEIGHT, color);
            }
        }

        draw_circle(snapshot.ball.x, snapshot.ball.y, BALL_RADIUS, ball_color);

        let (left, right) = snapshot.scores;
        self.draw_centered(&format!("{} : {}", left, right), 60.0, 72.0, WHITE);
        draw_text(
            &format!("Player: {}", identity.display_name),
            10.0,
            20.0,
            24.0,
            Color::from_rgba(200, 200, 255, 255),
        );
    }

    fn draw_terminal(&mut self, outcome: Outcome, last: Option<&Snapshot>) {
        clear_background(Color::from_rgba(20, 20, 20, 255));

        let (text, color) = match outcome {
            Outcome::Won => ("YOU WIN!", GOLD),
            Outcome::Lost => ("YOU LOSE!", Color::from_rgba(255, 100, 100, 255)),
            Outcome::Disconnected => ("CONNECTION LOST", Color::from_rgba(200, 200, 200, 255)),
        };
        self.draw_centered(text, self.height / 2.0, 80.0, color);

        if let Some(snapshot) = last {
            let (left, right) = snapshot.scores;
            self.draw_centered(&format!("{} : {}", left, right), self.height / 2.0 + 60.0, 40.0, color);
        }
        self.draw_centered("Press K to restart", self.height / 2.0 + 120.0, 36.0, color);
    }

    fn draw_centered(&self, text: &str, y: f32, size: f32, color: Color) {
        let dims = measure_text(text, None, size as u16, 1.0);
        draw_text(text, self.width / 2.0 - dims.width / 2.0, y, size, color);
    }
}

fn skin_color(kind: SkinKind, id: &str) -> Color {
    let (r, g, b) = skins::find(kind, id).map_or((255, 255, 255), |skin| skin.color);
    Color::from_rgba(r, g, b, 255)
}
