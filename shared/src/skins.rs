//! Cosmetic skin catalog

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinKind {
    Ball,
    Paddle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skin {
    pub id: &'static str,
    pub name: &'static str,
    pub color: (u8, u8, u8),
    pub price: u32,
}

pub const DEFAULT_BALL_SKIN: &str = "ball_white";
pub const DEFAULT_PADDLE_SKIN: &str = "paddle_magenta";

pub const BALL_SKINS: [Skin; 5] = [
    Skin { id: "ball_white", name: "White ball", color: (255, 255, 255), price: 0 },
    Skin { id: "ball_red", name: "Red ball", color: (255, 50, 50), price: 100 },
    Skin { id: "ball_blue", name: "Blue ball", color: (50, 100, 255), price: 100 },
    Skin { id: "ball_gold", name: "Gold ball", color: (255, 200, 0), price: 200 },
    Skin { id: "ball_green", name: "Green ball", color: (50, 255, 50), price: 100 },
];

pub const PADDLE_SKINS: [Skin; 5] = [
    Skin { id: "paddle_magenta", name: "Magenta paddle", color: (255, 0, 255), price: 0 },
    Skin { id: "paddle_green", name: "Green paddle", color: (0, 255, 0), price: 100 },
    Skin { id: "paddle_blue", name: "Blue paddle", color: (0, 150, 255), price: 100 },
    Skin { id: "paddle_gold", name: "Gold paddle", color: (255, 200, 0), price: 200 },
    Skin { id: "paddle_neon", name: "Neon paddle", color: (0, 255, 200), price: 300 },
];

pub fn catalog(kind: SkinKind) -> &'static [Skin] {
    match kind {
        SkinKind::Ball => &BALL_SKINS,
        SkinKind::Paddle => &PADDLE_SKINS,
    }
}

pub fn find(kind: SkinKind, id: &str) -> Option<&'static Skin> {
    catalog(kind).iter().find(|skin| skin.id == id)
}

/// Index of `id` in the catalog, falling back to the first entry.
pub fn position(kind: SkinKind, id: &str) -> usize {
    catalog(kind)
        .iter()
        .position(|skin| skin.id == id)
        .unwrap_or(0)
}

/// The skin `step` places away from `id`, wrapping around the catalog.
pub fn cycle(kind: SkinKind, id: &str, step: isize) -> &'static Skin {
    let skins = catalog(kind);
    let len = skins.len() as isize;
    let next = (position(kind, id) as isize + step).rem_euclid(len);
    &skins[next as usize]
}
