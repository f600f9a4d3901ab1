// src/gallery/layout.rs — Bulletin-board placement for the gallery wall
//
// Items are scattered over a shuffled grid of zones with a little rotation
// and scale jitter. A candidate is rejected when it crowds an already placed
// item or pokes out of the container; after enough rejections the item falls
// back to a plain grid slot.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ATTEMPTS: usize = 50;
/// Largest board edge accepted from clients, in pixels.
pub const MAX_BOARD_SIDE: f64 = 10_000.0;
/// Zone grid is rebuilt on every attempt, so its size is bounded.
const MAX_ZONES_PER_AXIS: usize = 64;
const MIN_SPACING: f64 = 20.0;
const ROTATION_RANGE: (f64, f64) = (-15.0, 15.0);
const SCALE_RANGE: (f64, f64) = (0.95, 1.05);
const TAPE_ROTATION_RANGE: (f64, f64) = (-45.0, 45.0);
/// Allowed overlap: centres may come this close relative to the mean width.
const OVERLAP_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decoration {
    Tape,
    Pin,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPosition {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale: f64,
    pub z_index: i64,
    #[serde(rename = "decorationType")]
    pub decoration: Decoration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tape_rotation: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Placed {
    x: f64,
    y: f64,
    width: f64,
}

#[derive(Debug, Clone, Copy)]
struct Zone {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

pub struct GalleryLayoutEngine<R: Rng = StdRng> {
    container_w: f64,
    container_h: f64,
    item_w: f64,
    item_h: f64,
    max_attempts: usize,
    placed: Vec<Placed>,
    rng: R,
}

impl GalleryLayoutEngine<StdRng> {
    pub fn new(container_w: f64, container_h: f64, item_w: f64, item_h: f64) -> Self {
        Self::with_rng(container_w, container_h, item_w, item_h, StdRng::from_entropy())
    }
}

impl<R: Rng> GalleryLayoutEngine<R> {
    pub fn with_rng(container_w: f64, container_h: f64, item_w: f64, item_h: f64, rng: R) -> Self {
        Self {
            container_w,
            container_h,
            item_w,
            item_h,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            placed: Vec::new(),
            rng,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn generate_position(&mut self, index: usize) -> LayoutPosition {
        for _ in 0..self.max_attempts {
            let candidate = self.random_candidate(index);
            if self.is_valid(&candidate) {
                self.record(&candidate);
                return candidate;
            }
        }

        let fallback = self.fallback_position(index);
        self.record(&fallback);
        fallback
    }

    /// Positions for `count` items, starting from an empty board.
    pub fn layout(&mut self, count: usize) -> Vec<LayoutPosition> {
        self.reset();
        (0..count).map(|i| self.generate_position(i)).collect()
    }

    pub fn reset(&mut self) {
        self.placed.clear();
    }

    pub fn update_dimensions(&mut self, width: f64, height: f64) {
        self.container_w = width;
        self.container_h = height;
        self.reset();
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    fn zones(&mut self) -> Vec<Zone> {
        let cols = ((self.container_w / self.item_w).floor() as usize).clamp(3, MAX_ZONES_PER_AXIS);
        let rows = ((self.container_h / self.item_h).floor() as usize).clamp(3, MAX_ZONES_PER_AXIS);
        let zone_w = self.container_w / cols as f64;
        let zone_h = self.container_h / rows as f64;

        let mut zones: Vec<Zone> = (0..rows)
            .flat_map(|row| {
                (0..cols).map(move |col| Zone {
                    x: col as f64 * zone_w,
                    y: row as f64 * zone_h,
                    width: zone_w,
                    height: zone_h,
                })
            })
            .collect();
        zones.shuffle(&mut self.rng);
        zones
    }

    fn random_candidate(&mut self, index: usize) -> LayoutPosition {
        let zones = self.zones();
        let zone = zones[index % zones.len()];

        let x = zone.x + self.rng.gen::<f64>() * zone.width;
        let y = zone.y + self.rng.gen::<f64>() * zone.height;
        let rotation = self.sample(ROTATION_RANGE);
        let scale = self.sample(SCALE_RANGE);
        let z_index = (y / 10.0).floor() as i64 + self.rng.gen_range(0..5);

        let decoration = match self.rng.gen_range(0..3) {
            0 => Decoration::Tape,
            1 => Decoration::Pin,
            _ => Decoration::Both,
        };
        let tape_rotation = match decoration {
            Decoration::Pin => None,
            _ => Some(self.sample(TAPE_ROTATION_RANGE)),
        };

        LayoutPosition {
            x,
            y,
            rotation,
            scale,
            z_index,
            decoration,
            tape_rotation,
        }
    }

    fn is_valid(&self, pos: &LayoutPosition) -> bool {
        let scaled_w = self.item_w * pos.scale;
        let scaled_h = self.item_h * pos.scale;

        let crowded = self.placed.iter().any(|p| {
            let distance = ((pos.x - p.x).powi(2) + (pos.y - p.y).powi(2)).sqrt();
            distance < (scaled_w + p.width) / 2.0 * OVERLAP_FACTOR
        });
        if crowded {
            return false;
        }

        let (half_w, half_h) = (scaled_w / 2.0, scaled_h / 2.0);
        pos.x - half_w >= 0.0
            && pos.x + half_w <= self.container_w
            && pos.y - half_h >= 0.0
            && pos.y + half_h <= self.container_h
    }

    fn record(&mut self, pos: &LayoutPosition) {
        self.placed.push(Placed {
            x: pos.x,
            y: pos.y,
            width: self.item_w * pos.scale,
        });
    }

    fn fallback_position(&mut self, index: usize) -> LayoutPosition {
        let cols = ((self.container_w / (self.item_w + MIN_SPACING)).floor() as usize).max(1);
        let (row, col) = (index / cols, index % cols);

        LayoutPosition {
            x: col as f64 * (self.item_w + MIN_SPACING) + self.item_w / 2.0,
            y: row as f64 * (self.item_h + MIN_SPACING) + self.item_h / 2.0,
            rotation: self.sample(ROTATION_RANGE),
            scale: 1.0,
            z_index: index as i64,
            decoration: Decoration::Tape,
            tape_rotation: Some(self.sample(TAPE_ROTATION_RANGE)),
        }
    }

    fn sample(&mut self, (min, max): (f64, f64)) -> f64 {
        min + self.rng.gen::<f64>() * (max - min)
    }
}
