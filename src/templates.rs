use image::GrayImage;
use std::path::Path;
use tracing::debug;

use crate::error::TemplateError;
use crate::tableau::{Rank, RANK_COUNT};

/// File stems of the rank glyph templates, in ascending rank order:
/// `RANK_STEMS[rank.value() - 1]` names the image for `rank`.
pub const RANK_STEMS: [&str; RANK_COUNT] = [
    "ace", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "jack",
    "queen", "king",
];

/// File stem of the draw ("advance the stock") control image.
pub const DRAW_STEM: &str = "next_stack";

/// The 13 rank glyph templates plus the draw control, decoded to grayscale
/// once at startup.
#[derive(Debug)]
pub struct TemplateSet {
    ranks: Vec<GrayImage>,
    draw: GrayImage,
}

impl TemplateSet {
    /// Load `<stem>.png` for every rank plus the draw control from `dir`.
    /// Fails fast on the first missing or undecodable image.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let mut ranks = Vec::with_capacity(RANK_COUNT);
        for stem in RANK_STEMS {
            ranks.push(load_template(dir, stem)?);
        }
        let draw = load_template(dir, DRAW_STEM)?;
        debug!(dir = %dir.display(), "loaded {} templates", RANK_COUNT + 1);
        Ok(Self { ranks, draw })
    }

    /// Build a set from in-memory images. `ranks` must hold one image per
    /// real rank, ascending.
    pub fn from_images(ranks: Vec<GrayImage>, draw: GrayImage) -> Self {
        assert_eq!(ranks.len(), RANK_COUNT);
        Self { ranks, draw }
    }

    /// The glyph template for a real rank. `Unknown` has no glyph.
    pub fn rank(&self, rank: Rank) -> &GrayImage {
        debug_assert!(!rank.is_unknown());
        &self.ranks[rank.value() as usize - 1]
    }

    pub fn draw_control(&self) -> &GrayImage {
        &self.draw
    }
}

fn load_template(dir: &Path, stem: &str) -> Result<GrayImage, TemplateError> {
    let path = dir.join(format!("{stem}.png"));
    if !path.exists() {
        return Err(TemplateError::Missing {
            path: path.display().to_string(),
        });
    }
    let image = image::open(&path).map_err(|source| TemplateError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    Ok(image.into_luma8())
}
