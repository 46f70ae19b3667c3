//! Thin wrapper around the template-matching primitive.
//!
//! Scores come from normalized cross-correlation, so they live in [0, 1]
//! with 1.0 meaning an exact match. All-black patches have zero norm and
//! score NaN, and NaN fails every threshold comparison, which is exactly
//! the no-match answer such patches deserve.

use image::imageops;
use image::GrayImage;
use imageproc::template_matching::{match_template_parallel, MatchTemplateMethod};
use tracing::trace;

use crate::capture::Capture;
use crate::geometry::{Point, Rect};

const METHOD: MatchTemplateMethod = MatchTemplateMethod::CrossCorrelationNormalized;

/// Similarity scores for one template over one search region.
///
/// One grid is computed per (template, region) pair and answers any number
/// of threshold queries, so a descending-confidence search never re-runs
/// the primitive. Positions are reported in capture coordinates.
pub struct ScoreGrid {
    scores: Vec<f32>,
    cols: u32,
    rows: u32,
    origin: Point,
    template_width: u32,
    template_height: u32,
}

impl ScoreGrid {
    fn empty() -> Self {
        Self {
            scores: Vec::new(),
            cols: 0,
            rows: 0,
            origin: Point::new(0, 0),
            template_width: 0,
            template_height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// The first position, scanning rows top to bottom and columns left to
    /// right, that scores at least `confidence`. Scan order makes the
    /// answer deterministic when several positions qualify.
    pub fn first_at_least(&self, confidence: f64) -> Option<Rect> {
        let threshold = confidence as f32;
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.scores[(row * self.cols + col) as usize] >= threshold {
                    return Some(self.rect_at(col, row));
                }
            }
        }
        None
    }

    /// Every qualifying position in scan order.
    pub fn all_at_least(&self, confidence: f64) -> Vec<Rect> {
        let threshold = confidence as f32;
        let mut hits = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.scores[(row * self.cols + col) as usize] >= threshold {
                    hits.push(self.rect_at(col, row));
                }
            }
        }
        hits
    }

    fn rect_at(&self, col: u32, row: u32) -> Rect {
        Rect::new(
            self.origin.x + col as i32,
            self.origin.y + row as i32,
            self.template_width,
            self.template_height,
        )
    }
}

/// Runs the matching primitive against the run's single capture.
pub struct TemplateMatcher<'a> {
    capture: &'a Capture,
}

impl<'a> TemplateMatcher<'a> {
    pub fn new(capture: &'a Capture) -> Self {
        Self { capture }
    }

    pub fn full_region(&self) -> Rect {
        Rect::new(0, 0, self.capture.width(), self.capture.height())
    }

    /// Score `template` at every position inside `region`.
    ///
    /// The region is clamped to the capture first; boxes may legitimately
    /// hang off the edges. A clamped region smaller than the template has
    /// no valid positions and yields an empty grid, which is an answer,
    /// not an error.
    pub fn scores(&self, template: &GrayImage, region: Rect) -> ScoreGrid {
        let (x, y, width, height) = self.clamp_region(region);
        if width < template.width()
            || height < template.height()
            || template.width() == 0
            || template.height() == 0
        {
            return ScoreGrid::empty();
        }

        let view = imageops::crop_imm(self.capture.image(), x, y, width, height).to_image();
        let map = match_template_parallel(&view, template, METHOD);
        trace!(
            x,
            y,
            width,
            height,
            positions = map.width() * map.height(),
            "scored region"
        );

        let (cols, rows) = map.dimensions();
        ScoreGrid {
            scores: map.into_raw(),
            cols,
            rows,
            origin: Point::new(x as i32, y as i32),
            template_width: template.width(),
            template_height: template.height(),
        }
    }

    /// First occurrence of `template` inside `region` at or above
    /// `confidence`, in scan order.
    pub fn locate(&self, template: &GrayImage, region: Rect, confidence: f64) -> Option<Rect> {
        self.scores(template, region).first_at_least(confidence)
    }

    /// Every occurrence of `template` over the whole capture at or above
    /// `confidence`, in scan order.
    pub fn locate_all(&self, template: &GrayImage, confidence: f64) -> Vec<Rect> {
        self.scores(template, self.full_region())
            .all_at_least(confidence)
    }

    fn clamp_region(&self, region: Rect) -> (u32, u32, u32, u32) {
        let x0 = region.left.max(0);
        let y0 = region.top.max(0);
        let x1 = region.right().min(self.capture.width() as i32);
        let y1 = region.bottom().min(self.capture.height() as i32);
        if x1 <= x0 || y1 <= y0 {
            return (0, 0, 0, 0);
        }
        (x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
    }
}
