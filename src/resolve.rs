//! Per-cell resolution at descending confidence.
//!
//! Each of the 52 cells gets its own small search, restricted to the ranks
//! the rough scan placed nearby. Starting strict and loosening gradually
//! keeps visually similar glyphs apart: a cell is awarded to the candidate
//! that survives the highest confidence bar, and only when every candidate
//! fails the floor does the cell stay unknown.

use tracing::debug;

use crate::config::Config;
use crate::geometry::Rect;
use crate::grid::GridGeometry;
use crate::matcher::{ScoreGrid, TemplateMatcher};
use crate::scan::RoughScan;
use crate::tableau::{CardObservation, Locator, Rank, Tableau, PILE_COUNT, PILE_SIZE};
use crate::templates::TemplateSet;

/// Ranks whose rough detections overlap `search`, ascending. An empty
/// answer means the rough pass missed this card entirely.
pub fn candidate_ranks(scan: &RoughScan, search: Rect) -> Vec<Rank> {
    Rank::ORDERED
        .into_iter()
        .filter(|rank| {
            scan.detections(*rank)
                .iter()
                .any(|det| det.overlaps(&search))
        })
        .collect()
}

/// The most likely rank inside `search`, with the box it matched at.
///
/// Candidates are tried at each confidence level in the order given; the
/// first hit wins. A higher level therefore always beats a lower one, and
/// within a level the earlier (lower) rank takes the tie. Score grids are
/// computed once per candidate and reused across every level.
pub fn most_likely(
    matcher: &TemplateMatcher,
    templates: &TemplateSet,
    search: Rect,
    candidates: &[Rank],
    config: &Config,
) -> Option<(Rank, Rect)> {
    let grids: Vec<(Rank, ScoreGrid)> = candidates
        .iter()
        .map(|&rank| (rank, matcher.scores(templates.rank(rank), search)))
        .collect();

    for confidence in confidence_ladder(config) {
        for (rank, grid) in &grids {
            if let Some(matched) = grid.first_at_least(confidence) {
                return Some((*rank, matched));
            }
        }
    }
    None
}

/// Confidence levels from start down to the floor. Stepping in integer
/// percent keeps repeated subtraction from drifting past the floor.
fn confidence_ladder(config: &Config) -> Vec<f64> {
    let start = (config.fine_confidence_start * 100.0).round() as i64;
    let floor = (config.fine_confidence_floor * 100.0).round() as i64;
    let step = ((config.fine_confidence_step * 100.0).round() as i64).max(1);

    let mut levels = Vec::new();
    let mut level = start;
    while level >= floor {
        levels.push(level as f64 / 100.0);
        level -= step;
    }
    levels
}

/// Resolve all 52 cells, row by row in deal order. `on_row` fires after
/// each completed row so the driver can show progress.
pub fn resolve_tableau(
    matcher: &TemplateMatcher,
    scan: &RoughScan,
    geometry: &GridGeometry,
    templates: &TemplateSet,
    config: &Config,
    mut on_row: impl FnMut(usize, &Tableau),
) -> Tableau {
    let mut tableau = Tableau::new();

    for row in 0..PILE_SIZE {
        for pile in 0..PILE_COUNT {
            let search = geometry.cell_box(pile, row, config);
            let mut candidates = candidate_ranks(scan, search);
            if candidates.is_empty() {
                // nothing nearby in the rough scan; fall back to every rank
                candidates = Rank::ORDERED.to_vec();
            }

            let observation = match most_likely(matcher, templates, search, &candidates, config) {
                Some((rank, matched)) => {
                    debug!(pile, row, rank = rank.value(), "cell resolved");
                    CardObservation {
                        rank,
                        locator: Locator::Spot(matched.center()),
                    }
                }
                None => {
                    debug!(pile, row, "cell unresolved");
                    CardObservation {
                        rank: Rank::Unknown,
                        locator: Locator::Region(search),
                    }
                }
            };
            tableau.push(pile, observation);
        }
        on_row(row, &tableau);
    }

    tableau
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Capture;
    use image::{GrayImage, Luma};

    const TPL_W: u32 = 12;
    const TPL_H: u32 = 16;

    fn pattern(seed: u32) -> GrayImage {
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
        GrayImage::from_fn(TPL_W, TPL_H, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([if state & 1 == 0 { 0 } else { 255 }])
        })
    }

    fn template_set() -> TemplateSet {
        let ranks = (1..=13).map(pattern).collect();
        TemplateSet::from_images(ranks, pattern(99))
    }

    fn plant(canvas: &mut GrayImage, stamp: &GrayImage, left: u32, top: u32) {
        for y in 0..stamp.height() {
            for x in 0..stamp.width() {
                canvas.put_pixel(left + x, top + y, *stamp.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_ladder_descends_to_the_floor() {
        let config = Config::default();
        let levels = confidence_ladder(&config);

        assert_eq!(levels.first(), Some(&0.85));
        assert_eq!(levels.last(), Some(&0.01));
        assert_eq!(levels.len(), 43);
        for pair in levels.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn test_ladder_respects_custom_bounds() {
        let config = Config {
            fine_confidence_start: 0.9,
            fine_confidence_floor: 0.5,
            fine_confidence_step: 0.2,
            ..Config::default()
        };
        assert_eq!(confidence_ladder(&config), vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn test_candidate_ranks_filters_by_overlap() {
        let mut scan = RoughScan::default();
        scan.consider(Rank::Three, Rect::new(100, 100, 12, 16));
        scan.consider(Rank::Seven, Rect::new(105, 102, 12, 16));
        scan.consider(Rank::King, Rect::new(500, 500, 12, 16));

        let candidates = candidate_ranks(&scan, Rect::new(95, 95, 40, 40));
        assert_eq!(candidates, vec![Rank::Three, Rank::Seven]);

        assert!(candidate_ranks(&scan, Rect::new(0, 0, 20, 20)).is_empty());
    }

    #[test]
    fn test_most_likely_picks_planted_rank() {
        let templates = template_set();
        let mut canvas = GrayImage::from_pixel(60, 60, Luma([15]));
        plant(&mut canvas, templates.rank(Rank::Five), 20, 20);
        let capture = Capture::from_gray(canvas);
        let matcher = TemplateMatcher::new(&capture);

        let search = Rect::new(10, 10, 30, 30);
        let (rank, matched) = most_likely(
            &matcher,
            &templates,
            search,
            &[Rank::Ace, Rank::Five, Rank::Nine],
            &Config::default(),
        )
        .unwrap();

        assert_eq!(rank, Rank::Five);
        assert_eq!(matched, Rect::new(20, 20, TPL_W, TPL_H));
    }

    #[test]
    fn test_most_likely_prefers_confidence_over_candidate_order() {
        // Ace precedes Five in the candidate list but is absent from the
        // image, so Five must win on score alone.
        let templates = template_set();
        let mut canvas = GrayImage::from_pixel(60, 60, Luma([15]));
        plant(&mut canvas, templates.rank(Rank::Five), 20, 20);
        let capture = Capture::from_gray(canvas);
        let matcher = TemplateMatcher::new(&capture);

        let search = Rect::new(12, 12, 24, 24);
        let (rank, _) = most_likely(
            &matcher,
            &templates,
            search,
            &[Rank::Ace, Rank::Five],
            &Config::default(),
        )
        .unwrap();

        assert_eq!(rank, Rank::Five);
    }

    #[test]
    fn test_most_likely_breaks_level_ties_by_candidate_order() {
        // two exact plants in one search box both score 1.0 at the top
        // level; the earlier candidate takes the cell
        let templates = template_set();
        let mut canvas = GrayImage::from_pixel(80, 40, Luma([15]));
        plant(&mut canvas, templates.rank(Rank::Two), 40, 10);
        plant(&mut canvas, templates.rank(Rank::Nine), 12, 10);
        let capture = Capture::from_gray(canvas);
        let matcher = TemplateMatcher::new(&capture);

        let search = Rect::new(0, 0, 80, 40);
        let (rank, _) = most_likely(
            &matcher,
            &templates,
            search,
            &[Rank::Two, Rank::Nine],
            &Config::default(),
        )
        .unwrap();

        assert_eq!(rank, Rank::Two);
    }

    #[test]
    fn test_most_likely_gives_up_on_empty_region() {
        let templates = template_set();
        let capture = Capture::from_gray(GrayImage::from_pixel(40, 40, Luma([15])));
        let matcher = TemplateMatcher::new(&capture);

        // entirely off the capture
        let search = Rect::new(-100, -100, 50, 50);
        let answer = most_likely(
            &matcher,
            &templates,
            search,
            &Rank::ORDERED,
            &Config::default(),
        );
        assert!(answer.is_none());
    }

    #[test]
    fn test_cell_missed_by_rough_scan_resolves_via_fallback() {
        // the rough scan has nothing near cell (1, 1), so its candidate set
        // is empty and every rank is tried; the planted Seven must still win
        let templates = template_set();
        let mut canvas = GrayImage::from_pixel(320, 220, Luma([15]));
        plant(&mut canvas, templates.rank(Rank::Seven), 250, 140);
        let capture = Capture::from_gray(canvas);
        let matcher = TemplateMatcher::new(&capture);
        let config = Config {
            cell_pad_x_frac: 0.0625,
            cell_width_frac: 0.25,
            cell_pad_y_frac: 0.25,
            cell_height_frac: 1.0,
            ..Config::default()
        };

        // lattice corners only: 150 x 60 spacing, nothing at (250, 140)
        let mut scan = RoughScan::default();
        for (left, top) in [(100, 80), (550, 80), (100, 800), (550, 800)] {
            scan.consider(Rank::Ace, Rect::new(left, top, TPL_W, TPL_H));
        }
        let geometry = GridGeometry::infer(&scan).unwrap();
        assert!(candidate_ranks(&scan, geometry.cell_box(1, 1, &config)).is_empty());

        let tableau = resolve_tableau(&matcher, &scan, &geometry, &templates, &config, |_, _| {});

        // the planted glyph clears the ladder's first level, well before the
        // depths where flat background starts matching things
        assert_eq!(tableau.rank_at(1, 1), Some(Rank::Seven));
        match tableau.pile(1)[1].locator {
            Locator::Spot(spot) => assert_eq!(spot, crate::geometry::Point::new(256, 148)),
            other => panic!("expected a spot locator, got {other:?}"),
        }
        // cells whose boxes fall off the capture have no positions to score
        assert_eq!(tableau.rank_at(3, 12), Some(Rank::Unknown));
    }

    #[test]
    fn test_unresolved_cells_keep_their_search_region() {
        let templates = template_set();
        // capture too small for any cell box to fit a template: every cell
        // comes back unknown with its region preserved
        let capture = Capture::from_gray(GrayImage::from_pixel(4, 4, Luma([15])));
        let matcher = TemplateMatcher::new(&capture);
        let config = Config::default();

        let mut scan = RoughScan::default();
        scan.consider(Rank::Ace, Rect::new(0, 0, 2, 2));
        scan.consider(Rank::Two, Rect::new(300, 0, 2, 2));
        scan.consider(Rank::Three, Rect::new(0, 240, 2, 2));
        let geometry = GridGeometry::infer(&scan).unwrap();

        let mut rows_seen = 0;
        let tableau = resolve_tableau(
            &matcher,
            &scan,
            &geometry,
            &templates,
            &config,
            |_, _| rows_seen += 1,
        );

        assert_eq!(rows_seen, PILE_SIZE);
        assert_eq!(tableau.total_cards(), PILE_COUNT * PILE_SIZE);
        assert_eq!(tableau.unknown_cells(), PILE_COUNT * PILE_SIZE);
        for pile in 0..PILE_COUNT {
            for row in 0..PILE_SIZE {
                assert_eq!(tableau.rank_at(pile, row), Some(Rank::Unknown));
            }
        }
        // the retained region is the cell's search box
        let expected = geometry.cell_box(0, 0, &config);
        match tableau.pile(0)[0].locator {
            Locator::Region(region) => assert_eq!(region, expected),
            other => panic!("expected a region locator, got {other:?}"),
        }
    }
}
