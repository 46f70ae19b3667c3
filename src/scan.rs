//! Whole-capture scan that seeds the pile grid.
//!
//! Every rank template is matched over the full capture at one fixed
//! confidence. The detections drive grid inference, so this pass cares
//! about clean positions, not about covering all 52 cells; misses here are
//! recovered later by the per-cell search.

use tracing::debug;

use crate::config::Config;
use crate::geometry::Rect;
use crate::matcher::TemplateMatcher;
use crate::tableau::{Rank, PILE_COUNT, RANK_COUNT};
use crate::templates::TemplateSet;

/// Accepted detections per rank, in the order the scan produced them.
/// Built once per capture, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoughScan {
    by_rank: [Vec<Rect>; RANK_COUNT],
}

impl RoughScan {
    /// Match every rank over the whole capture and keep at most
    /// `PILE_COUNT` clean detections per rank.
    pub fn run(matcher: &TemplateMatcher, templates: &TemplateSet, config: &Config) -> Self {
        let mut scan = RoughScan::default();

        for rank in Rank::ORDERED {
            let hits = matcher.locate_all(templates.rank(rank), config.rough_confidence);
            let candidates = hits.len();
            for hit in hits {
                scan.consider(rank, hit);
            }
            debug!(
                rank = rank.value(),
                candidates,
                kept = scan.detections(rank).len(),
                "rough scan pass"
            );
        }

        // Capping runs after every rank has scanned, so the Queen pass above
        // saw the full Ten list rather than a truncated one.
        for rank in Rank::ORDERED {
            scan.cap_rank(rank);
        }

        scan
    }

    /// Accept `detection` unless it overlaps a detection already accepted
    /// for the same rank (template matching reports near-duplicate hits a
    /// pixel or two apart), or, for Queens, an accepted Ten: the Q glyph
    /// reads as the 0 of 10 at matching confidence.
    pub(crate) fn consider(&mut self, rank: Rank, detection: Rect) {
        if self
            .detections(rank)
            .iter()
            .any(|kept| kept.overlaps(&detection))
        {
            return;
        }
        if rank == Rank::Queen
            && self
                .detections(Rank::Ten)
                .iter()
                .any(|ten| ten.overlaps(&detection))
        {
            return;
        }
        self.by_rank[Self::index(rank)].push(detection);
    }

    /// Shrink a rank's list to at most `PILE_COUNT` entries by repeatedly
    /// dropping every detection at the current maximum `top`. Ranks whose
    /// glyphs also read upside-down (6/9, 8, 10) collect phantom hits low
    /// in the layout, while true hits sit higher. Each pass can drop
    /// several ties at once; residual misreads are the correction loop's
    /// problem, not this one's.
    pub(crate) fn cap_rank(&mut self, rank: Rank) {
        let list = &mut self.by_rank[Self::index(rank)];
        while list.len() > PILE_COUNT {
            match list.iter().map(|r| r.top).max() {
                Some(max_top) => list.retain(|r| r.top != max_top),
                None => break,
            }
        }
    }

    pub fn detections(&self, rank: Rank) -> &[Rect] {
        &self.by_rank[Self::index(rank)]
    }

    /// Every accepted detection, all ranks flattened.
    pub fn all(&self) -> impl Iterator<Item = Rect> + '_ {
        self.by_rank.iter().flatten().copied()
    }

    pub fn total(&self) -> usize {
        self.by_rank.iter().map(Vec::len).sum()
    }

    fn index(rank: Rank) -> usize {
        debug_assert!(!rank.is_unknown());
        rank.value() as usize - 1
    }
}

impl Default for RoughScan {
    fn default() -> Self {
        Self {
            by_rank: std::array::from_fn(|_| Vec::new()),
        }
    }
}
