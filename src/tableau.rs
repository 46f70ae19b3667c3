//! Domain model for the recognized card layout.
//!
//! The deal is always 4 piles of 13 cards. Piles grow downward on screen,
//! so index 0 of a pile is the bottom-most (first dealt) card and the last
//! entry is the currently accessible top card.

use std::fmt;

use crate::geometry::{Point, Rect};

/// Number of piles across the layout.
pub const PILE_COUNT: usize = 4;

/// Cards dealt to each pile.
pub const PILE_SIZE: usize = 13;

/// Distinct card face values.
pub const RANK_COUNT: usize = 13;

/// A card face value as read off the screen.
///
/// `Unknown` is a legitimate domain value: a cell the recognizer could not
/// resolve, left for the operator to fill in. It is distinct from the
/// "no match" results the matching layer reports as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Rank {
    Unknown = 0,
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
}

impl Rank {
    /// The 13 real ranks in ascending value order. Every scan enumerates
    /// ranks in this order, which is what makes tie-breaks deterministic.
    pub const ORDERED: [Rank; RANK_COUNT] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Rank::Unknown),
            1 => Some(Rank::Ace),
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            _ => None,
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    pub const fn is_unknown(self) -> bool {
        matches!(self, Rank::Unknown)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Where a card lives on the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// The search box retained for a cell no template matched. Clicking its
    /// center still lands on the card the cell must contain.
    Region(Rect),
    /// Center of the matched glyph, ready to click.
    Spot(Point),
}

impl Locator {
    /// The point automation should click for this card.
    pub fn click_point(&self) -> Point {
        match self {
            Locator::Region(rect) => rect.center(),
            Locator::Spot(point) => *point,
        }
    }
}

/// One recognized cell. The correction loop rewrites `rank` in place; the
/// locator keeps the original recognition evidence either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardObservation {
    pub rank: Rank,
    pub locator: Locator,
}

/// One pile, bottom card first.
pub type Pile = Vec<CardObservation>;

/// The recognized 4-pile layout for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tableau {
    piles: [Pile; PILE_COUNT],
}

impl Tableau {
    pub fn new() -> Self {
        Self {
            piles: std::array::from_fn(|_| Vec::with_capacity(PILE_SIZE)),
        }
    }

    pub fn from_piles(piles: [Pile; PILE_COUNT]) -> Self {
        Self { piles }
    }

    /// Append an observation to `pile`. The resolver deals cells row by row,
    /// so rows end up stacked bottom-to-top within each pile.
    pub fn push(&mut self, pile: usize, observation: CardObservation) {
        self.piles[pile].push(observation);
    }

    pub fn pile(&self, pile: usize) -> &[CardObservation] {
        &self.piles[pile]
    }

    pub fn pile_len(&self, pile: usize) -> usize {
        self.piles.get(pile).map_or(0, Vec::len)
    }

    pub fn rank_at(&self, pile: usize, row: usize) -> Option<Rank> {
        self.piles.get(pile)?.get(row).map(|card| card.rank)
    }

    /// Overwrite the rank of one cell. Returns false when the cell does not
    /// exist, leaving the layout untouched.
    pub fn set_rank(&mut self, pile: usize, row: usize, rank: Rank) -> bool {
        match self.piles.get_mut(pile).and_then(|p| p.get_mut(row)) {
            Some(card) => {
                card.rank = rank;
                true
            }
            None => false,
        }
    }

    /// Remove and return the top (last pushed) card of `pile`.
    pub fn pop_top(&mut self, pile: usize) -> Option<CardObservation> {
        self.piles.get_mut(pile)?.pop()
    }

    pub fn total_cards(&self) -> usize {
        self.piles.iter().map(Vec::len).sum()
    }

    pub fn unknown_cells(&self) -> usize {
        self.piles
            .iter()
            .flatten()
            .filter(|card| card.rank.is_unknown())
            .count()
    }

    /// Render the layout as 13 rows of 4 two-digit right-aligned rank
    /// values, columns separated by a single space. Cells past the end of a
    /// shortened pile render blank.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in 0..PILE_SIZE {
            for pile in 0..PILE_COUNT {
                if pile > 0 {
                    out.push(' ');
                }
                match self.rank_at(pile, row) {
                    Some(rank) => out.push_str(&format!("{:>2}", rank.value())),
                    None => out.push_str("  "),
                }
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Tableau {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(rank: Rank) -> CardObservation {
        CardObservation {
            rank,
            locator: Locator::Spot(Point::new(0, 0)),
        }
    }

    fn full_tableau() -> Tableau {
        let mut tableau = Tableau::new();
        for row in 0..PILE_SIZE {
            for pile in 0..PILE_COUNT {
                let value = ((row + pile * 5) % RANK_COUNT) as u8 + 1;
                let rank = Rank::from_value(value).unwrap();
                tableau.push(pile, observation(rank));
            }
        }
        tableau
    }

    #[test]
    fn test_rank_value_round_trip() {
        for value in 0..=13u8 {
            let rank = Rank::from_value(value).unwrap();
            assert_eq!(rank.value(), value);
        }
        assert_eq!(Rank::from_value(14), None);
        assert_eq!(Rank::from_value(255), None);
    }

    #[test]
    fn test_ordered_covers_every_real_rank_ascending() {
        assert_eq!(Rank::ORDERED.len(), RANK_COUNT);
        for (i, rank) in Rank::ORDERED.iter().enumerate() {
            assert_eq!(rank.value() as usize, i + 1);
            assert!(!rank.is_unknown());
        }
    }

    #[test]
    fn test_click_point_prefers_match_center() {
        let spot = Locator::Spot(Point::new(42, 99));
        assert_eq!(spot.click_point(), Point::new(42, 99));
        let region = Locator::Region(Rect::new(10, 20, 30, 40));
        assert_eq!(region.click_point(), Point::new(25, 40));
    }

    #[test]
    fn test_set_rank_rewrites_only_the_target_cell() {
        let mut tableau = full_tableau();
        let before = tableau.clone();
        assert!(tableau.set_rank(2, 7, Rank::King));
        assert_eq!(tableau.rank_at(2, 7), Some(Rank::King));
        for pile in 0..PILE_COUNT {
            for row in 0..PILE_SIZE {
                if (pile, row) != (2, 7) {
                    assert_eq!(tableau.rank_at(pile, row), before.rank_at(pile, row));
                }
            }
        }
    }

    #[test]
    fn test_set_rank_rejects_missing_cells() {
        let mut tableau = Tableau::new();
        tableau.push(0, observation(Rank::Ace));
        assert!(!tableau.set_rank(0, 1, Rank::Two));
        assert!(!tableau.set_rank(4, 0, Rank::Two));
        assert_eq!(tableau.rank_at(0, 0), Some(Rank::Ace));
    }

    #[test]
    fn test_pop_top_returns_last_pushed_card() {
        let mut tableau = Tableau::new();
        tableau.push(1, observation(Rank::Ace));
        tableau.push(1, observation(Rank::Nine));
        let top = tableau.pop_top(1).unwrap();
        assert_eq!(top.rank, Rank::Nine);
        assert_eq!(tableau.pile_len(1), 1);
        assert!(tableau.pop_top(3).is_none());
    }

    #[test]
    fn test_render_right_aligns_two_digit_cells() {
        let tableau = full_tableau();
        let rendered = tableau.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), PILE_SIZE);
        // row 0 holds piles 0..4 -> values 1, 6, 11, 3
        assert_eq!(lines[0], " 1  6 11  3");
        for line in &lines {
            assert_eq!(line.len(), PILE_COUNT * 2 + (PILE_COUNT - 1));
        }
    }

    #[test]
    fn test_render_blanks_missing_cells() {
        let mut tableau = Tableau::new();
        tableau.push(0, observation(Rank::Queen));
        let first_line = tableau.render().lines().next().unwrap().to_string();
        assert_eq!(first_line, "12         ");
    }
}
