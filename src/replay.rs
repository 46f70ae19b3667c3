//! Replay of the solver's move sequence against the recognized layout.
//!
//! The solver names piles, not cards: each pile token means "take the
//! current top card of that pile". Walking the sequence pops recognized
//! observations off the layout, which both yields the click location and
//! keeps the layout synchronized so the next move for the same pile finds
//! the card underneath.

use crate::error::ProtocolError;
use crate::geometry::Point;
use crate::solver::MoveToken;
use crate::tableau::{Rank, Tableau};

/// One pointer instruction derived from one move token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Click the recognized location of the card just taken from `pile`.
    Card {
        pile: usize,
        rank: Rank,
        target: Point,
    },
    /// Click the draw control.
    Draw,
}

/// Iterator over the click actions of a move sequence.
///
/// A pile token against an already-empty pile means the solver's line and
/// the recognized layout have diverged; the error names the offending move
/// and the iterator stops, since every later click would land on the wrong
/// card anyway.
pub struct Replayer<'a> {
    tableau: &'a mut Tableau,
    moves: &'a [MoveToken],
    next: usize,
}

impl<'a> Replayer<'a> {
    pub fn new(tableau: &'a mut Tableau, moves: &'a [MoveToken]) -> Self {
        Self {
            tableau,
            moves,
            next: 0,
        }
    }
}

impl Iterator for Replayer<'_> {
    type Item = Result<ClickAction, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = *self.moves.get(self.next)?;
        let move_index = self.next;
        self.next += 1;

        Some(match token {
            MoveToken::Draw => Ok(ClickAction::Draw),
            MoveToken::Pile(pile) => match self.tableau.pop_top(pile) {
                Some(card) => Ok(ClickAction::Card {
                    pile,
                    rank: card.rank,
                    target: card.locator.click_point(),
                }),
                None => {
                    self.next = self.moves.len();
                    Err(ProtocolError::EmptyPile { pile, move_index })
                }
            },
        })
    }
}
