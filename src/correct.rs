//! Operator correction of the recognized layout.
//!
//! Recognition is not trusted blindly: before anything is handed to the
//! solver, the grid is shown and the operator may overwrite any cell. A
//! solver fed one wrong rank produces a line of moves that wrecks the game,
//! so this checkpoint is mandatory, not optional.

use std::io::{self, BufRead, Write};

use crate::error::CorrectionError;
use crate::tableau::{Rank, Tableau, PILE_COUNT, PILE_SIZE};

/// One line of the correction protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Accept the grid as rendered.
    Accept,
    /// Overwrite one cell's rank.
    Set { pile: usize, row: usize, rank: Rank },
}

/// Parse one input line. A blank line accepts; anything else must be
/// `<pile> <row> <rank>`, whitespace separated, with rank 0 meaning
/// unknown.
pub fn parse_command(line: &str) -> Result<Command, CorrectionError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Command::Accept);
    }

    let mut parts = trimmed.split_whitespace();
    let (Some(pile), Some(row), Some(rank), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CorrectionError::Malformed(trimmed.to_string()));
    };

    let pile: i64 = pile
        .parse()
        .map_err(|_| CorrectionError::Malformed(trimmed.to_string()))?;
    let row: i64 = row
        .parse()
        .map_err(|_| CorrectionError::Malformed(trimmed.to_string()))?;
    let rank: i64 = rank
        .parse()
        .map_err(|_| CorrectionError::Malformed(trimmed.to_string()))?;

    if !(0..PILE_COUNT as i64).contains(&pile) {
        return Err(CorrectionError::PileOutOfRange(pile));
    }
    if !(0..PILE_SIZE as i64).contains(&row) {
        return Err(CorrectionError::RowOutOfRange(row));
    }
    let rank = u8::try_from(rank)
        .ok()
        .and_then(Rank::from_value)
        .ok_or(CorrectionError::RankOutOfRange(rank))?;

    Ok(Command::Set {
        pile: pile as usize,
        row: row as usize,
        rank,
    })
}

/// Render the grid and apply corrections until the operator accepts.
///
/// Generic over the streams so tests can script a whole session. A
/// rejected line re-prompts with the unchanged grid; end of input counts
/// as acceptance since nothing further can arrive.
pub fn run_correction_loop<R: BufRead, W: Write>(
    tableau: &mut Tableau,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    loop {
        write!(output, "\n{}", tableau.render())?;
        write!(
            output,
            "Correct a cell with `<pile> <row> <rank>`, or press enter to accept: "
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        match parse_command(&line) {
            Ok(Command::Accept) => return Ok(()),
            Ok(Command::Set { pile, row, rank }) => {
                if !tableau.set_rank(pile, row, rank) {
                    writeln!(output, "No card at pile {pile}, row {row}")?;
                }
            }
            Err(err) => {
                writeln!(output, "{err}")?;
            }
        }
    }
}
