//! External solver protocol.
//!
//! The solver is a separate executable speaking a line protocol: 52 decimal
//! ranks on stdin (pile-major, bottom card first), a whitespace-separated
//! move sequence on stdout. Moves are pile indices, with `-` meaning
//! "advance the stock". This module owns both directions of that protocol
//! plus the bounded subprocess invocation.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};
use tracing::{debug, warn};

use crate::error::{ProtocolError, SolverError};
use crate::tableau::{Rank, Tableau, PILE_COUNT, PILE_SIZE};

/// One unit of the solver's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveToken {
    /// Take the current top card of this pile.
    Pile(usize),
    /// Advance the stock.
    Draw,
}

/// Serialize the recognized grid for the solver: one rank value per line,
/// piles in order, each pile bottom card first. Unknown cells serialize as
/// 0, which the solver rejects; the correction loop exists to prevent that.
pub fn serialize_tableau(tableau: &Tableau) -> String {
    let mut out = String::new();
    for pile in 0..PILE_COUNT {
        for card in tableau.pile(pile) {
            out.push_str(&card.rank.value().to_string());
            out.push('\n');
        }
    }
    out
}

/// Parse a full 52-line rank stream back into per-pile rank lists, the
/// inverse of `serialize_tableau` on a complete grid.
pub fn parse_ranks(stream: &str) -> Result<Vec<Vec<Rank>>, ProtocolError> {
    let mut ranks = Vec::with_capacity(PILE_COUNT * PILE_SIZE);
    for line in stream.lines() {
        let value: u8 = line
            .trim()
            .parse()
            .map_err(|_| ProtocolError::InvalidRank(line.to_string()))?;
        let rank = Rank::from_value(value)
            .ok_or_else(|| ProtocolError::InvalidRank(line.to_string()))?;
        ranks.push(rank);
    }
    if ranks.len() != PILE_COUNT * PILE_SIZE {
        return Err(ProtocolError::GridLength {
            lines: ranks.len(),
            expected: PILE_COUNT * PILE_SIZE,
        });
    }
    Ok(ranks.chunks_exact(PILE_SIZE).map(<[Rank]>::to_vec).collect())
}

/// Tokenize the solver's move sequence: whitespace-separated pile indices
/// or `-`.
pub fn parse_moves(output: &str) -> Result<Vec<MoveToken>, ProtocolError> {
    output
        .split_whitespace()
        .map(|token| match token {
            "-" => Ok(MoveToken::Draw),
            _ => token
                .parse::<usize>()
                .ok()
                .filter(|pile| *pile < PILE_COUNT)
                .map(MoveToken::Pile)
                .ok_or_else(|| ProtocolError::InvalidToken(token.to_string())),
        })
        .collect()
}

/// Run the solver over `input` with a hard deadline.
///
/// stdout and stderr are drained on watcher threads so a chatty solver can
/// never deadlock on a full pipe, and so the wait on stdout can be bounded.
/// Hitting the deadline kills the child. Solving is deterministic, so
/// there is no retry.
pub fn run_solver(path: &str, input: &str, timeout: Duration) -> Result<String, SolverError> {
    let mut child = Command::new(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| SolverError::Spawn {
            path: path.to_string(),
            source,
        })?;

    // The grid is tiny, far below pipe capacity, so this write cannot
    // block. Dropping the handle closes the pipe and the solver sees EOF.
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(SolverError::Stdin)?;
    }

    let stdout_rx = drain_pipe(child.stdout.take());
    let stderr_rx = drain_pipe(child.stderr.take());

    debug!(path, timeout_secs = timeout.as_secs(), "waiting for solver");
    let collected = match stdout_rx.recv_timeout(timeout) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(path, "solver deadline hit, killing it");
            kill_and_reap(&mut child);
            return Err(SolverError::Timeout(timeout.as_secs()));
        }
    };

    let status = child.wait().map_err(SolverError::Collect)?;
    if !status.success() {
        let stderr = stderr_rx
            .recv_timeout(Duration::from_secs(1))
            .unwrap_or_default();
        return Err(SolverError::Exit {
            status,
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    String::from_utf8(collected).map_err(|_| SolverError::OutputEncoding)
}

/// Read a child pipe to EOF on its own thread, delivering the bytes over a
/// channel so the caller can wait with a timeout.
fn drain_pipe<P: Read + Send + 'static>(pipe: Option<P>) -> Receiver<Vec<u8>> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            // a read error mid-stream just truncates the answer; the
            // protocol parser rejects whatever remains
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
