// Text command protocol spoken inside the encrypted session

use crate::game::board::{BoardState, PlayerId};
use crate::game::scores::ScoreTable;

/// Reply sent for anything that is not a valid, successful command
pub const INVALID_REPLY: &str = "Invalid Command\n";

/// Command that ends the session; handled by the connection loop, not `Command`
pub const EXIT_COMMAND: &str = "exit";

/// A parsed client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Board,
    Place { letter: char, row: usize, col: usize },
    Invalid,
}

impl Command {
    /// Parse one decrypted request line
    pub fn parse(request: &str) -> Self {
        if request == "board" {
            return Command::Board;
        }

        let tokens: Vec<&str> = request.split(' ').collect();
        if tokens.len() != 4 || tokens[0] != "place" {
            return Command::Invalid;
        }

        let mut letter = tokens[1].chars();
        let letter = match (letter.next(), letter.next()) {
            (Some(c), None) => c,
            _ => return Command::Invalid,
        };

        match (tokens[2].parse::<usize>(), tokens[3].parse::<usize>()) {
            (Ok(row), Ok(col)) => Command::Place { letter, row, col },
            _ => Command::Invalid,
        }
    }

    /// Apply the command to the board and produce the reply text.
    ///
    /// The caller must hold the board lock for the whole call and until the
    /// reply has been sent.
    pub fn execute(&self, board: &mut BoardState, scores: &ScoreTable, player: PlayerId) -> String {
        match *self {
            Command::Board => board.render(),
            Command::Place { letter, row, col } => {
                match board.place(scores, letter, row, col, player) {
                    Ok(points) => format!("{} points\n", points),
                    Err(e) => {
                        tracing::debug!("Placement rejected: {}", e);
                        INVALID_REPLY.to_string()
                    }
                }
            }
            Command::Invalid => INVALID_REPLY.to_string(),
        }
    }
}
