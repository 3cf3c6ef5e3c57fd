// Game board, placement rules and the scoreboard

use crate::game::scores::ScoreTable;
use std::fmt::Write as _;
use thiserror::Error;

/// Empty cell kinds, fixed by the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    /// `o`: placement always scores
    Free,
    /// `.`: needs an adjacent letter
    Plain,
    /// `:`: needs an adjacent letter, scores double
    Double,
}

impl Terrain {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'o' => Some(Terrain::Free),
            '.' => Some(Terrain::Plain),
            ':' => Some(Terrain::Double),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Terrain::Free => 'o',
            Terrain::Plain => '.',
            Terrain::Double => ':',
        }
    }
}

/// Current contents of one board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty(Terrain),
    Letter(char),
}

impl Cell {
    pub fn as_char(self) -> char {
        match self {
            Cell::Empty(terrain) => terrain.as_char(),
            Cell::Letter(c) => c,
        }
    }

    pub fn is_letter(self) -> bool {
        matches!(self, Cell::Letter(_))
    }
}

/// Rectangular starting layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardTemplate {
    rows: Vec<Vec<Terrain>>,
    width: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("board must have at least one row and one column")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },
}

impl BoardTemplate {
    pub fn new(rows: Vec<Vec<Terrain>>) -> Result<Self, TemplateError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(TemplateError::Empty);
        }

        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(TemplateError::Ragged {
                    row,
                    found: cells.len(),
                    expected: width,
                });
            }
        }

        Ok(Self { rows, width })
    }

    /// Uniform board of a single terrain
    pub fn filled(height: usize, width: usize, terrain: Terrain) -> Result<Self, TemplateError> {
        Self::new(vec![vec![terrain; width]; height])
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn terrain(&self, row: usize, col: usize) -> Option<Terrain> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }
}

/// Index of a registered player, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(pub usize);

/// Why a placement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceError {
    #[error("position ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("cell already holds a letter")]
    Occupied,
    #[error("no adjacent letter")]
    NotAdjacent,
    #[error("'{0}' is not a playable letter")]
    UnknownLetter(char),
    #[error("unknown player")]
    UnknownPlayer,
}

#[derive(Debug, Clone)]
struct PlayerScore {
    name: String,
    score: u32,
}

/// Mutable board plus per-player scores.
///
/// All access from connection workers goes through one mutex; this type
/// itself does no locking.
#[derive(Debug, Clone)]
pub struct BoardState {
    template: BoardTemplate,
    cells: Vec<Vec<Cell>>,
    players: Vec<PlayerScore>,
}

impl BoardState {
    /// Build a board for the given players and reset it
    pub fn new(template: BoardTemplate, player_names: impl IntoIterator<Item = String>) -> Self {
        let players = player_names
            .into_iter()
            .map(|name| PlayerScore { name, score: 0 })
            .collect();

        let mut board = Self {
            cells: Vec::new(),
            template,
            players,
        };
        board.reset();
        board
    }

    /// Restore every cell from the template and zero all scores
    pub fn reset(&mut self) {
        self.cells = self
            .template
            .rows
            .iter()
            .map(|row| row.iter().map(|&t| Cell::Empty(t)).collect())
            .collect();

        for player in &mut self.players {
            player.score = 0;
        }
    }

    pub fn height(&self) -> usize {
        self.template.height()
    }

    pub fn width(&self) -> usize {
        self.template.width()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn score(&self, player: PlayerId) -> Option<u32> {
        self.players.get(player.0).map(|p| p.score)
    }

    /// Place `letter` at (`row`, `col`) for `player` and return the points
    /// awarded. Nothing changes on error.
    pub fn place(
        &mut self,
        scores: &ScoreTable,
        letter: char,
        row: usize,
        col: usize,
        player: PlayerId,
    ) -> Result<u32, PlaceError> {
        if player.0 >= self.players.len() {
            return Err(PlaceError::UnknownPlayer);
        }

        let value = scores.get(letter).ok_or(PlaceError::UnknownLetter(letter))?;

        let terrain = match self.cell(row, col) {
            None => return Err(PlaceError::OutOfBounds { row, col }),
            Some(Cell::Letter(_)) => return Err(PlaceError::Occupied),
            Some(Cell::Empty(terrain)) => terrain,
        };

        let awarded = match terrain {
            Terrain::Free => value,
            Terrain::Plain | Terrain::Double => {
                if !self.has_adjacent_letter(row, col) {
                    return Err(PlaceError::NotAdjacent);
                }
                if terrain == Terrain::Double {
                    value * 2
                } else {
                    value
                }
            }
        };

        self.cells[row][col] = Cell::Letter(letter);
        self.players[player.0].score += awarded;

        Ok(awarded)
    }

    fn has_adjacent_letter(&self, row: usize, col: usize) -> bool {
        let up = row.checked_sub(1).map(|r| (r, col));
        let down = Some((row + 1, col));
        let left = col.checked_sub(1).map(|c| (row, c));
        let right = Some((row, col + 1));

        [up, down, left, right]
            .into_iter()
            .flatten()
            .any(|(r, c)| self.cell(r, c).is_some_and(Cell::is_letter))
    }

    /// Grid rows, then one `name: score` line per player
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width() + 1) * self.height());

        for row in &self.cells {
            out.extend(row.iter().map(|c| c.as_char()));
            out.push('\n');
        }

        for player in &self.players {
            let _ = writeln!(out, "{}: {}", player.name, player.score);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: PlayerId = PlayerId(0);
    const BOB: PlayerId = PlayerId(1);

    fn board(rows: &[&str]) -> BoardState {
        let rows = rows
            .iter()
            .map(|r| r.chars().map(|c| Terrain::from_char(c).unwrap()).collect())
            .collect();
        BoardState::new(
            BoardTemplate::new(rows).unwrap(),
            ["alice".to_string(), "bob".to_string()],
        )
    }

    #[test]
    fn test_free_cell_scores_unconditionally() {
        let mut b = board(&["ooo", "ooo"]);
        let table = ScoreTable::standard();

        assert_eq!(b.place(&table, 'z', 1, 2, ALICE), Ok(10));
        assert_eq!(b.cell(1, 2), Some(Cell::Letter('z')));
        assert_eq!(b.score(ALICE), Some(10));
    }

    #[test]
    fn test_occupied_cell_rejected() {
        let mut b = board(&["oo"]);
        let table = ScoreTable::standard();

        assert!(b.place(&table, 'a', 0, 0, ALICE).is_ok());
        assert_eq!(b.place(&table, 'b', 0, 0, BOB), Err(PlaceError::Occupied));
        assert_eq!(b.cell(0, 0), Some(Cell::Letter('a')));
        assert_eq!(b.score(BOB), Some(0));
    }

    #[test]
    fn test_placing_o_on_free_cell_counts_as_letter() {
        let mut b = board(&["o."]);
        let table = ScoreTable::standard();

        assert_eq!(b.place(&table, 'o', 0, 0, ALICE), Ok(1));
        assert_eq!(b.place(&table, 'o', 0, 0, ALICE), Err(PlaceError::Occupied));
        assert_eq!(b.place(&table, 'a', 0, 1, ALICE), Ok(1));
    }

    #[test]
    fn test_plain_cell_needs_neighbor() {
        let mut b = board(&["...", "...", "..."]);
        let table = ScoreTable::standard();

        assert_eq!(b.place(&table, 'a', 1, 1, ALICE), Err(PlaceError::NotAdjacent));
        assert_eq!(b.cell(1, 1), Some(Cell::Empty(Terrain::Plain)));
        assert_eq!(b.score(ALICE), Some(0));
    }

    #[test]
    fn test_each_direction_counts_as_adjacent() {
        let table = ScoreTable::standard();
        for (r, c) in [(0, 1), (2, 1), (1, 0), (1, 2)] {
            let mut rows = vec![vec![Terrain::Plain; 3]; 3];
            rows[r][c] = Terrain::Free;
            let mut b = BoardState::new(BoardTemplate::new(rows).unwrap(), ["alice".to_string()]);

            b.place(&table, 'x', r, c, ALICE).unwrap();
            assert_eq!(b.place(&table, 'a', 1, 1, ALICE), Ok(1), "neighbor at ({r}, {c})");
        }
    }

    #[test]
    fn test_diagonal_is_not_adjacent() {
        let mut b = board(&["o..", "...", "..."]);
        let table = ScoreTable::standard();

        b.place(&table, 'x', 0, 0, ALICE).unwrap();
        assert_eq!(b.place(&table, 'a', 1, 1, ALICE), Err(PlaceError::NotAdjacent));
    }

    #[test]
    fn test_free_terrain_is_not_a_neighbor_letter() {
        let mut b = board(&["o."]);
        let table = ScoreTable::standard();

        assert_eq!(b.place(&table, 'a', 0, 1, ALICE), Err(PlaceError::NotAdjacent));
    }

    #[test]
    fn test_double_cell_doubles_award() {
        let mut b = board(&["o.", "o:"]);
        let table = ScoreTable::standard();

        b.place(&table, 'x', 0, 0, ALICE).unwrap();
        b.place(&table, 'x', 1, 0, ALICE).unwrap();

        assert_eq!(b.place(&table, 'k', 0, 1, BOB), Ok(5));
        // (1, 1) now has letters to the left and above
        assert_eq!(b.place(&table, 'k', 1, 1, BOB), Ok(10));
        assert_eq!(b.score(BOB), Some(15));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut b = board(&["oo", "oo"]);
        let table = ScoreTable::standard();

        assert_eq!(
            b.place(&table, 'a', 2, 0, ALICE),
            Err(PlaceError::OutOfBounds { row: 2, col: 0 })
        );
        assert_eq!(
            b.place(&table, 'a', 0, 2, ALICE),
            Err(PlaceError::OutOfBounds { row: 0, col: 2 })
        );
        assert_eq!(b.render(), "oo\noo\nalice: 0\nbob: 0\n");
    }

    #[test]
    fn test_edge_cells_check_neighbors_in_bounds_only() {
        let mut b = board(&["o.", ".."]);
        let table = ScoreTable::standard();

        b.place(&table, 'a', 0, 0, ALICE).unwrap();
        assert_eq!(b.place(&table, 'b', 1, 0, ALICE), Ok(3));
        assert_eq!(b.place(&table, 'c', 1, 1, ALICE), Ok(3));
        assert_eq!(b.place(&table, 'd', 0, 1, ALICE), Ok(2));
    }

    #[test]
    fn test_unknown_letter() {
        let mut b = board(&["o"]);
        let table = ScoreTable::standard();

        assert_eq!(
            b.place(&table, 'A', 0, 0, ALICE),
            Err(PlaceError::UnknownLetter('A'))
        );
        assert_eq!(b.cell(0, 0), Some(Cell::Empty(Terrain::Free)));
    }

    #[test]
    fn test_unknown_player() {
        let mut b = board(&["o"]);
        let table = ScoreTable::standard();

        assert_eq!(
            b.place(&table, 'a', 0, 0, PlayerId(7)),
            Err(PlaceError::UnknownPlayer)
        );
    }

    #[test]
    fn test_render_and_reset() {
        let mut b = board(&["o.:", "..."]);
        let table = ScoreTable::standard();

        b.place(&table, 'q', 0, 0, BOB).unwrap();
        assert_eq!(b.render(), "q.:\n...\nalice: 0\nbob: 10\n");

        b.reset();
        assert_eq!(b.render(), "o.:\n...\nalice: 0\nbob: 0\n");
    }

    #[test]
    fn test_template_validation() {
        assert_eq!(BoardTemplate::new(vec![]), Err(TemplateError::Empty));
        assert_eq!(BoardTemplate::new(vec![vec![]]), Err(TemplateError::Empty));
        assert_eq!(
            BoardTemplate::new(vec![vec![Terrain::Free; 2], vec![Terrain::Free; 3]]),
            Err(TemplateError::Ragged {
                row: 1,
                found: 3,
                expected: 2
            })
        );

        let t = BoardTemplate::filled(3, 4, Terrain::Plain).unwrap();
        assert_eq!((t.height(), t.width()), (3, 4));
        assert_eq!(t.terrain(2, 3), Some(Terrain::Plain));
        assert_eq!(t.terrain(3, 0), None);
    }
}
