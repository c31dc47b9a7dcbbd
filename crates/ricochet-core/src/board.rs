use serde::{Deserialize, Serialize};

use crate::robots::RobotColor;

/// Wall on the top side of a cell.
pub const WALL_TOP: u8 = 1;
/// Wall on the right side of a cell.
pub const WALL_RIGHT: u8 = 2;
/// Wall on the bottom side of a cell.
pub const WALL_BOTTOM: u8 = 4;
/// Wall on the left side of a cell.
pub const WALL_LEFT: u8 = 8;
/// A cell walled on all four sides is decorative and never holds a robot.
pub const BLOCKED: u8 = WALL_TOP | WALL_RIGHT | WALL_BOTTOM | WALL_LEFT;

/// One of the four slide directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// The wall bit a robot runs into when moving in this direction.
    pub fn wall_bit(self) -> u8 {
        match self {
            Self::Up => WALL_TOP,
            Self::Right => WALL_RIGHT,
            Self::Down => WALL_BOTTOM,
            Self::Left => WALL_LEFT,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }
}

/// A cell coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A goal cell a robot of the matching color must reach.
/// `number` is the linear (row-major) index of the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Goal {
    pub color: RobotColor,
    pub number: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BoardError {
    Empty,
    NotSquare { rows: usize, columns: usize },
    BadMask { row: usize, column: usize, mask: u8 },
    GoalOutOfBounds { number: usize, cell_count: usize },
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "board has no cells"),
            Self::NotSquare { rows, columns } => {
                write!(f, "board must be square, got {rows}x{columns}")
            },
            Self::BadMask { row, column, mask } => {
                write!(f, "wall mask {mask} at ({row}, {column}) exceeds 15")
            },
            Self::GoalOutOfBounds { number, cell_count } => {
                write!(f, "goal cell {number} outside board of {cell_count} cells")
            },
        }
    }
}

impl std::error::Error for BoardError {}

/// Immutable grid of wall masks plus the goal list.
///
/// The grid is stored row-major; a column-major transpose is derived at
/// construction so vertical slide scans read a contiguous slice, the same
/// way horizontal scans read a row. Goal-index math assumes a square board,
/// so non-square input is rejected outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<u8>,
    transposed: Vec<u8>,
    goals: Vec<Goal>,
}

impl Board {
    /// Build a board from row-major rows of wall masks, as delivered on the
    /// wire by `start_new_game`.
    pub fn from_rows(rows: &[Vec<u8>], goals: Vec<Goal>) -> Result<Self, BoardError> {
        let size = rows.len();
        if size == 0 {
            return Err(BoardError::Empty);
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, masks) in rows.iter().enumerate() {
            if masks.len() != size {
                return Err(BoardError::NotSquare {
                    rows: size,
                    columns: masks.len(),
                });
            }
            for (column, &mask) in masks.iter().enumerate() {
                if mask > BLOCKED {
                    return Err(BoardError::BadMask { row, column, mask });
                }
                cells.push(mask);
            }
        }
        for goal in &goals {
            if goal.number >= cells.len() {
                return Err(BoardError::GoalOutOfBounds {
                    number: goal.number,
                    cell_count: cells.len(),
                });
            }
        }

        let mut transposed = vec![0u8; cells.len()];
        for row in 0..size {
            for column in 0..size {
                transposed[column * size + row] = cells[row * size + column];
            }
        }

        Ok(Self {
            size,
            cells,
            transposed,
            goals,
        })
    }

    /// Side length of the (square) board.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// The stored 4-bit wall mask of a cell. Board-edge walls are not part
    /// of the mask; use [`Board::has_wall`] for the effective walls.
    pub fn wall_mask(&self, row: usize, column: usize) -> u8 {
        self.cells[row * self.size + column]
    }

    /// Row-major slice of one row's masks, used by horizontal slide scans.
    pub fn row(&self, row: usize) -> &[u8] {
        &self.cells[row * self.size..(row + 1) * self.size]
    }

    /// Column-major slice of one column's masks, used by vertical slide
    /// scans; indexed by row.
    pub fn column(&self, column: usize) -> &[u8] {
        &self.transposed[column * self.size..(column + 1) * self.size]
    }

    /// Whether the cell has a wall on the given side, either stored in its
    /// mask or implied by the board edge.
    pub fn has_wall(&self, row: usize, column: usize, direction: Direction) -> bool {
        if self.wall_mask(row, column) & direction.wall_bit() != 0 {
            return true;
        }
        match direction {
            Direction::Up => row == 0,
            Direction::Right => column == self.size - 1,
            Direction::Down => row == self.size - 1,
            Direction::Left => column == 0,
        }
    }

    /// A fully-walled cell never holds a robot and can never be crossed.
    pub fn is_blocked(&self, row: usize, column: usize) -> bool {
        self.wall_mask(row, column) == BLOCKED
    }

    /// The cell adjacent to `position` in the given direction, if it exists.
    pub fn neighbor(&self, position: Position, direction: Direction) -> Option<Position> {
        let Position { row, column } = position;
        match direction {
            Direction::Up if row > 0 => Some(Position::new(row - 1, column)),
            Direction::Right if column + 1 < self.size => Some(Position::new(row, column + 1)),
            Direction::Down if row + 1 < self.size => Some(Position::new(row + 1, column)),
            Direction::Left if column > 0 => Some(Position::new(row, column - 1)),
            _ => None,
        }
    }

    /// Board coordinates of a goal's cell.
    pub fn goal_coordinates(&self, goal: &Goal) -> Position {
        Position::new(goal.number / self.size, goal.number % self.size)
    }

    /// Unique id of a goal instance, used for completion tracking.
    pub fn goal_id(&self, goal: &Goal) -> String {
        format!("{}_{}", goal.color, goal.number)
    }
}
