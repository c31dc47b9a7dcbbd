pub mod board;
pub mod protocol;
pub mod robots;
pub mod session;
pub mod slide;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::board::{
        Board, Position, WALL_BOTTOM, WALL_LEFT, WALL_RIGHT, WALL_TOP,
    };
    use crate::robots::{Robot, RobotColor, RobotSet};

    /// Row-major masks for a `size × size` board with explicit border walls
    /// and an open interior, the layout most fixtures start from.
    pub fn bordered_rows(size: usize) -> Vec<Vec<u8>> {
        let mut rows = vec![vec![0u8; size]; size];
        for (row, masks) in rows.iter_mut().enumerate() {
            for (column, mask) in masks.iter_mut().enumerate() {
                if row == 0 {
                    *mask |= WALL_TOP;
                }
                if row == size - 1 {
                    *mask |= WALL_BOTTOM;
                }
                if column == 0 {
                    *mask |= WALL_LEFT;
                }
                if column == size - 1 {
                    *mask |= WALL_RIGHT;
                }
            }
        }
        rows
    }

    /// Board with no goals from row-major masks.
    pub fn board_from_rows(rows: &[Vec<u8>]) -> Board {
        Board::from_rows(rows, vec![]).expect("test board must be valid")
    }

    /// Robot set at the given `(color, row, column)` cells.
    pub fn robots_at(robots: &[(RobotColor, usize, usize)]) -> RobotSet {
        robots
            .iter()
            .map(|&(color, row, column)| Robot {
                color,
                position: Position::new(row, column),
            })
            .collect()
    }
}
