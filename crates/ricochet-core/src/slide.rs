//! Slide legality: a robot moves in a straight line and may only stop where
//! a wall or another robot would physically stop it. Rather than simulating
//! the slide, the checks verify that the requested destination is exactly
//! the cell where the slide would come to rest.

use crate::board::{Board, Direction, Position};
use crate::robots::RobotSet;

/// Whether any robot currently sits at the cell.
pub fn cell_occupied(robots: &RobotSet, position: Position) -> bool {
    robots.occupied(position)
}

/// Decide whether a robot may slide from `from` to `to`.
///
/// Legal iff the start cell has no wall on the exit side, every cell passed
/// through is free of robots and of walls along the slide axis, and the
/// destination is a genuine stopping point: robot-free, and backed by either
/// a wall on the far side or a robot in the cell beyond.
pub fn can_slide(board: &Board, robots: &RobotSet, from: Position, to: Position) -> bool {
    if from == to {
        return false;
    }
    // Robots cannot move diagonally.
    if from.row != to.row && from.column != to.column {
        return false;
    }

    if from.row == to.row {
        let direction = if from.column < to.column {
            Direction::Right
        } else {
            Direction::Left
        };
        if board.has_wall(from.row, from.column, direction) {
            return false;
        }
        let (lo, hi) = (from.column.min(to.column), from.column.max(to.column));
        board.row(from.row).iter().enumerate().all(|(column, _)| {
            let cell = Position::new(from.row, column);
            if column > lo && column < hi {
                valid_path_cell(board, robots, cell, direction)
            } else if column == to.column {
                valid_target_cell(board, robots, cell, direction)
            } else {
                true
            }
        })
    } else {
        let direction = if from.row < to.row {
            Direction::Down
        } else {
            Direction::Up
        };
        if board.has_wall(from.row, from.column, direction) {
            return false;
        }
        let (lo, hi) = (from.row.min(to.row), from.row.max(to.row));
        board.column(from.column).iter().enumerate().all(|(row, _)| {
            let cell = Position::new(row, from.column);
            if row > lo && row < hi {
                valid_path_cell(board, robots, cell, direction)
            } else if row == to.row {
                valid_target_cell(board, robots, cell, direction)
            } else {
                true
            }
        })
    }
}

/// A cell being slid through: no robot, and no wall on either side of the
/// slide axis (a wall meant to stop entry blocks passage just as well as one
/// meant to stop exit).
fn valid_path_cell(board: &Board, robots: &RobotSet, cell: Position, direction: Direction) -> bool {
    !robots.occupied(cell)
        && !board.has_wall(cell.row, cell.column, direction)
        && !board.has_wall(cell.row, cell.column, direction.opposite())
}

/// A cell the robot wants to stop at: robot-free, and stopped either by a
/// wall ahead or by a robot in the next cell over. Anything else means the
/// robot would keep sliding, so stopping there is illegal.
fn valid_target_cell(
    board: &Board,
    robots: &RobotSet,
    cell: Position,
    direction: Direction,
) -> bool {
    if robots.occupied(cell) {
        return false;
    }
    if board.has_wall(cell.row, cell.column, direction) {
        return true;
    }
    board
        .neighbor(cell, direction)
        .is_some_and(|next| robots.occupied(next))
}
