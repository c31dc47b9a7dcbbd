use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Goal, Position};
use crate::robots::{Robot, RobotColor, RobotSet};
use crate::slide::can_slide;

/// One recorded move: the robot that moved and where it came to rest. The
/// origin is implicit in the robot's position before the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub robot: RobotColor,
    pub to: Position,
}

/// Outcome of a board click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click landed on a robot, which is now selected.
    SelectedRobot(RobotColor),
    /// The selected robot slid to the clicked cell.
    Moved {
        robot: RobotColor,
        to: Position,
        goal_reached: bool,
    },
    /// No selection, or the slide was illegal; nothing changed.
    Ignored,
}

/// One game's worth of mutable play state over an immutable [`Board`]:
/// robot positions, the per-goal move log and start snapshot, the current
/// selection, and which goals have already been completed.
#[derive(Debug, Clone, Default)]
pub struct PlaySession {
    robots: RobotSet,
    start: RobotSet,
    moves: Vec<Move>,
    selected: Option<RobotColor>,
    current_goal: Option<Goal>,
    completed: HashSet<String>,
}

impl PlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn robots(&self) -> &RobotSet {
        &self.robots
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn moves_taken(&self) -> usize {
        self.moves.len()
    }

    pub fn selected(&self) -> Option<RobotColor> {
        self.selected
    }

    pub fn current_goal(&self) -> Option<&Goal> {
        self.current_goal.as_ref()
    }

    pub fn completed_goals(&self) -> &HashSet<String> {
        &self.completed
    }

    /// Place one robot of each color on a uniformly random free cell.
    /// Fully-walled cells are excluded, and each picked cell leaves the
    /// candidate pool so no two robots ever share a start.
    pub fn initialize_robots<R: Rng>(&mut self, board: &Board, rng: &mut R) {
        let mut pool: Vec<Position> = Vec::with_capacity(board.size() * board.size());
        for row in 0..board.size() {
            for column in 0..board.size() {
                if !board.is_blocked(row, column) {
                    pool.push(Position::new(row, column));
                }
            }
        }

        let robots = RobotColor::ALL
            .into_iter()
            .map(|color| {
                let index = rng.random_range(0..pool.len());
                Robot {
                    color,
                    position: pool.swap_remove(index),
                }
            })
            .collect();

        self.robots = robots;
        self.start = self.robots.clone();
        self.moves.clear();
        self.selected = None;
    }

    /// Replace robot positions wholesale with server-authoritative values.
    pub fn set_robots(&mut self, robots: RobotSet) {
        self.robots = robots;
    }

    /// Uniformly random goal among those not yet completed, or `None` when
    /// every goal has been played (the game is over).
    pub fn next_goal<R: Rng>(&self, board: &Board, rng: &mut R) -> Option<Goal> {
        let remaining: Vec<&Goal> = board
            .goals()
            .iter()
            .filter(|goal| !self.completed.contains(&board.goal_id(goal)))
            .collect();
        if remaining.is_empty() {
            None
        } else {
            Some(*remaining[rng.random_range(0..remaining.len())])
        }
    }

    /// Start a fresh attempt at `goal`: clear the move log and selection and
    /// snapshot the current robot positions as the attempt's start.
    pub fn set_current_goal(&mut self, goal: Goal) {
        self.moves.clear();
        self.selected = None;
        self.start = self.robots.clone();
        self.current_goal = Some(goal);
    }

    pub fn clear_current_goal(&mut self) {
        self.current_goal = None;
    }

    /// Restore every robot to the attempt's start snapshot and clear the
    /// move log. Goal and completed set are untouched.
    pub fn reset_to_start(&mut self) {
        self.robots = self.start.clone();
        self.moves.clear();
    }

    /// Record the current goal as completed. Returns its id and the move
    /// log that solved it; the log is left in place until the next goal is
    /// set.
    pub fn complete_current_goal(&mut self, board: &Board) -> Option<(String, Vec<Move>)> {
        let goal = self.current_goal.as_ref()?;
        let id = board.goal_id(goal);
        self.completed.insert(id.clone());
        Some((id, self.moves.clone()))
    }

    /// Move a robot and append to the move log. No validation: callers
    /// either went through [`can_slide`] or are replaying an authoritative
    /// sequence.
    pub fn move_robot_to_cell(&mut self, color: RobotColor, to: Position) -> bool {
        if !self.robots.set_position(color, to) {
            tracing::warn!(robot = %color, "move for a robot that is not on the board");
            return false;
        }
        self.moves.push(Move { robot: color, to });
        true
    }

    /// Handle a click on the given cell: a robot there becomes the
    /// selection; otherwise, with a robot selected, attempt the slide and
    /// report whether it landed the matching robot on the current goal.
    pub fn click(&mut self, board: &Board, row: usize, column: usize) -> ClickOutcome {
        let cell = Position::new(row, column);

        if let Some(color) = self.robots.robot_at(cell) {
            self.selected = Some(color);
            return ClickOutcome::SelectedRobot(color);
        }

        let Some(selected) = self.selected else {
            return ClickOutcome::Ignored;
        };
        let Some(from) = self.robots.position(selected) else {
            return ClickOutcome::Ignored;
        };

        if !can_slide(board, &self.robots, from, cell) {
            return ClickOutcome::Ignored;
        }

        self.move_robot_to_cell(selected, cell);
        ClickOutcome::Moved {
            robot: selected,
            to: cell,
            goal_reached: self.goal_reached_by(board, selected, cell),
        }
    }

    fn goal_reached_by(&self, board: &Board, robot: RobotColor, cell: Position) -> bool {
        self.current_goal
            .as_ref()
            .is_some_and(|goal| goal.color == robot && board.goal_coordinates(goal) == cell)
    }
}
