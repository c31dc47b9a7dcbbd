use serde::{Deserialize, Serialize};

use crate::board::Position;

/// Robot color selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotColor {
    Yellow,
    Red,
    Blue,
    Green,
    Silver,
}

impl RobotColor {
    /// Placement order used when seeding a new game.
    pub const ALL: [RobotColor; 5] = [
        RobotColor::Yellow,
        RobotColor::Red,
        RobotColor::Blue,
        RobotColor::Green,
        RobotColor::Silver,
    ];
}

impl std::fmt::Display for RobotColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Silver => "silver",
        };
        f.write_str(name)
    }
}

/// A robot and its current cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Robot {
    pub color: RobotColor,
    pub position: Position,
}

/// Current positions of all robots on a board.
///
/// Positions are plain `Copy` values: moving a robot assigns a new
/// `Position`, and a snapshot is simply a retained clone of the set.
/// Invariant: no two robots share a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotSet {
    robots: Vec<Robot>,
}

impl RobotSet {
    pub fn new(robots: Vec<Robot>) -> Self {
        Self { robots }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Robot> {
        self.robots.iter()
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    pub fn robot(&self, color: RobotColor) -> Option<&Robot> {
        self.robots.iter().find(|r| r.color == color)
    }

    pub fn position(&self, color: RobotColor) -> Option<Position> {
        self.robot(color).map(|r| r.position)
    }

    /// The color of the robot occupying the cell, if any.
    pub fn robot_at(&self, position: Position) -> Option<RobotColor> {
        self.robots
            .iter()
            .find(|r| r.position == position)
            .map(|r| r.color)
    }

    /// Whether any robot currently sits at the cell.
    pub fn occupied(&self, position: Position) -> bool {
        self.robot_at(position).is_some()
    }

    /// Place the robot of the given color, returning false when the color
    /// is not part of this set.
    pub fn set_position(&mut self, color: RobotColor, position: Position) -> bool {
        match self.robots.iter_mut().find(|r| r.color == color) {
            Some(robot) => {
                robot.position = position;
                true
            },
            None => false,
        }
    }

    /// Current positions as a plain list, for display surfaces.
    pub fn to_vec(&self) -> Vec<Robot> {
        self.robots.clone()
    }
}

impl FromIterator<Robot> for RobotSet {
    fn from_iter<I: IntoIterator<Item = Robot>>(iter: I) -> Self {
        Self {
            robots: iter.into_iter().collect(),
        }
    }
}
