//! The competitive round coordinator: a state machine driven by
//! server-authoritative events, gating who may claim a solution and who may
//! submit moves, and owning every piece of mutable play state. All robot
//! and round mutation funnels through this one task; the countdown and
//! preview tasks only pace events back into it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};

use ricochet_core::board::{Board, Goal};
use ricochet_core::protocol::{self, ClientAction, RobotPlacement, ServerEvent};
use ricochet_core::robots::{Robot, RobotColor};
use ricochet_core::session::{ClickOutcome, Move, PlaySession};

use crate::config::ClientConfig;
use crate::countdown::{Countdown, TimerKind};
use crate::preview::Preview;
use crate::transport::TransportAdapter;

/// Lifecycle of one competitive game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoundPhase {
    #[default]
    Idle,
    SolutionBidding,
    MovesWindow,
    GoalResolved,
    GameFinished,
}

/// Gating flags and bookkeeping for the round in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundState {
    pub phase: RoundPhase,
    pub winner: Option<String>,
    pub winner_id: Option<String>,
    pub claimed_nr_moves: Option<u32>,
    /// Displayed countdown, always seeded from the server's value.
    pub seconds_left: u32,
    pub cant_provide_solution: bool,
    pub can_provide_moves: bool,
    pub ready_for_next_goal: bool,
}

/// Commands from the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    StartNewGame,
    GetNextGoal,
    SendNumberOfMoves(u32),
    ResetMoves,
    ClickedBoard { row: usize, column: usize },
    Stop,
}

/// Events the coordinator's own timer and preview tasks feed back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    Tick { kind: TimerKind, generation: u64 },
    Elapsed { kind: TimerKind, generation: u64 },
    PreviewStep { generation: u64, index: usize },
    PreviewDone { generation: u64 },
}

/// Read-only snapshot for display surfaces.
#[derive(Debug, Clone, Default)]
pub struct RoundView {
    pub phase: RoundPhase,
    pub board: Option<Arc<Board>>,
    pub robots: Vec<Robot>,
    pub selected: Option<RobotColor>,
    pub current_goal: Option<Goal>,
    pub moves: Vec<Move>,
    pub winner: Option<String>,
    pub seconds_left: u32,
    pub cant_provide_solution: bool,
    pub can_provide_moves: bool,
    pub ready_for_next_goal: bool,
}

pub struct RoundCoordinator {
    user_id: String,
    preview_step: Duration,
    transport: TransportAdapter,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    board: Option<Arc<Board>>,
    session: PlaySession,
    state: RoundState,
    winning_moves: Vec<Move>,
    solution_timer: Countdown,
    moves_timer: Countdown,
    preview: Preview,
}

impl RoundCoordinator {
    pub fn new(
        config: &ClientConfig,
        transport: TransportAdapter,
        internal_tx: mpsc::UnboundedSender<InternalEvent>,
    ) -> Self {
        Self {
            user_id: config.user_id.clone(),
            preview_step: Duration::from_millis(config.preview_step_millis),
            transport,
            internal_tx,
            board: None,
            session: PlaySession::new(),
            state: RoundState::default(),
            winning_moves: Vec::new(),
            solution_timer: Countdown::new(TimerKind::Solution),
            moves_timer: Countdown::new(TimerKind::Moves),
            preview: Preview::new(),
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn session(&self) -> &PlaySession {
        &self.session
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_deref()
    }

    /// Decode and filter an inbound transport frame.
    pub fn dispatch(&self, frame: &str) -> Option<ServerEvent> {
        self.transport.dispatch_frame(frame)
    }

    /// Apply one server-authoritative event. Events arriving in the wrong
    /// phase are ignored without any state change.
    pub fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::StartNewGame {
                cells,
                goals,
                robot_colors,
                robot_positions,
                current_goal,
            } => self.on_start_new_game(&cells, goals, &robot_colors, &robot_positions, current_goal),
            ServerEvent::SolutionIn {
                current_winner,
                current_winner_id,
                current_nr_moves,
                seconds_left,
            } => self.on_solution_in(current_winner, current_winner_id, current_nr_moves, seconds_left),
            ServerEvent::ClosedForSolutions {
                current_winner,
                current_winner_id,
                seconds_left,
            } => self.on_closed_for_solutions(current_winner, current_winner_id, seconds_left),
            ServerEvent::ClosedForMoves => self.on_closed_for_moves(),
            ServerEvent::NewGoal {
                goal,
                robot_positions,
            } => self.on_new_goal(goal, &robot_positions),
            ServerEvent::GoalWonBy { winner, moves } => self.on_goal_won_by(winner, moves),
            ServerEvent::GameFinished => self.on_game_finished(),
        }
    }

    fn on_start_new_game(
        &mut self,
        cells: &[Vec<u8>],
        goals: Vec<Goal>,
        robot_colors: &[RobotColor],
        robot_positions: &[RobotPlacement],
        current_goal: Option<Goal>,
    ) {
        if !matches!(self.state.phase, RoundPhase::Idle | RoundPhase::GameFinished) {
            tracing::warn!(phase = ?self.state.phase, "start_new_game out of phase, ignored");
            return;
        }
        let board = match Board::from_rows(cells, goals) {
            Ok(board) => Arc::new(board),
            Err(e) => {
                tracing::error!(error = %e, "rejecting start_new_game with a malformed board");
                return;
            },
        };
        if robot_positions.len() != robot_colors.len() {
            tracing::debug!(
                colors = robot_colors.len(),
                positions = robot_positions.len(),
                "robot color list does not match positions"
            );
        }

        self.solution_timer.cancel();
        self.moves_timer.cancel();
        self.preview.cancel();

        self.session = PlaySession::new();
        self.session
            .set_robots(protocol::robot_set_from_placements(robot_positions));
        self.winning_moves.clear();
        self.state = RoundState {
            phase: RoundPhase::SolutionBidding,
            ..RoundState::default()
        };
        if let Some(goal) = current_goal {
            self.session.set_current_goal(goal);
        }
        tracing::info!(
            size = board.size(),
            goals = board.goals().len(),
            robots = self.session.robots().len(),
            "new game started"
        );
        self.board = Some(board);
    }

    fn on_solution_in(
        &mut self,
        current_winner: String,
        current_winner_id: String,
        current_nr_moves: u32,
        seconds_left: u32,
    ) {
        if self.state.phase != RoundPhase::SolutionBidding {
            tracing::warn!(phase = ?self.state.phase, "solution_in out of phase, ignored");
            return;
        }
        tracing::info!(
            winner = %current_winner,
            nr_moves = current_nr_moves,
            seconds_left,
            "solution bid recorded"
        );
        self.state.winner = Some(current_winner);
        self.state.winner_id = Some(current_winner_id);
        self.state.claimed_nr_moves = Some(current_nr_moves);
        self.state.seconds_left = seconds_left;
        self.solution_timer.start(seconds_left, &self.internal_tx);
    }

    fn on_closed_for_solutions(
        &mut self,
        current_winner: String,
        current_winner_id: String,
        seconds_left: u32,
    ) {
        if self.state.phase != RoundPhase::SolutionBidding {
            tracing::warn!(phase = ?self.state.phase, "closed_for_solutions out of phase, ignored");
            return;
        }
        self.solution_timer.cancel();
        self.state.can_provide_moves = current_winner_id == self.user_id;
        self.state.winner = Some(current_winner);
        self.state.winner_id = Some(current_winner_id);
        self.state.cant_provide_solution = true;
        self.state.seconds_left = seconds_left;
        self.state.phase = RoundPhase::MovesWindow;
        self.moves_timer.start(seconds_left, &self.internal_tx);
        tracing::info!(
            winner = self.state.winner.as_deref().unwrap_or_default(),
            ours = self.state.can_provide_moves,
            "bidding closed, moves window open"
        );
    }

    fn on_closed_for_moves(&mut self) {
        if self.state.phase != RoundPhase::MovesWindow {
            tracing::warn!(phase = ?self.state.phase, "closed_for_moves out of phase, ignored");
            return;
        }
        self.moves_timer.cancel();
        self.state.can_provide_moves = false;
        self.state.ready_for_next_goal = true;
        self.state.seconds_left = 0;
        self.state.phase = RoundPhase::GoalResolved;
        tracing::info!("moves window closed without a proven solution");
    }

    fn on_goal_won_by(&mut self, winner: String, moves: Vec<Move>) {
        if self.state.phase != RoundPhase::MovesWindow {
            tracing::warn!(phase = ?self.state.phase, "goal_won_by out of phase, ignored");
            return;
        }
        self.moves_timer.cancel();
        self.state.can_provide_moves = false;
        self.state.ready_for_next_goal = true;
        self.state.seconds_left = 0;
        self.state.winner = Some(winner);
        self.state.phase = RoundPhase::GoalResolved;

        if let Some(board) = self.board.as_deref()
            && let Some((goal_id, _)) = self.session.complete_current_goal(board)
        {
            tracing::info!(
                goal = %goal_id,
                winner = self.state.winner.as_deref().unwrap_or_default(),
                moves = moves.len(),
                "goal won"
            );
        }

        // Replay the winning sequence from the attempt's start.
        self.winning_moves = moves;
        self.session.reset_to_start();
        self.preview
            .start(self.winning_moves.len(), self.preview_step, &self.internal_tx);
    }

    fn on_new_goal(&mut self, goal: Goal, robot_positions: &[RobotPlacement]) {
        if !matches!(
            self.state.phase,
            RoundPhase::GoalResolved | RoundPhase::SolutionBidding
        ) {
            tracing::warn!(phase = ?self.state.phase, "new_goal out of phase, ignored");
            return;
        }
        self.solution_timer.cancel();
        self.moves_timer.cancel();
        self.preview.cancel();

        self.state.cant_provide_solution = false;
        self.state.can_provide_moves = false;
        self.state.ready_for_next_goal = false;
        self.state.winner = None;
        self.state.winner_id = None;
        self.state.claimed_nr_moves = None;
        self.state.seconds_left = 0;
        self.winning_moves.clear();

        self.session
            .set_robots(protocol::robot_set_from_placements(robot_positions));
        self.session.set_current_goal(goal);
        self.state.phase = RoundPhase::SolutionBidding;
        tracing::info!(color = %goal.color, number = goal.number, "new goal set");
    }

    fn on_game_finished(&mut self) {
        self.solution_timer.cancel();
        self.moves_timer.cancel();
        self.preview.cancel();
        self.session.clear_current_goal();
        self.state.can_provide_moves = false;
        self.state.ready_for_next_goal = false;
        self.state.seconds_left = 0;
        self.state.phase = RoundPhase::GameFinished;
        tracing::info!("game finished");
    }

    /// Apply a tick or preview step from one of our own paced tasks.
    /// Events from superseded generations are discarded.
    pub fn handle_internal(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::Tick { kind, generation } => {
                if self.timer(kind).current(generation) {
                    self.state.seconds_left = self.state.seconds_left.saturating_sub(1);
                }
            },
            InternalEvent::Elapsed { kind, generation } => {
                if self.timer(kind).current(generation) {
                    tracing::debug!(timer = kind.name(), "countdown ran out");
                }
            },
            InternalEvent::PreviewStep { generation, index } => {
                if self.preview.current(generation)
                    && let Some(mv) = self.winning_moves.get(index).copied()
                {
                    self.session.move_robot_to_cell(mv.robot, mv.to);
                }
            },
            InternalEvent::PreviewDone { generation } => {
                if self.preview.current(generation) {
                    self.session.reset_to_start();
                }
            },
        }
    }

    fn timer(&self, kind: TimerKind) -> &Countdown {
        match kind {
            TimerKind::Solution => &self.solution_timer,
            TimerKind::Moves => &self.moves_timer,
        }
    }

    /// Ask the server to start a fresh game.
    pub fn start_new_game(&self) {
        self.send(&ClientAction::StartNewGame);
    }

    /// Ask the server for the next goal. Only meaningful between goals or
    /// right after a game starts with no goal yet.
    pub fn get_next_goal(&self) {
        let between_goals = self.state.ready_for_next_goal
            || (self.state.phase == RoundPhase::SolutionBidding
                && self.session.current_goal().is_none());
        if !between_goals {
            tracing::debug!(phase = ?self.state.phase, "next_goal dropped, not between goals");
            return;
        }
        self.send(&ClientAction::NextGoal);
    }

    /// Claim a solution in `nr_moves` moves, opening (or underbidding) the
    /// bidding window. Dropped once bidding has closed.
    pub fn send_number_of_moves(&self, nr_moves: u32) {
        if self.state.phase != RoundPhase::SolutionBidding || self.state.cant_provide_solution {
            tracing::debug!(phase = ?self.state.phase, "solution bid dropped, bidding closed");
            return;
        }
        self.send(&ClientAction::SolutionIn { nr_moves });
    }

    /// Put the robots back at the attempt's start. Only the player proving
    /// a solution has anything to reset.
    pub fn reset_moves(&mut self) {
        if !self.state.can_provide_moves {
            tracing::debug!("reset dropped, not allowed to provide moves");
            return;
        }
        self.session.reset_to_start();
    }

    /// A click on the board. Ignored entirely unless this client won the
    /// bid; a move that lands the matching robot on the current goal sends
    /// the accumulated move log as the proof.
    pub fn clicked_board(&mut self, row: usize, column: usize) {
        if !self.state.can_provide_moves {
            tracing::debug!(row, column, "click dropped, not allowed to provide moves");
            return;
        }
        let Some(board) = self.board.as_deref() else {
            tracing::debug!("click dropped, no board loaded");
            return;
        };
        match self.session.click(board, row, column) {
            ClickOutcome::Moved {
                goal_reached: true, ..
            } => {
                let moves = self.session.moves().to_vec();
                tracing::info!(moves = moves.len(), "goal reached, submitting moves");
                self.send(&ClientAction::SolutionMoves { moves });
            },
            ClickOutcome::Moved { robot, to, .. } => {
                tracing::debug!(robot = %robot, row = to.row, column = to.column, "robot moved");
            },
            ClickOutcome::SelectedRobot(color) => {
                tracing::debug!(robot = %color, "robot selected");
            },
            ClickOutcome::Ignored => {},
        }
    }

    fn send(&self, action: &ClientAction) {
        if let Err(e) = self.transport.send(action) {
            tracing::error!(error = %e, "failed to encode outbound action");
        }
    }

    /// Snapshot for display surfaces.
    pub fn view(&self) -> RoundView {
        RoundView {
            phase: self.state.phase,
            board: self.board.as_ref().map(Arc::clone),
            robots: self.session.robots().to_vec(),
            selected: self.session.selected(),
            current_goal: self.session.current_goal().copied(),
            moves: self.session.moves().to_vec(),
            winner: self.state.winner.clone(),
            seconds_left: self.state.seconds_left,
            cant_provide_solution: self.state.cant_provide_solution,
            can_provide_moves: self.state.can_provide_moves,
            ready_for_next_goal: self.state.ready_for_next_goal,
        }
    }
}

/// Handle for feeding local player commands to a running round session.
#[derive(Debug, Clone)]
pub struct RoundHandle {
    commands: mpsc::UnboundedSender<LocalCommand>,
}

impl RoundHandle {
    /// Returns false when the session has already stopped.
    pub fn command(&self, command: LocalCommand) -> bool {
        self.commands.send(command).is_ok()
    }
}

/// Run the coordinator as a single task: subscribe, then process inbound
/// frames, local commands, and internal tick/preview events strictly in
/// arrival order. A published [`RoundView`] follows every handled event.
pub fn spawn_round_session<S>(
    config: &ClientConfig,
    transport: TransportAdapter,
    mut frames: S,
) -> (RoundHandle, watch::Receiver<RoundView>, JoinHandle<()>)
where
    S: Stream<Item = String> + Send + Unpin + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(RoundView::default());
    let mut coordinator = RoundCoordinator::new(config, transport, internal_tx);

    let handle = tokio::spawn(async move {
        if let Err(e) = coordinator.transport.subscribe() {
            tracing::error!(error = %e, "failed to subscribe to the game channel");
        }
        loop {
            tokio::select! {
                frame = frames.next() => {
                    match frame {
                        Some(frame) => {
                            if let Some(event) = coordinator.dispatch(&frame) {
                                coordinator.handle_server_event(event);
                            }
                        },
                        None => {
                            tracing::info!("inbound frame stream closed, stopping");
                            break;
                        },
                    }
                },
                Some(command) = cmd_rx.recv() => {
                    match command {
                        LocalCommand::StartNewGame => coordinator.start_new_game(),
                        LocalCommand::GetNextGoal => coordinator.get_next_goal(),
                        LocalCommand::SendNumberOfMoves(n) => coordinator.send_number_of_moves(n),
                        LocalCommand::ResetMoves => coordinator.reset_moves(),
                        LocalCommand::ClickedBoard { row, column } => {
                            coordinator.clicked_board(row, column);
                        },
                        LocalCommand::Stop => break,
                    }
                },
                Some(event) = internal_rx.recv() => coordinator.handle_internal(event),
            }
            let _ = view_tx.send(coordinator.view());
        }
    });

    (RoundHandle { commands: cmd_tx }, view_rx, handle)
}
