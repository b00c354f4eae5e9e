use std::{collections::VecDeque, mem, time::Duration};

use log::{debug, info, trace};
use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::{
    ActionError, ActivePiece, Board, ConfigError, PieceKind, RotationDirection,
};

use super::{
    mode::{EndReason, FinalStats, LineClear, ModeConfig, ModeControl, ModeStrategy, SpeedInput},
    sequencer::{PieceSeed, PieceSequencer},
    snapshot::Snapshot,
    stats::{GameStats, LockOutcome, is_tetris},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SessionState {
    Playing,
    Paused,
    GameOver,
}

/// Player input, mirroring the public control methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    MoveLeft,
    MoveRight,
    SoftDrop,
    RotateCw,
    RotateCcw,
    HardDrop,
    Hold,
    Pause,
    Resume,
    TogglePause,
}

/// Result of a downward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Step {
    /// The piece moved down one row.
    Moved,
    /// The piece could not move and was locked.
    Locked(LockOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GarbageAttack {
    lines: usize,
    hole_col: usize,
}

/// A single game, from the first spawn to game over.
///
/// The session is driven from outside: [`Self::tick`] is called with
/// monotonic millisecond timestamps to advance gravity and timers, and the
/// control methods (or [`Self::apply`]) carry player input. Nothing blocks
/// and nothing is scheduled internally.
///
/// # Lock sequence
///
/// 1. The piece is written into the board and hold is re-enabled
/// 2. Full rows are cleared, score and level are updated
/// 3. [`ModeStrategy::on_line_cleared`] fires when rows were cleared
/// 4. Pending garbage rises from the bottom
/// 5. The next piece spawns; a spawn collision ends the session
///   unless the mode suppresses top-out
#[derive(Debug)]
pub struct GameSession {
    mode: Box<dyn ModeStrategy>,
    config: ModeConfig,
    board: Board,
    active: Option<ActivePiece>,
    sequencer: PieceSequencer,
    stats: GameStats,
    state: SessionState,
    end_reason: Option<EndReason>,
    drop_interval: Duration,
    gravity_accum: Duration,
    elapsed: Duration,
    last_timestamp: Option<u64>,
    reported_seconds: u64,
    pending_garbage: VecDeque<GarbageAttack>,
    outgoing_garbage: usize,
}

impl GameSession {
    /// Builds a session and spawns the first piece.
    ///
    /// The mode's configuration is validated here, so malformed settings never
    /// surface mid-game. If the very first spawn collides (possible with a
    /// pre-filled board) the session starts out over.
    pub fn new(mode: Box<dyn ModeStrategy>, seed: PieceSeed) -> Result<Self, ConfigError> {
        let config = mode.config();
        let (board, sequencer) = Self::fresh_parts(&config, seed)?;
        let mut session = Self {
            mode,
            stats: GameStats::new(config.starting_level),
            drop_interval: Duration::ZERO,
            config,
            board,
            active: None,
            sequencer,
            state: SessionState::Playing,
            end_reason: None,
            gravity_accum: Duration::ZERO,
            elapsed: Duration::ZERO,
            last_timestamp: None,
            reported_seconds: 0,
            pending_garbage: VecDeque::new(),
            outgoing_garbage: 0,
        };
        session.start();
        Ok(session)
    }

    /// Like [`Self::new`], with a random seed.
    pub fn with_random_seed(mode: Box<dyn ModeStrategy>) -> Result<Self, ConfigError> {
        Self::new(mode, rand::rng().random())
    }

    fn fresh_parts(
        config: &ModeConfig,
        seed: PieceSeed,
    ) -> Result<(Board, PieceSequencer), ConfigError> {
        config.validate()?;
        let board = match &config.initial_board {
            Some(board) => board.clone(),
            None => Board::new(config.rows, config.cols)?,
        };
        let sequencer = PieceSequencer::new(&config.bag, config.lookahead, seed)?;
        Ok((board, sequencer))
    }

    /// Restarts with a fresh configuration from the same mode.
    pub fn reset(&mut self, seed: PieceSeed) -> Result<(), ConfigError> {
        let config = self.mode.config();
        let (board, sequencer) = Self::fresh_parts(&config, seed)?;
        self.stats = GameStats::new(config.starting_level);
        self.config = config;
        self.board = board;
        self.sequencer = sequencer;
        self.active = None;
        self.state = SessionState::Playing;
        self.end_reason = None;
        self.gravity_accum = Duration::ZERO;
        self.elapsed = Duration::ZERO;
        self.last_timestamp = None;
        self.reported_seconds = 0;
        self.pending_garbage.clear();
        self.outgoing_garbage = 0;
        self.start();
        Ok(())
    }

    fn start(&mut self) {
        info!(
            "starting {} session on a {}x{} board at level {}",
            self.config.game_mode,
            self.config.rows,
            self.config.cols,
            self.config.starting_level
        );
        self.refresh_drop_interval();
        let mut control = ModeControl::default();
        self.mode.on_game_start(&mut control);
        self.apply_control(control);
        if !self.state.is_game_over() {
            self.spawn_next();
        }
    }

    #[must_use]
    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> &dyn ModeStrategy {
        self.mode.as_ref()
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    /// Where the active piece would land if hard-dropped.
    #[must_use]
    pub fn ghost_piece(&self) -> Option<ActivePiece> {
        self.active.map(|piece| piece.dropped(&self.board))
    }

    /// The next `lookahead` kinds.
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.sequencer.preview()
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.sequencer.held()
    }

    /// Whether a hold would be accepted now.
    #[must_use]
    pub fn can_hold(&self) -> bool {
        self.config.hold_enabled && self.sequencer.can_hold()
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    #[must_use]
    pub fn drop_interval(&self) -> Duration {
        self.drop_interval
    }

    /// Play time, excluding pauses.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn remaining_time(&self) -> Option<Duration> {
        self.config
            .time_limit
            .map(|limit| limit.saturating_sub(self.elapsed))
    }

    /// Garbage rows received but not yet applied.
    #[must_use]
    pub fn pending_garbage(&self) -> usize {
        self.pending_garbage.iter().map(|g| g.lines).sum()
    }

    /// Final statistics, available once the session is over.
    #[must_use]
    pub fn final_stats(&self) -> Option<FinalStats> {
        self.end_reason.map(|reason| self.build_final_stats(reason))
    }

    fn build_final_stats(&self, reason: EndReason) -> FinalStats {
        FinalStats {
            game_mode: self.config.game_mode,
            score: self.stats.score(),
            level: self.stats.level(),
            lines: self.stats.total_lines(),
            pieces: self.stats.pieces_spawned(),
            tetrises: self.stats.tetrises(),
            elapsed_ms: duration_millis(self.elapsed),
            reason,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            game_mode: self.config.game_mode,
            board: self.board.clone(),
            active: self.active,
            ghost: self.ghost_piece(),
            next: self.next_pieces().collect(),
            hold: self.held_piece(),
            can_hold: self.can_hold(),
            score: self.stats.score(),
            level: self.stats.level(),
            lines: self.stats.total_lines(),
            paused: self.state.is_paused(),
            game_over: self.state.is_game_over(),
            end_reason: self.end_reason,
            elapsed_ms: duration_millis(self.elapsed),
            remaining_ms: self.remaining_time().map(duration_millis),
            pending_garbage: self.pending_garbage(),
        }
    }

    /// Advances the session clock to `timestamp_ms`.
    ///
    /// Timestamps must be monotonic; a smaller value than the previous one is
    /// treated as no time passing. The first tick (and the first tick after a
    /// resume) only records the timestamp. While paused, time is ignored and
    /// the gravity accumulator keeps its partial progress.
    ///
    /// Gravity performs at most one soft drop per tick.
    pub fn tick(&mut self, timestamp_ms: u64) {
        let previous = self.last_timestamp;
        let now = previous.map_or(timestamp_ms, |p| p.max(timestamp_ms));
        self.last_timestamp = Some(now);
        let Some(previous) = previous else {
            return;
        };
        if !self.state.is_playing() {
            return;
        }
        self.advance(Duration::from_millis(now - previous));
    }

    fn advance(&mut self, delta: Duration) {
        self.elapsed += delta;
        self.gravity_accum += delta;

        if let Some(limit) = self.config.time_limit {
            self.run_timer(limit);
            if !self.state.is_playing() {
                return;
            }
        }

        self.refresh_drop_interval();
        if self.gravity_accum >= self.drop_interval {
            self.gravity_accum = Duration::ZERO;
            trace!("gravity drop");
            self.step_down();
        }
    }

    fn run_timer(&mut self, limit: Duration) {
        let elapsed = self.elapsed.min(limit);
        while self.reported_seconds < elapsed.as_secs() && self.state.is_playing() {
            self.reported_seconds += 1;
            let at = Duration::from_secs(self.reported_seconds);
            if at >= limit {
                break;
            }
            self.notify_timer(limit - at, at);
        }
        if self.elapsed >= limit && !self.state.is_game_over() {
            self.notify_timer(Duration::ZERO, limit);
            self.finish(EndReason::TimeUp);
        }
    }

    fn notify_timer(&mut self, remaining: Duration, elapsed: Duration) {
        let mut control = ModeControl::default();
        self.mode.on_timer_tick(remaining, elapsed, &mut control);
        self.apply_control(control);
    }

    fn refresh_drop_interval(&mut self) {
        self.drop_interval = self.config.speed_curve.interval(SpeedInput {
            level: self.stats.level(),
            elapsed: self.elapsed,
            time_limit: self.config.time_limit,
        });
    }

    /// Dispatches an [`Input`] to the matching control method.
    pub fn apply(&mut self, input: Input) -> Result<(), ActionError> {
        match input {
            Input::MoveLeft => self.move_left(),
            Input::MoveRight => self.move_right(),
            Input::SoftDrop => self.soft_drop().map(drop),
            Input::RotateCw => self.rotate_cw(),
            Input::RotateCcw => self.rotate_ccw(),
            Input::HardDrop => self.hard_drop().map(drop),
            Input::Hold => self.hold(),
            Input::Pause => self.pause(),
            Input::Resume => self.resume(),
            Input::TogglePause => self.toggle_pause(),
        }
    }

    fn ensure_playing(&self) -> Result<(), ActionError> {
        match self.state {
            SessionState::Playing => Ok(()),
            SessionState::Paused => Err(ActionError::Paused),
            SessionState::GameOver => Err(ActionError::GameOver),
        }
    }

    fn current_piece(&self) -> Result<ActivePiece, ActionError> {
        self.ensure_playing()?;
        self.active.ok_or(ActionError::GameOver)
    }

    fn try_place(&mut self, piece: ActivePiece) -> Result<(), ActionError> {
        if self.board.collides(&piece) {
            return Err(ActionError::Blocked);
        }
        self.active = Some(piece);
        Ok(())
    }

    pub fn move_left(&mut self) -> Result<(), ActionError> {
        let piece = self.current_piece()?;
        self.try_place(piece.left())
    }

    pub fn move_right(&mut self) -> Result<(), ActionError> {
        let piece = self.current_piece()?;
        self.try_place(piece.right())
    }

    /// Moves the piece down one row, locking it if it cannot move.
    pub fn soft_drop(&mut self) -> Result<Step, ActionError> {
        self.current_piece()?;
        Ok(self.step_down())
    }

    pub fn rotate_cw(&mut self) -> Result<(), ActionError> {
        self.rotate(RotationDirection::Clockwise)
    }

    pub fn rotate_ccw(&mut self) -> Result<(), ActionError> {
        self.rotate(RotationDirection::CounterClockwise)
    }

    fn rotate(&mut self, direction: RotationDirection) -> Result<(), ActionError> {
        let piece = self.current_piece()?;
        let rotated = piece
            .rotated_with_kicks(&self.board, direction)
            .ok_or(ActionError::Blocked)?;
        self.active = Some(rotated);
        Ok(())
    }

    /// Drops the piece as far as it goes and locks it.
    pub fn hard_drop(&mut self) -> Result<LockOutcome, ActionError> {
        let piece = self.current_piece()?;
        let dropped = piece.dropped(&self.board);
        trace!("hard drop by {} rows", dropped.row() - piece.row());
        self.active = Some(dropped);
        Ok(self.lock_active())
    }

    /// Swaps the active piece with the hold slot.
    ///
    /// The incoming piece appears at the spawn position, shifted by the kick
    /// table if needed. Nothing changes when the hold is rejected.
    pub fn hold(&mut self) -> Result<(), ActionError> {
        let current = self.current_piece()?;
        if !self.config.hold_enabled {
            return Err(ActionError::HoldDisabled);
        }
        if !self.sequencer.can_hold() {
            return Err(ActionError::HoldUsed);
        }
        let incoming = ActivePiece::spawn(self.sequencer.peek_hold_result(), self.board.cols())
            .kicked(&self.board)
            .ok_or(ActionError::Blocked)?;
        let swap = self.sequencer.hold(current.kind())?;
        debug!("held {}, now playing {}", swap.held, swap.active);
        self.active = Some(incoming);
        if swap.drew_from_queue {
            self.stats.record_spawn();
            self.notify_spawned(swap.active);
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), ActionError> {
        match self.state {
            SessionState::Playing => {
                debug!("paused");
                self.state = SessionState::Paused;
                Ok(())
            }
            SessionState::Paused => Ok(()),
            SessionState::GameOver => Err(ActionError::GameOver),
        }
    }

    /// Resumes play. The next tick re-synchronizes the clock, so time spent
    /// paused never counts.
    pub fn resume(&mut self) -> Result<(), ActionError> {
        match self.state {
            SessionState::Paused => {
                debug!("resumed");
                self.state = SessionState::Playing;
                self.last_timestamp = None;
                Ok(())
            }
            SessionState::Playing => Ok(()),
            SessionState::GameOver => Err(ActionError::GameOver),
        }
    }

    pub fn toggle_pause(&mut self) -> Result<(), ActionError> {
        match self.state {
            SessionState::Playing => self.pause(),
            SessionState::Paused => self.resume(),
            SessionState::GameOver => Err(ActionError::GameOver),
        }
    }

    /// Ends the session from outside (quit, or a lost battle).
    pub fn end(&mut self, reason: EndReason) {
        self.finish(reason);
    }

    /// Queues garbage rows to rise after the next lock.
    pub fn receive_garbage(&mut self, lines: usize, hole_col: usize) {
        if lines == 0 || self.state.is_game_over() {
            return;
        }
        debug!("received {lines} garbage line(s)");
        self.pending_garbage.push_back(GarbageAttack { lines, hole_col });
    }

    /// Takes garbage rows the mode asked to send to an opponent.
    pub fn take_outgoing_garbage(&mut self) -> usize {
        mem::take(&mut self.outgoing_garbage)
    }

    fn step_down(&mut self) -> Step {
        let Some(piece) = self.active else {
            return Step::Moved;
        };
        let down = piece.down();
        if self.board.collides(&down) {
            return Step::Locked(self.lock_active());
        }
        self.active = Some(down);
        Step::Moved
    }

    fn lock_active(&mut self) -> LockOutcome {
        let Some(piece) = self.active.take() else {
            return LockOutcome::default();
        };
        self.board.lock(&piece);
        self.sequencer.reset_hold();

        let lines = self.board.clear_full_lines();
        let outcome = self.stats.record_lock(
            lines,
            self.config.score_multiplier,
            self.config.level_progression,
        );
        if outcome.levels_gained > 0 {
            info!("level up to {}", self.stats.level());
            self.refresh_drop_interval();
        }
        if lines > 0 {
            debug!("cleared {lines} line(s) for {} points", outcome.points);
            let clear = LineClear {
                lines,
                total_lines: self.stats.total_lines(),
                is_tetris: is_tetris(lines),
                points: outcome.points,
                level: self.stats.level(),
            };
            let mut control = ModeControl::default();
            self.mode.on_line_cleared(&clear, &mut control);
            self.apply_control(control);
        }

        if !self.state.is_game_over() {
            self.rise_garbage();
        }
        if !self.state.is_game_over() {
            self.spawn_next();
        }
        outcome
    }

    fn rise_garbage(&mut self) {
        while let Some(attack) = self.pending_garbage.pop_front() {
            if self.board.push_garbage(attack.lines, attack.hole_col) {
                if self.config.suppress_top_out_game_over {
                    info!("garbage overflow suppressed, clearing board");
                    self.board.clear();
                } else {
                    self.finish(EndReason::TopOut);
                    return;
                }
            }
        }
    }

    fn spawn_next(&mut self) {
        let kind = self.sequencer.next();
        let piece = ActivePiece::spawn(kind, self.board.cols());
        if self.board.collides(&piece) {
            if !self.config.suppress_top_out_game_over {
                self.finish(EndReason::TopOut);
                return;
            }
            info!("top-out suppressed, clearing board");
            self.board.clear();
            if self.board.collides(&piece) {
                self.finish(EndReason::TopOut);
                return;
            }
        }
        self.active = Some(piece);
        self.stats.record_spawn();
        self.notify_spawned(kind);
    }

    fn notify_spawned(&mut self, kind: PieceKind) {
        let mut control = ModeControl::default();
        self.mode.on_piece_spawned(kind, &mut control);
        self.apply_control(control);
    }

    fn apply_control(&mut self, control: ModeControl) {
        let (pause, finish, garbage) = control.into_parts();
        self.outgoing_garbage += garbage;
        if let Some(reason) = finish {
            self.finish(reason);
        } else if pause && self.state.is_playing() {
            debug!("paused by mode");
            self.state = SessionState::Paused;
        }
    }

    fn finish(&mut self, reason: EndReason) {
        if self.state.is_game_over() {
            return;
        }
        self.state = SessionState::GameOver;
        self.end_reason = Some(reason);
        self.active = None;
        let stats = self.build_final_stats(reason);
        info!(
            "{} session over ({reason}): score {}, level {}, lines {}",
            stats.game_mode, stats.score, stats.level, stats.lines
        );
        self.mode.on_game_over(&stats);
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use crate::{Cell, GameMode, Rotation, SpeedCurve};

    use super::*;

    const SEED: PieceSeed = PieceSeed::from_bytes([42; 16]);

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Start,
        Spawned(PieceKind),
        Cleared {
            lines: usize,
            total: usize,
            tetris: bool,
        },
        Timer {
            remaining: u64,
            elapsed: u64,
        },
        GameOver(EndReason),
    }

    type Events = Rc<RefCell<Vec<Event>>>;

    #[derive(Debug)]
    struct Recorder {
        config: ModeConfig,
        events: Events,
        finish_on_clear: Option<EndReason>,
        garbage_per_clear: usize,
    }

    impl ModeStrategy for Recorder {
        fn config(&self) -> ModeConfig {
            self.config.clone()
        }

        fn on_game_start(&mut self, _control: &mut ModeControl) {
            self.events.borrow_mut().push(Event::Start);
        }

        fn on_piece_spawned(&mut self, kind: PieceKind, _control: &mut ModeControl) {
            self.events.borrow_mut().push(Event::Spawned(kind));
        }

        fn on_line_cleared(&mut self, clear: &LineClear, control: &mut ModeControl) {
            self.events.borrow_mut().push(Event::Cleared {
                lines: clear.lines,
                total: clear.total_lines,
                tetris: clear.is_tetris,
            });
            control.send_garbage(self.garbage_per_clear);
            if let Some(reason) = self.finish_on_clear {
                control.finish(reason);
            }
        }

        fn on_timer_tick(
            &mut self,
            remaining: Duration,
            elapsed: Duration,
            _control: &mut ModeControl,
        ) {
            self.events.borrow_mut().push(Event::Timer {
                remaining: remaining.as_secs(),
                elapsed: elapsed.as_secs(),
            });
        }

        fn on_game_over(&mut self, stats: &FinalStats) {
            self.events.borrow_mut().push(Event::GameOver(stats.reason));
        }
    }

    fn recorder(config: ModeConfig) -> (Recorder, Events) {
        let events = Events::default();
        let recorder = Recorder {
            config,
            events: Rc::clone(&events),
            finish_on_clear: None,
            garbage_per_clear: 0,
        };
        (recorder, events)
    }

    fn session(config: ModeConfig) -> (GameSession, Events) {
        let (recorder, events) = recorder(config);
        (GameSession::new(Box::new(recorder), SEED).unwrap(), events)
    }

    fn i_only() -> ModeConfig {
        ModeConfig::new(GameMode::Classic).with_bag(vec![PieceKind::I])
    }

    fn board(bottom: &[&str]) -> Board {
        let mut rows = vec![".........."; 20 - bottom.len()];
        rows.extend_from_slice(bottom);
        Board::from_rows(rows).unwrap()
    }

    /// Turns the spawned I-piece vertical and slides it against the right wall.
    fn stand_i_at_right_wall(session: &mut GameSession) {
        session.rotate_cw().unwrap();
        for _ in 0..3 {
            session.move_right().unwrap();
        }
        assert!(session.move_right().is_err());
    }

    #[test]
    fn test_first_piece_spawns_at_top_center() {
        let (session, events) = session(ModeConfig::new(GameMode::Classic));
        let piece = session.active_piece().unwrap();
        assert_eq!((piece.col(), piece.row()), (4, 0));
        assert_eq!(piece.rotation(), Rotation::SPAWN);
        assert_eq!(
            events.borrow().as_slice(),
            &[Event::Start, Event::Spawned(piece.kind())]
        );
        assert_eq!(session.next_pieces().count(), 3);
    }

    #[test]
    fn test_i_piece_hard_drop_locks_on_bottom_row() {
        let (mut session, _) = session(i_only());
        let outcome = session.hard_drop().unwrap();

        assert_eq!(outcome.lines, 0);
        for col in 4..8 {
            assert_eq!(session.board().cell(19, col), Some(Cell::Block(PieceKind::I)));
        }
        assert_eq!(session.board().filled_cell_count(), 4);
        assert_eq!(session.active_piece().unwrap().row(), 0);
    }

    #[test]
    fn test_i_piece_hard_drop_clears_one_line() {
        let config = i_only().with_initial_board(board(&["####....##"]));
        let (mut session, events) = session(config);

        let outcome = session.hard_drop().unwrap();

        assert_eq!(outcome.lines, 1);
        assert_eq!(outcome.points, 100);
        assert_eq!(session.stats().score(), 100);
        assert!(session.board().is_empty());
        assert!(events.borrow().contains(&Event::Cleared {
            lines: 1,
            total: 1,
            tetris: false
        }));
    }

    #[test]
    fn test_single_line_score_uses_level_and_multiplier() {
        let config = i_only()
            .with_initial_board(board(&["####....##"]))
            .with_starting_level(3)
            .with_score_multiplier(1.5);
        let (mut session, _) = session(config);
        session.hard_drop().unwrap();
        assert_eq!(session.stats().score(), 450);
    }

    #[test]
    fn test_two_non_adjacent_lines_score_as_double() {
        let config = i_only().with_initial_board(board(&[
            "..........",
            ".#########",
            "..########",
            ".#########",
        ]));
        let (mut session, events) = session(config);
        session.rotate_cw().unwrap();
        for _ in 0..6 {
            session.move_left().unwrap();
        }
        assert_eq!(session.move_left(), Err(ActionError::Blocked));

        let outcome = session.hard_drop().unwrap();

        assert_eq!(outcome.lines, 2);
        assert_eq!(session.stats().score(), 300);
        assert_eq!(
            *session.board(),
            board(&["I.........", "I.########"])
        );
        assert!(events.borrow().contains(&Event::Cleared {
            lines: 2,
            total: 2,
            tetris: false
        }));
    }

    #[test]
    fn test_tetris_scores_800_at_level_1_and_2400_at_level_3() {
        for (level, expected) in [(1, 800), (3, 2400)] {
            let config = i_only()
                .with_starting_level(level)
                .with_initial_board(board(&["#########."; 4]));
            let (mut session, events) = session(config);
            stand_i_at_right_wall(&mut session);

            let outcome = session.hard_drop().unwrap();

            assert_eq!(outcome.lines, 4);
            assert_eq!(session.stats().score(), expected);
            assert_eq!(session.stats().tetrises(), 1);
            assert!(events.borrow().contains(&Event::Cleared {
                lines: 4,
                total: 4,
                tetris: true
            }));
        }
    }

    #[test]
    fn test_level_up_after_ten_lines_speeds_up_gravity() {
        let config = i_only().with_initial_board(board(&["#########."; 10]));
        let (mut session, _) = session(config);
        assert_eq!(session.drop_interval(), Duration::from_millis(950));

        for expected_total in [4, 8, 10] {
            stand_i_at_right_wall(&mut session);
            session.hard_drop().unwrap();
            assert_eq!(session.stats().total_lines(), expected_total);
        }

        assert_eq!(session.stats().level(), 2);
        assert_eq!(session.stats().score(), 800 + 800 + 300);
        assert_eq!(session.drop_interval(), Duration::from_millis(900));
    }

    #[test]
    fn test_rigged_rotation_failure_keeps_rotation_state() {
        // Row 0 blocks every upward and in-place kick, row 2 blocks the I-piece's downward kick.
        let mut rows = vec!["...#######", "..........", "...#######"];
        rows.extend(std::iter::repeat_n("..........", 17));
        let config = i_only().with_initial_board(Board::from_rows(rows).unwrap());
        let (mut session, _) = session(config);
        let before = *session.active_piece().unwrap();

        for _ in 0..4 {
            assert_eq!(session.rotate_cw(), Err(ActionError::Blocked));
            assert_eq!(session.active_piece(), Some(&before));
        }
        assert_eq!(session.rotate_ccw(), Err(ActionError::Blocked));
        assert_eq!(session.active_piece().unwrap().rotation(), Rotation::SPAWN);
    }

    #[test]
    fn test_moves_blocked_by_walls() {
        let (mut session, _) = session(i_only());
        for _ in 0..4 {
            session.move_left().unwrap();
        }
        let before = session.snapshot();
        assert_eq!(session.move_left(), Err(ActionError::Blocked));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_soft_drop_locks_when_blocked() {
        let (mut session, _) = session(i_only());
        for _ in 0..18 {
            assert_eq!(session.soft_drop(), Ok(Step::Moved));
        }
        let step = session.soft_drop().unwrap();
        assert!(step.is_locked());
        assert_eq!(session.board().filled_cell_count(), 4);
        assert_eq!(session.stats().pieces_spawned(), 2);
    }

    #[test]
    fn test_second_hold_is_a_no_op() {
        let (mut session, _) = session(ModeConfig::new(GameMode::Classic));
        let first = session.active_piece().unwrap().kind();
        session.hold().unwrap();
        assert_eq!(session.held_piece(), Some(first));
        assert!(!session.can_hold());

        let before = session.snapshot();
        assert_eq!(session.hold(), Err(ActionError::HoldUsed));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_hold_swaps_back_after_lock() {
        let (mut session, _) = session(ModeConfig::new(GameMode::Classic));
        let first = session.active_piece().unwrap().kind();
        session.hold().unwrap();
        session.hard_drop().unwrap();
        assert!(session.can_hold());

        let current = session.active_piece().unwrap().kind();
        session.hold().unwrap();
        let piece = session.active_piece().unwrap();
        assert_eq!(piece.kind(), first);
        assert_eq!((piece.col(), piece.row()), (4, 0));
        assert_eq!(session.held_piece(), Some(current));
    }

    #[test]
    fn test_hold_disabled() {
        let (mut session, _) = session(ModeConfig::new(GameMode::Puzzle).with_hold_enabled(false));
        assert_eq!(session.hold(), Err(ActionError::HoldDisabled));
        assert_eq!(session.held_piece(), None);
    }

    #[test]
    fn test_spawn_collision_ends_session() {
        let config = ModeConfig::new(GameMode::Classic)
            .with_initial_board(board(&["#########."; 19]));
        let (mut session, events) = session(config);

        assert!(session.state().is_game_over());
        assert_eq!(session.end_reason(), Some(EndReason::TopOut));
        assert!(session.active_piece().is_none());
        assert_eq!(session.move_left(), Err(ActionError::GameOver));
        assert_eq!(session.hard_drop(), Err(ActionError::GameOver));
        session.tick(0);
        session.tick(10_000);

        let game_overs = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::GameOver(_)))
            .count();
        assert_eq!(game_overs, 1);
        let stats = session.final_stats().unwrap();
        assert_eq!(stats.reason, EndReason::TopOut);
        assert_eq!(stats.score_submission().game_mode, GameMode::Classic);
    }

    #[test]
    fn test_suppressed_top_out_clears_board() {
        let config = ModeConfig::new(GameMode::Zen)
            .with_initial_board(board(&["#########."; 19]))
            .with_suppress_top_out_game_over(true);
        let (session, events) = session(config);

        assert!(session.state().is_playing());
        assert!(session.board().is_empty());
        assert!(session.active_piece().is_some());
        assert!(
            !events
                .borrow()
                .iter()
                .any(|e| matches!(e, Event::GameOver(_)))
        );
    }

    #[test]
    fn test_gravity_fires_once_interval_elapsed() {
        let (mut session, _) = session(i_only());
        session.tick(1_000);
        assert_eq!(session.active_piece().unwrap().row(), 0);
        session.tick(1_949);
        assert_eq!(session.active_piece().unwrap().row(), 0);
        session.tick(1_950);
        assert_eq!(session.active_piece().unwrap().row(), 1);
        // at most one drop per tick, and the accumulator restarts
        session.tick(10_000);
        assert_eq!(session.active_piece().unwrap().row(), 2);
        session.tick(10_100);
        assert_eq!(session.active_piece().unwrap().row(), 2);
    }

    #[test]
    fn test_timestamps_going_backwards_are_ignored() {
        let (mut session, _) = session(i_only());
        session.tick(5_000);
        session.tick(4_000);
        session.tick(5_900);
        assert_eq!(session.active_piece().unwrap().row(), 0);
        assert_eq!(session.elapsed(), Duration::from_millis(900));
    }

    #[test]
    fn test_pause_keeps_gravity_accumulator() {
        let (mut session, _) = session(i_only());
        session.tick(0);
        session.tick(600);
        session.pause().unwrap();

        assert_eq!(session.move_left(), Err(ActionError::Paused));
        assert_eq!(session.hold(), Err(ActionError::Paused));
        session.tick(5_000);
        assert_eq!(session.active_piece().unwrap().row(), 0);

        session.resume().unwrap();
        session.tick(6_000);
        session.tick(6_349);
        assert_eq!(session.active_piece().unwrap().row(), 0);
        session.tick(6_350);
        assert_eq!(session.active_piece().unwrap().row(), 1);
        assert_eq!(session.elapsed(), Duration::from_millis(950));
    }

    #[test]
    fn test_toggle_pause() {
        let (mut session, _) = session(i_only());
        session.apply(Input::TogglePause).unwrap();
        assert!(session.state().is_paused());
        assert!(session.snapshot().paused);
        session.apply(Input::TogglePause).unwrap();
        assert!(session.state().is_playing());
    }

    #[test]
    fn test_time_limit_fires_timer_ticks_then_ends() {
        let config = i_only().with_time_limit(Duration::from_secs(3));
        let (mut session, events) = session(config);
        session.tick(0);
        session.tick(1_500);
        assert_eq!(session.remaining_time(), Some(Duration::from_millis(1_500)));
        session.tick(3_200);

        let timer_events = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Timer { .. } | Event::GameOver(_)))
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(
            timer_events,
            vec![
                Event::Timer {
                    remaining: 2,
                    elapsed: 1
                },
                Event::Timer {
                    remaining: 1,
                    elapsed: 2
                },
                Event::Timer {
                    remaining: 0,
                    elapsed: 3
                },
                Event::GameOver(EndReason::TimeUp),
            ]
        );
        assert_eq!(session.remaining_time(), Some(Duration::ZERO));
    }

    #[test]
    fn test_time_based_speed_curve() {
        let curve = SpeedCurve::new(|input| {
            if input.elapsed < Duration::from_secs(1) {
                Duration::from_millis(500)
            } else {
                Duration::from_millis(200)
            }
        });
        let (mut session, _) = session(i_only().with_speed_curve(curve));
        session.tick(0);
        session.tick(1_000);
        assert_eq!(session.drop_interval(), Duration::from_millis(200));
        assert_eq!(session.active_piece().unwrap().row(), 1);
        session.tick(1_200);
        assert_eq!(session.active_piece().unwrap().row(), 2);
    }

    #[test]
    fn test_hook_can_finish_the_session() {
        let (mut recorder, events) = recorder(i_only().with_initial_board(board(&["####....##"])));
        recorder.finish_on_clear = Some(EndReason::Objective);
        let mut session = GameSession::new(Box::new(recorder), SEED).unwrap();

        session.hard_drop().unwrap();

        assert_eq!(session.end_reason(), Some(EndReason::Objective));
        assert!(session.active_piece().is_none());
        assert_eq!(
            events.borrow().last(),
            Some(&Event::GameOver(EndReason::Objective))
        );
    }

    #[test]
    fn test_outgoing_garbage_from_hook() {
        let (mut recorder, _) = recorder(i_only().with_initial_board(board(&["####....##"])));
        recorder.garbage_per_clear = 2;
        let mut session = GameSession::new(Box::new(recorder), SEED).unwrap();

        session.hard_drop().unwrap();

        assert_eq!(session.take_outgoing_garbage(), 2);
        assert_eq!(session.take_outgoing_garbage(), 0);
    }

    #[test]
    fn test_received_garbage_rises_after_lock() {
        let (mut session, _) = session(i_only());
        session.receive_garbage(2, 0);
        assert_eq!(session.pending_garbage(), 2);

        session.hard_drop().unwrap();

        assert_eq!(session.pending_garbage(), 0);
        let board = session.board();
        for row in [18, 19] {
            assert_eq!(board.cell(row, 0), Some(Cell::Empty));
            assert_eq!(board.cell(row, 1), Some(Cell::Garbage));
        }
        assert_eq!(board.cell(17, 4), Some(Cell::Block(PieceKind::I)));
    }

    #[test]
    fn test_garbage_overflow_tops_out() {
        let (mut session, _) = session(i_only());
        session.receive_garbage(20, 3);
        session.hard_drop().unwrap();
        assert_eq!(session.end_reason(), Some(EndReason::TopOut));
    }

    #[test]
    fn test_snapshot() {
        let (session, _) = session(i_only());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.next, vec![PieceKind::I; 3]);
        assert_eq!(snapshot.ghost.unwrap().row(), 18);
        assert_eq!(snapshot.hold, None);
        assert!(snapshot.can_hold);
        assert!(!snapshot.game_over);
        assert_eq!(snapshot.remaining_ms, None);
    }

    #[test]
    fn test_reset_starts_over() {
        let (mut session, events) = session(i_only());
        session.hard_drop().unwrap();
        session.end(EndReason::Quit);
        assert!(session.state().is_game_over());

        session.reset(SEED).unwrap();

        assert!(session.state().is_playing());
        assert!(session.board().is_empty());
        assert_eq!(session.stats().score(), 0);
        assert_eq!(
            events
                .borrow()
                .iter()
                .filter(|e| **e == Event::Start)
                .count(),
            2
        );
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let (recorder, _) = recorder(ModeConfig::new(GameMode::Classic).with_board_size(0, 10));
        assert!(matches!(
            GameSession::new(Box::new(recorder), SEED),
            Err(ConfigError::InvalidBoardSize { .. })
        ));
    }
}
