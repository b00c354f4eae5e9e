use blockfall_modes::{BattleOutcome, Opponent, Side};
use crossterm::event::{Event, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
};

use crate::{
    command::play::keys::{self, Action},
    game::Game,
    tui::{App, Tui},
    ui::widgets::{KeyBindingDisplay, SessionDisplay, color},
};

const FPS: f64 = 60.0;

#[derive(Debug)]
pub(crate) struct PlayApp {
    game: Game,
    show_ghost: bool,
    is_exiting: bool,
}

impl PlayApp {
    pub(crate) fn new(game: Game, show_ghost: bool) -> Self {
        Self {
            game,
            show_ghost,
            is_exiting: false,
        }
    }

    pub(crate) fn into_game(self) -> Game {
        self.game
    }

    fn has_second_player(&self) -> bool {
        self.game
            .battle()
            .is_some_and(|battle| battle.opponent() == Opponent::Local)
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Play(side, input) => {
                if let Some(session) = self.game.human_session_mut(side) {
                    // rejected inputs leave the session unchanged
                    _ = session.apply(input);
                }
            }
            Action::TogglePause => self.game.toggle_pause(),
            Action::Quit if self.game.is_over() => self.is_exiting = true,
            Action::Quit => self.game.quit(),
        }
    }

    fn draw_solo(&self, frame: &mut Frame, area: Rect) {
        let display = SessionDisplay::new(self.game.player()).show_ghost(self.show_ghost);
        frame.render_widget(display, area);
    }

    fn draw_battle(&self, frame: &mut Frame, area: Rect) {
        let Some(battle) = self.game.battle() else {
            return;
        };
        let opponent_title = match battle.opponent() {
            Opponent::Cpu(difficulty) => format!("CPU ({difficulty})"),
            Opponent::Local => "PLAYER 2".to_owned(),
        };
        let areas = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).split(area);
        for (side, area) in [Side::Player, Side::Opponent].into_iter().zip(areas.iter()) {
            let title = match side {
                Side::Player => "PLAYER",
                Side::Opponent => opponent_title.as_str(),
            };
            let mut display = SessionDisplay::new(battle.session(side))
                .title(title)
                .show_ghost(self.show_ghost);
            if side.is_player() {
                display = display.highlight(color::GREEN);
            }
            if let Some(outcome) = battle.outcome() {
                display = display.game_over_text(match outcome {
                    BattleOutcome::Winner(winner) if winner == side => "WINNER",
                    BattleOutcome::Winner(_) => "DEFEATED",
                    BattleOutcome::Draw => "DRAW",
                });
            }
            frame.render_widget(display, *area);
        }
    }
}

impl App for PlayApp {
    fn init(&mut self, tui: &mut Tui) {
        tui.set_tick_rate(FPS);
        tui.set_frame_rate(FPS);
    }

    fn should_exit(&self) -> bool {
        self.is_exiting
    }

    fn handle_event(&mut self, _tui: &mut Tui, event: Event) {
        let Some(key) = event.as_key_event() else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Some(action) = keys::action_for(key.code, self.has_second_player()) {
            self.apply(action);
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let [main_area, help_area, second_help_area] = Layout::vertical([
            Constraint::Length(26),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        if self.game.is_battle() {
            self.draw_battle(frame, main_area);
        } else {
            self.draw_solo(frame, main_area);
        }

        if self.game.is_over() {
            frame.render_widget(KeyBindingDisplay::new(keys::GAME_OVER_KEYS), help_area);
            return;
        }
        if self.has_second_player() {
            let first = KeyBindingDisplay::new(keys::PLAYER_KEYS).label("P1");
            let second = KeyBindingDisplay::new(keys::SECOND_PLAYER_KEYS).label("P2");
            frame.render_widget(first, help_area);
            frame.render_widget(second, second_help_area);
        } else {
            frame.render_widget(KeyBindingDisplay::new(keys::PLAYER_KEYS), help_area);
        }
    }

    fn update(&mut self, tui: &mut Tui) {
        self.game.tick(tui.now_ms());
    }
}
