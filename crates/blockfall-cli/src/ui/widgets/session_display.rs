use blockfall_engine::{GameSession, SessionState};
use ratatui::{
    layout::{Constraint, Flex, Layout},
    prelude::{Buffer, Rect},
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Padding, Widget},
};

use crate::ui::widgets::{
    BoardDisplay, NextQueueDisplay, PieceDisplay, SessionStatsDisplay, color, style,
};

/// One session: HOLD and STATS on the left, the board, NEXT on the right.
#[derive(Debug)]
pub struct SessionDisplay<'a> {
    session: &'a GameSession,
    title: Option<&'a str>,
    show_ghost: bool,
    highlight: Option<Color>,
    game_over_text: Option<String>,
    horizontal_padding: u16,
    vertical_padding: u16,
}

impl<'a> SessionDisplay<'a> {
    pub fn new(session: &'a GameSession) -> Self {
        Self {
            session,
            title: None,
            show_ghost: true,
            highlight: None,
            game_over_text: None,
            horizontal_padding: 1,
            vertical_padding: 0,
        }
    }

    /// Title shown above the board.
    pub fn title(self, title: &'a str) -> Self {
        Self {
            title: Some(title),
            ..self
        }
    }

    pub fn show_ghost(self, show_ghost: bool) -> Self {
        Self { show_ghost, ..self }
    }

    /// Border color while playing.
    pub fn highlight(self, color: Color) -> Self {
        Self {
            highlight: Some(color),
            ..self
        }
    }

    /// Replaces the default game over banner.
    pub fn game_over_text(self, text: impl Into<String>) -> Self {
        Self {
            game_over_text: Some(text.into()),
            ..self
        }
    }

    fn game_over_banner(&self) -> String {
        if let Some(text) = &self.game_over_text {
            return text.clone();
        }
        match self.session.end_reason() {
            Some(reason) => format!("GAME OVER ({reason})"),
            None => "GAME OVER".to_owned(),
        }
    }
}

impl Widget for SessionDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &SessionDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let style = style::DEFAULT;
        let block_padding = Padding::symmetric(self.horizontal_padding, self.vertical_padding);
        let state = self.session.state();
        let border_style = match state {
            SessionState::Playing => self.highlight.unwrap_or(color::WHITE),
            SessionState::Paused => color::YELLOW,
            SessionState::GameOver => color::RED,
        };
        let panel = |title: &'static str| {
            Block::bordered()
                .title(Line::from(title).centered())
                .padding(block_padding)
                .border_style(border_style)
                .style(style)
        };

        let game_board = {
            let mut frame = Block::bordered().border_style(border_style).style(style);
            if let Some(title) = self.title {
                frame = frame.title(Line::from(title).centered());
            }
            let ghost = self.show_ghost.then(|| self.session.ghost_piece()).flatten();
            BoardDisplay::new(self.session.board())
                .active(self.session.active_piece().copied())
                .ghost(ghost)
                .block(frame)
        };
        let hold_panel = PieceDisplay::new()
            .piece(self.session.held_piece())
            .dimmed(!self.session.can_hold())
            .block(panel("HOLD"));
        let next_queue = NextQueueDisplay::new(self.session).block(panel("NEXT"));
        let session_stats = SessionStatsDisplay::new(self.session).block(panel("STATS"));

        let [left_column, center_column, right_column] = Layout::horizontal([
            Constraint::Length(u16::max(hold_panel.width(), session_stats.width())),
            Constraint::Length(game_board.width()),
            Constraint::Length(next_queue.width()),
        ])
        .flex(Flex::Center)
        .spacing(1)
        .areas(area);

        let [hold_area, stats_area] = Layout::vertical([
            Constraint::Length(hold_panel.height()),
            Constraint::Length(session_stats.height()),
        ])
        .spacing(1)
        .areas(left_column);
        let hold_area = hold_area.layout::<1>(
            &Layout::horizontal([Constraint::Length(hold_panel.width())]).flex(Flex::End),
        )[0];
        let stats_area = stats_area.layout::<1>(
            &Layout::horizontal([Constraint::Length(session_stats.width())]).flex(Flex::End),
        )[0];

        let [board_area] =
            Layout::vertical([Constraint::Length(game_board.height())]).areas(center_column);

        let [next_queue_area] =
            Layout::vertical([Constraint::Length(next_queue.height())]).areas(right_column);

        let game_board_width = game_board.width();
        hold_panel.render(hold_area, buf);
        session_stats.render(stats_area, buf);
        game_board.render(board_area, buf);
        next_queue.render(next_queue_area, buf);

        let popup = match state {
            SessionState::Playing => None,
            SessionState::Paused => Some((
                "PAUSED".to_owned(),
                Style::new().fg(color::BLACK).bg(color::YELLOW),
            )),
            SessionState::GameOver => Some((
                self.game_over_banner(),
                Style::new().fg(color::WHITE).bg(color::RED),
            )),
        };

        if let Some((text, style)) = popup {
            let block = Block::new().style(style);
            let text = Text::styled(text, style).centered();
            let area =
                board_area.centered(Constraint::Length(game_board_width), Constraint::Length(3));
            let inner = block.inner(area);
            Clear.render(area, buf);
            block.render(area, buf);
            text.render(inner.centered_vertically(Constraint::Length(1)), buf);
        }
    }
}
