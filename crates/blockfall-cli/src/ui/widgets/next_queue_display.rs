use blockfall_engine::{GameSession, PieceKind};
use ratatui::{
    layout::{Constraint, Layout},
    prelude::{Buffer, Rect},
    symbols::line,
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::{BlockDisplay, PieceDisplay, style};

/// The session's preview queue.
///
/// One slot per lookahead entry, so the panel keeps its size while the queue
/// drains at game over. The piece that spawns next is drawn solid above a
/// divider; the rest are outlines.
#[derive(Debug)]
pub struct NextQueueDisplay<'a> {
    slots: Vec<Option<PieceKind>>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> NextQueueDisplay<'a> {
    pub fn new(session: &GameSession) -> Self {
        let mut queue = session.next_pieces();
        let slots = (0..session.config().lookahead).map(|_| queue.next()).collect();
        Self { slots, block: None }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    fn slot_height() -> u16 {
        2 * BlockDisplay::height()
    }

    fn has_divider(&self) -> bool {
        self.slots.len() > 1
    }

    pub fn width(&self) -> u16 {
        4 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        let slots = super::cells_to_u16(self.slots.len());
        Self::slot_height() * slots
            + u16::from(self.has_divider())
            + super::block_vertical_margin(self.block.as_ref())
    }

    /// Each slot's piece and whether it is drawn as an outline.
    fn previews(&self) -> impl Iterator<Item = (Option<PieceKind>, bool)> + '_ {
        self.slots.iter().enumerate().map(|(i, piece)| (*piece, i > 0))
    }
}

impl Widget for NextQueueDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &NextQueueDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let mut constraints = vec![Constraint::Length(NextQueueDisplay::slot_height())];
        if self.has_divider() {
            constraints.push(Constraint::Length(1));
            constraints.extend(
                (1..self.slots.len()).map(|_| Constraint::Length(NextQueueDisplay::slot_height())),
            );
        }
        let mut rows = area.layout_vec(&Layout::vertical(constraints)).into_iter();

        let mut previews = self
            .previews()
            .map(|(piece, dimmed)| PieceDisplay::new().piece(piece).dimmed(dimmed));
        if let (Some(row), Some(next)) = (rows.next(), previews.next()) {
            next.render(row, buf);
        }
        if let Some(divider) = rows.next().filter(|_| self.has_divider()) {
            for x in divider.left()..divider.right() {
                buf[(x, divider.y)]
                    .set_symbol(line::HORIZONTAL)
                    .set_style(style::EMPTY_DOT);
            }
        }
        for (row, later) in rows.zip(previews) {
            later.render(row, buf);
        }
    }
}
