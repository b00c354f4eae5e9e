use blockfall_engine::PieceKind;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::{BlockDisplay, Tile};

#[derive(Debug)]
pub struct PieceDisplay<'a> {
    piece: Option<PieceKind>,
    dimmed: bool,
    block: Option<BlockWidget<'a>>,
}

impl<'a> PieceDisplay<'a> {
    pub fn new() -> Self {
        Self {
            piece: None,
            dimmed: false,
            block: None,
        }
    }

    pub fn piece(self, piece: Option<PieceKind>) -> Self {
        Self { piece, ..self }
    }

    /// Draws the piece as an outline, e.g. a held piece that cannot be swapped.
    pub fn dimmed(self, dimmed: bool) -> Self {
        Self { dimmed, ..self }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        4 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        2 * BlockDisplay::height() + super::block_vertical_margin(self.block.as_ref())
    }
}

/// Filled cells of `kind` in spawn orientation, shifted to the origin, with
/// the bounding box size as `(rows, cols)`.
fn spawn_cells(kind: PieceKind) -> (Vec<(usize, usize)>, (usize, usize)) {
    let cells = kind.shape().filled_cells().collect::<Vec<_>>();
    let top = cells.iter().map(|&(r, _)| r).min().unwrap_or(0);
    let left = cells.iter().map(|&(_, c)| c).min().unwrap_or(0);
    let cells = cells
        .into_iter()
        .map(|(r, c)| (r - top, c - left))
        .collect::<Vec<_>>();
    let rows = cells.iter().map(|&(r, _)| r + 1).max().unwrap_or(0);
    let cols = cells.iter().map(|&(_, c)| c + 1).max().unwrap_or(0);
    (cells, (rows, cols))
}

impl Widget for PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let Some(piece) = self.piece else {
            return;
        };
        let (cells, (rows, cols)) = spawn_cells(piece);
        let piece_area = area.centered(
            Constraint::Length(super::cells_to_u16(cols) * BlockDisplay::width()),
            Constraint::Length(super::cells_to_u16(rows) * BlockDisplay::height()),
        );

        let col_constraints = (0..cols).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints = (0..rows).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);
        let grid_rows = piece_area
            .layout_vec(&vertical)
            .into_iter()
            .map(|row| row.layout_vec(&horizontal))
            .collect::<Vec<_>>();

        let tile = if self.dimmed {
            Tile::Ghost(piece)
        } else {
            Tile::Piece(piece)
        };
        for (row, col) in cells {
            if let Some(grid_cell) = grid_rows.get(row).and_then(|r| r.get(col)) {
                BlockDisplay::from_tile(tile, false).render(*grid_cell, buf);
            }
        }
    }
}
