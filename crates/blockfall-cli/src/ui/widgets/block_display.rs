use blockfall_engine::{Cell, PieceKind};
use ratatui::{
    prelude::{Buffer, Rect},
    style::Style,
    widgets::{Paragraph, Widget},
};

use crate::ui::widgets::style;

/// What a single board square shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tile {
    #[default]
    Empty,
    Garbage,
    Ghost(PieceKind),
    Piece(PieceKind),
}

impl From<Cell> for Tile {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => Self::Empty,
            Cell::Block(kind) => Self::Piece(kind),
            Cell::Garbage => Self::Garbage,
        }
    }
}

#[derive(Debug)]
pub struct BlockDisplay {
    style: Style,
    symbol: &'static str,
}

impl BlockDisplay {
    pub const fn new(style: Style, symbol: &'static str) -> Self {
        Self { style, symbol }
    }

    pub fn width() -> u16 {
        2
    }

    pub fn height() -> u16 {
        1
    }

    pub fn from_tile(tile: Tile, show_dots: bool) -> Self {
        match tile {
            Tile::Empty if show_dots => Self::new(style::EMPTY_DOT, "."),
            Tile::Empty => Self::new(style::EMPTY, ""),
            Tile::Garbage => Self::new(style::GARBAGE, ""),
            Tile::Ghost(kind) => Self::new(style::ghost(kind), "[]"),
            Tile::Piece(kind) => Self::new(style::piece(kind), ""),
        }
    }
}

impl Widget for BlockDisplay {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BlockDisplay {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        // Paragraph fills the whole area, not just the cells under the symbol
        Paragraph::new(self.symbol)
            .style(self.style)
            .centered()
            .render(area, buf);
    }
}
