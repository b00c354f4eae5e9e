use std::iter;

use blockfall_engine::{ActivePiece, Board};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::{BlockDisplay, Tile};

#[derive(Debug)]
pub struct BoardDisplay<'a> {
    board: &'a Board,
    ghost: Option<ActivePiece>,
    active: Option<ActivePiece>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> BoardDisplay<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            ghost: None,
            active: None,
            block: None,
        }
    }

    pub fn ghost(self, ghost: Option<ActivePiece>) -> Self {
        Self { ghost, ..self }
    }

    pub fn active(self, active: Option<ActivePiece>) -> Self {
        Self { active, ..self }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        super::cells_to_u16(self.board.cols()) * BlockDisplay::width()
            + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        super::cells_to_u16(self.board.rows()) * BlockDisplay::height()
            + super::block_vertical_margin(self.block.as_ref())
    }

    /// Board squares top row first, with the ghost under the active piece.
    /// Piece cells above the top row are not shown.
    pub fn tiles(&self) -> Vec<Vec<Tile>> {
        let mut tiles = self
            .board
            .row_cells()
            .map(|row| row.iter().copied().map(Tile::from).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let pieces = [
            self.ghost.map(|piece| (piece, Tile::Ghost(piece.kind()))),
            self.active.map(|piece| (piece, Tile::Piece(piece.kind()))),
        ];
        for (piece, tile) in pieces.into_iter().flatten() {
            for (row, col) in piece.cells() {
                let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
                    continue;
                };
                if let Some(square) = tiles.get_mut(row).and_then(|r| r.get_mut(col)) {
                    *square = tile;
                }
            }
        }
        tiles
    }
}

impl Widget for BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let col_constraints =
            (0..self.board.cols()).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints =
            (0..self.board.rows()).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);

        let grid_cells = area
            .layout_vec(&vertical)
            .into_iter()
            .map(|row| row.layout_vec(&horizontal));

        for (grid_row, row) in iter::zip(grid_cells, self.tiles()) {
            for (grid_cell, tile) in iter::zip(grid_row, row) {
                BlockDisplay::from_tile(tile, true).render(grid_cell, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use blockfall_engine::{PieceKind, Rotation};

    use super::*;

    #[test]
    fn test_tiles_overlay_pieces() {
        let board = Board::from_rows(["....", "....", "....", "#..I"]).unwrap();
        let active = ActivePiece::new(PieceKind::O, 1, -1, Rotation::SPAWN);
        let ghost = active.dropped(&board);
        let tiles = BoardDisplay::new(&board)
            .active(Some(active))
            .ghost(Some(ghost))
            .tiles();

        // the active piece's top row is above the board
        assert_eq!(tiles[0][1], Tile::Piece(PieceKind::O));
        assert_eq!(tiles[0][2], Tile::Piece(PieceKind::O));
        assert_eq!(tiles[1][1], Tile::Empty);
        assert_eq!(tiles[2][1], Tile::Ghost(PieceKind::O));
        assert_eq!(tiles[3][2], Tile::Ghost(PieceKind::O));
        assert_eq!(tiles[3][0], Tile::Garbage);
        assert_eq!(tiles[3][3], Tile::Piece(PieceKind::I));
    }

    #[test]
    fn test_active_piece_wins_over_ghost() {
        let board = Board::new(4, 4).unwrap();
        let active = ActivePiece::new(PieceKind::O, 0, 2, Rotation::SPAWN);
        let tiles = BoardDisplay::new(&board)
            .ghost(Some(active.dropped(&board)))
            .active(Some(active))
            .tiles();
        assert!(tiles[2..].iter().all(|row| row[..2] == [Tile::Piece(PieceKind::O); 2]));
        assert_eq!(tiles[0][0], Tile::Empty);
    }
}
