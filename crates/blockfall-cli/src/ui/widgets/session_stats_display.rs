use std::{iter, time::Duration};

use blockfall_engine::GameSession;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::style;

pub struct SessionStatsDisplay<'a> {
    session: &'a GameSession,
    block: Option<BlockWidget<'a>>,
}

impl<'a> SessionStatsDisplay<'a> {
    pub fn new(session: &'a GameSession) -> Self {
        Self {
            session,
            block: None,
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        24 + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        super::cells_to_u16(ROWS.len()) + super::block_vertical_margin(self.block.as_ref())
    }
}

#[derive(Clone, Copy)]
enum Row {
    Empty,
    FullLabel(&'static str),
    FullValue(&'static dyn Fn(&GameSession) -> String),
    LabelValue(&'static str, &'static dyn Fn(&GameSession) -> String),
}

const ROWS: &[Row] = &[
    Row::FullLabel("SCORE:"),
    Row::FullValue(&|session| session.stats().score().to_string()),
    Row::FullLabel("TIME:"),
    Row::FullValue(&|session| match session.remaining_time() {
        Some(remaining) => format!("{} left", format_duration(remaining)),
        None => format_duration(session.elapsed()),
    }),
    Row::Empty,
    Row::LabelValue("LEVEL:", &|session| session.stats().level().to_string()),
    Row::LabelValue("LINES:", &|session| {
        session.stats().total_lines().to_string()
    }),
    Row::LabelValue("PIECES:", &|session| {
        session.stats().pieces_locked().to_string()
    }),
    Row::LabelValue("TETRIS:", &|session| session.stats().tetrises().to_string()),
    Row::LabelValue("GARBAGE:", &|session| session.pending_garbage().to_string()),
    Row::Empty,
    Row::FullLabel("GOAL:"),
    Row::FullValue(&|session| session.mode().progress().unwrap_or_default()),
];

fn format_duration(duration: Duration) -> String {
    format!(
        "{:0}:{:0>2}.{:0>2}",
        duration.as_secs() / 60,
        duration.as_secs() % 60,
        duration.subsec_millis() / 10
    )
}

impl Widget for SessionStatsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let style = style::DEFAULT;

        let rows_areas =
            Layout::vertical((0..ROWS.len()).map(|_| Constraint::Length(1))).split(area);

        for (row, area) in iter::zip(ROWS.iter().copied(), rows_areas[..].iter().copied()) {
            match row {
                Row::Empty => {}
                Row::FullLabel(label) => {
                    Line::styled(label, style).left_aligned().render(area, buf);
                }
                Row::FullValue(value) => {
                    Line::styled(value(self.session), style)
                        .right_aligned()
                        .render(area, buf);
                }
                Row::LabelValue(label, value) => {
                    let [label_area, value_area] = area.layout(&Layout::horizontal([
                        Constraint::Fill(1),
                        Constraint::Fill(1),
                    ]));
                    Line::styled(label, style)
                        .left_aligned()
                        .render(label_area, buf);
                    Line::styled(value(self.session), style)
                        .right_aligned()
                        .render(value_area, buf);
                }
            }
        }
    }
}
