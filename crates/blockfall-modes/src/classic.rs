use blockfall_engine::{GameMode, LINES_PER_LEVEL, LineClear, ModeConfig, ModeControl, ModeStrategy};

/// Marathon rules: the level rises every 10 lines and gravity follows the
/// classic curve until the stack tops out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicMode {
    starting_level: u32,
    level: u32,
    total_lines: usize,
}

impl Default for ClassicMode {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ClassicMode {
    #[must_use]
    pub fn new(starting_level: u32) -> Self {
        Self {
            starting_level,
            level: starting_level,
            total_lines: 0,
        }
    }
}

impl ModeStrategy for ClassicMode {
    fn config(&self) -> ModeConfig {
        ModeConfig::new(GameMode::Classic).with_starting_level(self.starting_level)
    }

    fn on_line_cleared(&mut self, clear: &LineClear, _control: &mut ModeControl) {
        self.level = clear.level;
        self.total_lines = clear.total_lines;
    }

    fn progress(&self) -> Option<String> {
        let to_next = LINES_PER_LEVEL - self.total_lines % LINES_PER_LEVEL;
        Some(format!("level {}, {to_next} lines to next", self.level))
    }
}
