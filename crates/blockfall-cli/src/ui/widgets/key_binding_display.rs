use ratatui::{
    prelude::{Buffer, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::widgets::color;

const LABEL: Style = Style::new().fg(color::GREEN);
const KEY: Style = Style::new().fg(color::YELLOW);
const KEY_SEPARATOR: Style = Style::new().fg(color::GRAY);
const ACTION: Style = Style::new().fg(color::WHITE);

/// Keys bound to one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    keys: &'static [&'static str],
    action: &'static str,
}

impl KeyBinding {
    pub const fn new(keys: &'static [&'static str], action: &'static str) -> Self {
        Self { keys, action }
    }

    fn spans(self) -> impl Iterator<Item = Span<'static>> {
        let keys = self.keys.iter().enumerate().flat_map(|(i, key)| {
            let separator = (i > 0).then(|| Span::styled("/", KEY_SEPARATOR));
            separator.into_iter().chain([Span::styled(*key, KEY)])
        });
        keys.chain([Span::raw(" "), Span::styled(self.action, ACTION)])
    }
}

/// A centered line of key hints.
///
/// Bindings that do not fit the width are left out from the end, never cut
/// in the middle.
#[derive(Debug)]
pub struct KeyBindingDisplay<'a> {
    label: Option<&'a str>,
    bindings: &'a [KeyBinding],
}

impl<'a> KeyBindingDisplay<'a> {
    pub fn new(bindings: &'a [KeyBinding]) -> Self {
        Self {
            label: None,
            bindings,
        }
    }

    /// Names the player the keys belong to.
    pub fn label(self, label: &'a str) -> Self {
        Self {
            label: Some(label),
            ..self
        }
    }

    fn line(&self, width: u16) -> Line<'static> {
        let width = usize::from(width);
        let mut line = Line::default();
        if let Some(label) = self.label {
            line.push_span(Span::styled(format!("{label}: "), LABEL));
        }
        for (i, binding) in self.bindings.iter().enumerate() {
            let gap = (i > 0).then(|| Span::raw("  "));
            let item = gap.into_iter().chain(binding.spans()).collect::<Vec<_>>();
            let item_width = item.iter().map(Span::width).sum::<usize>();
            if line.width() + item_width > width {
                break;
            }
            line.spans.extend(item);
        }
        line.centered()
    }
}

impl Widget for KeyBindingDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.line(area.width).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINDINGS: &[KeyBinding] = &[
        KeyBinding::new(&["←", "→"], "Move"),
        KeyBinding::new(&["Space"], "Hard Drop"),
        KeyBinding::new(&["C"], "Hold"),
    ];

    fn text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_all_bindings_fit() {
        let line = KeyBindingDisplay::new(BINDINGS).line(80);
        assert_eq!(text(&line), "←/→ Move  Space Hard Drop  C Hold");
    }

    #[test]
    fn test_narrow_width_drops_trailing_bindings() {
        let display = KeyBindingDisplay::new(BINDINGS);
        assert_eq!(text(&display.line(26)), "←/→ Move  Space Hard Drop");
        assert_eq!(text(&display.line(10)), "←/→ Move");
        assert_eq!(text(&display.line(3)), "");
    }

    #[test]
    fn test_label_prefix() {
        let line = KeyBindingDisplay::new(&BINDINGS[2..]).label("P2").line(80);
        assert_eq!(text(&line), "P2: C Hold");
    }
}
