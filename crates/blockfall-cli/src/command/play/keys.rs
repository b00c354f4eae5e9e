use blockfall_engine::Input;
use blockfall_modes::Side;
use crossterm::event::KeyCode;

use crate::ui::widgets::KeyBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Play(Side, Input),
    TogglePause,
    Quit,
}

pub(crate) const PLAYER_KEYS: &[KeyBinding] = &[
    KeyBinding::new(&["←", "→"], "Move"),
    KeyBinding::new(&["↓"], "Soft Drop"),
    KeyBinding::new(&["Space"], "Hard Drop"),
    KeyBinding::new(&["↑", "X"], "Rotate"),
    KeyBinding::new(&["Z"], "Rotate Left"),
    KeyBinding::new(&["C"], "Hold"),
    KeyBinding::new(&["P"], "Pause"),
    KeyBinding::new(&["Q"], "Quit"),
];

pub(crate) const SECOND_PLAYER_KEYS: &[KeyBinding] = &[
    KeyBinding::new(&["J", "L"], "Move"),
    KeyBinding::new(&["K"], "Soft Drop"),
    KeyBinding::new(&["O"], "Hard Drop"),
    KeyBinding::new(&["I"], "Rotate"),
    KeyBinding::new(&["U"], "Rotate Left"),
    KeyBinding::new(&["H"], "Hold"),
];

pub(crate) const GAME_OVER_KEYS: &[KeyBinding] = &[KeyBinding::new(&["Q", "Esc"], "Exit")];

/// Maps a pressed key to an action. The second player's keys are only
/// bound when `second_player` is set. Letters are case-insensitive.
pub(crate) fn action_for(code: KeyCode, second_player: bool) -> Option<Action> {
    let player = |input| Some(Action::Play(Side::Player, input));
    let second = |input| second_player.then_some(Action::Play(Side::Opponent, input));
    match code {
        KeyCode::Left => player(Input::MoveLeft),
        KeyCode::Right => player(Input::MoveRight),
        KeyCode::Down => player(Input::SoftDrop),
        KeyCode::Up => player(Input::RotateCw),
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'z' => player(Input::RotateCcw),
            'x' => player(Input::RotateCw),
            ' ' => player(Input::HardDrop),
            'c' => player(Input::Hold),
            'p' => Some(Action::TogglePause),
            'q' => Some(Action::Quit),
            'j' => second(Input::MoveLeft),
            'l' => second(Input::MoveRight),
            'k' => second(Input::SoftDrop),
            'i' => second(Input::RotateCw),
            'u' => second(Input::RotateCcw),
            'o' => second(Input::HardDrop),
            'h' => second(Input::Hold),
            _ => None,
        },
        _ => None,
    }
}
