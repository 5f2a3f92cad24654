//! Keystrokes and the input symbols of the annotation process

use crate::annotations::Direction;
use crate::meanings::DELETE_CHAR;

/// A keystroke as delivered by the terminal front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStroke {
    Char(char),
    Delete,
    Left,
    Right,
    Up,
    Down,
}

/// What a keystroke asks the annotation process to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Annotate with the meaning assigned to this key
    Annotate(char),
    /// Set the value of the last-added annotation
    Value(u8),
    /// Remove the last-added annotation
    DeleteLast,
    /// Remove the value of the last-added annotation
    ClearValue,
    /// Move the review cursor
    Navigate(Direction),
    /// Move the reference time back by one time step
    StepBack,
    /// Move the reference time forward by one time step
    StepForward,
    /// Stop annotating
    Stop,
}

impl From<KeyStroke> for Input {
    fn from(stroke: KeyStroke) -> Self {
        match stroke {
            KeyStroke::Char(' ') => Input::Stop,
            KeyStroke::Char(DELETE_CHAR) | KeyStroke::Char('\x08') | KeyStroke::Delete => {
                Input::DeleteLast
            }
            KeyStroke::Char('-') => Input::ClearValue,
            KeyStroke::Char('<') => Input::Navigate(Direction::First),
            KeyStroke::Char('>') => Input::Navigate(Direction::Last),
            KeyStroke::Char(c) => match c.to_digit(10) {
                Some(digit) => Input::Value(digit as u8),
                None => Input::Annotate(c),
            },
            KeyStroke::Left => Input::Navigate(Direction::Previous),
            KeyStroke::Right => Input::Navigate(Direction::Next),
            KeyStroke::Up => Input::StepBack,
            KeyStroke::Down => Input::StepForward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystroke_classification() {
        assert_eq!(Input::from(KeyStroke::Char(' ')), Input::Stop);
        assert_eq!(Input::from(KeyStroke::Char('7')), Input::Value(7));
        assert_eq!(Input::from(KeyStroke::Char('-')), Input::ClearValue);
        assert_eq!(Input::from(KeyStroke::Char('\x7f')), Input::DeleteLast);
        assert_eq!(Input::from(KeyStroke::Delete), Input::DeleteLast);
        assert_eq!(Input::from(KeyStroke::Char('<')), Input::Navigate(Direction::First));
        assert_eq!(Input::from(KeyStroke::Char('>')), Input::Navigate(Direction::Last));
        assert_eq!(Input::from(KeyStroke::Left), Input::Navigate(Direction::Previous));
        assert_eq!(Input::from(KeyStroke::Right), Input::Navigate(Direction::Next));
        assert_eq!(Input::from(KeyStroke::Up), Input::StepBack);
        assert_eq!(Input::from(KeyStroke::Down), Input::StepForward);
        assert_eq!(Input::from(KeyStroke::Char('i')), Input::Annotate('i'));
    }
}
