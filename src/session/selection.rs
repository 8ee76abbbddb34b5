//! Two-click move input.

use crate::chess::{ChessPosition, Color, Square};

/// Input state of the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Idle,
    /// A piece is picked up; `destinations` are highlighted.
    Selected {
        from: Square,
        destinations: Vec<Square>,
    },
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Click {
    /// A piece was picked up.
    Selected {
        from: Square,
        destinations: Vec<Square>,
    },
    /// The caller should play this move (UCI).
    Move(String),
    /// Selection dropped, or nothing selectable was clicked.
    Cleared,
}

impl Selection {
    /// Advance the state machine.
    ///
    /// `movable` says which colors may currently be picked up. A click that
    /// is not a highlighted destination is treated as a fresh selection.
    pub fn click(
        &mut self,
        position: &ChessPosition,
        square: Square,
        movable: impl Fn(Color) -> bool,
    ) -> Click {
        if let Selection::Selected { from, destinations } = self {
            if destinations.contains(&square) {
                let from = *from;
                *self = Selection::Idle;
                return match position.find_move(from, square) {
                    Some(uci) => Click::Move(uci),
                    None => Click::Cleared,
                };
            }
        }

        match position.piece_color_at(square) {
            Some(color) if movable(color) => {
                let destinations = position.destinations(square);
                if destinations.is_empty() {
                    *self = Selection::Idle;
                    Click::Cleared
                } else {
                    *self = Selection::Selected {
                        from: square,
                        destinations: destinations.clone(),
                    };
                    Click::Selected {
                        from: square,
                        destinations,
                    }
                }
            }
            _ => {
                *self = Selection::Idle;
                Click::Cleared
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Selection::Idle;
    }

    pub fn selected(&self) -> Option<Square> {
        match self {
            Selection::Idle => None,
            Selection::Selected { from, .. } => Some(*from),
        }
    }
}
