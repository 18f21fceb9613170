//! Game session: settings, the controller state machine and its view.

mod controller;
mod error;
mod pending;
mod settings;
mod view;

pub use controller::SessionController;
pub use error::SessionError;
pub use pending::{OpponentReplies, OpponentReply, Ticket};
pub use settings::{GameMode, GameSettings, Phase};
pub use view::SessionView;
