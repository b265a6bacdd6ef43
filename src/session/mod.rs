pub mod controller;
pub mod state;

pub use controller::SessionController;
pub use state::{transition, Command, Effect, MenuEntry, State, Transition};
