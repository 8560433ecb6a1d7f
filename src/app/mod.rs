// Application layer - Screen controller, use case interactors and session loop

pub mod container;
pub mod controller;
pub mod save_interactor;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export application types
pub use container::{AppContainer, DefaultAppContainer};
pub use controller::{ControllerOptions, ControllerPorts, ScreenController};
pub use save_interactor::SaveInteractor;
pub use session::{Command, Session};
