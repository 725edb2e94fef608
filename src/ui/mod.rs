//! Ratatui front-end: the view controller that translates keystrokes into
//! store and catalog calls and reflects the outcome back through list views
//! and the status footer. Rendering always re-queries state after a command;
//! nothing in here caches rows past the next store write.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
