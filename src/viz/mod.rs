use std::{
    io,
    sync::mpsc::{self, Sender},
    thread::{self, JoinHandle},
};

use log::LevelFilter;

use crate::harness::Progress;

pub use app::App;

mod app;
mod components;
mod tui;

/// Start the training dashboard on its own thread
///
/// Installs [`tui_logger`] as the global logger so that harness logs show up in the Logs tab.
///
/// **Returns** the handle of the render thread and a sender to register with
/// [`Harness::add_sink`](crate::harness::Harness::add_sink)
pub fn init(total_episodes: u64) -> (JoinHandle<io::Result<()>>, Sender<Progress>) {
    if tui_logger::init_logger(LevelFilter::Trace).is_ok() {
        tui_logger::set_default_level(LevelFilter::Trace);
    }

    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || App::new(total_episodes).run(rx));

    (handle, tx)
}
