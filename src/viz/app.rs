use std::{
    io,
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use crossterm::event::{self, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::{
    components::{render_help, Component, Logs, Plots},
    tui::{key_press, Tui},
};
use crate::harness::Progress;

const TABS: [&str; 2] = ["Plots", "Logs"];

/// Only every n-th loss report is plotted
const LOSS_STRIDE: u64 = 100;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    #[default]
    Train,
    /// The harness hung up; keep showing the last frame until the user quits
    Done,
    Quit,
}

/// The root TUI component which holds the dashboard state and runs the render loop
pub struct App {
    state: State,
    episode: u64,
    total_episodes: u64,
    selected_tab: usize,
    show_help: bool,
    plots: Plots,
    logs: Logs,
}

impl App {
    pub fn new(total_episodes: u64) -> Self {
        Self {
            state: State::default(),
            episode: 0,
            total_episodes,
            selected_tab: 0,
            show_help: false,
            plots: Plots::new(),
            logs: Logs::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Apply one harness event to the dashboard
    pub fn handle_progress(&mut self, event: Progress) {
        match event {
            Progress::Step { step, loss } if step % LOSS_STRIDE == 0 => {
                self.plots.push_loss(step, loss)
            }
            Progress::Step { .. } | Progress::Plot { .. } => {}
            Progress::Evaluation {
                timestep, reward, ..
            } => self.plots.push_reward(timestep, reward),
            Progress::EpisodeEnd { episode, .. } => self.episode = episode + 1,
            Progress::Finished { episodes, .. } => {
                self.episode = episodes;
                self.state = State::Done;
            }
        }
    }

    fn ratio(&self) -> f64 {
        if self.total_episodes == 0 {
            return 1.0;
        }
        (self.episode as f64 / self.total_episodes as f64).clamp(0.0, 1.0)
    }

    fn drain(&mut self, rx: &Receiver<Progress>) {
        loop {
            match rx.try_recv() {
                Ok(event) => self.handle_progress(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.state = State::Done;
                    break;
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, ui_event: &event::Event) {
        match key {
            KeyCode::Char('q') => self.state = State::Quit,
            KeyCode::Char('h') => self.show_help = !self.show_help,
            KeyCode::Tab => self.selected_tab = (self.selected_tab + 1) % TABS.len(),
            _ => {
                match self.selected_tab {
                    0 => self.plots.handle_ui_event(ui_event),
                    _ => self.logs.handle_ui_event(ui_event),
                };
            }
        }
    }

    /// Take over the terminal and run the main loop until the user quits
    pub fn run(&mut self, rx: Receiver<Progress>) -> io::Result<()> {
        let mut tui = Tui::enter()?;

        while self.state != State::Quit {
            if self.state == State::Train {
                self.drain(&rx);
            }

            tui.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                let ui_event = event::read()?;
                if let Some(key) = key_press(&ui_event) {
                    self.handle_key(key, &ui_event);
                }
            }
        }

        Ok(())
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [menu_area, main_area, progress_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        match self.selected_tab {
            0 => self.plots.render_ref(main_area, buf),
            _ => self.logs.render_ref(main_area, buf),
        }

        let title = match self.state {
            State::Train => "Progress",
            State::Done | State::Quit => "Done (press q to quit)",
        };
        Gauge::default()
            .block(Block::bordered().border_type(BorderType::Rounded).title(title))
            .gauge_style(Color::Cyan)
            .label(format!("{}/{}", self.episode, self.total_episodes))
            .ratio(self.ratio())
            .render(progress_area, buf);

        if self.show_help {
            render_help(area, buf, self.selected_tab);
        }
    }
}
