use crossterm::event::{Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::Component;
use crate::{
    plot::{Labels, Plot},
    viz::tui::key_press,
};

const NAMES: [&str; 2] = ["Reward", "Loss"];

/// The live learning curve and training loss, one shown at a time
pub struct Plots {
    plots: [Plot; 2],
    selected: usize,
}

impl Plots {
    pub fn new() -> Self {
        let rewards = Plot::new(Labels::new("timestep", "reward", "evaluation"));
        let losses = Plot::new(Labels::new("step", "loss", "training loss"));
        Self {
            plots: [rewards, losses],
            selected: 0,
        }
    }

    pub fn rewards(&self) -> &Plot {
        &self.plots[0]
    }

    pub fn losses(&self) -> &Plot {
        &self.plots[1]
    }

    pub fn push_reward(&mut self, timestep: u64, reward: f64) {
        self.plots[0].update((timestep as f64, reward));
    }

    pub fn push_loss(&mut self, step: u64, loss: f32) {
        self.plots[1].update((step as f64, loss.into()));
    }

    pub fn next_plot(&mut self) {
        self.selected = (self.selected + 1) % self.plots.len();
    }

    pub fn prev_plot(&mut self) {
        let len = self.plots.len();
        self.selected = (self.selected + len - 1) % len;
    }
}

impl WidgetRef for Plots {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let [tabs_area, plot_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        Tabs::new(NAMES)
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(tabs_area, buf);

        self.plots[self.selected].render(plot_area, buf);
    }
}

impl Component for Plots {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        match key_press(event) {
            Some(KeyCode::Left) => self.prev_plot(),
            Some(KeyCode::Right) => self.next_plot(),
            _ => return false,
        }
        true
    }
}
