use std::{
    io::{self, Stdout, Write},
    path::PathBuf,
    sync::mpsc::Sender,
};

/// Something that happened during a harness run
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// One optimization step ran after interaction `step`
    Step { step: u64, loss: f32 },
    /// A point was added to the learning curve
    Evaluation {
        episode: u64,
        timestep: u64,
        reward: f64,
    },
    /// The learning curve was rendered to `path`
    Plot { episode: u64, path: PathBuf },
    /// A training episode went through every stage of the loop
    EpisodeEnd { episode: u64, interactions: u64 },
    /// The final render is done, nothing more will happen
    Finished { episodes: u64, interactions: u64 },
}

/// A consumer of [`Progress`] events
pub trait ProgressSink {
    /// Handle one event
    ///
    /// **Returns** `false` once the sink will never accept events again, which unsubscribes it
    fn on_progress(&mut self, event: &Progress) -> bool;
}

impl ProgressSink for Sender<Progress> {
    fn on_progress(&mut self, event: &Progress) -> bool {
        self.send(event.clone()).is_ok()
    }
}

/// Prints progress the way an interactive training script does
///
/// Loss reports overwrite each other on a single line; evaluations and renders get their own lines.
pub struct Console<W: Write = Stdout> {
    out: W,
}

impl Console {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, event: &Progress) -> io::Result<()> {
        match event {
            Progress::Step { step, loss } => {
                write!(self.out, "\rINFO - Step {step}, loss: {loss}")?;
            }
            Progress::Evaluation {
                timestep, reward, ..
            } => {
                writeln!(self.out, "\n########## Evaluation ##########")?;
                writeln!(self.out, "Timestep: {timestep} Average reward is {reward}")?;
            }
            Progress::Plot { path, .. } => {
                writeln!(self.out, "\nSaved learning curve to {}", path.display())?;
            }
            Progress::EpisodeEnd { .. } => {}
            Progress::Finished {
                episodes,
                interactions,
            } => {
                writeln!(
                    self.out,
                    "\nFinished {episodes} episodes ({interactions} interactions)"
                )?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write> ProgressSink for Console<W> {
    fn on_progress(&mut self, event: &Progress) -> bool {
        // a closed stdout should not stop training
        let _ = self.write(event);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn console_overwrites_steps_in_place() {
        let mut console = Console::new(Vec::new());
        console.on_progress(&Progress::Step { step: 7, loss: 0.25 });
        console.on_progress(&Progress::Step { step: 8, loss: 0.5 });
        console.on_progress(&Progress::Evaluation {
            episode: 1,
            timestep: 8,
            reward: 0.0,
        });

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(
            text,
            "\rINFO - Step 7, loss: 0.25\rINFO - Step 8, loss: 0.5\
             \n########## Evaluation ##########\nTimestep: 8 Average reward is 0\n"
        );
    }

    #[test]
    fn channel_sink_reports_disconnect() {
        let (mut tx, rx) = mpsc::channel();
        let event = Progress::EpisodeEnd {
            episode: 0,
            interactions: 3,
        };
        assert!(tx.on_progress(&event));
        assert_eq!(rx.try_recv().unwrap(), event);

        drop(rx);
        assert!(!tx.on_progress(&event), "receiver gone");
    }
}
