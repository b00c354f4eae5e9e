//! Minimal terminal runtime: a tick/render event loop driving an [`App`].

use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event};
use ratatui::Frame;

/// Trait for TUI applications run by [`Tui::run`].
pub(crate) trait App {
    /// Called once before the loop starts. Use this to configure rates.
    fn init(&mut self, tui: &mut Tui);

    fn should_exit(&self) -> bool;

    /// Handles terminal events (key input, resize, etc.).
    fn handle_event(&mut self, tui: &mut Tui, event: Event);

    /// Draws the screen (called on each render event).
    fn draw(&self, frame: &mut Frame);

    /// Updates game logic (called on each tick event).
    fn update(&mut self, tui: &mut Tui);
}

#[derive(Debug, Clone, derive_more::From)]
enum TuiEvent {
    Tick,
    Render,
    Crossterm(Event),
}

/// Event loop state.
///
/// Ticks fire at the tick interval. Renders fire after a tick or a terminal
/// event, at most once per frame interval.
#[derive(Debug)]
pub(crate) struct Tui {
    tick_interval: Option<Duration>,
    frame_interval: Duration,
    started: Instant,
    last_tick: Instant,
    last_render: Instant,
    dirty: bool,
}

impl Default for Tui {
    fn default() -> Self {
        Self::new()
    }
}

impl Tui {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        let past_time = now.checked_sub(Duration::from_secs(86400)).unwrap_or(now);
        Self {
            tick_interval: None,
            frame_interval: Duration::ZERO,
            started: now,
            last_tick: past_time,
            last_render: past_time,
            dirty: true,
        }
    }

    /// Sets the tick rate (Hz, ticks per second).
    pub(crate) fn set_tick_rate(&mut self, rate: f64) {
        self.tick_interval = Some(Duration::from_secs_f64(1.0 / rate));
    }

    /// Sets the maximum number of renders per second.
    pub(crate) fn set_frame_rate(&mut self, rate: f64) {
        self.frame_interval = Duration::from_secs_f64(1.0 / rate);
    }

    /// Monotonic milliseconds since the runtime was created.
    #[expect(clippy::cast_possible_truncation)]
    pub(crate) fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Runs `app` until it asks to exit.
    pub(crate) fn run<A>(mut self, app: &mut A) -> anyhow::Result<()>
    where
        A: App,
    {
        app.init(&mut self);

        ratatui::run(|terminal| {
            while !app.should_exit() {
                match self.next_event()? {
                    TuiEvent::Tick => app.update(&mut self),
                    TuiEvent::Render => _ = terminal.draw(|f| app.draw(f))?,
                    TuiEvent::Crossterm(event) => app.handle_event(&mut self, event),
                }
            }
            Ok(())
        })
    }

    /// Blocks until a tick or render is due or a terminal event arrives.
    fn next_event(&mut self) -> io::Result<TuiEvent> {
        loop {
            let now = Instant::now();
            if let Some(tick_interval) = self.tick_interval
                && now.duration_since(self.last_tick) >= tick_interval
            {
                self.last_tick = now;
                self.dirty = true;
                return Ok(TuiEvent::Tick);
            }

            if self.dirty && now.duration_since(self.last_render) >= self.frame_interval {
                self.last_render = now;
                self.dirty = false;
                return Ok(TuiEvent::Render);
            }

            if let Some(timeout) = self.compute_timeout(now)
                && !event::poll(timeout)?
            {
                continue;
            }

            self.dirty = true;
            return Ok(event::read()?.into());
        }
    }

    fn compute_timeout(&self, now: Instant) -> Option<Duration> {
        let next_tick_at = self.tick_interval.map(|interval| self.last_tick + interval);
        let next_render_at = self.dirty.then(|| self.last_render + self.frame_interval);
        let next_timeout_at = [next_tick_at, next_render_at].into_iter().flatten().min()?;
        Some(next_timeout_at.saturating_duration_since(now))
    }
}
