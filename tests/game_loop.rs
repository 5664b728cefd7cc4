//! Driving a game through fixed and variable time steps.

mod backend;

use std::time::Duration;

use backend::TestBackend;
use kestrel::{
    game::{GameHost, GameState},
    graphics::{backend::recording::BackendCall, Color, DisplayOrientation},
    Config, Context, Error, Game, GameTime, Result,
};

/// 60 updates per second, rounded to whole microseconds.
const TARGET: Duration = Duration::from_micros(16_667);

/// Game recording everything the loop asks of it.
#[derive(Debug, Default)]
struct Recorder {
    /// Time of every update.
    updates: Vec<GameTime>,
    /// Time of every draw.
    draws: Vec<GameTime>,
    /// Suppress the draw in this update, counting from one.
    suppress_on_update: Option<usize>,
    /// Exit in this update, counting from one.
    exit_on_update: Option<usize>,
    /// Lifecycle callbacks in the order they were called.
    lifecycle: Vec<&'static str>,
}

impl Recorder {
    /// Suppress the draw of an update.
    fn suppressing(update: usize) -> Self {
        Self {
            suppress_on_update: Some(update),
            ..Self::default()
        }
    }

    /// Exit in an update.
    fn exiting(update: usize) -> Self {
        Self {
            exit_on_update: Some(update),
            ..Self::default()
        }
    }
}

impl Game for Recorder {
    fn initialize(&mut self, _ctx: Context) -> Result<()> {
        self.lifecycle.push("initialize");

        Ok(())
    }

    fn load_content(&mut self, _ctx: Context) -> Result<()> {
        self.lifecycle.push("load content");

        Ok(())
    }

    fn update(&mut self, ctx: Context) -> Result<()> {
        self.updates.push(ctx.game_time());

        if self.suppress_on_update == Some(self.updates.len()) {
            ctx.suppress_draw();
        }
        if self.exit_on_update == Some(self.updates.len()) {
            ctx.exit();
        }

        Ok(())
    }

    fn draw(&mut self, ctx: Context) -> Result<()> {
        self.draws.push(ctx.game_time());

        ctx.device(|device| device.clear(Color::CORNFLOWER_BLUE))
    }

    fn on_exiting(&mut self, _ctx: Context) {
        self.lifecycle.push("exiting");
    }

    fn unload_content(&mut self, _ctx: Context) {
        self.lifecycle.push("unload content");
    }
}

/// Host with a fixed time step of [`TARGET`].
fn host(game: Recorder, platform: &TestBackend) -> GameHost<Recorder> {
    GameHost::new(
        game,
        platform.clone(),
        Config::default().with_target_elapsed_time(TARGET),
    )
    .with_clock(platform.clock())
}

#[test]
fn fixed_step_catches_up() -> miette::Result<()> {
    let platform = TestBackend::new();
    let mut host = host(Recorder::default(), &platform);

    host.step(Duration::from_micros(50_000))?;

    let game = host.game();
    assert_eq!(game.updates.len(), 3);
    assert_eq!(game.draws.len(), 1);
    assert_eq!(game.draws[0].elapsed_game_time(), Duration::from_micros(50_001));
    assert_eq!(game.draws[0].total_game_time(), TARGET * 3);
    assert!(game
        .updates
        .iter()
        .all(|time| time.elapsed_game_time() == TARGET));

    Ok(())
}

#[test]
fn not_enough_time_runs_nothing() {
    let platform = TestBackend::new();
    let mut host = host(Recorder::default(), &platform);

    host.step(Duration::from_micros(10_000)).unwrap();
    assert!(host.game().updates.is_empty());
    assert!(host.game().draws.is_empty());

    // The remainder is kept for the next frame
    host.step(Duration::from_micros(6_500)).unwrap();
    assert_eq!(host.game().updates.len(), 1);
}

#[test]
fn suppressed_draw_only_skips_one_frame() {
    let platform = TestBackend::new();
    let mut host = host(Recorder::suppressing(1), &platform);

    host.step(TARGET).unwrap();
    assert_eq!(host.game().updates.len(), 1);
    assert!(host.game().draws.is_empty());

    host.step(TARGET).unwrap();
    assert_eq!(host.game().updates.len(), 2);
    assert_eq!(host.game().draws.len(), 1);
}

#[test]
fn variable_step_updates_once_per_frame() {
    let platform = TestBackend::new();
    let mut host = GameHost::new(
        Recorder::default(),
        platform.clone(),
        Config::default().with_fixed_time_step(false),
    );

    host.step(Duration::from_millis(33)).unwrap();
    host.step(Duration::from_millis(5)).unwrap();

    let game = host.game();
    assert_eq!(game.updates.len(), 2);
    assert_eq!(game.draws.len(), 2);
    assert_eq!(game.updates[0].elapsed_game_time(), Duration::from_millis(33));
    assert_eq!(game.draws[1].elapsed_game_time(), Duration::from_millis(5));
    assert_eq!(game.draws[1].total_game_time(), Duration::from_millis(38));
}

#[test]
fn long_frames_are_clamped() {
    let platform = TestBackend::new();
    let mut host = host(Recorder::default(), &platform);

    host.step(Duration::from_secs(2)).unwrap();

    // Half a second fits 30 updates within the snap tolerance
    let game = host.game();
    assert_eq!(game.updates.len(), 30);
    // A single long frame isn't a trend
    assert!(!game.draws[0].is_running_slowly());
}

#[test]
fn five_lagging_ticks_run_slowly() {
    let platform = TestBackend::new();
    let mut host = host(Recorder::default(), &platform);

    for _ in 0..4 {
        host.step(TARGET * 3).unwrap();
        assert!(!host.game_loop().is_running_slowly());
    }
    host.step(TARGET * 3).unwrap();
    assert!(host.game_loop().is_running_slowly());
    assert!(host.game().draws[4].is_running_slowly());

    // Updates of the following ticks see the flag
    host.step(TARGET).unwrap();
    assert!(host.game().updates[15].is_running_slowly());
}

#[test]
fn tiny_steps_survive_huge_elapsed_times() {
    let platform = TestBackend::new();
    let mut host = GameHost::new(
        Recorder::default(),
        platform.clone(),
        Config::default()
            .with_target_elapsed_time(Duration::from_micros(100))
            .with_max_elapsed_time(Duration::from_millis(1)),
    );

    host.step(Duration::MAX).unwrap();
    host.step(Duration::MAX).unwrap();

    assert_eq!(host.game().draws.len(), 2);
}

#[test]
fn tick_sleeps_until_an_update_is_due() {
    let platform = TestBackend::new();
    let mut host = host(Recorder::default(), &platform);

    host.tick().unwrap();

    assert_eq!(host.game().updates.len(), 1);
    assert_eq!(host.game().draws.len(), 1);
    assert_eq!(platform.state().sleeps, [Duration::from_micros(16_467)]);
    assert_eq!(host.state(), GameState::Running);
}

#[test]
fn inactive_game_sleeps_longer() {
    let platform = TestBackend::new();
    platform.state_mut().active = false;
    let mut host = host(Recorder::default(), &platform);

    host.tick().unwrap();

    let sleeps = platform.state().sleeps.clone();
    assert_eq!(sleeps[0], Duration::from_millis(20));
    assert!(!host.game().updates.is_empty());
}

#[test]
fn exit_stops_the_loop() {
    let platform = TestBackend::new();
    let mut host = host(Recorder::exiting(2), &platform);

    host.step(TARGET * 4).unwrap();

    let game = host.game();
    // No more updates after the exit request, the frame is still drawn
    assert_eq!(game.updates.len(), 2);
    assert_eq!(game.draws.len(), 1);
    assert_eq!(
        game.lifecycle,
        ["initialize", "load content", "exiting", "unload content"]
    );
    assert_eq!(host.state(), GameState::Exited);
    assert!(platform.state().exited);
    assert_eq!(
        platform
            .last_log()
            .count(|call| *call == BackendCall::Dispose),
        1
    );

    assert!(matches!(host.step(TARGET), Err(Error::GameExited)));
}

#[test]
fn run_returns_after_exit() -> miette::Result<()> {
    let platform = TestBackend::new();
    let mut host = host(Recorder::exiting(10), &platform);

    host.run()?;

    assert_eq!(host.game().updates.len(), 10);
    assert_eq!(
        host.game().updates[9].total_game_time(),
        TARGET * 10
    );
    assert_eq!(host.state(), GameState::Exited);

    Ok(())
}

#[test]
fn rotation_is_picked_up_every_tick() {
    let platform = TestBackend::mobile();
    let mut host = host(Recorder::default(), &platform);
    host.initialize().unwrap();

    platform.rotate(DisplayOrientation::PORTRAIT);
    host.step(TARGET).unwrap();

    let size = host.context().graphics(|graphics| {
        graphics.graphics_device().map(|device| {
            let parameters = device.presentation_parameters();

            (parameters.back_buffer_width, parameters.back_buffer_height)
        })
    });
    assert_eq!(size, Some((480, 800)));
}

#[test]
fn draw_is_presented() {
    let platform = TestBackend::new();
    let mut host = host(Recorder::default(), &platform);

    host.step(TARGET).unwrap();

    let calls = platform.last_log().calls();
    let clear = calls
        .iter()
        .position(|call| matches!(call, BackendCall::Clear { .. }))
        .unwrap();
    let present = calls
        .iter()
        .position(|call| *call == BackendCall::Present)
        .unwrap();
    assert!(clear < present);
}
