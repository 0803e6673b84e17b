//! Countdown state machine: Idle -> Running -> Exploding -> Idle.
//!
//! The driver feeds a monotonic millisecond clock into [`Countdown::update`]
//! once per simulation step and into [`Countdown::render`] once per frame.
//! Nothing here reads a clock on its own.

use crate::bomb::Bomb;
use crate::burn::{self, BurnRenderer};
use crate::canvas::Canvas;
use crate::config::Config;
use crate::explosion::ParticleSet;
use crate::fuse::{self, FusePath};
use crate::geom::Rect;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Exploding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

/// What one [`Countdown::update`] step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    Idle,
    Burning { fraction: f32 },
    /// The fuse ran out this step and the burst was spawned
    Detonated { particles: usize },
    Exploding { particles: usize },
    /// The last particle faded this step; the countdown is idle again
    Finished,
}

pub struct Countdown {
    config: Config,
    bomb: Bomb,
    fuse_bounds: Rect,
    fuse: FusePath,
    burn: BurnRenderer,
    explosion: ParticleSet,
    phase: Phase,
    started_ms: u64,
    ends_ms: u64,
    rng: fastrand::Rng,
}

impl Countdown {
    pub fn new(config: Config, mut rng: fastrand::Rng) -> Self {
        let canvas_bounds = Rect::new(0.0, 0.0, config.canvas.width, config.canvas.height);
        let bomb = Bomb::new(canvas_bounds, config.bomb.clone());
        let fuse_bounds = canvas_bounds.inset(config.fuse.margin);
        let fuse = fuse::generate(
            bomb.fuse_anchor(),
            fuse_bounds,
            config.fuse.steps,
            &config.fuse,
            &mut rng,
        );
        let burn = BurnRenderer::new(config.burn.clone(), rng.u32(..));

        Self {
            config,
            bomb,
            fuse_bounds,
            fuse,
            burn,
            explosion: ParticleSet::default(),
            phase: Phase::Idle,
            started_ms: 0,
            ends_ms: 0,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn fuse(&self) -> &FusePath {
        &self.fuse
    }

    pub fn explosion(&self) -> &ParticleSet {
        &self.explosion
    }

    pub fn bomb(&self) -> &Bomb {
        &self.bomb
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn command(&mut self, command: Command, now_ms: u64) -> Phase {
        match (command, self.phase) {
            (Command::Start, Phase::Idle | Phase::Running) => self.start(now_ms),
            (Command::Stop, Phase::Running) => {
                info!(
                    remaining_ms = self.remaining_ms(now_ms),
                    "countdown stopped"
                );
                self.phase = Phase::Idle;
            }
            (_, Phase::Exploding) => debug!(?command, "ignored while exploding"),
            (Command::Stop, Phase::Idle) => {}
        }
        self.phase
    }

    fn start(&mut self, now_ms: u64) {
        let duration_ms = self.config.duration_ms();
        self.fuse = fuse::generate(
            self.bomb.fuse_anchor(),
            self.fuse_bounds,
            self.config.fuse.steps,
            &self.config.fuse,
            &mut self.rng,
        );
        self.explosion = ParticleSet::default();
        self.started_ms = now_ms;
        self.ends_ms = now_ms + duration_ms;
        self.phase = Phase::Running;
        info!(duration_ms, "countdown started");
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.phase {
            Phase::Running => self.ends_ms.saturating_sub(now_ms),
            Phase::Idle | Phase::Exploding => 0,
        }
    }

    /// Share of the fuse left: 1 when idle, 0 once it has burned down.
    pub fn remaining_fraction(&self, now_ms: u64) -> f32 {
        match self.phase {
            Phase::Idle => 1.0,
            Phase::Exploding => 0.0,
            Phase::Running => {
                let total = self.ends_ms.saturating_sub(self.started_ms);
                if total == 0 {
                    return 0.0;
                }
                (self.remaining_ms(now_ms) as f64 / total as f64).clamp(0.0, 1.0) as f32
            }
        }
    }

    /// Advance the simulation by one fixed step.
    pub fn update(&mut self, now_ms: u64) -> Frame {
        match self.phase {
            Phase::Idle => Frame::Idle,
            Phase::Running if now_ms >= self.ends_ms => {
                self.explosion =
                    ParticleSet::trigger(self.bomb.center(), &self.config.explosion, &mut self.rng);
                self.phase = Phase::Exploding;
                info!(particles = self.explosion.len(), "fuse burned down");
                Frame::Detonated {
                    particles: self.explosion.len(),
                }
            }
            Phase::Running => Frame::Burning {
                fraction: self.remaining_fraction(now_ms),
            },
            Phase::Exploding => {
                if self.explosion.advance() {
                    self.phase = Phase::Idle;
                    info!("explosion finished");
                    Frame::Finished
                } else {
                    Frame::Exploding {
                        particles: self.explosion.len(),
                    }
                }
            }
        }
    }

    pub fn render(&self, now_ms: u64, canvas: &mut Canvas) {
        canvas.clear();
        match self.phase {
            Phase::Idle => {
                self.bomb.render(canvas);
                self.burn.render_unlit(&self.fuse, canvas);
            }
            Phase::Running => {
                self.bomb.render(canvas);
                self.burn.render(&self.fuse, self.remaining_fraction(now_ms), now_ms, canvas);
            }
            Phase::Exploding => self.explosion.render(canvas),
        }
    }

    /// Whole rope points still unburned at `now_ms`.
    pub fn drawn_fuse_len(&self, now_ms: u64) -> usize {
        burn::drawn_len(self.fuse.len(), self.remaining_fraction(now_ms))
    }
}
