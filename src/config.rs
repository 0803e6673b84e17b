//! Tunable parameters for the countdown, the fuse and the explosion.
//!
//! Every section falls back to its defaults, so a config file only needs the
//! keys it wants to change. [`Config::validate`] clamps loaded values into
//! ranges the simulation can cope with.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub type Rgb = (u8, u8, u8);

pub const MIN_DURATION_SECS: u32 = 10;
pub const MAX_DURATION_SECS: u32 = 300;
pub const MIN_PARTICLES: usize = 80;
pub const MAX_PARTICLES: usize = 400;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub countdown: CountdownConfig,
    pub canvas: CanvasConfig,
    pub bomb: BombConfig,
    pub fuse: FuseConfig,
    pub burn: BurnConfig,
    pub explosion: ExplosionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Length of one run in seconds
    pub duration_secs: u32,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self { duration_secs: 60 }
    }
}

/// Logical drawing surface. Everything else is expressed in these units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    pub background: Rgb,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 480.0,
            background: (0, 0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BombConfig {
    pub radius: f32,
    /// Vertical offset of the body centre below the canvas centre
    pub offset_y: f32,
    pub cap_width: f32,
    pub cap_height: f32,
    pub body_color: Rgb,
    pub outline_color: Rgb,
    pub outline_width: f32,
    pub cap_color: Rgb,
}

impl Default for BombConfig {
    fn default() -> Self {
        Self {
            radius: 80.0,
            offset_y: 30.0,
            cap_width: 40.0,
            cap_height: 20.0,
            body_color: (12, 12, 14),
            outline_color: (70, 70, 78),
            outline_width: 5.0,
            cap_color: (40, 40, 44),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuseConfig {
    /// Random-walk steps after the stem
    pub steps: usize,
    pub stem_length: f32,
    pub step_min: f32,
    pub step_max: f32,
    /// Full range of the per-step heading change, in radians
    pub turn: f32,
    /// Distance between the canvas edge and the walk's soft boundary
    pub margin: f32,
}

impl Default for FuseConfig {
    fn default() -> Self {
        Self {
            steps: 150,
            stem_length: 15.0,
            step_min: 10.0,
            step_max: 25.0,
            turn: 1.2,
            margin: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnConfig {
    pub rope_width: f32,
    pub rope_color: Rgb,
    pub texture_width: f32,
    pub texture_color: Rgb,
    /// Dash pattern of the texture pass: (on, off)
    pub dash: (f32, f32),
    pub core_radius: f32,
    pub core_color: Rgb,
    pub glow_radius: f32,
    pub glow_color: Rgb,
    pub glow_alpha: f32,
    pub satellites: usize,
    pub satellite_radius: f32,
    pub satellite_orbit: f32,
    pub satellite_color: Rgb,
    /// Angular speed of the satellite ring in radians per second
    pub satellite_speed: f32,
}

impl Default for BurnConfig {
    fn default() -> Self {
        Self {
            rope_width: 6.0,
            rope_color: (139, 69, 19),
            texture_width: 3.0,
            texture_color: (205, 133, 63),
            dash: (5.0, 3.0),
            core_radius: 6.0,
            core_color: (255, 153, 0),
            glow_radius: 16.0,
            glow_color: (255, 200, 60),
            glow_alpha: 0.35,
            satellites: 8,
            satellite_radius: 2.0,
            satellite_orbit: 14.0,
            satellite_color: (255, 255, 0),
            satellite_speed: 9.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionConfig {
    pub particle_count: usize,
    /// Maximum initial speed, units per step
    pub burst_speed: f32,
    pub gravity: f32,
    /// Velocity multiplier per step
    pub drag: f32,
    pub life_min: f32,
    pub life_max: f32,
    /// Life lost per step
    pub decay: f32,
    pub size_min: f32,
    pub size_max: f32,
    /// Size multiplier per step
    pub shrink: f32,
    pub flash_color: Rgb,
    pub flash_strength: f32,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            particle_count: 200,
            burst_speed: 18.0,
            gravity: 0.15,
            drag: 0.97,
            life_min: 0.5,
            life_max: 1.0,
            decay: 0.015,
            size_min: 2.0,
            size_max: 7.0,
            shrink: 0.98,
            flash_color: (255, 230, 180),
            flash_strength: 0.6,
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        config.validate();
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Clamp every value into a usable range, logging anything that moved.
    pub fn validate(&mut self) {
        let duration = self
            .countdown
            .duration_secs
            .clamp(MIN_DURATION_SECS, MAX_DURATION_SECS);
        if duration != self.countdown.duration_secs {
            warn!(
                "duration {}s out of range, clamped to {duration}s",
                self.countdown.duration_secs
            );
            self.countdown.duration_secs = duration;
        }

        let fuse = &mut self.fuse;
        fuse.steps = fuse.steps.clamp(1, 2000);
        fuse.step_min = fuse.step_min.max(0.5);
        if fuse.step_max < fuse.step_min {
            warn!("fuse.step_max below step_min, raising it to {}", fuse.step_min);
            fuse.step_max = fuse.step_min;
        }
        fuse.turn = fuse.turn.clamp(0.0, std::f32::consts::TAU);
        fuse.stem_length = fuse.stem_length.max(0.0);
        fuse.margin = fuse.margin.max(0.0);

        let bomb = &mut self.bomb;
        bomb.radius = bomb.radius.max(0.0);
        bomb.cap_width = bomb.cap_width.max(0.0);
        bomb.cap_height = bomb.cap_height.max(0.0);
        bomb.outline_width = bomb.outline_width.max(0.0);

        // The stem has to start inside the fuse boundary.
        let (min_width, min_height) = self.min_canvas_size();
        if self.canvas.width < min_width || self.canvas.height < min_height {
            warn!(
                "canvas {}x{} too small for the bomb, raised to {min_width}x{min_height}",
                self.canvas.width, self.canvas.height
            );
            self.canvas.width = self.canvas.width.max(min_width);
            self.canvas.height = self.canvas.height.max(min_height);
        }

        let burn = &mut self.burn;
        burn.glow_alpha = burn.glow_alpha.clamp(0.0, 1.0);
        burn.dash.0 = burn.dash.0.max(0.5);
        burn.dash.1 = burn.dash.1.max(0.0);

        let ex = &mut self.explosion;
        let count = ex.particle_count.clamp(MIN_PARTICLES, MAX_PARTICLES);
        if count != ex.particle_count {
            warn!(
                "particle_count {} out of range, clamped to {count}",
                ex.particle_count
            );
            ex.particle_count = count;
        }
        ex.decay = ex.decay.max(0.001);
        ex.life_max = ex.life_max.max(ex.decay);
        ex.life_min = ex.life_min.clamp(ex.decay, ex.life_max);
        ex.size_min = ex.size_min.max(0.0);
        ex.size_max = ex.size_max.max(ex.size_min);
        ex.drag = ex.drag.clamp(0.0, 1.0);
        ex.shrink = ex.shrink.clamp(0.0, 1.0);
        ex.flash_strength = ex.flash_strength.clamp(0.0, 1.0);
    }

    /// Smallest logical canvas that keeps the fuse stem inside the margin and
    /// leaves the walk room for a couple of full steps.
    pub fn min_canvas_size(&self) -> (f32, f32) {
        let (bomb, fuse) = (&self.bomb, &self.fuse);
        let walk_room = 2.0 * (fuse.margin + fuse.step_max);

        // Anchor sits at h/2 + offset - radius - 0.75 * cap_height.
        let anchor_rise = bomb.radius + bomb.cap_height * 0.75 - bomb.offset_y;
        let above = 2.0 * (fuse.margin + fuse.stem_length + anchor_rise);
        let below = 2.0 * (fuse.margin - anchor_rise);

        let width = walk_room.max(100.0);
        let height = walk_room.max(above).max(below).max(100.0);
        (width, height)
    }

    pub fn duration_ms(&self) -> u64 {
        u64::from(self.countdown.duration_secs) * 1000
    }
}

/// Parse `RRGGBB` (with or without a leading `#`).
pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        let mut validated = config.clone();
        validated.validate();
        assert_eq!(config, validated);
        assert_eq!(config.duration_ms(), 60_000);
    }

    #[test]
    fn test_validation_clamps() {
        let mut config = Config::default();
        config.countdown.duration_secs = 5;
        config.explosion.particle_count = 10_000;
        config.explosion.decay = 0.0;
        config.fuse.step_min = 30.0;
        config.fuse.step_max = 20.0;

        config.validate();

        assert_eq!(config.countdown.duration_secs, MIN_DURATION_SECS);
        assert_eq!(config.explosion.particle_count, MAX_PARTICLES);
        assert!(config.explosion.decay > 0.0);
        assert!(config.fuse.step_max >= config.fuse.step_min);
    }

    #[test]
    fn test_small_canvas_keeps_fuse_on_screen() {
        use crate::bomb::Bomb;
        use crate::fuse;
        use crate::geom::Rect;

        let mut config = Config::default();
        config.canvas.width = 100.0;
        config.canvas.height = 100.0;
        config.validate();

        let (min_width, min_height) = config.min_canvas_size();
        assert!(config.canvas.width >= min_width);
        assert!(config.canvas.height >= min_height);

        let canvas = Rect::new(0.0, 0.0, config.canvas.width, config.canvas.height);
        let bomb = Bomb::new(canvas, config.bomb.clone());
        let bounds = canvas.inset(config.fuse.margin);
        assert!(bounds.contains(bomb.fuse_anchor()), "anchor {:?}", bomb.fuse_anchor());

        let outer = bounds.expand(config.fuse.step_max + 1e-3);
        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let path = fuse::generate(
                bomb.fuse_anchor(),
                bounds,
                config.fuse.steps,
                &config.fuse,
                &mut rng,
            );
            assert!(path.points().iter().all(|p| outer.contains(*p)));
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[countdown]\nduration_secs = 120\n\n[explosion]\nparticle_count = 100")
            .expect("write config");

        let config = Config::load_from(file.path()).expect("load config");
        assert_eq!(config.countdown.duration_secs, 120);
        assert_eq!(config.explosion.particle_count, 100);
        assert_eq!(config.fuse, FuseConfig::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.canvas.background = (0x1a, 0x1b, 0x26);
        let text = config.to_toml_string().expect("serialize");

        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(text.as_bytes()).expect("write config");
        let loaded = Config::load_from(file.path()).expect("load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let err = Config::load_from("/nonexistent/fusebomb.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[countdown\nduration_secs = ").expect("write config");
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("1a1b26"), Some((0x1a, 0x1b, 0x26)));
        assert_eq!(parse_hex_color("#FF8000"), Some((255, 128, 0)));
        assert_eq!(parse_hex_color("12345"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }
}
