//! Countdown bomb: a procedurally wound fuse that burns down with the clock
//! and a particle explosion when it runs out.
//!
//! [`countdown::Countdown`] ties the pieces together; the binary only feeds
//! it a clock, key presses and a [`canvas::Canvas`] to paint.

pub mod bomb;
pub mod burn;
pub mod canvas;
pub mod config;
pub mod countdown;
pub mod error;
pub mod explosion;
pub mod fuse;
pub mod geom;
