//! ALSA plugin bridge for the MSM Android sound driver.
//!
//! The MSM driver exposes a handful of character devices (`/dev/msm_snd`,
//! `/dev/msm_pcm_out`, `/dev/msm_pcm_in`) driven by ioctls, reads and writes.
//! This crate maps the two ALSA external plugin contracts onto them:
//!
//!  * [`pcm::Stream`] implements the ioplug (buffer transfer) side: open,
//!    configure, start, stop, transfer and a synthetic hardware pointer.
//!  * [`ctl::Ctl`] implements the ctl_ext (control element) side: volume,
//!    output route and record switch, plus change notifications for a polling host.
//!
//! The two bridges are normally loaded into different processes. They only
//! talk through the driver and through [`shared::SharedState`], a tiny record
//! kept in a System V shared memory segment.
//!
//! Plugin registration, symbol export and the alsa-lib callback tables are
//! left to the host glue; every callback has a matching method here, and
//! [`Error::code`] gives the negative errno to hand back to alsa-lib.

macro_rules! alsa_enum {
 ($(#[$attr:meta])+ $name:ident, $static_name:ident [$count:expr], $( $a:ident = $b:expr),* ,) =>
{
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
$(#[$attr])*
pub enum $name {
$(
    $a = $b as isize,
)*
}

static $static_name: [$name; $count] =
  [ $( $name::$a, )* ];

impl $name {
    /// Returns a slice of all possible values; useful for iteration
    pub fn all() -> &'static [$name] { &$static_name[..] }
}

}
}

/// Replaces constants ending with PLAYBACK/CAPTURE
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Playback,
    Capture
}

mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::Config;

pub mod logging;

pub mod driver;
pub use driver::{Driver, Msm};

pub mod shared;
pub use shared::SharedState;

pub mod route;

pub mod poll;
pub use poll::PollDescriptors;

pub mod pcm;
pub use pcm::Stream;

pub mod ctl;
pub use ctl::Ctl;

#[cfg(test)]
mod mock;
