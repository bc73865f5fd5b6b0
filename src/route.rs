//! Routing and volume directives
//!
//! Both go through the control node, which is opened for the duration of a
//! single call and closed again. Used by the PCM side when a stream is
//! opened or started, and by the control side when the user changes route
//! or volume.

use tracing::{debug, error};
use super::driver::{ControlNode, DeviceConfig, Driver, VolumeConfig, SND_METHOD_VOICE, SND_MUTE_MUTED, SND_MUTE_UNMUTED};
use super::error::*;

/// Device id meaning "leave routing alone".
pub const NO_DEVICE: i32 = -1;

/// Logical output devices that carry their own volume: handset, speaker,
/// headset and bluetooth.
pub const VOLUME_DEVICES: u32 = 4;

fn mute(m: bool) -> u32 { if m { SND_MUTE_MUTED } else { SND_MUTE_UNMUTED } }

/// Routes audio to `device`, muting earpiece and/or microphone path as asked.
pub fn apply_route<D: Driver>(driver: &D, device: i32, ear_mute: bool, mic_mute: bool) -> Result<()> {
    if device == NO_DEVICE { return Ok(()) }
    let mut c = driver.open_control()?;
    let cfg = DeviceConfig { device: device as u32, ear_mute: mute(ear_mute), mic_mute: mute(mic_mute) };
    debug!("Routing to device {} (ear muted: {}, mic muted: {})", device, ear_mute, mic_mute);
    c.set_device(&cfg).map_err(|e| {
        error!("snd_set_device error: {}", e);
        e
    })
}

/// Sets `volume` on every logical device, in order. Stops at the first failure.
pub fn apply_volume<D: Driver>(driver: &D, volume: i32) -> Result<()> {
    let mut c = driver.open_control()?;
    let mut cfg = VolumeConfig { device: 0, method: SND_METHOD_VOICE, volume: volume as u32 };
    for device in 0..VOLUME_DEVICES {
        cfg.device = device;
        c.set_volume(&cfg).map_err(|e| {
            error!("set volume failed on device {}: {}", device, e);
            e
        })?;
    }
    Ok(())
}
