//! Audio playback and capture through `/dev/msm_pcm_out` and `/dev/msm_pcm_in`
//!
//! [`Stream`] carries one ioplug stream from open to close. The device node
//! is opened lazily, on the first transfer or start, and is reopened from
//! scratch whenever the shared route changes: the driver only applies a new
//! route to a fresh session.
//!
//! The driver has no way to read back the hardware position, so
//! [`Stream::pointer`] reports a synthetic value that alternates between zero
//! and one period's worth of bytes. This keeps alsa-lib's ioplug layer
//! transferring but is not a real position; callers needing exact position
//! information are not supported.
//!
//! # Example
//!
//! ```no_run
//! use alsa_android::{Direction, Stream};
//! use alsa_android::pcm::{ChannelArea, HwParams};
//!
//! let mut pcm = Stream::open_default(Direction::Playback, ["type"]).unwrap();
//! pcm.hw_params(&HwParams::s16(2, 44100, 1200, 2)).unwrap();
//! let mut buf = vec![0u8; 4800];
//! let mut area = ChannelArea::interleaved(&mut buf, 2);
//! pcm.transfer(&mut area, 0, 1200).unwrap();
//! pcm.stop().unwrap();
//! ```

use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::Arc;
use nix::errno::Errno;
use tracing::{debug, error, warn};
use super::driver::{Driver, Msm, PcmNode};
use super::error::*;
use super::poll::{PollDescriptors, PollFd, PollFlags};
use super::route::{apply_route, apply_volume};
use super::shared::{SharedState, DEFAULT_ROUTE_ID, DEFAULT_VOLUME};
use super::{config, logging, Direction};

/// [snd_pcm_sframes_t](http://www.alsa-project.org/alsa-doc/alsa-lib/group___p_c_m.html)
pub type Frames = i64;

/// Samples are always 16 bit.
pub const BYTES_PER_SAMPLE: usize = 2;

alsa_enum!(
    /// [SND_PCM_FORMAT_xxx](http://www.alsa-project.org/alsa-doc/alsa-lib/group___p_c_m.html) constants
    Format, ALL_FORMATS[3],

    S16LE = 2,
    S16BE = 3,
    S32LE = 10,
);

alsa_enum!(
    /// [SND_PCM_ACCESS_xxx](http://www.alsa-project.org/alsa-doc/alsa-lib/group___p_c_m.html) constants
    Access, ALL_ACCESSES[5],

    MMapInterleaved = 0,
    MMapNonInterleaved = 1,
    MMapComplex = 2,
    RWInterleaved = 3,
    RWNonInterleaved = 4,
);

/// Parameters the host negotiated for a stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HwParams {
    pub access: Access,
    pub format: Format,
    pub channels: u32,
    pub rate: u32,
    /// Period size in frames.
    pub period_size: Frames,
    pub periods: u32,
}

impl HwParams {
    /// Interleaved S16_LE with the given layout.
    pub fn s16(channels: u32, rate: u32, period_size: Frames, periods: u32) -> HwParams {
        HwParams { access: Access::RWInterleaved, format: Format::S16LE, channels, rate, period_size, periods }
    }

    pub fn bytes_per_frame(&self) -> usize { BYTES_PER_SAMPLE * self.channels as usize }
    pub fn period_bytes(&self) -> usize { (self.period_size.max(0) as usize).saturating_mul(self.bytes_per_frame()) }
    pub fn buffer_bytes(&self) -> usize { self.period_bytes().saturating_mul(self.periods as usize) }
}

/// What a stream accepts, as declared to the host's negotiation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwConstraints {
    pub access: &'static [Access],
    pub formats: &'static [Format],
    pub channels: (u32, u32),
    pub rate: (u32, u32),
    pub period_bytes: &'static [usize],
    pub buffer_bytes: &'static [usize],
    pub periods: (u32, u32),
}

const PLAYBACK_BYTES: &[usize] = &[960 * 5, 960 * 5 * 2];
const CAPTURE_BYTES: &[usize] = &[2048, 2048 * 2];

impl HwConstraints {
    pub fn for_direction(dir: Direction) -> HwConstraints {
        let bytes = match dir {
            Direction::Playback => PLAYBACK_BYTES,
            Direction::Capture => CAPTURE_BYTES,
        };
        HwConstraints {
            access: &[Access::RWInterleaved],
            formats: &[Format::S16LE],
            channels: (1, 2),
            rate: (8000, 48000),
            period_bytes: bytes,
            buffer_bytes: bytes,
            periods: (2, 1024),
        }
    }

    /// Rejects parameters outside the declared sets.
    pub fn check(&self, p: &HwParams) -> Result<()> {
        fn within(what: &str, v: u32, (lo, hi): (u32, u32)) -> Result<()> {
            if v < lo || v > hi { Err(Error::bounds(what, v as i64)) } else { Ok(()) }
        }
        if !self.access.contains(&p.access) { return Err(Error::bounds("access", p.access as i64)) }
        if !self.formats.contains(&p.format) { return Err(Error::bounds("format", p.format as i64)) }
        within("channels", p.channels, self.channels)?;
        within("rate", p.rate, self.rate)?;
        within("periods", p.periods, self.periods)?;
        if !self.period_bytes.contains(&p.period_bytes()) {
            return Err(Error::bounds("period bytes", p.period_bytes() as i64));
        }
        if !self.buffer_bytes.contains(&p.buffer_bytes()) {
            return Err(Error::bounds("buffer bytes", p.buffer_bytes() as i64));
        }
        Ok(())
    }
}

/// The host's view of the ring buffer for one transfer call
/// (`snd_pcm_channel_area_t`). `first` and `step` are in bits.
#[derive(Debug)]
pub struct ChannelArea<'a> {
    pub buf: &'a mut [u8],
    pub first: u32,
    pub step: u32,
}

impl<'a> ChannelArea<'a> {
    /// Interleaved 16-bit frames starting at the beginning of `buf`.
    pub fn interleaved(buf: &'a mut [u8], channels: u32) -> ChannelArea<'a> {
        ChannelArea { buf, first: 0, step: channels.saturating_mul(8 * BYTES_PER_SAMPLE as u32) }
    }

    fn bytes(&mut self, offset: Frames, len: usize) -> Result<&mut [u8]> {
        let start = usize::try_from(offset).ok()
            .and_then(|o| (self.step as usize).checked_mul(o))
            .and_then(|bits| bits.checked_add(self.first as usize))
            .map(|bits| bits / 8)
            .ok_or(Error::bounds("transfer offset", offset))?;
        let end = start.checked_add(len).ok_or(Error::bounds("transfer offset", offset))?;
        let over = end.saturating_sub(self.buf.len());
        self.buf.get_mut(start..end).ok_or(Error::bounds("transfer end", i64::try_from(over).unwrap_or(i64::MAX)))
    }
}

/// Lifecycle of a [`Stream`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// No device session yet.
    Unopened,
    /// Device node open and configured, not started.
    Configured,
    Started,
    /// Stopped; the device node has been closed.
    Stopped,
    Closed,
}

#[derive(Debug, Copy, Clone)]
struct Negotiated {
    rate: u32,
    channels: u32,
    period_size: Frames,
    bytes_per_frame: usize,
}

/// One ioplug stream on the MSM PCM nodes.
#[derive(Debug)]
pub struct Stream<D: Driver = Msm> {
    driver: D,
    shared: Arc<SharedState>,
    direction: Direction,
    constraints: HwConstraints,
    params: Option<Negotiated>,
    buffer_size: usize,
    device: Option<D::Pcm>,
    started: bool,
    old_route: i32,
    hw_pointer: Frames,
    state: State,
}

impl Stream<Msm> {
    /// Opens a stream on the real driver with the process-wide shared state.
    pub fn open_default<'a, I: IntoIterator<Item = &'a str>>(dir: Direction, config_keys: I) -> Result<Stream<Msm>> {
        Stream::open(Msm::default(), SharedState::global(), dir, config_keys)
    }
}

impl<D: Driver> Stream<D> {
    /// Plugin open: checks the configuration node, then routes audio to the
    /// stored device with both paths muted until the first start.
    pub fn open<'a, I: IntoIterator<Item = &'a str>>(driver: D, shared: Arc<SharedState>, dir: Direction, config_keys: I) -> Result<Stream<D>> {
        logging::init();
        config::check_keys(config_keys)?;

        let s = Stream {
            driver,
            shared,
            direction: dir,
            constraints: HwConstraints::for_direction(dir),
            params: None,
            buffer_size: 0,
            device: None,
            started: false,
            old_route: DEFAULT_ROUTE_ID,
            hw_pointer: 0,
            state: State::Unopened,
        };

        let route = s.shared.route_id().unwrap_or(DEFAULT_ROUTE_ID);
        if let Err(e) = apply_route(&s.driver, route, true, true) {
            warn!("Initial routing to device {} failed: {}", route, e);
        }
        Ok(s)
    }

    pub fn direction(&self) -> Direction { self.direction }
    pub fn state(&self) -> State { self.state }
    pub fn constraints(&self) -> &HwConstraints { &self.constraints }
    /// Buffer size the driver reported when the device was last configured, in bytes.
    pub fn buffer_size(&self) -> usize { self.buffer_size }
    pub fn bytes_per_frame(&self) -> usize { self.params.map(|p| p.bytes_per_frame).unwrap_or(0) }
    /// Route device id the current device session was opened for.
    pub fn last_route(&self) -> i32 { self.old_route }
    pub fn is_started(&self) -> bool { self.started }

    /// The device node descriptor while a session is open.
    pub fn poll_fd(&self) -> Option<RawFd> { self.device.as_ref().map(|d| d.as_raw_fd()) }

    fn poll_events(&self) -> PollFlags {
        match self.direction {
            Direction::Playback => PollFlags::POLLOUT,
            Direction::Capture => PollFlags::POLLIN,
        }
    }

    fn negotiated(&self) -> Result<Negotiated> { self.params.ok_or(Error::NotConfigured) }

    /// Records the negotiated rate and frame layout.
    pub fn hw_params(&mut self, p: &HwParams) -> Result<()> {
        self.constraints.check(p)?;
        self.params = Some(Negotiated {
            rate: p.rate,
            channels: p.channels,
            period_size: p.period_size,
            bytes_per_frame: p.bytes_per_frame(),
        });
        Ok(())
    }

    /// Nothing to do; the device is configured on first use.
    pub fn prepare(&mut self) -> Result<()> { Ok(()) }

    fn release(&mut self) {
        self.device = None;
        self.started = false;
    }

    /// Makes sure a configured device session exists for the current route.
    pub fn ensure_open(&mut self) -> Result<()> {
        let p = self.negotiated()?;
        let route = self.shared.route_id().unwrap_or(DEFAULT_ROUTE_ID);

        if self.device.is_some() {
            if route == self.old_route { return Ok(()) }
            debug!("Routing changed from {} to {}, reopening device", self.old_route, route);
            self.release();
            self.state = State::Unopened;
        }
        self.old_route = route;

        let mut dev = self.driver.open_pcm(self.direction).map_err(|e| {
            error!("PCM file open failed: {}", e);
            e
        })?;
        let mut cfg = dev.get_config()?;
        cfg.channel_count = p.channels;
        cfg.sample_rate = p.rate;
        self.buffer_size = cfg.buffer_size as usize;
        dev.set_config(&cfg)?;

        debug!("Opened {:?} device: {} channels, {} Hz, {} byte buffer", self.direction, p.channels, p.rate, self.buffer_size);
        self.device = Some(dev);
        self.state = State::Configured;
        Ok(())
    }

    /// Starts the device the first time only, then pushes the stored volume to it.
    pub fn ensure_started(&mut self) -> Result<()> {
        if self.started { return Ok(()) }
        let dev = self.device.as_mut().ok_or(Error::driver("AUDIO_START", Errno::EBADF))?;
        dev.start()?;
        self.started = true;
        self.state = State::Started;

        let volume = self.shared.volume().unwrap_or(DEFAULT_VOLUME);
        if let Err(e) = apply_volume(&self.driver, volume) {
            warn!("Restoring volume {} failed: {}", volume, e);
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.ensure_started()
    }

    /// Moves up to `size` frames at `offset` of `area` to or from the device.
    ///
    /// Playback writes before starting the device, so that it starts with a
    /// primed buffer; capture starts first and then reads. At most one
    /// driver buffer is moved per call. Returns the number of frames moved.
    pub fn transfer(&mut self, area: &mut ChannelArea, offset: Frames, size: Frames) -> Result<Frames> {
        self.ensure_open()?;
        let bpf = self.negotiated()?.bytes_per_frame;
        let len = (size.max(0) as usize).saturating_mul(bpf).min(self.buffer_size);
        let buf = area.bytes(offset, len)?;

        let mut done = 0;
        if self.direction == Direction::Playback {
            if let Some(dev) = self.device.as_mut() { done = dev.write(buf)?; }
        }

        self.ensure_started()?;

        if self.direction == Direction::Capture {
            if let Some(dev) = self.device.as_mut() { done = dev.read(buf)?; }
        }

        let frames = (done / bpf) as Frames;
        self.hw_pointer += frames;
        Ok(frames)
    }

    /// Synthetic hardware pointer. Returns the last value and flips the
    /// stored one between zero and one period in bytes.
    pub fn pointer(&mut self) -> Frames {
        let ret = self.hw_pointer;
        self.hw_pointer = match self.params {
            Some(p) if self.hw_pointer == 0 => p.period_size * p.bytes_per_frame as Frames,
            _ => 0,
        };
        ret
    }

    /// Stops the device and closes the session, even if the stop directive fails.
    pub fn stop(&mut self) -> Result<()> {
        let r = match self.device.as_mut() {
            Some(dev) => dev.stop(),
            None => Err(Error::driver("AUDIO_STOP", Errno::EBADF)),
        };
        self.release();
        self.state = State::Stopped;
        debug!("Stopped {:?} stream", self.direction);
        r
    }

    /// Halts the device without giving up the session. `enable` is ignored:
    /// the driver has no pause, so this is always a plain stop directive.
    pub fn pause(&mut self, _enable: bool) -> Result<()> {
        self.device.as_mut().ok_or(Error::driver("AUDIO_STOP", Errno::EBADF))?.stop()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.device.as_mut().ok_or(Error::driver("AUDIO_START", Errno::EBADF))?.start()
    }

    /// Closes any open session. Always succeeds.
    pub fn close(&mut self) -> Result<()> {
        self.release();
        self.state = State::Closed;
        Ok(())
    }
}

impl<D: Driver> PollDescriptors for Stream<D> {
    fn count(&self) -> usize { if self.device.is_some() { 1 } else { 0 } }
    fn fill(&self, p: &mut [PollFd]) -> Result<usize> {
        match (self.poll_fd(), p.first_mut()) {
            (Some(fd), Some(slot)) => { *slot = PollFd::new(fd, self.poll_events()); Ok(1) }
            _ => Ok(0),
        }
    }
    fn revents(&self, p: &[PollFd]) -> Result<PollFlags> {
        Ok(p.first().map(|x| x.get_revents()).unwrap_or(PollFlags::empty()))
    }
}
