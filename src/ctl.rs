//! Mixer controls backed by the shared state
//!
//! [`Ctl`] exposes three elements to the host:
//!
//! | numid | name | type |
//! |---|---|---|
//! | 1 | PCM Playback Volume | integer, 0..=5 |
//! | 2 | Playback Route | enumerated over the driver's endpoints |
//! | 3 | Record Capture Switch | boolean |
//!
//! Values live in [`SharedState`], so a change made by any process shows up
//! here. A monitor thread samples the volume and route every couple of
//! seconds and pushes a tag into a non-blocking pipe whenever one of them
//! moved; the read end of that pipe is the descriptor the host polls, and
//! [`Ctl::read_event`] turns each tag into a value-changed event.
//!
//! Notifications may be late or coalesced, never lost for good: the monitor
//! compares against what it saw last, so it reports on its next pass.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use tracing::{debug, error, trace};
use super::config::{self, Config};
use super::driver::{ControlNode, Driver, Endpoint, Msm};
use super::error::*;
use super::poll::{PollDescriptors, PollFd, PollFlags};
use super::route::{apply_route, apply_volume};
use super::shared::{SharedState, MAX_VOLUME};
use super::logging;

alsa_enum!(
    /// [SND_CTL_ELEM_IFACE_xxx](http://www.alsa-project.org/alsa-doc/alsa-lib/group___control.html) constants
    ElemIface, ALL_ELEM_IFACE[7],

    Card = 0,
    Hwdep = 1,
    Mixer = 2,
    PCM = 3,
    Rawmidi = 4,
    Timer = 5,
    Sequencer = 6,
);

alsa_enum!(
    /// [SND_CTL_ELEM_TYPE_xxx](http://www.alsa-project.org/alsa-doc/alsa-lib/group___control.html) constants
    ElemType, ALL_ELEM_TYPES[7],

    None = 0,
    Boolean = 1,
    Integer = 2,
    Enumerated = 3,
    Bytes = 4,
    IEC958 = 5,
    Integer64 = 6,
);

bitflags::bitflags! {
    /// SND_CTL_EXT_ACCESS_xxx
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ElemAccess: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const READWRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

bitflags::bitflags! {
    /// SND_CTL_EVENT_MASK_xxx
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const VALUE = 1 << 0;
        const INFO = 1 << 1;
        const ADD = 1 << 2;
        const TLV = 1 << 3;
    }
}

/// The elements of this plugin. The discriminant is the element's numid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlKey {
    Volume = 1,
    Route = 2,
    RecordEnable = 3,
}

const ALL_KEYS: [ControlKey; 3] = [ControlKey::Volume, ControlKey::Route, ControlKey::RecordEnable];

impl ControlKey {
    pub fn all() -> &'static [ControlKey] { &ALL_KEYS[..] }

    pub fn numid(self) -> u32 { self as u32 }

    pub fn from_numid(numid: u32) -> Option<ControlKey> {
        ALL_KEYS.iter().copied().find(|k| k.numid() == numid)
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlKey::Volume => "PCM Playback Volume",
            ControlKey::Route => "Playback Route",
            ControlKey::RecordEnable => "Record Capture Switch",
        }
    }

    pub fn elem_type(self) -> ElemType {
        match self {
            ControlKey::Volume => ElemType::Integer,
            ControlKey::Route => ElemType::Enumerated,
            ControlKey::RecordEnable => ElemType::Boolean,
        }
    }

    pub fn elem_id(self) -> ElemId {
        ElemId { numid: self.numid(), iface: ElemIface::Mixer, name: self.name().into() }
    }
}

/// [snd_ctl_elem_id_t](http://www.alsa-project.org/alsa-doc/alsa-lib/group___control.html) as seen by the plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElemId {
    /// Zero when the host looks an element up by name.
    pub numid: u32,
    pub iface: ElemIface,
    pub name: String,
}

impl ElemId {
    pub fn by_name(iface: ElemIface, name: &str) -> ElemId { ElemId { numid: 0, iface, name: name.into() } }
    pub fn by_numid(numid: u32) -> ElemId { ElemId { numid, iface: ElemIface::Mixer, name: String::new() } }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub etype: ElemType,
    pub access: ElemAccess,
    pub count: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IntegerInfo {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

/// What [`Ctl::read_event`] reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: ElemId,
    pub mask: EventMask,
}

/// Change tags written by the monitor. Travel through the pipe as a native `i32`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tag {
    Volume = 0,
    Route = 1,
}

impl Tag {
    pub fn from_raw(i: i32) -> Option<Tag> {
        match i {
            0 => Some(Tag::Volume),
            1 => Some(Tag::Route),
            _ => None,
        }
    }

    pub fn key(self) -> ControlKey {
        match self {
            Tag::Volume => ControlKey::Volume,
            Tag::Route => ControlKey::Route,
        }
    }
}

/// Last observed volume and route, for change detection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Watch {
    volume: i32,
    route: u32,
}

impl Watch {
    pub fn new(volume: i32, route: u32) -> Watch { Watch { volume, route } }

    /// Takes a new reading and yields a tag for each value that differs from
    /// the previous one. Readings that could not be taken are skipped.
    pub fn observe(&mut self, volume: Option<i32>, route: Option<u32>) -> impl Iterator<Item = Tag> {
        let v = match volume {
            Some(v) if v != self.volume => { self.volume = v; Some(Tag::Volume) }
            _ => None,
        };
        let r = match route {
            Some(r) if r != self.route => { self.route = r; Some(Tag::Route) }
            _ => None,
        };
        [v, r].into_iter().flatten()
    }
}

fn push_tag(mut push: &File, tag: Tag) {
    // A full pipe drops the tag; the host has unread ones pending anyway.
    match push.write(&(tag as i32).to_ne_bytes()) {
        Ok(_) => trace!("Pushed {:?} change", tag),
        Err(e) => trace!("Dropped {:?} change: {}", tag, e),
    }
}

/// Background sampler of the shared state.
///
/// Stops when dropped: the thread waits on a channel between samples, so
/// dropping the sender wakes it and it exits before the next sample.
#[derive(Debug)]
pub struct Monitor {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Monitor {
    pub fn spawn(shared: Arc<SharedState>, push: File, interval: Duration) -> Result<Monitor> {
        let mut watch = Watch::new(shared.volume().unwrap_or(0), shared.route().unwrap_or(0));
        let (tx, rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("alsa-android-monitor".into())
            .spawn(move || {
                while let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(interval) {
                    for tag in watch.observe(shared.volume().ok(), shared.route().ok()) {
                        push_tag(&push, tag);
                    }
                }
                trace!("Monitor exiting");
            })
            .map_err(|e| Error::resource("pthread_create", Errno::from_raw(e.raw_os_error().unwrap_or(libc::EAGAIN))))?;
        Ok(Monitor { stop: Some(tx), thread: Some(thread) })
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

fn enumerate_endpoints<D: Driver>(driver: &D) -> Result<Vec<Endpoint>> {
    let mut c = driver.open_control().map_err(|e| {
        error!("Error opening control node: {}", e);
        e
    })?;
    let n = c.num_endpoints()?;
    (0..n).map(|i| c.endpoint(i)).collect()
}

/// One control session (ctl_ext instance).
#[derive(Debug)]
pub struct Ctl<D: Driver = Msm> {
    // Declared first so the monitor is gone before its pipe's read end closes.
    monitor: Monitor,
    events: File,
    driver: D,
    shared: Arc<SharedState>,
    endpoints: Vec<Endpoint>,
}

impl Ctl<Msm> {
    /// Opens a control session on the real driver with the process-wide shared state.
    pub fn open_default<'a, I: IntoIterator<Item = &'a str>>(config_keys: I) -> Result<Ctl<Msm>> {
        let cfg = Config::default();
        Ctl::open(Msm::new(cfg.nodes.clone()), SharedState::global(), &cfg, config_keys)
    }
}

impl<D: Driver> Ctl<D> {
    /// Plugin open: checks the configuration node, fetches the endpoint list
    /// and starts the monitor. Nothing is left behind on failure.
    pub fn open<'a, I: IntoIterator<Item = &'a str>>(driver: D, shared: Arc<SharedState>, cfg: &Config, config_keys: I) -> Result<Ctl<D>> {
        logging::init();
        config::check_keys(config_keys)?;

        let (rd, wr) = nix::unistd::pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).map_err(|e| Error::resource("pipe", e))?;
        let endpoints = enumerate_endpoints(&driver)?;
        debug!("Driver reports {} endpoints", endpoints.len());
        let monitor = Monitor::spawn(shared.clone(), File::from(wr), cfg.poll_interval)?;

        Ok(Ctl { monitor, events: File::from(rd), driver, shared, endpoints })
    }

    /// Endpoints as enumerated at open.
    pub fn endpoints(&self) -> &[Endpoint] { &self.endpoints }

    pub fn elem_count(&self) -> usize { ControlKey::all().len() }

    pub fn elem_list(&self, offset: usize) -> Result<ElemId> {
        ControlKey::all().get(offset).map(|k| k.elem_id()).ok_or(Error::bounds("element offset", offset as i64))
    }

    /// Looks an element up by numid, or by name if no numid is given.
    pub fn find_elem(&self, id: &ElemId) -> Option<ControlKey> {
        if id.numid != 0 { return ControlKey::from_numid(id.numid) }
        ControlKey::all().iter().copied().find(|k| id.iface == ElemIface::Mixer && k.name() == id.name)
    }

    pub fn get_attribute(&self, key: ControlKey) -> Attribute {
        Attribute { etype: key.elem_type(), access: ElemAccess::READWRITE, count: 1 }
    }

    pub fn get_integer_info(&self, _key: ControlKey) -> IntegerInfo {
        IntegerInfo { min: 0, max: MAX_VOLUME as i64, step: 0 }
    }

    fn check_kind(key: ControlKey, want: &[ControlKey]) -> Result<()> {
        if want.contains(&key) { Ok(()) }
        else { Err(Error::bounds(format!("control key for this call ({})", key.name()), key.numid() as i64)) }
    }

    pub fn get_enumerated_info(&self, key: ControlKey) -> Result<u32> {
        Self::check_kind(key, &[ControlKey::Route])?;
        Ok(self.endpoints.len() as u32)
    }

    pub fn get_enumerated_name(&self, key: ControlKey, item: u32) -> Result<&str> {
        Self::check_kind(key, &[ControlKey::Route])?;
        self.endpoints.get(item as usize).map(|e| &*e.name).ok_or(Error::bounds("route item", item as i64))
    }

    pub fn read_integer(&self, key: ControlKey) -> Result<i64> {
        match key {
            ControlKey::Volume => self.shared.volume().map(|v| v as i64),
            ControlKey::RecordEnable => self.shared.rec_flag().map(|b| b as i64),
            ControlKey::Route => Self::check_kind(key, &[ControlKey::Volume, ControlKey::RecordEnable]).map(|_| 0),
        }
    }

    /// Volume writes are forwarded to the driver; the record switch only lives in the shared state.
    pub fn write_integer(&self, key: ControlKey, value: i64) -> Result<()> {
        match key {
            ControlKey::Volume => {
                let v = i32::try_from(value).map_err(|_| Error::bounds("volume", value))?;
                self.shared.set_volume(v)?;
                apply_volume(&self.driver, v)
            }
            ControlKey::RecordEnable => self.shared.set_rec_flag(value != 0),
            ControlKey::Route => Self::check_kind(key, &[ControlKey::Volume, ControlKey::RecordEnable]),
        }
    }

    pub fn read_enumerated(&self, key: ControlKey) -> Result<u32> {
        Self::check_kind(key, &[ControlKey::Route])?;
        self.shared.route()
    }

    /// Switches the route. Both paths are muted while the driver reconfigures.
    pub fn write_enumerated(&self, key: ControlKey, item: u32) -> Result<()> {
        Self::check_kind(key, &[ControlKey::Route])?;
        let id = self.endpoints.get(item as usize).map(|e| e.id).ok_or(Error::bounds("route item", item as i64))?;
        self.shared.set_route_pair(item, id)?;
        apply_route(&self.driver, id, true, true)
    }

    /// Consumes one pending change notification, if any.
    pub fn read_event(&self) -> Result<Option<Event>> {
        let mut b = [0u8; 4];
        match (&self.events).read(&mut b) {
            Ok(4) => {}
            Ok(_) => return Ok(None),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(Error::driver_io("read", e)),
        }
        let raw = i32::from_ne_bytes(b);
        let tag = Tag::from_raw(raw).ok_or(Error::bounds("event tag", raw as i64))?;
        Ok(Some(Event { id: tag.key().elem_id(), mask: EventMask::VALUE }))
    }

    /// The descriptor the host polls for [`Ctl::read_event`].
    pub fn poll_fd(&self) -> RawFd { self.events.as_raw_fd() }

    /// Stops the monitor and closes the notification pipe. The shared state stays attached.
    pub fn close(self) {
        let Ctl { monitor, events, .. } = self;
        drop(monitor);
        drop(events);
    }
}

impl<D: Driver> PollDescriptors for Ctl<D> {
    fn count(&self) -> usize { 1 }
    fn fill(&self, p: &mut [PollFd]) -> Result<usize> {
        match p.first_mut() {
            Some(slot) => { *slot = PollFd::new(self.poll_fd(), PollFlags::POLLIN); Ok(1) }
            None => Ok(0),
        }
    }
    fn revents(&self, p: &[PollFd]) -> Result<PollFlags> {
        Ok(p.first().map(|x| x.get_revents()).unwrap_or(PollFlags::empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use crate::mock::{Directive::*, MockDriver, TestStore};
    use crate::poll::poll;

    fn fast() -> Config { Config { poll_interval: Duration::from_millis(10), ..Config::default() } }

    fn ctl(t: &TestStore) -> (Ctl<MockDriver>, MockDriver) {
        let d = MockDriver::new();
        let c = Ctl::open(d.clone(), t.shared.clone(), &fast(), ["type"]).unwrap();
        d.clear();
        (c, d)
    }

    fn wait_event(c: &Ctl<MockDriver>) -> Option<Event> {
        let mut fds = c.get().unwrap();
        poll(&mut fds, 5000).unwrap();
        c.read_event().unwrap()
    }

    #[test]
    fn open_enumerates_endpoints_once() {
        let t = TestStore::new();
        let d = MockDriver::new();
        let c = Ctl::open(d.clone(), t.shared.clone(), &fast(), ["comment", "type"]).unwrap();
        assert_eq!(d.log(), vec![OpenControl, NumEndpoints, GetEndpoint(0), GetEndpoint(1), GetEndpoint(2), GetEndpoint(3), CloseControl]);
        assert_eq!(c.get_enumerated_info(ControlKey::Route).unwrap(), 4);
        assert_eq!(c.get_enumerated_name(ControlKey::Route, 1).unwrap(), "SPEAKER");
        assert!(matches!(c.get_enumerated_name(ControlKey::Route, 4), Err(Error::BoundsViolation { .. })));
        assert_eq!(c.endpoints()[3], Endpoint { id: 13, name: "BT".into() });
    }

    #[test]
    fn open_fails_when_enumeration_fails() {
        let t = TestStore::new();
        for what in ["open_control", "num_endpoints", "get_endpoint"] {
            let d = MockDriver::new();
            d.fail(what);
            assert!(Ctl::open(d.clone(), t.shared.clone(), &fast(), ["type"]).is_err(), "{}", what);
        }
        let d = MockDriver::new();
        assert!(matches!(Ctl::open(d, t.shared.clone(), &fast(), ["type", "slave"]), Err(Error::ConfigurationInvalid(_))));
    }

    #[test]
    fn element_lookup() {
        let t = TestStore::new();
        let (c, _) = ctl(&t);
        assert_eq!(c.elem_count(), 3);
        for (i, k) in ControlKey::all().iter().enumerate() {
            let id = c.elem_list(i).unwrap();
            assert_eq!(id.iface, ElemIface::Mixer);
            assert_eq!(c.find_elem(&id), Some(*k));
            assert_eq!(c.find_elem(&ElemId::by_name(ElemIface::Mixer, k.name())), Some(*k));
        }
        assert!(c.elem_list(3).is_err());
        assert_eq!(c.find_elem(&ElemId::by_numid(4)), None);
        assert_eq!(c.find_elem(&ElemId::by_name(ElemIface::Mixer, "Master Volume")), None);
        assert_eq!(c.find_elem(&ElemId::by_name(ElemIface::PCM, "Playback Route")), None);
    }

    #[test]
    fn attributes() {
        let t = TestStore::new();
        let (c, _) = ctl(&t);
        assert_eq!(c.get_attribute(ControlKey::Volume).etype, ElemType::Integer);
        assert_eq!(c.get_attribute(ControlKey::Route).etype, ElemType::Enumerated);
        assert_eq!(c.get_attribute(ControlKey::RecordEnable),
            Attribute { etype: ElemType::Boolean, access: ElemAccess::READWRITE, count: 1 });
        assert_eq!(c.get_integer_info(ControlKey::Volume), IntegerInfo { min: 0, max: 5, step: 0 });
    }

    #[test]
    fn volume_write_reaches_store_and_driver() {
        let t = TestStore::new();
        let (c, d) = ctl(&t);
        for v in 0..=5 {
            d.clear();
            c.write_integer(ControlKey::Volume, v).unwrap();
            assert_eq!(c.read_integer(ControlKey::Volume).unwrap(), v);
            let expect: Vec<_> = (0..4).map(|device| SetVolume { device, volume: v as u32 }).collect();
            assert_eq!(&d.log()[1..5], &expect[..]);
        }
    }

    #[test]
    fn bad_volume_touches_nothing() {
        let t = TestStore::new();
        let (c, d) = ctl(&t);
        assert!(matches!(c.write_integer(ControlKey::Volume, 6), Err(Error::BoundsViolation { .. })));
        assert!(c.write_integer(ControlKey::Volume, i64::MAX).is_err());
        assert!(d.log().is_empty());
        assert_eq!(c.read_integer(ControlKey::Volume).unwrap(), 3);
    }

    #[test]
    fn volume_driver_failure_is_reported() {
        let t = TestStore::new();
        let (c, d) = ctl(&t);
        d.fail_volume_on(1);
        assert!(matches!(c.write_integer(ControlKey::Volume, 2), Err(Error::DriverRejected { .. })));
        // The stored value has already changed.
        assert_eq!(c.read_integer(ControlKey::Volume).unwrap(), 2);
    }

    #[test]
    fn record_switch_stays_in_store() {
        let t = TestStore::new();
        let (c, d) = ctl(&t);
        assert_eq!(c.read_integer(ControlKey::RecordEnable).unwrap(), 0);
        c.write_integer(ControlKey::RecordEnable, 1).unwrap();
        assert_eq!(c.read_integer(ControlKey::RecordEnable).unwrap(), 1);
        assert!(t.shared.rec_flag().unwrap());
        assert!(d.log().is_empty());
    }

    #[test]
    fn route_write_stores_and_routes_muted() {
        let t = TestStore::new();
        let (c, d) = ctl(&t);
        for i in 0..4u32 {
            d.clear();
            c.write_enumerated(ControlKey::Route, i).unwrap();
            assert_eq!(c.read_enumerated(ControlKey::Route).unwrap(), i);
            let id = 10 + i as i32;
            assert_eq!(t.shared.route_pair().unwrap(), (i, id));
            assert_eq!(d.log(), vec![OpenControl, SetDevice { device: id as u32, ear_mute: 1, mic_mute: 1 }, CloseControl]);
        }
    }

    #[test]
    fn route_out_of_range_touches_nothing() {
        let t = TestStore::new();
        let (c, d) = ctl(&t);
        assert!(matches!(c.write_enumerated(ControlKey::Route, 4), Err(Error::BoundsViolation { .. })));
        assert!(d.log().is_empty());
        assert_eq!(t.shared.route_pair().unwrap(), (1, 1));
    }

    #[test]
    fn wrong_element_type() {
        let t = TestStore::new();
        let (c, d) = ctl(&t);
        assert!(c.read_integer(ControlKey::Route).is_err());
        assert!(c.write_integer(ControlKey::Route, 1).is_err());
        assert!(c.read_enumerated(ControlKey::Volume).is_err());
        assert!(c.write_enumerated(ControlKey::RecordEnable, 0).is_err());
        assert!(c.get_enumerated_info(ControlKey::Volume).is_err());
        assert!(d.log().is_empty());
    }

    #[test]
    fn watch_reports_changes() {
        let mut w = Watch::new(3, 1);
        assert_eq!(w.observe(Some(3), Some(1)).count(), 0);
        assert_eq!(w.observe(Some(5), Some(1)).collect::<Vec<_>>(), vec![Tag::Volume]);
        assert_eq!(w.observe(Some(5), Some(1)).count(), 0);
        assert_eq!(w.observe(Some(0), Some(2)).collect::<Vec<_>>(), vec![Tag::Volume, Tag::Route]);
        assert_eq!(w.observe(None, None).count(), 0);
        assert_eq!(w.observe(None, Some(3)).collect::<Vec<_>>(), vec![Tag::Route]);
    }

    #[test]
    fn no_event_pending() {
        let t = TestStore::new();
        let (c, _) = ctl(&t);
        assert_eq!(c.read_event().unwrap(), None);
    }

    #[test]
    fn external_volume_change_is_notified_once() {
        let t = TestStore::new();
        let (c, _) = ctl(&t);
        assert_eq!(t.shared.volume().unwrap(), 3);

        // Another process changes the volume.
        SharedState::new(t.shared.path()).set_volume(5).unwrap();

        let e = wait_event(&c).unwrap();
        assert_eq!(e, Event { id: ControlKey::Volume.elem_id(), mask: EventMask::VALUE });
        assert_eq!(e.id.numid, 1);

        thread::sleep(Duration::from_millis(100));
        assert_eq!(c.read_event().unwrap(), None);
    }

    #[test]
    fn external_route_change_is_notified() {
        let t = TestStore::new();
        let (c, _) = ctl(&t);
        t.shared.set_route_pair(3, 13).unwrap();
        let e = wait_event(&c).unwrap();
        assert_eq!(e.id, ControlKey::Route.elem_id());
        assert_eq!(e.mask, EventMask::VALUE);
    }

    #[test]
    fn close_stops_monitor_promptly() {
        let t = TestStore::new();
        let d = MockDriver::new();
        let slow = Config { poll_interval: Duration::from_secs(30), ..Config::default() };
        let c = Ctl::open(d, t.shared.clone(), &slow, ["type"]).unwrap();
        let started = Instant::now();
        c.close();
        assert!(started.elapsed() < Duration::from_secs(5));
        // Still usable after the session is gone.
        assert_eq!(t.shared.volume().unwrap(), 3);
    }

    #[test]
    #[ignore] // Needs an MSM device with the sound driver loaded.
    fn list_controls_on_msm() -> anyhow::Result<()> {
        let c = Ctl::open_default(["type"])?;
        for i in 0..c.elem_count() {
            let id = c.elem_list(i)?;
            println!("{}: {}", id.numid, id.name);
        }
        for i in 0..c.get_enumerated_info(ControlKey::Route)? {
            println!("  route {}: {}", i, c.get_enumerated_name(ControlKey::Route, i)?);
        }
        Ok(())
    }
}
