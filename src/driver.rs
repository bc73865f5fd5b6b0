//! MSM sound driver directives
//!
//! The driver header declares most of its ioctls with a pointer or
//! `unsigned` as the size argument rather than the struct that is actually
//! passed, so the request codes are built by hand and issued through the
//! `_bad` flavour of the nix ioctl macros.
//!
//! [`Driver`] is the seam between the bridges and the device nodes: [`Msm`]
//! talks to the real nodes, tests substitute a recording driver.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::mem::size_of;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use libc::{c_char, c_int};
use tracing::error;
use super::config::Nodes;
use super::error::*;
use super::Direction;

const AUDIO_IOCTL_MAGIC: u8 = b'a';
const SND_IOCTL_MAGIC: u8 = b's';

pub const SND_MUTE_UNMUTED: u32 = 0;
pub const SND_MUTE_MUTED: u32 = 1;
pub const SND_METHOD_VOICE: u32 = 0;

/// `struct msm_audio_config`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AudioConfig {
    pub buffer_size: u32,
    pub buffer_count: u32,
    pub channel_count: u32,
    pub sample_rate: u32,
    pub type_: u32,
    pub unused: [u32; 3],
}

/// `struct msm_snd_device_config`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    pub device: u32,
    pub ear_mute: u32,
    pub mic_mute: u32,
}

/// `struct msm_snd_volume_config`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct VolumeConfig {
    pub device: u32,
    pub method: u32,
    pub volume: u32,
}

/// `struct msm_snd_endpoint`
#[repr(C)]
#[derive(Copy, Clone)]
pub struct RawEndpoint {
    pub id: c_int,
    pub name: [c_char; 64],
}

impl fmt::Debug for RawEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RawEndpoint({:?})", Endpoint::from(self))
    }
}

nix::ioctl_write_int_bad!(audio_start, nix::request_code_write!(AUDIO_IOCTL_MAGIC, 0, size_of::<u32>()));
nix::ioctl_write_int_bad!(audio_stop, nix::request_code_write!(AUDIO_IOCTL_MAGIC, 1, size_of::<u32>()));
nix::ioctl_read_bad!(audio_get_config, nix::request_code_read!(AUDIO_IOCTL_MAGIC, 3, size_of::<u32>()), AudioConfig);
nix::ioctl_write_ptr_bad!(audio_set_config, nix::request_code_write!(AUDIO_IOCTL_MAGIC, 4, size_of::<u32>()), AudioConfig);

nix::ioctl_write_ptr_bad!(snd_set_device, nix::request_code_write!(SND_IOCTL_MAGIC, 2, size_of::<*const DeviceConfig>()), DeviceConfig);
nix::ioctl_write_ptr_bad!(snd_set_volume, nix::request_code_write!(SND_IOCTL_MAGIC, 3, size_of::<*const VolumeConfig>()), VolumeConfig);
nix::ioctl_read_bad!(snd_get_num_endpoints, nix::request_code_read!(SND_IOCTL_MAGIC, 4, size_of::<*const u32>()), c_int);
nix::ioctl_readwrite_bad!(snd_get_endpoint, nix::request_code_readwrite!(SND_IOCTL_MAGIC, 5, size_of::<*const RawEndpoint>()), RawEndpoint);

/// A physical audio path reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Driver-facing device id, as used by `SND_SET_DEVICE`.
    pub id: i32,
    pub name: String,
}

impl From<&RawEndpoint> for Endpoint {
    fn from(r: &RawEndpoint) -> Endpoint {
        let bytes: Vec<u8> = r.name.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
        Endpoint { id: r.id, name: String::from_utf8_lossy(&bytes).into_owned() }
    }
}

/// An open `/dev/msm_snd`. Closed on drop.
pub trait ControlNode: fmt::Debug {
    fn set_device(&mut self, cfg: &DeviceConfig) -> Result<()>;
    fn set_volume(&mut self, cfg: &VolumeConfig) -> Result<()>;
    fn num_endpoints(&mut self) -> Result<i32>;
    /// Fetches the endpoint at `index` of the driver's list.
    fn endpoint(&mut self, index: i32) -> Result<Endpoint>;
}

/// An open PCM node. Closed on drop.
pub trait PcmNode: AsRawFd + fmt::Debug {
    fn get_config(&mut self) -> Result<AudioConfig>;
    fn set_config(&mut self, cfg: &AudioConfig) -> Result<()>;
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn write(&mut self, buf: &[u8]) -> Result<usize>;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Opens the driver's nodes.
pub trait Driver: fmt::Debug {
    type Control: ControlNode;
    type Pcm: PcmNode;

    fn open_control(&self) -> Result<Self::Control>;
    /// Playback uses the output node, capture the input node.
    fn open_pcm(&self, dir: Direction) -> Result<Self::Pcm>;
}

/// The real MSM driver.
#[derive(Debug, Clone, Default)]
pub struct Msm {
    nodes: Nodes,
}

impl Msm {
    pub fn new(nodes: Nodes) -> Msm { Msm { nodes } }
    pub fn nodes(&self) -> &Nodes { &self.nodes }
}

fn open_node(path: &Path) -> Result<File> {
    OpenOptions::new().read(true).write(true).open(path).map_err(|e| {
        error!("Can not open {}: {}", path.display(), e);
        Error::unavailable(path, e)
    })
}

fn check(func: &'static str, r: nix::Result<c_int>) -> Result<()> {
    r.map(|_| ()).map_err(|e| {
        error!("{} ioctl failed: {}", func, e);
        Error::driver(func, e)
    })
}

#[derive(Debug)]
pub struct MsmControl(File);

impl ControlNode for MsmControl {
    fn set_device(&mut self, cfg: &DeviceConfig) -> Result<()> {
        check("SND_SET_DEVICE", unsafe { snd_set_device(self.0.as_raw_fd(), cfg) })
    }

    fn set_volume(&mut self, cfg: &VolumeConfig) -> Result<()> {
        check("SND_SET_VOLUME", unsafe { snd_set_volume(self.0.as_raw_fd(), cfg) })
    }

    fn num_endpoints(&mut self) -> Result<i32> {
        let mut n: c_int = 0;
        check("SND_GET_NUM_ENDPOINTS", unsafe { snd_get_num_endpoints(self.0.as_raw_fd(), &mut n) })?;
        Ok(n)
    }

    fn endpoint(&mut self, index: i32) -> Result<Endpoint> {
        let mut r = RawEndpoint { id: index, name: [0; 64] };
        check("SND_GET_ENDPOINT", unsafe { snd_get_endpoint(self.0.as_raw_fd(), &mut r) })?;
        Ok(Endpoint::from(&r))
    }
}

#[derive(Debug)]
pub struct MsmPcm(File);

impl AsRawFd for MsmPcm {
    fn as_raw_fd(&self) -> RawFd { self.0.as_raw_fd() }
}

impl PcmNode for MsmPcm {
    fn get_config(&mut self) -> Result<AudioConfig> {
        let mut c = AudioConfig::default();
        check("AUDIO_GET_CONFIG", unsafe { audio_get_config(self.0.as_raw_fd(), &mut c) })?;
        Ok(c)
    }

    fn set_config(&mut self, cfg: &AudioConfig) -> Result<()> {
        check("AUDIO_SET_CONFIG", unsafe { audio_set_config(self.0.as_raw_fd(), cfg) })
    }

    fn start(&mut self) -> Result<()> {
        check("AUDIO_START", unsafe { audio_start(self.0.as_raw_fd(), 0) })
    }

    fn stop(&mut self) -> Result<()> {
        check("AUDIO_STOP", unsafe { audio_stop(self.0.as_raw_fd(), 0) })
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.0.write(buf).map_err(|e| Error::driver_io("write", e))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.0.read(buf).map_err(|e| Error::driver_io("read", e))
    }
}

impl Driver for Msm {
    type Control = MsmControl;
    type Pcm = MsmPcm;

    fn open_control(&self) -> Result<MsmControl> { open_node(&self.nodes.control).map(MsmControl) }

    fn open_pcm(&self, dir: Direction) -> Result<MsmPcm> {
        let path = match dir {
            Direction::Playback => &self.nodes.pcm_out,
            Direction::Capture => &self.nodes.pcm_in,
        };
        open_node(path).map(MsmPcm)
    }
}

#[test]
fn endpoint_name_stops_at_nul() {
    let mut r = RawEndpoint { id: 7, name: [0; 64] };
    for (d, s) in r.name.iter_mut().zip(b"SPEAKER\0junk".iter()) { *d = *s as c_char; }
    assert_eq!(Endpoint::from(&r), Endpoint { id: 7, name: "SPEAKER".into() });
}

#[test]
fn missing_node_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let m = Msm::new(Nodes { control: dir.path().join("msm_snd"), ..Nodes::default() });
    match m.open_control() {
        Err(Error::DeviceUnavailable { path, errno }) => {
            assert_eq!(path, dir.path().join("msm_snd"));
            assert_eq!(errno, nix::errno::Errno::ENOENT);
        }
        r => panic!("unexpected {:?}", r.map(|_| ())),
    }
}

#[test]
#[ignore] // Needs an MSM device with the sound driver loaded.
fn print_endpoints() {
    let mut c = Msm::default().open_control().unwrap();
    for i in 0..c.num_endpoints().unwrap() {
        println!("{:?}", c.endpoint(i).unwrap());
    }
}
