//! Recording driver and throwaway shared state for tests.

use std::collections::HashSet;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::{Arc, Mutex, MutexGuard};
use nix::errno::Errno;
use tempfile::TempDir;
use crate::driver::*;
use crate::error::*;
use crate::shared::SharedState;
use crate::Direction;

/// One thing the driver was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    OpenControl,
    CloseControl,
    SetDevice { device: u32, ear_mute: u32, mic_mute: u32 },
    SetVolume { device: u32, volume: u32 },
    NumEndpoints,
    GetEndpoint(i32),
    OpenPcm(Direction),
    ClosePcm,
    GetConfig,
    SetConfig { channels: u32, rate: u32 },
    Start,
    Stop,
    Write(usize),
    Read(usize),
}

#[derive(Debug)]
struct Inner {
    log: Vec<Directive>,
    endpoints: Vec<Endpoint>,
    buffer_size: u32,
    failing: HashSet<&'static str>,
    fail_volume_device: Option<u32>,
    next_fd: RawFd,
}

#[derive(Debug, Clone)]
pub struct MockDriver(Arc<Mutex<Inner>>);

impl MockDriver {
    pub fn new() -> MockDriver {
        let endpoints = ["HANDSET", "SPEAKER", "HEADSET", "BT"].iter().enumerate()
            .map(|(i, n)| Endpoint { id: 10 + i as i32, name: n.to_string() }).collect();
        MockDriver(Arc::new(Mutex::new(Inner {
            log: vec!(),
            endpoints,
            buffer_size: 4800,
            failing: HashSet::new(),
            fail_volume_device: None,
            next_fd: 100,
        })))
    }

    fn inner(&self) -> MutexGuard<Inner> { self.0.lock().unwrap() }

    fn push(&self, d: Directive) { self.inner().log.push(d) }

    fn fails(&self, what: &'static str) -> Result<()> {
        if self.inner().failing.contains(what) { Err(Error::driver(what, Errno::EIO)) } else { Ok(()) }
    }

    /// Makes every later call of `what` fail with EIO.
    pub fn fail(&self, what: &'static str) { self.inner().failing.insert(what); }
    pub fn fail_volume_on(&self, device: u32) { self.inner().fail_volume_device = Some(device) }
    pub fn set_endpoints(&self, e: Vec<Endpoint>) { self.inner().endpoints = e }
    pub fn set_buffer_size(&self, b: u32) { self.inner().buffer_size = b }

    pub fn log(&self) -> Vec<Directive> { self.inner().log.clone() }
    pub fn clear(&self) { self.inner().log.clear() }
}

#[derive(Debug)]
pub struct MockControl(MockDriver);

impl Drop for MockControl {
    fn drop(&mut self) { self.0.push(Directive::CloseControl) }
}

impl ControlNode for MockControl {
    fn set_device(&mut self, cfg: &DeviceConfig) -> Result<()> {
        self.0.fails("set_device")?;
        self.0.push(Directive::SetDevice { device: cfg.device, ear_mute: cfg.ear_mute, mic_mute: cfg.mic_mute });
        Ok(())
    }

    fn set_volume(&mut self, cfg: &VolumeConfig) -> Result<()> {
        assert_eq!(cfg.method, SND_METHOD_VOICE);
        if self.0.inner().fail_volume_device == Some(cfg.device) {
            return Err(Error::driver("set_volume", Errno::EIO));
        }
        self.0.push(Directive::SetVolume { device: cfg.device, volume: cfg.volume });
        Ok(())
    }

    fn num_endpoints(&mut self) -> Result<i32> {
        self.0.fails("num_endpoints")?;
        self.0.push(Directive::NumEndpoints);
        Ok(self.0.inner().endpoints.len() as i32)
    }

    fn endpoint(&mut self, index: i32) -> Result<Endpoint> {
        self.0.fails("get_endpoint")?;
        self.0.push(Directive::GetEndpoint(index));
        self.0.inner().endpoints.get(index as usize).cloned().ok_or(Error::driver("get_endpoint", Errno::EINVAL))
    }
}

#[derive(Debug)]
pub struct MockPcm {
    driver: MockDriver,
    fd: RawFd,
    config: AudioConfig,
}

impl Drop for MockPcm {
    fn drop(&mut self) { self.driver.push(Directive::ClosePcm) }
}

impl AsRawFd for MockPcm {
    fn as_raw_fd(&self) -> RawFd { self.fd }
}

impl PcmNode for MockPcm {
    fn get_config(&mut self) -> Result<AudioConfig> {
        self.driver.fails("get_config")?;
        self.driver.push(Directive::GetConfig);
        Ok(self.config)
    }

    fn set_config(&mut self, cfg: &AudioConfig) -> Result<()> {
        self.driver.fails("set_config")?;
        assert_eq!(cfg.buffer_size, self.config.buffer_size);
        self.driver.push(Directive::SetConfig { channels: cfg.channel_count, rate: cfg.sample_rate });
        self.config = *cfg;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.driver.fails("start")?;
        self.driver.push(Directive::Start);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.driver.push(Directive::Stop);
        self.driver.fails("stop")
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.driver.fails("write")?;
        self.driver.push(Directive::Write(buf.len()));
        Ok(buf.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.driver.fails("read")?;
        self.driver.push(Directive::Read(buf.len()));
        for (i, b) in buf.iter_mut().enumerate() { *b = i as u8 }
        Ok(buf.len())
    }
}

impl Driver for MockDriver {
    type Control = MockControl;
    type Pcm = MockPcm;

    fn open_control(&self) -> Result<MockControl> {
        self.fails("open_control")?;
        self.push(Directive::OpenControl);
        Ok(MockControl(self.clone()))
    }

    fn open_pcm(&self, dir: Direction) -> Result<MockPcm> {
        self.fails("open_pcm")?;
        self.push(Directive::OpenPcm(dir));
        let mut i = self.inner();
        i.next_fd += 1;
        let config = AudioConfig { buffer_size: i.buffer_size, buffer_count: 2, channel_count: 2, sample_rate: 44100, ..AudioConfig::default() };
        Ok(MockPcm { driver: self.clone(), fd: i.next_fd, config })
    }
}

/// A shared state segment private to one test, removed afterwards.
#[derive(Debug)]
pub struct TestStore {
    pub shared: Arc<SharedState>,
    _dir: TempDir,
}

impl TestStore {
    pub fn new() -> TestStore {
        let dir = tempfile::tempdir().unwrap();
        let shared = Arc::new(SharedState::new(dir.path().join("alsa_android")));
        // Attach now so that drop has a segment to remove.
        shared.volume().unwrap();
        TestStore { shared, _dir: dir }
    }
}

impl Drop for TestStore {
    fn drop(&mut self) { self.shared.remove() }
}
