//! State shared by every process using the plugin
//!
//! The PCM side and the control side usually run in different processes,
//! yet both need the current volume and route. They find each other through
//! a System V shared memory segment keyed on a well-known file. Whoever
//! touches it first creates it and fills in the defaults; nobody ever
//! removes it, so it lives as long as the machine does.
//!
//! There is no lock. Every field is a single 32-bit word and is
//! read and written atomically, but a route change writes two fields (index
//! and device id) and a reader in another process may see one without the
//! other for a moment. Concurrent writers can interleave the same way. The
//! control monitor picks up whatever ends up stored on its next pass.

use std::ffi::CString;
use std::fs::OpenOptions;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::{fmt, mem};
use libc::c_int;
use nix::errno::Errno;
use tracing::{debug, error};
use super::config::Nodes;
use super::error::*;

pub const DEFAULT_VOLUME: i32 = 3;
pub const DEFAULT_ROUTE: u32 = 1;
pub const DEFAULT_ROUTE_ID: i32 = 1;
pub const MAX_VOLUME: i32 = 5;

const KEY_PROJ_ID: u8 = b'D';

/// Layout of the shared segment. Fixed size, no version field.
///
/// Every field is 32 bits wide. The C plugin for this driver keeps volume and
/// record flag in a `long`, so on a 64-bit host the two layouts differ and the
/// two plugins must not share a key file.
#[repr(C)]
#[derive(Debug, Default)]
pub struct Record {
    initialized: AtomicI32,
    volume: AtomicI32,
    route: AtomicU32,
    route_id: AtomicI32,
    rec_flag: AtomicI32,
}

/// An attached segment.
struct Segment {
    ptr: NonNull<Record>,
    id: c_int,
}

// Only atomics are reachable through the pointer.
unsafe impl Send for Segment {}
unsafe impl Sync for Segment {}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "Segment(#{}, {:?})", self.id, self.ptr) }
}

impl Segment {
    fn attach(path: &Path) -> Result<Segment> {
        // ftok needs the file to exist; somebody else may own it already, which is fine.
        let _ = OpenOptions::new().write(true).create(true).mode(0o666).open(path);

        let cpath = CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::resource("ftok", Errno::EINVAL))?;
        let key = unsafe { libc::ftok(cpath.as_ptr(), KEY_PROJ_ID as c_int) };
        if key == -1 {
            let e = Errno::last();
            error!("Shared key generation failed for {}: {}", path.display(), e);
            return Err(Error::resource("ftok", e));
        }

        let id = unsafe { libc::shmget(key, mem::size_of::<Record>(), libc::IPC_CREAT | 0o666) };
        if id == -1 {
            let e = Errno::last();
            error!("Shared memory creation failed: {}", e);
            return Err(Error::resource("shmget", e));
        }

        let p = unsafe { libc::shmat(id, ptr::null(), 0) };
        if p as isize == -1 {
            let e = Errno::last();
            error!("Shared memory access failed with id={}: {}", id, e);
            return Err(Error::resource("shmat", e));
        }
        let ptr = NonNull::new(p as *mut Record).ok_or(Error::resource("shmat", Errno::EFAULT))?;
        let s = Segment { ptr, id };

        let r = s.record();
        if r.initialized.load(Ordering::Acquire) == 0 {
            debug!("Initializing shared state #{}", id);
            r.volume.store(DEFAULT_VOLUME, Ordering::Relaxed);
            r.route.store(DEFAULT_ROUTE, Ordering::Relaxed);
            r.route_id.store(DEFAULT_ROUTE_ID, Ordering::Relaxed);
            r.initialized.store(1, Ordering::Release);
        }
        Ok(s)
    }

    fn record(&self) -> &Record { unsafe { self.ptr.as_ref() } }
}

impl Drop for Segment {
    fn drop(&mut self) {
        unsafe { libc::shmdt(self.ptr.as_ptr() as *const libc::c_void) };
    }
}

/// Handle to the shared volume / route / record-enable state.
///
/// Creating a handle does no I/O. Each accessor attaches the segment on
/// first use; if that fails the accessor fails, and the next call tries again.
#[derive(Debug)]
pub struct SharedState {
    path: PathBuf,
    segment: OnceLock<Segment>,
}

impl SharedState {
    pub fn new<P: Into<PathBuf>>(path: P) -> SharedState {
        SharedState { path: path.into(), segment: OnceLock::new() }
    }

    /// The process-wide handle on the default key file.
    ///
    /// It is never dropped, so the segment stays attached until the process exits.
    pub fn global() -> Arc<SharedState> {
        static GLOBAL: OnceLock<Arc<SharedState>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(SharedState::new(Nodes::default().shared_key))).clone()
    }

    pub fn path(&self) -> &Path { &self.path }

    fn record(&self) -> Result<&Record> {
        if let Some(s) = self.segment.get() { return Ok(s.record()) }
        let s = Segment::attach(&self.path)?;
        // Losing a race here just detaches the extra mapping.
        Ok(self.segment.get_or_init(|| s).record())
    }

    pub fn volume(&self) -> Result<i32> { Ok(self.record()?.volume.load(Ordering::Relaxed)) }

    /// Fails for values outside `0..=MAX_VOLUME`.
    pub fn set_volume(&self, v: i32) -> Result<()> {
        if !(0..=MAX_VOLUME).contains(&v) { return Err(Error::bounds("volume", v as i64)) }
        self.record()?.volume.store(v, Ordering::Relaxed);
        Ok(())
    }

    /// Index of the selected route in the driver's endpoint list.
    pub fn route(&self) -> Result<u32> { Ok(self.record()?.route.load(Ordering::Relaxed)) }
    pub fn set_route(&self, v: u32) -> Result<()> {
        self.record()?.route.store(v, Ordering::Relaxed);
        Ok(())
    }

    /// Driver device id of the selected route.
    pub fn route_id(&self) -> Result<i32> { Ok(self.record()?.route_id.load(Ordering::Relaxed)) }
    pub fn set_route_id(&self, v: i32) -> Result<()> {
        self.record()?.route_id.store(v, Ordering::Relaxed);
        Ok(())
    }

    pub fn rec_flag(&self) -> Result<bool> { Ok(self.record()?.rec_flag.load(Ordering::Relaxed) != 0) }
    pub fn set_rec_flag(&self, v: bool) -> Result<()> {
        self.record()?.rec_flag.store(v as i32, Ordering::Relaxed);
        Ok(())
    }

    /// Reads route index and device id.
    pub fn route_pair(&self) -> Result<(u32, i32)> {
        let r = self.record()?;
        Ok((r.route.load(Ordering::Relaxed), r.route_id.load(Ordering::Relaxed)))
    }

    /// Stores route index and device id together; index first.
    pub fn set_route_pair(&self, index: u32, id: i32) -> Result<()> {
        let r = self.record()?;
        r.route.store(index, Ordering::Relaxed);
        r.route_id.store(id, Ordering::Release);
        Ok(())
    }

    /// Marks the segment for removal once every process has detached.
    #[cfg(test)]
    pub(crate) fn remove(&self) {
        if let Some(s) = self.segment.get() {
            unsafe { libc::shmctl(s.id, libc::IPC_RMID, ptr::null_mut()) };
        }
    }
}
