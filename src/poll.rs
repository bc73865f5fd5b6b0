//! Tiny poll ffi
//!
//! The host polls the control session for change notifications, and the
//! PCM stream for readiness of the device node. Both hand out their
//! descriptors through [`PollDescriptors`].

use std::os::unix::io::{AsRawFd, RawFd};
use nix::errno::Errno;
use super::error::*;

bitflags::bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct PollFlags: libc::c_short {
        const POLLIN  = libc::POLLIN;
        const POLLPRI = libc::POLLPRI;
        const POLLOUT = libc::POLLOUT;
        const POLLERR = libc::POLLERR;
        const POLLHUP = libc::POLLHUP;
        const POLLNVAL = libc::POLLNVAL;
    }
}

#[repr(C)]
#[derive(Clone, Debug)]
pub struct PollFd {
    fd: libc::c_int,
    events: libc::c_short,
    revents: libc::c_short,
}

impl AsRawFd for PollFd {
    fn as_raw_fd(&self) -> RawFd { self.fd }
}

impl PollFd {
    pub fn new(fd: RawFd, f: PollFlags) -> PollFd { PollFd { fd, events: f.bits(), revents: 0 }}
    pub fn get_events(&self) -> PollFlags { PollFlags::from_bits_truncate(self.events) }
    pub fn set_events(&mut self, f: PollFlags) { self.events = f.bits(); }
    pub fn get_revents(&self) -> PollFlags { PollFlags::from_bits_truncate(self.revents) }
}

pub trait PollDescriptors {
    fn count(&self) -> usize;
    fn fill(&self, p: &mut [PollFd]) -> Result<usize>;
    fn revents(&self, p: &[PollFd]) -> Result<PollFlags>;

    /// Wrapper around count and fill - returns an array of PollFds
    fn get(&self) -> Result<Vec<PollFd>> {
        let mut v = vec![PollFd { fd: 0, events: 0, revents: 0 }; self.count()];
        let n = self.fill(&mut v)?;
        if n != v.len() { Err(Error::bounds("filled poll descriptors", n as i64)) }
        else { Ok(v) }
    }
}

impl PollDescriptors for PollFd {
    fn count(&self) -> usize { 1 }
    fn fill(&self, a: &mut [PollFd]) -> Result<usize> { a[0] = self.clone(); Ok(1) }
    fn revents(&self, a: &[PollFd]) -> Result<PollFlags> { Ok(a[0].get_revents()) }
}

/// Wrapper around the libc poll call.
pub fn poll(fds: &mut [PollFd], timeout: i32) -> Result<usize> {
    let r = unsafe { libc::poll(fds.as_mut_ptr() as *mut libc::pollfd, fds.len() as libc::nfds_t, timeout) };
    if r >= 0 { Ok(r as usize) } else { Err(Error::driver("poll", Errno::last())) }
}

#[test]
fn poll_pipe() {
    use std::io::Write;
    use std::os::fd::OwnedFd;
    let (rd, wr): (OwnedFd, OwnedFd) = nix::unistd::pipe().unwrap();
    let p = PollFd::new(rd.as_raw_fd(), PollFlags::POLLIN);
    let mut fds = p.get().unwrap();
    assert_eq!(poll(&mut fds, 0).unwrap(), 0);
    let mut w = std::fs::File::from(wr);
    w.write_all(&[1]).unwrap();
    assert_eq!(poll(&mut fds, 1000).unwrap(), 1);
    assert_eq!(p.revents(&fds).unwrap(), PollFlags::POLLIN);

    // Closing the write end adds a hangup.
    drop(w);
    assert_eq!(poll(&mut fds, 1000).unwrap(), 1);
    assert!(p.revents(&fds).unwrap().contains(PollFlags::POLLIN | PollFlags::POLLHUP));
}
