use std::io;
use std::path::{Path, PathBuf};
use libc::c_int;
use nix::errno::Errno;

/// Everything that can go wrong in either bridge.
///
/// Nothing is retried internally: each failure is handed back to the host,
/// which reports [`Error::code`] to the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A system resource (shared segment, pipe, thread) could not be obtained.
    #[error("{func} failed: {errno}")]
    ResourceExhaustion { func: &'static str, errno: Errno },

    /// A device node could not be opened.
    #[error("cannot open {}: {errno}", path.display())]
    DeviceUnavailable { path: PathBuf, errno: Errno },

    /// The driver refused an ioctl, read or write.
    #[error("{func} rejected by driver: {errno}")]
    DriverRejected { func: &'static str, errno: Errno },

    /// The plugin configuration node contains a key we don't know.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// An index or parameter outside the allowed set.
    #[error("{what} out of range: {value}")]
    BoundsViolation { what: String, value: i64 },

    /// A stream operation that needs negotiated hw params was called before them.
    #[error("stream is not configured")]
    NotConfigured,
}

pub type Result<T> = ::std::result::Result<T, Error>;

fn io_errno(e: &io::Error) -> Errno {
    Errno::from_raw(e.raw_os_error().unwrap_or(libc::EIO))
}

impl Error {
    pub(crate) fn driver(func: &'static str, errno: Errno) -> Error {
        Error::DriverRejected { func, errno }
    }

    pub(crate) fn driver_io(func: &'static str, e: io::Error) -> Error {
        Error::DriverRejected { func, errno: io_errno(&e) }
    }

    pub(crate) fn unavailable(path: &Path, e: io::Error) -> Error {
        Error::DeviceUnavailable { path: path.to_owned(), errno: io_errno(&e) }
    }

    pub(crate) fn resource(func: &'static str, errno: Errno) -> Error {
        Error::ResourceExhaustion { func, errno }
    }

    pub(crate) fn bounds(what: impl Into<String>, value: i64) -> Error {
        Error::BoundsViolation { what: what.into(), value }
    }

    /// The OS error behind this failure, if there is one.
    pub fn errno(&self) -> Option<Errno> {
        match *self {
            Error::ResourceExhaustion { errno, .. } |
            Error::DeviceUnavailable { errno, .. } |
            Error::DriverRejected { errno, .. } => Some(errno),
            _ => None,
        }
    }

    /// Negative errno as expected by alsa-lib callbacks.
    pub fn code(&self) -> c_int {
        let errno = match *self {
            Error::ConfigurationInvalid(_) | Error::BoundsViolation { .. } => Errno::EINVAL,
            Error::NotConfigured => Errno::EBADFD,
            _ => self.errno().unwrap_or(Errno::EIO),
        };
        -(errno as c_int)
    }
}

#[test]
fn codes_are_negative_errno() {
    assert_eq!(Error::driver("AUDIO_STOP", Errno::EBUSY).code(), -libc::EBUSY);
    assert_eq!(Error::ConfigurationInvalid("slave".into()).code(), -libc::EINVAL);
    assert_eq!(Error::bounds("route index", 9).code(), -libc::EINVAL);
    assert_eq!(Error::NotConfigured.code(), -libc::EBADFD);

    let e = Error::unavailable(Path::new("/dev/msm_snd"), io::Error::from_raw_os_error(libc::ENOENT));
    assert_eq!(e.code(), -libc::ENOENT);
    assert_eq!(e.to_string(), "cannot open /dev/msm_snd: ENOENT: No such file or directory");
}
