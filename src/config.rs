//! Plugin configuration
//!
//! alsa-lib hands each plugin its configuration node. The only keys we
//! accept are the ones every plugin node carries anyway; anything else is
//! rejected so that typos in `asound.conf` are caught at open time.
//!
//! The driver node paths and the shared state key are fixed by the driver
//! and the cooperating processes, but are kept in [`Nodes`] so they can be
//! pointed somewhere else.

use std::path::PathBuf;
use std::time::Duration;
use tracing::error;
use super::error::*;

/// Keys allowed in the plugin's configuration node.
pub const KNOWN_KEYS: &[&str] = &["comment", "type", "hint"];

/// Checks the ids of a configuration node against [`KNOWN_KEYS`].
pub fn check_keys<'a, I: IntoIterator<Item = &'a str>>(keys: I) -> Result<()> {
    for id in keys {
        if KNOWN_KEYS.contains(&id) { continue }
        error!("Unknown field {}", id);
        return Err(Error::ConfigurationInvalid(format!("unknown field {}", id)));
    }
    Ok(())
}

/// Device nodes of the MSM sound driver, and the key file of the shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nodes {
    /// Routing, volume and endpoint enumeration.
    pub control: PathBuf,
    pub pcm_out: PathBuf,
    pub pcm_in: PathBuf,
    /// File whose identity keys the shared state segment.
    pub shared_key: PathBuf,
}

impl Default for Nodes {
    fn default() -> Nodes {
        Nodes {
            control: "/dev/msm_snd".into(),
            pcm_out: "/dev/msm_pcm_out".into(),
            pcm_in: "/dev/msm_pcm_in".into(),
            shared_key: "/tmp/alsa_android".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub nodes: Nodes,
    /// How often the control monitor samples the shared state.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config { nodes: Nodes::default(), poll_interval: Duration::from_secs(2) }
    }
}

#[test]
fn known_keys_pass() {
    check_keys(vec!["type", "comment", "hint"]).unwrap();
    check_keys(Vec::<&str>::new()).unwrap();
}

#[test]
fn unknown_key_is_rejected() {
    let e = check_keys(vec!["type", "slave", "hint"]).unwrap_err();
    match e {
        Error::ConfigurationInvalid(ref s) => assert!(s.contains("slave")),
        _ => panic!("unexpected error {:?}", e),
    }
    assert_eq!(e.code(), -libc::EINVAL);
}
