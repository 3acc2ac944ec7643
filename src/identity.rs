//! Stable device identity derived from the hardware address.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized hardware address used to recognise a controller across setups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Derive the identifier from a MAC address as reported by the device.
    pub fn from_mac(mac: &str) -> Self {
        DeviceId(format_mac(mac))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Format a MAC address as lower-case, colon separated octets.
///
/// Accepts `AA:BB:CC:DD:EE:FF`, `AA-BB-CC-DD-EE-FF`, `aabb.ccdd.eeff` and
/// `AABBCCDDEEFF`. Anything else is returned unchanged.
///
/// # Examples
///
/// ```
/// use aquael_rs::format_mac;
///
/// assert_eq!(format_mac("AA-BB-CC-DD-EE-FF"), "aa:bb:cc:dd:ee:ff");
/// assert_eq!(format_mac("AABB.CCDD.EEFF"), "aa:bb:cc:dd:ee:ff");
/// assert_eq!(format_mac("not-a-mac"), "not-a-mac");
/// ```
pub fn format_mac(mac: &str) -> String {
    if mac.len() == 17 && mac.matches(':').count() == 5 {
        return mac.to_lowercase();
    }
    if mac.len() == 17 && mac.matches('-').count() == 5 {
        return mac.replace('-', ":").to_lowercase();
    }

    let bare = if mac.len() == 14 && mac.matches('.').count() == 2 {
        mac.replace('.', "")
    } else {
        mac.to_string()
    };

    if bare.len() == 12 && bare.chars().all(|c| c.is_ascii_hexdigit()) {
        let lower = bare.to_lowercase();
        return lower
            .as_bytes()
            .chunks(2)
            .map(|octet| String::from_utf8_lossy(octet).into_owned())
            .collect::<Vec<_>>()
            .join(":");
    }

    mac.to_string()
}
