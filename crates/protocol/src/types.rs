//! Record type definitions
//!
//! This module defines the records the management backend returns:
//! local and remote USB/IP devices, attached ports, virtual devices and
//! ports, and log records. Field names follow the backend's JSON keys.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Severity of a user-facing status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operation completed
    Success,
    /// Operation failed
    Danger,
    /// Input problem or soft failure
    Warning,
    /// Neutral information
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Danger => "danger",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log record severity as stored by the backend (`INFO`, `WARNING`, ...)
///
/// The backend keeps the level as free text, so anything outside the
/// known set is carried as [`LogLevel::Other`] instead of failing the
/// whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Other(String),
}

impl LogLevel {
    /// Known levels in ascending order of severity
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    /// Level for a stored label; unknown labels are kept verbatim
    pub fn from_label(label: &str) -> Self {
        label
            .parse()
            .unwrap_or_else(|_| LogLevel::Other(label.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::Other(label) => label,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ProtocolError;

    /// Case-insensitive; accepts `warn` as an alias of `warning`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(ProtocolError::UnknownVariant {
                kind: "log level",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(LogLevel::from_label(&label))
    }
}

/// A USB device on the backend host, as listed by `usbip list -l`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDevice {
    /// Bus ID (e.g. "1-1.2")
    pub busid: String,
    /// USB Vendor ID as four hex digits
    #[serde(default)]
    pub vendor_id: Option<String>,
    /// USB Product ID as four hex digits
    #[serde(default)]
    pub product_id: Option<String>,
    /// Human-readable name resolved by the backend
    #[serde(default)]
    pub device_name: Option<String>,
    /// User-assigned alias, if one was saved
    #[serde(default)]
    pub alias: Option<String>,
    /// Raw detail lines from the listing
    #[serde(default)]
    pub details: Vec<String>,
}

impl LocalDevice {
    /// Alias if set, then the resolved name, then the bus ID
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .or(self.device_name.as_deref())
            .unwrap_or(&self.busid)
    }

    /// "vvvv:pppp" when both IDs are known
    pub fn vid_pid(&self) -> Option<String> {
        match (&self.vendor_id, &self.product_id) {
            (Some(v), Some(p)) => Some(format!("{}:{}", v, p)),
            _ => None,
        }
    }
}

/// A device exported by a remote USB/IP server (`usbip list -r`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDevice {
    pub busid: String,
    /// Summary line, e.g. "1-1: Logitech, Inc. : USB Optical Mouse (046d:c05a)"
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub details: Vec<String>,
}

/// A remote device attached to a local virtual port (`usbip port`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedDevice {
    /// Virtual host controller port number
    pub port: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub remote_host: Option<String>,
    #[serde(default)]
    pub remote_busid: Option<String>,
    /// Custom port name saved through `/port_name`
    #[serde(default)]
    pub custom_name: Option<String>,
}

/// Local and attached devices, fetched together for the overview page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOverview {
    #[serde(default)]
    pub local_devices: Vec<LocalDevice>,
    #[serde(default)]
    pub attached_devices: Vec<AttachedDevice>,
}

/// Kind of emulated device the backend can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VirtualDeviceType {
    /// Mass storage backed by an image file
    Storage,
    Keyboard,
    Mouse,
    /// FIDO2 security key
    Fido,
}

impl VirtualDeviceType {
    pub const ALL: [VirtualDeviceType; 4] = [
        VirtualDeviceType::Storage,
        VirtualDeviceType::Keyboard,
        VirtualDeviceType::Mouse,
        VirtualDeviceType::Fido,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VirtualDeviceType::Storage => "storage",
            VirtualDeviceType::Keyboard => "keyboard",
            VirtualDeviceType::Mouse => "mouse",
            VirtualDeviceType::Fido => "fido",
        }
    }
}

impl fmt::Display for VirtualDeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VirtualDeviceType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        VirtualDeviceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::UnknownVariant {
                kind: "device type",
                value: s.to_string(),
            })
    }
}

/// An emulated USB device managed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDevice {
    pub id: u32,
    pub name: String,
    pub device_type: VirtualDeviceType,
    /// Storage size in MB (storage devices only)
    #[serde(default)]
    pub storage_size: Option<u32>,
    #[serde(default)]
    pub is_running: bool,
}

/// A virtual port definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualPort {
    pub id: u32,
    pub port_number: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Virtual device currently bound to this port
    #[serde(default)]
    pub device_id: Option<u32>,
}

/// One row of the backend's log table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: u64,
    /// Timestamp text as rendered by the backend
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    /// Origin tag: system, usbip, user, ...
    #[serde(default)]
    pub source: Option<String>,
}

/// Strip scheme, path and port from a user-entered host
///
/// The backend hands this straight to `usbip -r`, which only accepts a
/// bare host. `http://10.0.0.5:3240/x` becomes `10.0.0.5`.
pub fn normalize_host(input: &str) -> String {
    let mut host = input.trim();
    if let Some((_, rest)) = host.split_once("://") {
        host = rest;
    }
    if let Some((before, _)) = host.split_once('/') {
        host = before;
    }
    if let Some((before, _)) = host.split_once(':') {
        host = before;
    }
    host.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(" Error ".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_serde_uppercase() {
        let level: LogLevel = serde_json::from_str("\"WARNING\"").unwrap();
        assert_eq!(level, LogLevel::Warning);
        let level: LogLevel = serde_json::from_str("\"WARN\"").unwrap();
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(serde_json::to_string(&LogLevel::Debug).unwrap(), "\"DEBUG\"");
    }

    #[test]
    fn test_log_level_keeps_unknown_labels() {
        let level: LogLevel = serde_json::from_str("\"info\"").unwrap();
        assert_eq!(level, LogLevel::Info);
        let level: LogLevel = serde_json::from_str("\"NOTICE\"").unwrap();
        assert_eq!(level, LogLevel::Other("NOTICE".to_string()));
        assert_eq!(level.as_str(), "NOTICE");
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"NOTICE\"");
    }

    #[test]
    fn test_severity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Danger).unwrap(), "\"danger\"");
        assert_eq!(Severity::Success.to_string(), "success");
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("192.168.1.100"), "192.168.1.100");
        assert_eq!(normalize_host("http://192.168.1.100:3240/"), "192.168.1.100");
        assert_eq!(normalize_host(" usb-host.lan:3240 "), "usb-host.lan");
        assert_eq!(normalize_host("https://usb-host.lan/path"), "usb-host.lan");
    }

    #[test]
    fn test_local_device_display_name() {
        let mut device = LocalDevice {
            busid: "1-1".to_string(),
            vendor_id: Some("046d".to_string()),
            product_id: Some("c05a".to_string()),
            device_name: None,
            alias: None,
            details: Vec::new(),
        };
        assert_eq!(device.display_name(), "1-1");
        assert_eq!(device.vid_pid().as_deref(), Some("046d:c05a"));

        device.device_name = Some("USB Optical Mouse".to_string());
        assert_eq!(device.display_name(), "USB Optical Mouse");

        device.alias = Some("Desk mouse".to_string());
        assert_eq!(device.display_name(), "Desk mouse");
    }

    #[test]
    fn test_virtual_device_type_from_str() {
        assert_eq!(
            "Storage".parse::<VirtualDeviceType>().unwrap(),
            VirtualDeviceType::Storage
        );
        assert!("printer".parse::<VirtualDeviceType>().is_err());
    }
}
