//! Test utilities for usbip-console
//!
//! Provides mock records and helper functions for testing across crates.
//!
//! # Example
//!
//! ```
//! use common::test_utils::create_mock_log_record;
//! use protocol::LogLevel;
//!
//! # fn main() {
//! let record = create_mock_log_record(1, "2024-03-01 10:00:00", LogLevel::Info, "system");
//! assert_eq!(record.source.as_deref(), Some("system"));
//! # }
//! ```

use protocol::{
    AttachedDevice, LocalDevice, LogLevel, LogRecord, RemoteDevice, VirtualDevice,
    VirtualDeviceType, VirtualPort,
};
use std::future::Future;
use std::time::Duration;

/// Default test timeout (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a mock LogRecord for testing
pub fn create_mock_log_record(id: u64, timestamp: &str, level: LogLevel, source: &str) -> LogRecord {
    LogRecord {
        id,
        timestamp: timestamp.to_string(),
        level,
        message: format!("Test message {}", id),
        source: Some(source.to_string()),
    }
}

/// Create `count` log records spread over consecutive days of March 2024
///
/// Levels and sources rotate so every combination shows up in larger sets.
pub fn create_mock_log_records(count: u64) -> Vec<LogRecord> {
    const SOURCES: [&str; 3] = ["system", "usbip", "user"];
    (0..count)
        .map(|i| {
            let day = (i % 28) + 1;
            let hour = i % 24;
            let level = LogLevel::ALL[(i % LogLevel::ALL.len() as u64) as usize].clone();
            let source = SOURCES[(i % SOURCES.len() as u64) as usize];
            create_mock_log_record(
                i + 1,
                &format!("2024-03-{:02} {:02}:00:00", day, hour),
                level,
                source,
            )
        })
        .collect()
}

/// Create a mock LocalDevice for testing
pub fn create_mock_local_device(busid: &str, vendor_id: &str, product_id: &str) -> LocalDevice {
    LocalDevice {
        busid: busid.to_string(),
        vendor_id: Some(vendor_id.to_string()),
        product_id: Some(product_id.to_string()),
        device_name: Some(format!("Test Device {}", busid)),
        alias: None,
        details: vec![format!("{}: Test Manufacturer : Test Product", busid)],
    }
}

/// Create a mock RemoteDevice for testing
pub fn create_mock_remote_device(busid: &str) -> RemoteDevice {
    RemoteDevice {
        busid: busid.to_string(),
        info: format!("{}: Test Manufacturer : Test Product (1234:5678)", busid),
        details: vec![format!("{}:1.0: Test Interface", busid)],
    }
}

/// Create a mock AttachedDevice for testing
pub fn create_mock_attached_device(port: &str, remote_host: &str, remote_busid: &str) -> AttachedDevice {
    AttachedDevice {
        port: port.to_string(),
        info: format!("Port {}: <Port in Use> at Remote {}", port, remote_host),
        details: vec![
            "Status: Online".to_string(),
            format!("Remote host: {}", remote_host),
            format!("Remote busid: {}", remote_busid),
        ],
        remote_host: Some(remote_host.to_string()),
        remote_busid: Some(remote_busid.to_string()),
        custom_name: None,
    }
}

/// Create a mock VirtualDevice for testing
pub fn create_mock_virtual_device(id: u32, device_type: VirtualDeviceType) -> VirtualDevice {
    VirtualDevice {
        id,
        name: format!("Virtual {} {}", device_type, id),
        device_type,
        storage_size: (device_type == VirtualDeviceType::Storage).then_some(1024),
        is_running: false,
    }
}

/// Create a mock VirtualPort for testing
pub fn create_mock_virtual_port(id: u32, port_number: &str) -> VirtualPort {
    VirtualPort {
        id,
        port_number: port_number.to_string(),
        name: Some(format!("Port {}", port_number)),
        device_id: None,
    }
}

/// Run a future with a timeout
///
/// # Example
/// ```no_run
/// use common::test_utils::{with_timeout, DEFAULT_TEST_TIMEOUT};
///
/// #[tokio::test]
/// async fn test_with_timeout() {
///     let result = with_timeout(DEFAULT_TEST_TIMEOUT, async { 42 }).await.unwrap();
///     assert_eq!(result, 42);
/// }
/// ```
pub async fn with_timeout<T, F>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError { duration })
}

/// Error returned when a test times out
#[derive(Debug)]
pub struct TimeoutError {
    /// The timeout duration that was exceeded
    pub duration: Duration,
}

impl std::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Test timed out after {:?}", self.duration)
    }
}

impl std::error::Error for TimeoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_log_records() {
        let records = create_mock_log_records(10);
        assert_eq!(records.len(), 10);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].timestamp, "2024-03-01 00:00:00");
        assert_eq!(records[1].level, LogLevel::Info);
        assert_eq!(records[1].source.as_deref(), Some("usbip"));
    }

    #[test]
    fn test_create_mock_virtual_device() {
        let storage = create_mock_virtual_device(1, VirtualDeviceType::Storage);
        assert_eq!(storage.storage_size, Some(1024));
        let mouse = create_mock_virtual_device(2, VirtualDeviceType::Mouse);
        assert!(mouse.storage_size.is_none());
    }

    #[test]
    fn test_create_mock_attached_device() {
        let attached = create_mock_attached_device("00", "192.168.1.100", "1-1");
        assert_eq!(attached.remote_host.as_deref(), Some("192.168.1.100"));
        assert_eq!(attached.details.len(), 3);
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(DEFAULT_TEST_TIMEOUT, async { 42 }).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_failure() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            42
        })
        .await;

        assert!(result.is_err());
    }
}
