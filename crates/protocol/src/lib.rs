//! Wire protocol for usbip-console
//!
//! This crate defines the REST contract between the console and the USB/IP
//! management backend: typed requests, the `{success, message, data}`
//! response envelope, and the records the backend returns.
//!
//! # Example
//!
//! ```
//! use protocol::{ApiRequest, ApiResponse, BindDeviceRequest, Endpoint};
//! use serde::de::IgnoredAny;
//!
//! let req = BindDeviceRequest::new("1-1.2");
//! assert!(req.validate().is_ok());
//! assert_eq!(req.endpoint(), Endpoint::BindDevice);
//!
//! let body = r#"{"success": true, "message": "Device 1-1.2 published"}"#;
//! let resp: ApiResponse<IgnoredAny> = ApiResponse::decode(body).unwrap();
//! assert!(resp.success);
//! ```

pub mod error;
pub mod messages;
pub mod types;

pub use error::{ProtocolError, Result};
pub use messages::{
    ApiRequest, ApiResponse, AttachDeviceRequest, BindDeviceRequest, CreateVirtualDeviceRequest,
    CreateVirtualPortRequest, DeleteVirtualDeviceRequest, DeleteVirtualPortRequest,
    DetachDeviceRequest, DeviceAliasRequest, Endpoint, ListDevicesRequest,
    ListVirtualDevicesRequest, ListVirtualPortsRequest, LoginRequest, LogsRequest, Method,
    PortNameRequest, RemoteDevicesRequest, SearchDeviceInfoRequest, ToggleVirtualDeviceRequest,
};
pub use types::{
    AttachedDevice, DeviceOverview, LocalDevice, LogLevel, LogRecord, RemoteDevice, Severity,
    VirtualDevice, VirtualDeviceType, VirtualPort, normalize_host,
};
