//! Request and response definitions
//!
//! Every backend call is described by a request struct implementing
//! [`ApiRequest`]: it knows its [`Endpoint`], how to validate itself before
//! anything is sent, and which payload type comes back inside the
//! [`ApiResponse`] envelope. POST bodies are form-encoded; GET requests
//! carry the same struct as a query string.

use crate::error::{ProtocolError, Result};
use crate::types::{
    DeviceOverview, LogRecord, RemoteDevice, VirtualDevice, VirtualDeviceType, VirtualPort,
    normalize_host,
};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint
///
/// The payload normally arrives under `data`; older routes use `devices`
/// or `logs` for the same purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(alias = "devices", alias = "logs", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Server message, or `fallback` when the backend sent none
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Decode a JSON body
    pub fn decode(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// HTTP method used by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Backend routes consumed by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Devices,
    BindDevice,
    RemoteDevices,
    AttachDevice,
    DetachDevice,
    SearchDeviceInfo,
    DeviceAlias,
    PortName,
    VirtualDevices,
    CreateVirtualDevice,
    ToggleVirtualDevice(u32),
    DeleteVirtualDevice(u32),
    VirtualPorts,
    CreateVirtualPort,
    DeleteVirtualPort(u32),
    Logs,
}

impl Endpoint {
    /// Path relative to the backend base URL
    pub fn path(&self) -> String {
        match self {
            Endpoint::Login => "/login".to_string(),
            Endpoint::Devices => "/api/devices".to_string(),
            Endpoint::BindDevice => "/bind_device".to_string(),
            Endpoint::RemoteDevices => "/get_remote_devices".to_string(),
            Endpoint::AttachDevice => "/attach_device".to_string(),
            Endpoint::DetachDevice => "/detach_device".to_string(),
            Endpoint::SearchDeviceInfo => "/search_device_info".to_string(),
            Endpoint::DeviceAlias => "/device_alias".to_string(),
            Endpoint::PortName => "/port_name".to_string(),
            Endpoint::VirtualDevices => "/api/virtual_devices".to_string(),
            Endpoint::CreateVirtualDevice => "/virtual_devices/create".to_string(),
            Endpoint::ToggleVirtualDevice(id) => format!("/virtual_devices/{}/toggle", id),
            Endpoint::DeleteVirtualDevice(id) => format!("/virtual_devices/{}/delete", id),
            Endpoint::VirtualPorts => "/api/virtual_ports".to_string(),
            Endpoint::CreateVirtualPort => "/virtual_ports/create".to_string(),
            Endpoint::DeleteVirtualPort(id) => format!("/virtual_ports/{}/delete", id),
            Endpoint::Logs => "/api/logs".to_string(),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::Devices | Endpoint::VirtualDevices | Endpoint::VirtualPorts | Endpoint::Logs => {
                Method::Get
            }
            _ => Method::Post,
        }
    }
}

/// A typed backend request
pub trait ApiRequest: Serialize {
    /// Payload carried in `data` on success
    type Data: DeserializeOwned;

    fn endpoint(&self) -> Endpoint;

    /// Check required fields before the request leaves the process
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ProtocolError::MissingField(field))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl ApiRequest for LoginRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Login
    }

    fn validate(&self) -> Result<()> {
        require("username", &self.username)?;
        require("password", &self.password)
    }
}

/// Fetch local and attached devices
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListDevicesRequest {}

impl ApiRequest for ListDevicesRequest {
    type Data = DeviceOverview;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Devices
    }
}

/// Publish a local device over USB/IP
#[derive(Debug, Clone, Serialize)]
pub struct BindDeviceRequest {
    pub busid: String,
}

impl BindDeviceRequest {
    pub fn new(busid: &str) -> Self {
        Self {
            busid: busid.trim().to_string(),
        }
    }
}

impl ApiRequest for BindDeviceRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::BindDevice
    }

    fn validate(&self) -> Result<()> {
        require("busid", &self.busid)
    }
}

/// List devices exported by a remote USB/IP host
#[derive(Debug, Clone, Serialize)]
pub struct RemoteDevicesRequest {
    pub ip: String,
}

impl RemoteDevicesRequest {
    pub fn new(host: &str) -> Self {
        Self {
            ip: normalize_host(host),
        }
    }
}

impl ApiRequest for RemoteDevicesRequest {
    type Data = Vec<RemoteDevice>;

    fn endpoint(&self) -> Endpoint {
        Endpoint::RemoteDevices
    }

    fn validate(&self) -> Result<()> {
        require("ip", &self.ip)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachDeviceRequest {
    pub ip: String,
    pub busid: String,
}

impl AttachDeviceRequest {
    pub fn new(host: &str, busid: &str) -> Self {
        Self {
            ip: normalize_host(host),
            busid: busid.trim().to_string(),
        }
    }
}

impl ApiRequest for AttachDeviceRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::AttachDevice
    }

    fn validate(&self) -> Result<()> {
        require("ip", &self.ip)?;
        require("busid", &self.busid)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetachDeviceRequest {
    pub port: String,
}

impl DetachDeviceRequest {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.trim().to_string(),
        }
    }
}

impl ApiRequest for DetachDeviceRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::DetachDevice
    }

    fn validate(&self) -> Result<()> {
        require("port", &self.port)
    }
}

/// Look up descriptive information for a device ID
#[derive(Debug, Clone, Serialize)]
pub struct SearchDeviceInfoRequest {
    pub device_id: String,
}

impl SearchDeviceInfoRequest {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.trim().to_string(),
        }
    }
}

impl ApiRequest for SearchDeviceInfoRequest {
    type Data = String;

    fn endpoint(&self) -> Endpoint {
        Endpoint::SearchDeviceInfo
    }

    fn validate(&self) -> Result<()> {
        require("device_id", &self.device_id)
    }
}

/// Save a friendly name for a bus ID
#[derive(Debug, Clone, Serialize)]
pub struct DeviceAliasRequest {
    pub busid: String,
    pub alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
}

impl ApiRequest for DeviceAliasRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::DeviceAlias
    }

    fn validate(&self) -> Result<()> {
        require("busid", &self.busid)?;
        require("alias", &self.alias)
    }
}

/// Save a custom name for a virtual host controller port
#[derive(Debug, Clone, Serialize)]
pub struct PortNameRequest {
    pub port_number: String,
    pub custom_name: String,
}

impl ApiRequest for PortNameRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::PortName
    }

    fn validate(&self) -> Result<()> {
        require("port_number", &self.port_number)?;
        require("custom_name", &self.custom_name)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListVirtualDevicesRequest {}

impl ApiRequest for ListVirtualDevicesRequest {
    type Data = Vec<VirtualDevice>;

    fn endpoint(&self) -> Endpoint {
        Endpoint::VirtualDevices
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateVirtualDeviceRequest {
    pub name: String,
    pub device_type: VirtualDeviceType,
    /// Size in MB; only meaningful for storage devices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<u32>,
}

impl ApiRequest for CreateVirtualDeviceRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::CreateVirtualDevice
    }

    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        match (self.device_type, self.storage_size) {
            (VirtualDeviceType::Storage, Some(0)) => Err(ProtocolError::InvalidField {
                field: "storage_size",
                reason: "must be greater than zero".to_string(),
            }),
            (VirtualDeviceType::Storage, _) => Ok(()),
            (_, Some(_)) => Err(ProtocolError::InvalidField {
                field: "storage_size",
                reason: format!("not supported for {} devices", self.device_type),
            }),
            (_, None) => Ok(()),
        }
    }
}

/// Start a stopped virtual device or stop a running one
#[derive(Debug, Clone, Serialize)]
pub struct ToggleVirtualDeviceRequest {
    #[serde(skip)]
    pub id: u32,
}

impl ApiRequest for ToggleVirtualDeviceRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::ToggleVirtualDevice(self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteVirtualDeviceRequest {
    #[serde(skip)]
    pub id: u32,
}

impl ApiRequest for DeleteVirtualDeviceRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::DeleteVirtualDevice(self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListVirtualPortsRequest {}

impl ApiRequest for ListVirtualPortsRequest {
    type Data = Vec<VirtualPort>;

    fn endpoint(&self) -> Endpoint {
        Endpoint::VirtualPorts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateVirtualPortRequest {
    pub port_number: String,
    pub name: String,
}

impl ApiRequest for CreateVirtualPortRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::CreateVirtualPort
    }

    fn validate(&self) -> Result<()> {
        require("port_number", &self.port_number)?;
        if !self.port_number.trim().chars().all(|c| c.is_ascii_digit()) {
            return Err(ProtocolError::InvalidField {
                field: "port_number",
                reason: "must be numeric".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteVirtualPortRequest {
    #[serde(skip)]
    pub id: u32,
}

impl ApiRequest for DeleteVirtualPortRequest {
    type Data = IgnoredAny;

    fn endpoint(&self) -> Endpoint {
        Endpoint::DeleteVirtualPort(self.id)
    }
}

/// Fetch the newest `limit` log records
#[derive(Debug, Clone, Serialize)]
pub struct LogsRequest {
    pub limit: u32,
}

impl ApiRequest for LogsRequest {
    type Data = Vec<LogRecord>;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Logs
    }

    fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(ProtocolError::InvalidField {
                field: "limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::BindDevice.path(), "/bind_device");
        assert_eq!(Endpoint::ToggleVirtualDevice(7).path(), "/virtual_devices/7/toggle");
        assert_eq!(Endpoint::DeleteVirtualPort(3).path(), "/virtual_ports/3/delete");
        assert_eq!(Endpoint::Logs.method(), Method::Get);
        assert_eq!(Endpoint::AttachDevice.method(), Method::Post);
    }

    #[test]
    fn test_bind_request_validation() {
        assert!(BindDeviceRequest::new("1-1").validate().is_ok());
        assert!(matches!(
            BindDeviceRequest::new("   ").validate(),
            Err(ProtocolError::MissingField("busid"))
        ));
    }

    #[test]
    fn test_attach_request_normalizes_host() {
        let req = AttachDeviceRequest::new("http://10.0.0.5:3240", " 1-1 ");
        assert_eq!(req.ip, "10.0.0.5");
        assert_eq!(req.busid, "1-1");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_virtual_device_validation() {
        let mut req = CreateVirtualDeviceRequest {
            name: "Backup stick".to_string(),
            device_type: VirtualDeviceType::Storage,
            storage_size: Some(1024),
        };
        assert!(req.validate().is_ok());

        req.storage_size = Some(0);
        assert!(req.validate().is_err());

        req.device_type = VirtualDeviceType::Keyboard;
        req.storage_size = Some(64);
        assert!(req.validate().is_err());

        req.storage_size = None;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_response_with_devices_alias() {
        let body = r#"{"success": true, "devices": [{"busid": "1-1", "info": "1-1: Mouse", "details": []}]}"#;
        let response: ApiResponse<Vec<RemoteDevice>> = ApiResponse::decode(body).unwrap();
        assert!(response.success);
        assert_eq!(response.data.unwrap()[0].busid, "1-1");
    }

    #[test]
    fn test_response_without_data() {
        let body = r#"{"success": false, "message": "busid missing"}"#;
        let response: ApiResponse<IgnoredAny> = ApiResponse::decode(body).unwrap();
        assert!(!response.success);
        assert_eq!(response.message_or("fallback"), "busid missing");
    }

    #[test]
    fn test_message_or_fallback_on_blank() {
        let response: ApiResponse<IgnoredAny> = ApiResponse {
            success: true,
            message: Some("  ".to_string()),
            data: None,
        };
        assert_eq!(response.message_or("Done"), "Done");
    }
}
