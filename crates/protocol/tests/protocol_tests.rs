//! Protocol contract tests
//!
//! Decodes response bodies shaped like the backend's real output and checks
//! request validation for every endpoint that takes user input.

use protocol::*;
use serde::de::IgnoredAny;

mod records {
    use super::*;

    #[test]
    fn test_decode_device_overview() {
        let body = r#"{
            "success": true,
            "data": {
                "local_devices": [
                    {"busid": "1-1.2", "vendor_id": "0781", "product_id": "5567",
                     "device_name": "SanDisk Cruzer Blade", "details": ["Mass storage"]}
                ],
                "attached_devices": [
                    {"port": "00", "info": "Port 00: <Port in Use> at Remote 192.168.1.100",
                     "details": ["Status: Online"], "remote_host": "192.168.1.100",
                     "remote_busid": "1-1"}
                ]
            }
        }"#;

        let response: ApiResponse<DeviceOverview> = ApiResponse::decode(body).unwrap();
        let overview = response.data.unwrap();
        assert_eq!(overview.local_devices.len(), 1);
        assert_eq!(overview.local_devices[0].display_name(), "SanDisk Cruzer Blade");
        assert_eq!(overview.attached_devices[0].remote_busid.as_deref(), Some("1-1"));
        assert!(overview.attached_devices[0].custom_name.is_none());
    }

    #[test]
    fn test_decode_minimal_local_device() {
        let body = r#"{"success": true, "data": {"local_devices": [{"busid": "2-1"}]}}"#;
        let response: ApiResponse<DeviceOverview> = ApiResponse::decode(body).unwrap();
        let overview = response.data.unwrap();
        assert_eq!(overview.local_devices[0].busid, "2-1");
        assert!(overview.local_devices[0].details.is_empty());
        assert!(overview.attached_devices.is_empty());
    }

    #[test]
    fn test_decode_log_records() {
        let body = r#"{"success": true, "logs": [
            {"id": 2, "timestamp": "2024-03-01 10:15:00", "level": "ERROR",
             "message": "usbip bind failed", "source": "usbip"},
            {"id": 1, "timestamp": "2024-03-01 09:00:00", "level": "INFO",
             "message": "server started"}
        ]}"#;

        let response: ApiResponse<Vec<LogRecord>> = ApiResponse::decode(body).unwrap();
        let logs = response.data.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, LogLevel::Error);
        assert_eq!(logs[0].source.as_deref(), Some("usbip"));
        assert!(logs[1].source.is_none());
    }

    #[test]
    fn test_decode_virtual_devices_and_ports() {
        let body = r#"{"success": true, "data": [
            {"id": 1, "name": "Backup", "device_type": "storage", "storage_size": 1024, "is_running": true},
            {"id": 2, "name": "Key", "device_type": "fido"}
        ]}"#;
        let response: ApiResponse<Vec<VirtualDevice>> = ApiResponse::decode(body).unwrap();
        let devices = response.data.unwrap();
        assert_eq!(devices[0].device_type, VirtualDeviceType::Storage);
        assert!(devices[0].is_running);
        assert!(!devices[1].is_running);
        assert!(devices[1].storage_size.is_none());

        let body = r#"{"success": true, "data": [{"id": 4, "port_number": "3", "name": "Rack A"}]}"#;
        let response: ApiResponse<Vec<VirtualPort>> = ApiResponse::decode(body).unwrap();
        let ports = response.data.unwrap();
        assert_eq!(ports[0].port_number, "3");
        assert!(ports[0].device_id.is_none());
    }

    #[test]
    fn test_decode_search_result_text() {
        let body = r#"{"success": true, "data": "Vendor: Logitech\nProduct: Mouse"}"#;
        let response: ApiResponse<String> = ApiResponse::decode(body).unwrap();
        assert!(response.data.unwrap().contains("Logitech"));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let result: Result<ApiResponse<IgnoredAny>> = ApiResponse::decode("<html>login</html>");
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_decode_reply_without_payload() {
        let body = r#"{"success": true, "message": "ok"}"#;
        let response: ApiResponse<IgnoredAny> = ApiResponse::decode(body).unwrap();
        assert!(response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message_or("fallback"), "ok");
    }

    #[test]
    fn test_unexpected_levels_keep_their_rows() {
        let body = r#"{"success": true, "data": [
            {"id": 1, "timestamp": "2024-03-01 10:15:00", "level": "INFO", "message": "a"},
            {"id": 2, "timestamp": "2024-03-01 10:16:00", "level": "info", "message": "b"},
            {"id": 3, "timestamp": "2024-03-01 10:17:00", "level": "NOTICE", "message": "c"}
        ]}"#;
        let response: ApiResponse<Vec<LogRecord>> = ApiResponse::decode(body).unwrap();
        let logs = response.data.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[1].level, LogLevel::Info);
        assert_eq!(logs[2].level, LogLevel::Other("NOTICE".to_string()));
    }
}

mod requests {
    use super::*;

    #[test]
    fn test_required_fields() {
        assert!(matches!(
            RemoteDevicesRequest::new("").validate(),
            Err(ProtocolError::MissingField("ip"))
        ));
        assert!(matches!(
            AttachDeviceRequest::new("10.0.0.5", "").validate(),
            Err(ProtocolError::MissingField("busid"))
        ));
        assert!(matches!(
            DetachDeviceRequest::new(" ").validate(),
            Err(ProtocolError::MissingField("port"))
        ));
        assert!(matches!(
            SearchDeviceInfoRequest::new("").validate(),
            Err(ProtocolError::MissingField("device_id"))
        ));
    }

    #[test]
    fn test_alias_and_port_name_validation() {
        let alias = DeviceAliasRequest {
            busid: "1-1".to_string(),
            alias: String::new(),
            device_info: None,
        };
        assert!(matches!(
            alias.validate(),
            Err(ProtocolError::MissingField("alias"))
        ));

        let port = PortNameRequest {
            port_number: "00".to_string(),
            custom_name: "Printer".to_string(),
        };
        assert!(port.validate().is_ok());
    }

    #[test]
    fn test_virtual_port_number_must_be_numeric() {
        let req = CreateVirtualPortRequest {
            port_number: "a1".to_string(),
            name: "Front".to_string(),
        };
        assert!(matches!(
            req.validate(),
            Err(ProtocolError::InvalidField { field: "port_number", .. })
        ));
    }

    #[test]
    fn test_logs_limit() {
        assert!(LogsRequest { limit: 0 }.validate().is_err());
        assert!(LogsRequest { limit: 50 }.validate().is_ok());
        assert_eq!(LogsRequest { limit: 50 }.endpoint().method(), Method::Get);
    }

    #[test]
    fn test_login_requires_credentials() {
        let req = LoginRequest {
            username: "admin".to_string(),
            password: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_path_endpoints_carry_id() {
        assert_eq!(
            DeleteVirtualDeviceRequest { id: 12 }.endpoint(),
            Endpoint::DeleteVirtualDevice(12)
        );
        assert_eq!(
            ToggleVirtualDeviceRequest { id: 5 }.endpoint().path(),
            "/virtual_devices/5/toggle"
        );
        assert_eq!(ListVirtualPortsRequest::default().endpoint().path(), "/api/virtual_ports");
        assert_eq!(ListVirtualDevicesRequest::default().endpoint().method(), Method::Get);
        assert_eq!(ListDevicesRequest::default().endpoint().method(), Method::Get);
        assert_eq!(CreateVirtualDeviceRequest {
            name: "k".to_string(),
            device_type: VirtualDeviceType::Keyboard,
            storage_size: None,
        }
        .endpoint()
        .method(), Method::Post);
    }
}
