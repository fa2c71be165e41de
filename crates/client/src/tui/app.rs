//! TUI application state
//!
//! Manages the application state including the device lists of every page,
//! the loaded log table and its filter form, input steps, and the pending
//! post-action refresh.

use common::log_filter::FilterError;
use common::{FilterCriteria, FilterOutcome, LogTable, Notifier};
use protocol::{
    AttachDeviceRequest, AttachedDevice, BindDeviceRequest, CreateVirtualDeviceRequest,
    CreateVirtualPortRequest, DeleteVirtualDeviceRequest, DeleteVirtualPortRequest,
    DetachDeviceRequest, DeviceAliasRequest, DeviceOverview, LocalDevice, LogRecord,
    PortNameRequest, RemoteDevice, RemoteDevicesRequest, SearchDeviceInfoRequest, Severity,
    ToggleVirtualDeviceRequest, VirtualDevice, VirtualDeviceType, VirtualPort, normalize_host,
};
use std::time::{Duration, Instant};

use crate::config::RemoteHostConfig;

/// Top-level views, switched with 1-6 or h/l
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// USB devices on the backend host
    Local,
    /// Devices exported by other USB/IP servers
    Remote,
    /// Ports with an attached remote device
    Attached,
    /// Emulated devices
    Virtual,
    /// Virtual ports
    Ports,
    /// Backend log
    Logs,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Local,
        Page::Remote,
        Page::Attached,
        Page::Virtual,
        Page::Ports,
        Page::Logs,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Local => "Local",
            Page::Remote => "Remote",
            Page::Attached => "Attached",
            Page::Virtual => "Virtual",
            Page::Ports => "Ports",
            Page::Logs => "Logs",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Page::Local => 0,
            Page::Remote => 1,
            Page::Attached => 2,
            Page::Virtual => 3,
            Page::Ports => 4,
            Page::Logs => 5,
        }
    }

    pub fn next(&self) -> Page {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Page {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Active pane on the remote page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    /// Saved and ad-hoc USB/IP servers (left)
    Hosts,
    /// Devices exported by the selected server (right)
    Devices,
}

/// Field of the log filter form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Level,
    Source,
    From,
    To,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Level,
        FilterField::Source,
        FilterField::From,
        FilterField::To,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Level => "Level",
            FilterField::Source => "Source",
            FilterField::From => "From (YYYY-MM-DD)",
            FilterField::To => "To (YYYY-MM-DD)",
        }
    }

    pub fn next(&self) -> FilterField {
        match self {
            FilterField::Level => FilterField::Source,
            FilterField::Source => FilterField::From,
            FilterField::From => FilterField::To,
            FilterField::To => FilterField::Level,
        }
    }
}

/// Raw values of the log filter form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilterForm {
    pub level: String,
    pub source: String,
    pub date_from: String,
    pub date_to: String,
}

impl LogFilterForm {
    pub fn field(&self, field: FilterField) -> &str {
        match field {
            FilterField::Level => &self.level,
            FilterField::Source => &self.source,
            FilterField::From => &self.date_from,
            FilterField::To => &self.date_to,
        }
    }

    fn field_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Level => &mut self.level,
            FilterField::Source => &mut self.source,
            FilterField::From => &mut self.date_from,
            FilterField::To => &mut self.date_to,
        }
    }

    /// Criteria for the current form values
    pub fn criteria(&self) -> Result<FilterCriteria, FilterError> {
        FilterCriteria::from_form(&self.level, &self.source, &self.date_from, &self.date_to)
    }
}

/// What a value collected by a prompt will be used for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingInput {
    RemoteHost,
    SearchDeviceInfo,
    DeviceAlias {
        busid: String,
        device_info: Option<String>,
    },
    PortName {
        port: String,
    },
    VirtualDeviceName,
    VirtualDeviceType {
        name: String,
    },
    VirtualDeviceSize {
        name: String,
    },
    VirtualPortNumber,
    VirtualPortName {
        port_number: String,
    },
}

impl PendingInput {
    pub fn title(&self) -> &'static str {
        match self {
            PendingInput::RemoteHost => " Remote Server ",
            PendingInput::SearchDeviceInfo => " Device Info ",
            PendingInput::DeviceAlias { .. } => " Device Alias ",
            PendingInput::PortName { .. } => " Port Name ",
            PendingInput::VirtualDeviceName
            | PendingInput::VirtualDeviceType { .. }
            | PendingInput::VirtualDeviceSize { .. } => " New Virtual Device ",
            PendingInput::VirtualPortNumber | PendingInput::VirtualPortName { .. } => {
                " New Virtual Port "
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            PendingInput::RemoteHost => "USB/IP server address:".to_string(),
            PendingInput::SearchDeviceInfo => "Device ID (busid or vid:pid):".to_string(),
            PendingInput::DeviceAlias { busid, .. } => format!("Alias for {}:", busid),
            PendingInput::PortName { port } => format!("Name for port {}:", port),
            PendingInput::VirtualDeviceName => "Device name:".to_string(),
            PendingInput::VirtualDeviceType { .. } => {
                "Type (storage, keyboard, mouse, fido):".to_string()
            }
            PendingInput::VirtualDeviceSize { .. } => "Storage size in MB:".to_string(),
            PendingInput::VirtualPortNumber => "Port number:".to_string(),
            PendingInput::VirtualPortName { port_number } => {
                format!("Name for port {}:", port_number)
            }
        }
    }
}

/// Result of an input-collection step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Cancelled,
    Provided(String),
}

/// An open prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub pending: PendingInput,
    pub input: String,
}

/// Destructive action waiting for a yes/no
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    DetachPort { port: String },
    DeleteVirtualDevice { id: u32, name: String },
    DeleteVirtualPort { id: u32, port_number: String },
}

impl Confirmation {
    pub fn question(&self) -> String {
        match self {
            Confirmation::DetachPort { port } => format!("Detach the device on port {}?", port),
            Confirmation::DeleteVirtualDevice { name, .. } => {
                format!("Delete virtual device '{}'?", name)
            }
            Confirmation::DeleteVirtualPort { port_number, .. } => {
                format!("Delete virtual port {}?", port_number)
            }
        }
    }

    fn into_action(self) -> AppAction {
        match self {
            Confirmation::DetachPort { port } => AppAction::Detach(DetachDeviceRequest::new(&port)),
            Confirmation::DeleteVirtualDevice { id, .. } => {
                AppAction::DeleteVirtualDevice(DeleteVirtualDeviceRequest { id })
            }
            Confirmation::DeleteVirtualPort { id, .. } => {
                AppAction::DeleteVirtualPort(DeleteVirtualPortRequest { id })
            }
        }
    }
}

/// Input mode for the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Collecting a value (input dialog)
    Prompt(Prompt),
    /// Yes/no before a destructive action
    Confirm(Confirmation),
    /// Editing the log filter form
    LogFilter { focus: FilterField },
    /// Showing help overlay
    Help,
    /// Confirm quit dialog
    ConfirmQuit,
}

/// A USB/IP server listed on the remote page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHost {
    pub name: Option<String>,
    pub address: String,
}

impl RemoteHost {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.address),
            None => self.address.clone(),
        }
    }
}

/// Result of the last device info search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfoPanel {
    pub busid: String,
    pub text: String,
}

/// User action to be processed by the main loop
#[derive(Debug, Clone)]
pub enum AppAction {
    /// No action
    None,
    /// Quit the application
    Quit,
    /// Re-fetch every list from the backend
    Refresh,
    Bind(BindDeviceRequest),
    LoadRemote(RemoteDevicesRequest),
    Attach(AttachDeviceRequest),
    Detach(DetachDeviceRequest),
    SearchDeviceInfo(SearchDeviceInfoRequest),
    SaveAlias(DeviceAliasRequest),
    NamePort(PortNameRequest),
    CreateVirtualDevice(CreateVirtualDeviceRequest),
    ToggleVirtualDevice(ToggleVirtualDeviceRequest),
    DeleteVirtualDevice(DeleteVirtualDeviceRequest),
    CreateVirtualPort(CreateVirtualPortRequest),
    DeleteVirtualPort(DeleteVirtualPortRequest),
}

/// Main application state
pub struct App {
    /// Backend the console talks to
    pub backend_url: String,
    /// Toast queue shared with background tasks
    pub notifier: Notifier,
    /// Currently shown page
    pub page: Page,
    /// Active pane on the remote page
    pub active_pane: ActivePane,
    pub local_devices: Vec<LocalDevice>,
    pub attached_devices: Vec<AttachedDevice>,
    pub remote_hosts: Vec<RemoteHost>,
    /// Server the remote device list belongs to
    pub remote_host: Option<String>,
    pub remote_devices: Vec<RemoteDevice>,
    pub virtual_devices: Vec<VirtualDevice>,
    pub virtual_ports: Vec<VirtualPort>,
    /// Loaded log entries with the active filter
    pub logs: LogTable,
    pub log_form: LogFilterForm,
    pub device_info: Option<DeviceInfoPanel>,
    /// Selected row per page
    selected: [usize; 6],
    /// Selected host on the remote page
    pub selected_host: usize,
    /// Current input mode
    pub input_mode: InputMode,
    /// Status message to display
    pub status_message: Option<String>,
    /// Delay between a successful action and the refresh
    pub refresh_delay: Duration,
    pending_refresh: Option<Instant>,
    /// Should quit flag
    pub should_quit: bool,
}

impl App {
    /// Create a new application state
    pub fn new(backend_url: &str, notifier: Notifier, refresh_delay: Duration) -> Self {
        Self {
            backend_url: backend_url.to_string(),
            notifier,
            page: Page::Local,
            active_pane: ActivePane::Hosts,
            local_devices: Vec::new(),
            attached_devices: Vec::new(),
            remote_hosts: Vec::new(),
            remote_host: None,
            remote_devices: Vec::new(),
            virtual_devices: Vec::new(),
            virtual_ports: Vec::new(),
            logs: LogTable::default(),
            log_form: LogFilterForm::default(),
            device_info: None,
            selected: [0; 6],
            selected_host: 0,
            input_mode: InputMode::Normal,
            status_message: None,
            refresh_delay,
            pending_refresh: None,
            should_quit: false,
        }
    }

    /// Add saved servers from the configuration
    pub fn with_remote_hosts(mut self, hosts: &[RemoteHostConfig]) -> Self {
        for host in hosts {
            self.add_remote_host(Some(host.name.clone()), &host.address);
        }
        self
    }

    /// Add a server to the remote page unless it is already listed
    pub fn add_remote_host(&mut self, name: Option<String>, address: &str) {
        let address = normalize_host(address);
        if address.is_empty() || self.remote_hosts.iter().any(|h| h.address == address) {
            return;
        }
        self.remote_hosts.push(RemoteHost { name, address });
    }

    fn warn(&self, message: &str) {
        self.notifier.notify(message, Severity::Warning);
    }

    // ---- Data updates -------------------------------------------------

    pub fn set_overview(&mut self, overview: DeviceOverview) {
        self.local_devices = overview.local_devices;
        self.attached_devices = overview.attached_devices;
        self.clamp_selection(Page::Local);
        self.clamp_selection(Page::Attached);
    }

    pub fn set_remote_devices(&mut self, host: String, devices: Vec<RemoteDevice>) {
        self.remote_host = Some(host);
        self.remote_devices = devices;
        self.clamp_selection(Page::Remote);
    }

    pub fn set_virtual_devices(&mut self, devices: Vec<VirtualDevice>) {
        self.virtual_devices = devices;
        self.clamp_selection(Page::Virtual);
    }

    pub fn set_virtual_ports(&mut self, ports: Vec<VirtualPort>) {
        self.virtual_ports = ports;
        self.clamp_selection(Page::Ports);
    }

    /// Replace the log table; the active filter is re-applied
    pub fn set_logs(&mut self, records: Vec<LogRecord>) {
        self.logs.load(records);
        self.clamp_selection(Page::Logs);
    }

    pub fn show_device_info(&mut self, busid: String, text: String) {
        self.device_info = Some(DeviceInfoPanel { busid, text });
    }

    // ---- Selection and navigation -------------------------------------

    fn list_len(&self, page: Page) -> usize {
        match page {
            Page::Local => self.local_devices.len(),
            Page::Remote => self.remote_devices.len(),
            Page::Attached => self.attached_devices.len(),
            Page::Virtual => self.virtual_devices.len(),
            Page::Ports => self.virtual_ports.len(),
            Page::Logs => self.logs.outcome().visible_count,
        }
    }

    fn clamp_selection(&mut self, page: Page) {
        let len = self.list_len(page);
        let idx = &mut self.selected[page.index()];
        if *idx >= len {
            *idx = len.saturating_sub(1);
        }
    }

    /// Selected row index on `page`
    pub fn selected_index(&self, page: Page) -> usize {
        self.selected[page.index()]
    }

    pub fn selected_local(&self) -> Option<&LocalDevice> {
        self.local_devices.get(self.selected_index(Page::Local))
    }

    pub fn selected_remote_device(&self) -> Option<&RemoteDevice> {
        self.remote_devices.get(self.selected_index(Page::Remote))
    }

    pub fn selected_host(&self) -> Option<&RemoteHost> {
        self.remote_hosts.get(self.selected_host)
    }

    pub fn selected_attached(&self) -> Option<&AttachedDevice> {
        self.attached_devices.get(self.selected_index(Page::Attached))
    }

    pub fn selected_virtual_device(&self) -> Option<&VirtualDevice> {
        self.virtual_devices.get(self.selected_index(Page::Virtual))
    }

    pub fn selected_virtual_port(&self) -> Option<&VirtualPort> {
        self.virtual_ports.get(self.selected_index(Page::Ports))
    }

    pub fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    pub fn next_page(&mut self) {
        self.page = self.page.next();
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.prev();
    }

    /// Switch active pane (remote page only)
    pub fn toggle_pane(&mut self) {
        if self.page != Page::Remote {
            return;
        }
        self.active_pane = match self.active_pane {
            ActivePane::Hosts => ActivePane::Devices,
            ActivePane::Devices => ActivePane::Hosts,
        };
    }

    fn on_host_pane(&self) -> bool {
        self.page == Page::Remote && self.active_pane == ActivePane::Hosts
    }

    /// Navigate up in current list
    pub fn navigate_up(&mut self) {
        if self.on_host_pane() {
            self.selected_host = self.selected_host.saturating_sub(1);
            return;
        }
        let idx = &mut self.selected[self.page.index()];
        *idx = idx.saturating_sub(1);
    }

    /// Navigate down in current list
    pub fn navigate_down(&mut self) {
        if self.on_host_pane() {
            if self.selected_host + 1 < self.remote_hosts.len() {
                self.selected_host += 1;
            }
            return;
        }
        let len = self.list_len(self.page);
        let idx = &mut self.selected[self.page.index()];
        if *idx + 1 < len {
            *idx += 1;
        }
    }

    // ---- Page actions -------------------------------------------------

    /// Handle Enter key press
    pub fn handle_enter(&mut self) -> AppAction {
        match self.page {
            Page::Local => self.handle_bind(),
            Page::Remote => match self.active_pane {
                ActivePane::Hosts => match self.selected_host() {
                    Some(host) => AppAction::LoadRemote(RemoteDevicesRequest::new(&host.address)),
                    None => {
                        self.start_prompt(PendingInput::RemoteHost, "");
                        AppAction::None
                    }
                },
                ActivePane::Devices => self.handle_attach(),
            },
            Page::Attached => {
                self.handle_delete();
                AppAction::None
            }
            Page::Virtual => self.handle_toggle(),
            Page::Ports => AppAction::None,
            Page::Logs => {
                self.start_log_filter();
                AppAction::None
            }
        }
    }

    /// Publish the selected local device
    pub fn handle_bind(&mut self) -> AppAction {
        match self.selected_local() {
            Some(device) => AppAction::Bind(BindDeviceRequest::new(&device.busid)),
            None => {
                self.warn("No device selected");
                AppAction::None
            }
        }
    }

    /// Attach the selected remote device
    pub fn handle_attach(&mut self) -> AppAction {
        match (&self.remote_host, self.selected_remote_device()) {
            (Some(host), Some(device)) => {
                AppAction::Attach(AttachDeviceRequest::new(host, &device.busid))
            }
            _ => {
                self.warn("No remote device selected");
                AppAction::None
            }
        }
    }

    /// Start/stop the selected virtual device
    pub fn handle_toggle(&mut self) -> AppAction {
        match self.selected_virtual_device() {
            Some(device) => AppAction::ToggleVirtualDevice(ToggleVirtualDeviceRequest { id: device.id }),
            None => AppAction::None,
        }
    }

    /// Handle 'd' key: ask before detaching or deleting
    pub fn handle_delete(&mut self) {
        let confirmation = match self.page {
            Page::Attached => self.selected_attached().map(|d| Confirmation::DetachPort {
                port: d.port.clone(),
            }),
            Page::Virtual => {
                self.selected_virtual_device()
                    .map(|d| Confirmation::DeleteVirtualDevice {
                        id: d.id,
                        name: d.name.clone(),
                    })
            }
            Page::Ports => self
                .selected_virtual_port()
                .map(|p| Confirmation::DeleteVirtualPort {
                    id: p.id,
                    port_number: p.port_number.clone(),
                }),
            _ => None,
        };
        if let Some(confirmation) = confirmation {
            self.input_mode = InputMode::Confirm(confirmation);
        }
    }

    /// Handle 'c' key: create on virtual pages, clear filter on logs
    pub fn handle_create(&mut self) {
        match self.page {
            Page::Virtual => self.start_prompt(PendingInput::VirtualDeviceName, ""),
            Page::Ports => self.start_prompt(PendingInput::VirtualPortNumber, ""),
            Page::Logs => self.clear_log_filter(),
            _ => {}
        }
    }

    /// Handle 'n' key: alias a local device or name a port
    pub fn handle_name(&mut self) {
        match self.page {
            Page::Local => {
                if let Some(device) = self.selected_local() {
                    let busid = device.busid.clone();
                    let initial = device.alias.clone().unwrap_or_default();
                    let device_info = self
                        .device_info
                        .as_ref()
                        .filter(|panel| panel.busid == busid)
                        .map(|panel| panel.text.clone());
                    self.start_prompt(PendingInput::DeviceAlias { busid, device_info }, &initial);
                }
            }
            Page::Attached => {
                if let Some(device) = self.selected_attached() {
                    let port = device.port.clone();
                    let initial = device.custom_name.clone().unwrap_or_default();
                    self.start_prompt(PendingInput::PortName { port }, &initial);
                }
            }
            _ => {}
        }
    }

    /// Handle 's' key: search device info, prefilled with the selection
    pub fn start_search(&mut self) {
        let initial = self
            .selected_local()
            .map(|d| d.busid.clone())
            .unwrap_or_default();
        self.start_prompt(PendingInput::SearchDeviceInfo, &initial);
    }

    /// Handle 'a' key on the remote page
    pub fn start_add_host(&mut self) {
        if self.page == Page::Remote {
            self.start_prompt(PendingInput::RemoteHost, "");
        }
    }

    // ---- Input collection ---------------------------------------------

    pub fn start_prompt(&mut self, pending: PendingInput, initial: &str) {
        self.input_mode = InputMode::Prompt(Prompt {
            pending,
            input: initial.to_string(),
        });
    }

    pub fn prompt_push(&mut self, c: char) {
        if let InputMode::Prompt(prompt) = &mut self.input_mode {
            prompt.input.push(c);
        }
    }

    pub fn prompt_backspace(&mut self) {
        if let InputMode::Prompt(prompt) = &mut self.input_mode {
            prompt.input.pop();
        }
    }

    /// Close the prompt and act on its outcome
    pub fn finish_prompt(&mut self, submit: bool) -> AppAction {
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
        let InputMode::Prompt(prompt) = mode else {
            self.input_mode = mode;
            return AppAction::None;
        };
        let outcome = if submit {
            PromptOutcome::Provided(prompt.input)
        } else {
            PromptOutcome::Cancelled
        };
        self.resolve_input(prompt.pending, outcome)
    }

    /// Turn a collected value into the action it was collected for
    ///
    /// Multi-step inputs (virtual device, virtual port) open the next
    /// prompt and return no action until the last step.
    pub fn resolve_input(&mut self, pending: PendingInput, outcome: PromptOutcome) -> AppAction {
        let value = match outcome {
            PromptOutcome::Cancelled => {
                self.set_status("Cancelled".to_string());
                return AppAction::None;
            }
            PromptOutcome::Provided(value) => value.trim().to_string(),
        };

        match pending {
            PendingInput::RemoteHost => {
                let req = RemoteDevicesRequest::new(&value);
                if !req.ip.is_empty() {
                    self.add_remote_host(None, &req.ip);
                    if let Some(pos) = self.remote_hosts.iter().position(|h| h.address == req.ip) {
                        self.selected_host = pos;
                    }
                }
                AppAction::LoadRemote(req)
            }
            PendingInput::SearchDeviceInfo => {
                AppAction::SearchDeviceInfo(SearchDeviceInfoRequest::new(&value))
            }
            PendingInput::DeviceAlias { busid, device_info } => {
                AppAction::SaveAlias(DeviceAliasRequest {
                    busid,
                    alias: value,
                    device_info,
                })
            }
            PendingInput::PortName { port } => AppAction::NamePort(PortNameRequest {
                port_number: port,
                custom_name: value,
            }),
            PendingInput::VirtualDeviceName => {
                if value.is_empty() {
                    self.warn("Enter a device name");
                } else {
                    self.start_prompt(PendingInput::VirtualDeviceType { name: value }, "storage");
                }
                AppAction::None
            }
            PendingInput::VirtualDeviceType { name } => match value.parse::<VirtualDeviceType>() {
                Ok(VirtualDeviceType::Storage) => {
                    self.start_prompt(PendingInput::VirtualDeviceSize { name }, "1024");
                    AppAction::None
                }
                Ok(device_type) => AppAction::CreateVirtualDevice(CreateVirtualDeviceRequest {
                    name,
                    device_type,
                    storage_size: None,
                }),
                Err(e) => {
                    self.warn(&e.to_string());
                    AppAction::None
                }
            },
            PendingInput::VirtualDeviceSize { name } => match value.parse::<u32>() {
                Ok(size) => AppAction::CreateVirtualDevice(CreateVirtualDeviceRequest {
                    name,
                    device_type: VirtualDeviceType::Storage,
                    storage_size: Some(size),
                }),
                Err(_) => {
                    self.warn("Storage size must be a whole number of megabytes");
                    AppAction::None
                }
            },
            PendingInput::VirtualPortNumber => {
                if value.is_empty() {
                    self.warn("Enter a port number");
                } else {
                    self.start_prompt(PendingInput::VirtualPortName { port_number: value }, "");
                }
                AppAction::None
            }
            PendingInput::VirtualPortName { port_number } => {
                AppAction::CreateVirtualPort(CreateVirtualPortRequest {
                    port_number,
                    name: value,
                })
            }
        }
    }

    /// Accept the pending confirmation
    pub fn confirm(&mut self) -> AppAction {
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
        match mode {
            InputMode::Confirm(confirmation) => confirmation.into_action(),
            other => {
                self.input_mode = other;
                AppAction::None
            }
        }
    }

    // ---- Log filter ---------------------------------------------------

    pub fn start_log_filter(&mut self) {
        self.input_mode = InputMode::LogFilter {
            focus: FilterField::Level,
        };
    }

    pub fn filter_push(&mut self, c: char) {
        if let InputMode::LogFilter { focus } = self.input_mode {
            self.log_form.field_mut(focus).push(c);
        }
    }

    pub fn filter_backspace(&mut self) {
        if let InputMode::LogFilter { focus } = self.input_mode {
            self.log_form.field_mut(focus).pop();
        }
    }

    pub fn next_filter_field(&mut self) {
        if let InputMode::LogFilter { focus } = &mut self.input_mode {
            *focus = focus.next();
        }
    }

    /// Apply the form; invalid input keeps the form open
    pub fn apply_log_filter(&mut self) -> Option<FilterOutcome> {
        match self.log_form.criteria() {
            Ok(criteria) => {
                let outcome = self.logs.apply(criteria);
                self.selected[Page::Logs.index()] = 0;
                self.input_mode = InputMode::Normal;
                self.set_status(self.log_summary());
                Some(outcome)
            }
            Err(e) => {
                self.warn(&e.to_string());
                None
            }
        }
    }

    pub fn clear_log_filter(&mut self) {
        self.log_form = LogFilterForm::default();
        self.logs.clear_filter();
        self.selected[Page::Logs.index()] = 0;
        self.set_status(self.log_summary());
    }

    /// "Showing N of M entries"
    pub fn log_summary(&self) -> String {
        let outcome = self.logs.outcome();
        format!(
            "Showing {} of {} entries",
            outcome.visible_count, outcome.total
        )
    }

    // ---- Refresh deadline ---------------------------------------------

    /// Schedule a refresh after the configured delay, replacing any pending one
    pub fn schedule_refresh(&mut self, now: Instant) {
        self.pending_refresh = Some(now + self.refresh_delay);
    }

    pub fn cancel_refresh(&mut self) {
        self.pending_refresh = None;
    }

    pub fn refresh_pending(&self) -> Option<Instant> {
        self.pending_refresh
    }

    /// True once when the pending refresh is due
    pub fn take_due_refresh(&mut self, now: Instant) -> bool {
        match self.pending_refresh {
            Some(deadline) if now >= deadline => {
                self.pending_refresh = None;
                true
            }
            _ => false,
        }
    }

    // ---- Dialogs and status -------------------------------------------

    /// Cancel current input mode
    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Show help overlay
    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    /// Show quit confirmation
    pub fn show_quit_confirm(&mut self) {
        self.input_mode = InputMode::ConfirmQuit;
    }

    /// Confirm quit
    pub fn confirm_quit(&mut self) {
        self.pending_refresh = None;
        self.should_quit = true;
    }

    /// Dismiss the oldest toast
    pub fn dismiss_toast(&mut self) {
        self.notifier.dismiss_oldest();
    }

    /// Set status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    /// Count running virtual devices
    pub fn running_virtual_count(&self) -> usize {
        self.virtual_devices.iter().filter(|d| d.is_running).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::clock::ManualClock;
    use common::test_utils::{
        create_mock_attached_device, create_mock_local_device, create_mock_log_records,
        create_mock_remote_device, create_mock_virtual_device, create_mock_virtual_port,
    };
    use common::NotificationQueue;
    use std::sync::Arc;

    fn test_app() -> App {
        let notifier = Notifier::new(NotificationQueue::new(Arc::new(ManualClock::new())));
        App::new("http://127.0.0.1:5000", notifier, Duration::from_millis(1000))
    }

    fn overview() -> DeviceOverview {
        DeviceOverview {
            local_devices: vec![
                create_mock_local_device("1-1", "0781", "5567"),
                create_mock_local_device("1-2", "046d", "c077"),
            ],
            attached_devices: vec![create_mock_attached_device("00", "192.168.1.100", "1-1")],
        }
    }

    #[test]
    fn test_app_creation() {
        let app = test_app();
        assert_eq!(app.page, Page::Local);
        assert!(app.local_devices.is_empty());
        assert!(app.refresh_pending().is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_page_cycle() {
        assert_eq!(Page::Local.prev(), Page::Logs);
        assert_eq!(Page::Logs.next(), Page::Local);
        for page in Page::ALL {
            assert_eq!(Page::ALL[page.index()], page);
        }
    }

    #[test]
    fn test_navigate_clamps() {
        let mut app = test_app();
        app.set_overview(overview());

        app.navigate_down();
        assert_eq!(app.selected_index(Page::Local), 1);
        app.navigate_down();
        assert_eq!(app.selected_index(Page::Local), 1);
        app.navigate_up();
        app.navigate_up();
        assert_eq!(app.selected_index(Page::Local), 0);

        app.navigate_down();
        app.set_overview(DeviceOverview {
            local_devices: vec![create_mock_local_device("3-1", "1234", "5678")],
            attached_devices: Vec::new(),
        });
        assert_eq!(app.selected_index(Page::Local), 0);
    }

    #[test]
    fn test_enter_binds_selected_device() {
        let mut app = test_app();
        app.set_overview(overview());
        app.navigate_down();

        match app.handle_enter() {
            AppAction::Bind(req) => assert_eq!(req.busid, "1-2"),
            other => panic!("Expected Bind, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_without_devices_warns() {
        let mut app = test_app();
        assert!(matches!(app.handle_bind(), AppAction::None));
        assert_eq!(app.notifier.snapshot()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_remote_flow() {
        let mut app = test_app().with_remote_hosts(&[RemoteHostConfig {
            name: "lab".to_string(),
            address: "10.0.0.5".to_string(),
        }]);
        app.set_page(Page::Remote);

        match app.handle_enter() {
            AppAction::LoadRemote(req) => assert_eq!(req.ip, "10.0.0.5"),
            other => panic!("Expected LoadRemote, got {:?}", other),
        }

        app.set_remote_devices("10.0.0.5".to_string(), vec![create_mock_remote_device("1-1")]);
        app.toggle_pane();
        match app.handle_enter() {
            AppAction::Attach(req) => {
                assert_eq!(req.ip, "10.0.0.5");
                assert_eq!(req.busid, "1-1");
            }
            other => panic!("Expected Attach, got {:?}", other),
        }
    }

    #[test]
    fn test_ad_hoc_host_is_normalized_and_listed_once() {
        let mut app = test_app();
        app.set_page(Page::Remote);
        app.start_add_host();

        let pending = PendingInput::RemoteHost;
        let action = app.resolve_input(
            pending.clone(),
            PromptOutcome::Provided("http://10.0.0.7:3240/".to_string()),
        );
        assert!(matches!(action, AppAction::LoadRemote(ref req) if req.ip == "10.0.0.7"));

        app.resolve_input(pending, PromptOutcome::Provided("10.0.0.7".to_string()));
        assert_eq!(app.remote_hosts.len(), 1);
    }

    #[test]
    fn test_cancelled_prompt_does_nothing() {
        let mut app = test_app();
        app.start_prompt(PendingInput::SearchDeviceInfo, "1-1");
        let action = app.finish_prompt(false);
        assert!(matches!(action, AppAction::None));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.status_message.as_deref(), Some("Cancelled"));
    }

    #[test]
    fn test_search_prefills_selected_busid() {
        let mut app = test_app();
        app.set_overview(overview());
        app.start_search();
        match &app.input_mode {
            InputMode::Prompt(prompt) => assert_eq!(prompt.input, "1-1"),
            other => panic!("Expected prompt, got {:?}", other),
        }
        let action = app.finish_prompt(true);
        assert!(matches!(action, AppAction::SearchDeviceInfo(ref req) if req.device_id == "1-1"));
    }

    #[test]
    fn test_alias_carries_device_info_for_same_busid() {
        let mut app = test_app();
        app.set_overview(overview());
        app.show_device_info("1-1".to_string(), "SanDisk Cruzer".to_string());
        app.handle_name();
        for c in "Backup".chars() {
            app.prompt_push(c);
        }

        match app.finish_prompt(true) {
            AppAction::SaveAlias(req) => {
                assert_eq!(req.busid, "1-1");
                assert_eq!(req.alias, "Backup");
                assert_eq!(req.device_info.as_deref(), Some("SanDisk Cruzer"));
            }
            other => panic!("Expected SaveAlias, got {:?}", other),
        }
    }

    #[test]
    fn test_virtual_device_chain() {
        let mut app = test_app();
        app.set_page(Page::Virtual);
        app.handle_create();

        let action = app.resolve_input(
            PendingInput::VirtualDeviceName,
            PromptOutcome::Provided("Backup".to_string()),
        );
        assert!(matches!(action, AppAction::None));
        assert!(matches!(
            &app.input_mode,
            InputMode::Prompt(Prompt { pending: PendingInput::VirtualDeviceType { name }, .. }) if name == "Backup"
        ));

        // Default answer is storage, which asks for a size
        assert!(matches!(app.finish_prompt(true), AppAction::None));
        match app.finish_prompt(true) {
            AppAction::CreateVirtualDevice(req) => {
                assert_eq!(req.device_type, VirtualDeviceType::Storage);
                assert_eq!(req.storage_size, Some(1024));
            }
            other => panic!("Expected CreateVirtualDevice, got {:?}", other),
        }
    }

    #[test]
    fn test_virtual_device_non_storage_skips_size() {
        let mut app = test_app();
        let action = app.resolve_input(
            PendingInput::VirtualDeviceType {
                name: "Keys".to_string(),
            },
            PromptOutcome::Provided("keyboard".to_string()),
        );
        match action {
            AppAction::CreateVirtualDevice(req) => assert!(req.storage_size.is_none()),
            other => panic!("Expected CreateVirtualDevice, got {:?}", other),
        }

        let action = app.resolve_input(
            PendingInput::VirtualDeviceType {
                name: "Keys".to_string(),
            },
            PromptOutcome::Provided("printer".to_string()),
        );
        assert!(matches!(action, AppAction::None));
        assert_eq!(app.notifier.len(), 1);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = test_app();
        app.set_page(Page::Virtual);
        app.set_virtual_devices(vec![create_mock_virtual_device(7, VirtualDeviceType::Mouse)]);

        app.handle_delete();
        assert!(matches!(app.input_mode, InputMode::Confirm(_)));
        app.cancel_input();
        assert_eq!(app.input_mode, InputMode::Normal);

        app.handle_delete();
        match app.confirm() {
            AppAction::DeleteVirtualDevice(req) => assert_eq!(req.id, 7),
            other => panic!("Expected DeleteVirtualDevice, got {:?}", other),
        }
    }

    #[test]
    fn test_detach_and_port_delete_confirmations() {
        let mut app = test_app();
        app.set_overview(overview());
        app.set_page(Page::Attached);
        app.handle_delete();
        assert!(matches!(app.confirm(), AppAction::Detach(ref req) if req.port == "00"));

        app.set_page(Page::Ports);
        app.set_virtual_ports(vec![create_mock_virtual_port(3, "5")]);
        app.handle_delete();
        assert!(matches!(app.confirm(), AppAction::DeleteVirtualPort(ref req) if req.id == 3));
    }

    #[test]
    fn test_log_filter_form() {
        let mut app = test_app();
        app.set_logs(create_mock_log_records(10));
        app.start_log_filter();
        for c in "error".chars() {
            app.filter_push(c);
        }

        let outcome = app.apply_log_filter().unwrap();
        assert_eq!(outcome.total, 10);
        assert_eq!(outcome.visible_count, 2);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.status_message.as_deref(), Some("Showing 2 of 10 entries"));

        app.clear_log_filter();
        assert_eq!(app.logs.outcome().visible_count, 10);
    }

    #[test]
    fn test_invalid_filter_keeps_form_open() {
        let mut app = test_app();
        app.set_logs(create_mock_log_records(5));
        app.start_log_filter();
        app.next_filter_field();
        app.next_filter_field();
        for c in "yesterday".chars() {
            app.filter_push(c);
        }

        assert!(app.apply_log_filter().is_none());
        assert!(matches!(app.input_mode, InputMode::LogFilter { focus: FilterField::From }));
        assert_eq!(app.notifier.snapshot()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_refresh_deadline() {
        let mut app = test_app();
        let start = Instant::now();

        app.schedule_refresh(start);
        assert!(!app.take_due_refresh(start + Duration::from_millis(999)));
        assert!(app.take_due_refresh(start + Duration::from_millis(1000)));
        assert!(!app.take_due_refresh(start + Duration::from_millis(2000)));
    }

    #[test]
    fn test_refresh_replaced_and_cancelled() {
        let mut app = test_app();
        let start = Instant::now();

        app.schedule_refresh(start);
        app.schedule_refresh(start + Duration::from_millis(500));
        assert!(!app.take_due_refresh(start + Duration::from_millis(1000)));
        assert!(app.take_due_refresh(start + Duration::from_millis(1500)));

        app.schedule_refresh(start);
        app.confirm_quit();
        assert!(app.refresh_pending().is_none());
    }
}
