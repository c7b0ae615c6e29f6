//! Windows audio device enumeration via the MMDevice API.
//!
//! Wraps `IMMDeviceEnumerator` to walk active capture endpoints lazily, one
//! `IMMDevice` at a time, and read their friendly names.

use windows::core::PCWSTR;
use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;

use kinect_capture_core::models::endpoint::EndpointInfo;
use kinect_capture_core::models::error::CaptureError;
use kinect_capture_core::traits::endpoint::{CaptureEndpoint, EndpointEnumerator};

use crate::com::ComGuard;
use crate::wasapi_capture::WasapiCapture;

/// Audio device enumerator using the Windows MMDevice API.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
    _com: ComGuard,
}

impl DeviceEnumerator {
    /// Initialize COM on the calling thread and create the enumerator.
    pub fn new() -> Result<Self, CaptureError> {
        let com = ComGuard::init()?;
        let enumerator: IMMDeviceEnumerator = unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
            .map_err(|e| CaptureError::EnumerationFailed(format!("failed to create enumerator: {}", e)))?;
        Ok(Self { enumerator, _com: com })
    }

    /// Snapshot of every active capture endpoint, for `--list-devices`.
    pub fn list_capture_devices(&self) -> Result<Vec<EndpointInfo>, CaptureError> {
        let default_id = self.default_capture_device_id();
        let mut devices = Vec::new();

        for (i, item) in self.active_capture_endpoints()?.enumerate() {
            let Ok(endpoint) = item else { continue };
            let Ok(id) = endpoint.id() else { continue };
            let name = endpoint.friendly_name().unwrap_or_else(|_| format!("Device {}", i));
            let is_default = default_id.as_deref() == Some(id.as_str());
            devices.push(EndpointInfo { id, name, is_default });
        }

        Ok(devices)
    }

    /// ID of the default console capture endpoint, if there is one.
    pub fn default_capture_device_id(&self) -> Option<String> {
        let device = unsafe { self.enumerator.GetDefaultAudioEndpoint(eCapture, eConsole) }.ok()?;
        device_id(&device).ok()
    }

    /// Look an endpoint up by its stable ID.
    pub fn endpoint_by_id(&self, id: &str) -> Result<WasapiEndpoint, CaptureError> {
        let wide_id: Vec<u16> = id.encode_utf16().chain(std::iter::once(0)).collect();
        let device = unsafe { self.enumerator.GetDevice(PCWSTR(wide_id.as_ptr())) }
            .map_err(|_| CaptureError::DeviceNotFound)?;
        Ok(WasapiEndpoint { device })
    }
}

impl EndpointEnumerator for DeviceEnumerator {
    type Endpoint = WasapiEndpoint;
    type Endpoints = ActiveEndpoints;

    fn active_capture_endpoints(&self) -> Result<ActiveEndpoints, CaptureError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eCapture, DEVICE_STATE_ACTIVE)
                .map_err(|e| CaptureError::EnumerationFailed(format!("EnumAudioEndpoints failed: {}", e)))?;

            let count = collection
                .GetCount()
                .map_err(|e| CaptureError::EnumerationFailed(format!("GetCount failed: {}", e)))?;

            Ok(ActiveEndpoints {
                collection,
                next: 0,
                count,
            })
        }
    }
}

/// Lazy walk over an `IMMDeviceCollection`.
pub struct ActiveEndpoints {
    collection: IMMDeviceCollection,
    next: u32,
    count: u32,
}

impl Iterator for ActiveEndpoints {
    type Item = Result<WasapiEndpoint, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let item = unsafe { self.collection.Item(index) }
            .map(|device| WasapiEndpoint { device })
            .map_err(|e| CaptureError::EnumerationFailed(format!("Item({}) failed: {}", index, e)));
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

/// One capture endpoint. The underlying `IMMDevice` is released on drop.
pub struct WasapiEndpoint {
    device: IMMDevice,
}

impl CaptureEndpoint for WasapiEndpoint {
    type Stream = WasapiCapture;

    fn id(&self) -> Result<String, CaptureError> {
        device_id(&self.device)
    }

    /// Read the PKEY_Device_FriendlyName property.
    fn friendly_name(&self) -> Result<String, CaptureError> {
        unsafe {
            let store = self
                .device
                .OpenPropertyStore(STGM_READ)
                .map_err(|e| CaptureError::EnumerationFailed(format!("OpenPropertyStore failed: {}", e)))?;

            // PROPVARIANT clears itself on drop.
            let value = store
                .GetValue(&PKEY_Device_FriendlyName)
                .map_err(|e| CaptureError::EnumerationFailed(format!("GetValue failed: {}", e)))?;

            let name = value.to_string();
            if name.is_empty() {
                return Err(CaptureError::EnumerationFailed("friendly name is empty".into()));
            }
            Ok(name)
        }
    }

    fn open_stream(&self) -> Result<WasapiCapture, CaptureError> {
        let id = self.id().map_err(|e| CaptureError::StreamOpenFailed(e.to_string()))?;
        let name = self.friendly_name().unwrap_or_else(|_| id.clone());
        WasapiCapture::open(&self.device, id, name)
    }
}

fn device_id(device: &IMMDevice) -> Result<String, CaptureError> {
    unsafe {
        let raw = device
            .GetId()
            .map_err(|e| CaptureError::EnumerationFailed(format!("GetId failed: {}", e)))?;
        let id = raw.to_string();
        CoTaskMemFree(Some(raw.0 as *const _));
        id.map_err(|e| CaptureError::EnumerationFailed(format!("device ID is not UTF-16: {}", e)))
    }
}
