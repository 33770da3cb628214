//! Registry of simulated devices keyed by resource name

use std::collections::BTreeMap;

use tracing::info;
use visa_protocol::ResourceName;

use crate::definition::SimulationDefinition;
use crate::device::Device;
use crate::error::{ConfigError, DeviceError};

/// Devices exposed under their canonical resource names
#[derive(Debug, Default)]
pub struct Devices {
    devices: BTreeMap<String, Device>,
}

impl Devices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one fresh device per resource
    pub fn from_definition(definition: &SimulationDefinition) -> Result<Self, ConfigError> {
        let mut devices = Self::new();
        for (resource, resource_def) in &definition.resources {
            let device_def = definition.devices.get(&resource_def.device).ok_or_else(|| {
                ConfigError::UnknownDevice {
                    resource: resource.clone(),
                    device: resource_def.device.clone(),
                }
            })?;
            let device = device_def.build(&resource_def.device, Some(resource_def))?;
            devices.add_device(resource, device)?;
        }
        info!(count = devices.devices.len(), "simulated devices ready");
        Ok(devices)
    }

    /// Bind `device` to `resource_name` and store it
    pub fn add_device(&mut self, resource_name: &str, mut device: Device) -> Result<(), DeviceError> {
        device.bind(resource_name)?;
        let key = device
            .resource_name()
            .map(ToString::to_string)
            .unwrap_or_else(|| resource_name.to_string());
        self.devices.insert(key, device);
        Ok(())
    }

    /// Canonical names of all resources
    pub fn list_resources(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    pub fn get(&self, resource_name: &str) -> Option<&Device> {
        self.devices.get(&canonical(resource_name)?)
    }

    pub fn get_mut(&mut self, resource_name: &str) -> Option<&mut Device> {
        self.devices.get_mut(&canonical(resource_name)?)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn canonical(resource_name: &str) -> Option<String> {
    resource_name
        .parse::<ResourceName>()
        .ok()
        .map(|r| r.to_string())
}
