/*!
 * Bluetooth Device Query
 * Walks adapters and devices on the device service and turns them into bar items
 */

pub mod bluez;

pub use bluez::BluezClient;

use dbus::arg::PropMap;
use dbus::Path;

use crate::error::{BarError, Result};
use crate::item::{StatusItem, CONNECTED_COLOR, DISCONNECTED_COLOR};

/// The three calls DeviceQuery needs from the device service.
#[allow(async_fn_in_trait)]
pub trait DeviceBus {
    async fn list_adapters(&self) -> Result<Vec<Path<'static>>>;
    async fn list_devices(&self, adapter: &Path<'static>) -> Result<Vec<Path<'static>>>;
    async fn get_properties(&self, device: &Path<'static>) -> Result<PropMap>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub alias: String,
    pub address: String,
    pub connected: bool,
}

impl DeviceRecord {
    pub fn from_props(device: &Path<'_>, props: &PropMap) -> Result<Self> {
        Ok(Self {
            alias: prop::<String>(device, props, "Alias", "string")?.clone(),
            address: prop::<String>(device, props, "Address", "string")?.clone(),
            connected: *prop::<bool>(device, props, "Connected", "boolean")?,
        })
    }
}

fn prop<'a, T: 'static>(
    device: &Path<'_>,
    props: &'a PropMap,
    key: &'static str,
    expected: &'static str,
) -> Result<&'a T> {
    let value = props.get(key).ok_or_else(|| BarError::MissingProperty {
        device: device.to_string(),
        key,
    })?;

    (*value.0)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| BarError::PropertyType {
            device: device.to_string(),
            key,
            expected,
        })
}

impl From<DeviceRecord> for StatusItem {
    fn from(device: DeviceRecord) -> Self {
        let color = if device.connected {
            CONNECTED_COLOR
        } else {
            DISCONNECTED_COLOR
        };

        StatusItem {
            name: device.alias.clone(),
            instance: device.address,
            color: color.to_string(),
            full_text: device.alias,
        }
    }
}

/// Every device on every adapter, in enumeration order.
///
/// No adapters or no devices is an empty result; any failed call is an error.
pub async fn poll<B: DeviceBus>(bus: &B) -> Result<Vec<DeviceRecord>> {
    let mut devices = Vec::new();
    for adapter in bus.list_adapters().await? {
        devices.extend(bus.list_devices(&adapter).await?);
    }

    let mut records = Vec::with_capacity(devices.len());
    for device in &devices {
        let props = bus.get_properties(device).await?;
        records.push(DeviceRecord::from_props(device, &props)?);
    }

    tracing::debug!("Found {} bluetooth devices", records.len());
    Ok(records)
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use dbus::arg::Variant;

    pub struct FakeDevice {
        pub path: &'static str,
        pub alias: &'static str,
        pub address: &'static str,
        pub connected: bool,
    }

    /// In-memory device service: adapters in order, each with its devices.
    #[derive(Default)]
    pub struct FakeBus {
        pub adapters: Vec<(&'static str, Vec<FakeDevice>)>,
    }

    pub fn device_props(alias: &str, address: &str, connected: bool) -> PropMap {
        let mut props = PropMap::new();
        props.insert("Alias".to_string(), Variant(Box::new(alias.to_string())));
        props.insert("Address".to_string(), Variant(Box::new(address.to_string())));
        props.insert("Connected".to_string(), Variant(Box::new(connected)));
        props
    }

    impl DeviceBus for FakeBus {
        async fn list_adapters(&self) -> Result<Vec<Path<'static>>> {
            Ok(self.adapters.iter().map(|(path, _)| Path::from(*path)).collect())
        }

        async fn list_devices(&self, adapter: &Path<'static>) -> Result<Vec<Path<'static>>> {
            Ok(self
                .adapters
                .iter()
                .filter(|(path, _)| **path == **adapter)
                .flat_map(|(_, devices)| devices.iter().map(|d| Path::from(d.path)))
                .collect())
        }

        async fn get_properties(&self, device: &Path<'static>) -> Result<PropMap> {
            self.adapters
                .iter()
                .flat_map(|(_, devices)| devices.iter())
                .find(|d| d.path == &**device)
                .map(|d| device_props(d.alias, d.address, d.connected))
                .ok_or_else(|| BarError::BusLost(format!("no such object {}", device)))
        }
    }
}
