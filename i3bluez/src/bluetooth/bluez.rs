/*!
 * BlueZ D-Bus Client
 * Adapter and device enumeration over the system bus
 */

use dbus::arg::{PropMap, RefArg};
use dbus::nonblock::stdintf::org_freedesktop_dbus::{ObjectManager, Properties};
use dbus::nonblock::{Proxy, SyncConnection};
use dbus::strings::BusName;
use dbus::Path;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::DeviceBus;
use crate::config::{BluetoothSettings, BluezApi};
use crate::error::{BarError, Result};

const ADAPTER1: &str = "org.bluez.Adapter1";
const DEVICE1: &str = "org.bluez.Device1";

type ManagedObjects = HashMap<Path<'static>, HashMap<String, PropMap>>;

pub struct BluezClient {
    conn: Arc<SyncConnection>,
    service: BusName<'static>,
    api: BluezApi,
    timeout: Duration,
}

impl BluezClient {
    pub fn new(conn: Arc<SyncConnection>, settings: &BluetoothSettings) -> Result<Self> {
        let service = BusName::new(settings.service.clone()).map_err(BarError::BusName)?;

        Ok(Self {
            conn,
            service,
            api: settings.api,
            timeout: settings.timeout(),
        })
    }

    fn proxy(&self, path: Path<'static>) -> Proxy<'static, Arc<SyncConnection>> {
        Proxy::new(self.service.clone(), path, self.timeout, self.conn.clone())
    }

    async fn call_paths(
        &self,
        path: &Path<'static>,
        interface: &'static str,
        member: &'static str,
        method: &'static str,
    ) -> Result<Vec<Path<'static>>> {
        let (paths,): (Vec<Path<'static>>,) = self
            .proxy(path.clone())
            .method_call(interface, member, ())
            .await
            .map_err(|source| bus_error(method, path, source))?;
        Ok(paths)
    }

    async fn managed_objects(&self) -> Result<ManagedObjects> {
        let root = Path::from("/");
        self.proxy(root.clone())
            .get_managed_objects()
            .await
            .map_err(|source| bus_error("org.freedesktop.DBus.ObjectManager.GetManagedObjects", &root, source))
    }
}

fn bus_error(method: &'static str, path: &Path<'_>, source: dbus::Error) -> BarError {
    BarError::Bus {
        method,
        path: path.to_string(),
        source,
    }
}

fn sorted(mut paths: Vec<Path<'static>>) -> Vec<Path<'static>> {
    paths.sort_by(|a, b| Ord::cmp(&**a, &**b));
    paths
}

/// Objects exposing the adapter interface, by path.
fn adapters_in(objects: &ManagedObjects) -> Vec<Path<'static>> {
    sorted(
        objects
            .iter()
            .filter(|(_, interfaces)| interfaces.contains_key(ADAPTER1))
            .map(|(path, _)| path.clone())
            .collect(),
    )
}

/// Device objects whose `Adapter` property points at `adapter`, by path.
fn devices_in(objects: &ManagedObjects, adapter: &Path<'static>) -> Vec<Path<'static>> {
    sorted(
        objects
            .iter()
            .filter(|(_, interfaces)| {
                interfaces
                    .get(DEVICE1)
                    .and_then(|props| props.get("Adapter"))
                    .and_then(|owner| (*owner.0).as_any().downcast_ref::<Path<'static>>())
                    .is_some_and(|owner| owner == adapter)
            })
            .map(|(path, _)| path.clone())
            .collect(),
    )
}

impl DeviceBus for BluezClient {
    async fn list_adapters(&self) -> Result<Vec<Path<'static>>> {
        match self.api {
            BluezApi::Legacy => {
                self.call_paths(&Path::from("/"), "org.bluez.Manager", "ListAdapters", "org.bluez.Manager.ListAdapters")
                    .await
            }
            BluezApi::ObjectManager => Ok(adapters_in(&self.managed_objects().await?)),
        }
    }

    async fn list_devices(&self, adapter: &Path<'static>) -> Result<Vec<Path<'static>>> {
        match self.api {
            BluezApi::Legacy => {
                self.call_paths(adapter, "org.bluez.Adapter", "ListDevices", "org.bluez.Adapter.ListDevices")
                    .await
            }
            BluezApi::ObjectManager => Ok(devices_in(&self.managed_objects().await?, adapter)),
        }
    }

    async fn get_properties(&self, device: &Path<'static>) -> Result<PropMap> {
        let proxy = self.proxy(device.clone());
        match self.api {
            BluezApi::Legacy => {
                let (props,): (PropMap,) = proxy
                    .method_call("org.bluez.Device", "GetProperties", ())
                    .await
                    .map_err(|source| bus_error("org.bluez.Device.GetProperties", device, source))?;
                Ok(props)
            }
            BluezApi::ObjectManager => proxy
                .get_all(DEVICE1)
                .await
                .map_err(|source| bus_error("org.freedesktop.DBus.Properties.GetAll", device, source)),
        }
    }
}
