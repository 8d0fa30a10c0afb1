use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::error::{BarError, Result};

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub command: String,
    pub bluetooth: BluetoothSettings,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BluetoothSettings {
    pub service: String,
    pub api: BluezApi,
    pub timeout_ms: u64,
}

/// Which BlueZ object model to walk for adapters and devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BluezApi {
    /// BlueZ 4: `Manager.ListAdapters`, `Adapter.ListDevices`, `Device.GetProperties`.
    #[default]
    Legacy,
    /// BlueZ 5: `ObjectManager.GetManagedObjects` and `Properties.GetAll`.
    ObjectManager,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command: "/usr/bin/i3status".to_string(),
            bluetooth: BluetoothSettings::default(),
        }
    }
}

impl Default for BluetoothSettings {
    fn default() -> Self {
        Self {
            service: "org.bluez".to_string(),
            api: BluezApi::Legacy,
            timeout_ms: 25_000,
        }
    }
}

impl BluetoothSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| BarError::Settings {
                path: path.to_string(),
                source,
            }),
            Err(e) => {
                tracing::info!("Settings file {} not readable ({}), using defaults", path, e);
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_path_means_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.command, "/usr/bin/i3status");
        assert_eq!(settings.bluetooth.service, "org.bluez");
        assert_eq!(settings.bluetooth.api, BluezApi::Legacy);
        assert_eq!(settings.bluetooth.timeout(), Duration::from_secs(25));
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load(path.to_str()).unwrap();
        assert_eq!(settings.command, "/usr/bin/i3status");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "command = \"/opt/bin/i3status\"\n[bluetooth]\napi = \"object-manager\""
        )
        .unwrap();

        let settings = Settings::load(file.path().to_str()).unwrap();
        assert_eq!(settings.command, "/opt/bin/i3status");
        assert_eq!(settings.bluetooth.api, BluezApi::ObjectManager);
        assert_eq!(settings.bluetooth.service, "org.bluez");
        assert_eq!(settings.bluetooth.timeout_ms, 25_000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bluetooth]\napi = \"bluez3\"").unwrap();

        let err = Settings::load(file.path().to_str()).unwrap_err();
        assert!(matches!(err, BarError::Settings { .. }));
    }
}
