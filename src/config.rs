// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use serde::Deserialize;

/// Environment variable consulted when neither the CLI flag nor the
/// config file carries a connection string.
pub const CONNECTION_STRING_ENV: &str = "STORAGE_CONNECTION_STRING";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listen address, e.g. "127.0.0.1:8080"
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Credential string of the form "AccountName=..;AccountKey=..;..".
    /// Absence at startup is fatal.
    #[serde(default)]
    pub connection_string: Option<String>,

    /// Container video objects are uploaded to (private, SAS access)
    #[serde(default = "default_video_container")]
    pub video_container: String,

    /// Container thumbnails are uploaded to (public-read access)
    #[serde(default = "default_thumbnail_container")]
    pub thumbnail_container: String,

    /// Lifetime of issued read URLs, in seconds
    #[serde(default = "default_sas_ttl_secs")]
    pub sas_ttl_secs: u64,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// backend is "in-memory" (the only one wired up today)
    #[serde(default = "default_backend")]
    pub backend: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            connection_string: None,
            video_container: default_video_container(),
            thumbnail_container: default_thumbnail_container(),
            sas_ttl_secs: default_sas_ttl_secs(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    pub fn from_path(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let s = std::fs::read_to_string(path)?;
        let mut cfg: Config = toml::from_str(&s)?;
        cfg.normalize();
        Ok(cfg)
    }

    /// Load from `path`, falling back to defaults when the file does not
    /// exist (everything can also come from flags and environment).
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if std::path::Path::new(path).exists() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Container names are case-insensitive at the backing store; keep
    /// them lowercase so URLs and lookups agree.
    fn normalize(&mut self) {
        self.video_container = self.video_container.to_lowercase();
        self.thumbnail_container = self.thumbnail_container.to_lowercase();
    }

    /// Resolution order: CLI flag, then environment, then config file.
    pub fn resolve_connection_string(&self, flag: Option<&str>) -> Option<String> {
        if let Some(s) = flag {
            return Some(s.to_string());
        }
        if let Ok(s) = std::env::var(CONNECTION_STRING_ENV) {
            if !s.is_empty() {
                return Some(s);
            }
        }
        self.connection_string.clone()
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_video_container() -> String {
    "videos".to_string()
}

fn default_thumbnail_container() -> String {
    "thumbnails".to_string()
}

fn default_sas_ttl_secs() -> u64 {
    3600 // 60 minutes
}

fn default_backend() -> String {
    "in-memory".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let cfg: Config = toml::from_str("listen_addr = \"0.0.0.0:9000\"").unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
        assert_eq!(cfg.video_container, "videos");
        assert_eq!(cfg.thumbnail_container, "thumbnails");
        assert_eq!(cfg.sas_ttl_secs, 3600);
        assert_eq!(cfg.storage.backend, "in-memory");
    }

    #[test]
    fn container_names_are_lowercased() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "video_container = \"Videos\"\n").unwrap();
        let cfg = Config::from_path(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.video_container, "videos");
    }

    #[test]
    fn load_falls_back_to_defaults_when_file_missing() {
        let cfg = Config::load("/definitely/not/here.toml").unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    }

    #[test]
    fn flag_wins_over_config_connection_string() {
        let cfg = Config {
            connection_string: Some("from-config".into()),
            ..Default::default()
        };
        assert_eq!(
            cfg.resolve_connection_string(Some("from-flag")).as_deref(),
            Some("from-flag")
        );
        assert_eq!(
            cfg.resolve_connection_string(None).as_deref(),
            Some("from-config")
        );
    }
}
