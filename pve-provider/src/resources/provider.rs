//! Provider configuration (`pulumi:providers:pve`).
//!
//! Besides being a resource in its own right, the configuration can be
//! loaded from a YAML file and overridden from the environment:
//!
//! ```yaml
//! pveUrl: https://pve.example.com:8006
//! pveUser: root@pam!automation
//! pveToken: 00000000-0000-0000-0000-000000000000
//! sshUser: root
//! sshPass: changeme
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ProviderError, Result};
use crate::schema::{FieldSchema, ResourceSchema};
use crate::secret::Sensitive;
use crate::value::PropertyMap;

use super::{string_at, ResourceKind, ResourceModel};

const PROVIDER_FIELDS: &[FieldSchema] = &[
    // A different endpoint is a different cluster.
    FieldSchema::string("pveUrl")
        .required()
        .force_replace()
        .describe("URL of the Proxmox VE API"),
    FieldSchema::string("pveUser")
        .required()
        .describe("API user (user@realm!tokenid)"),
    FieldSchema::string("pveToken")
        .required()
        .secret()
        .describe("API token secret"),
    FieldSchema::string("sshUser")
        .required()
        .describe("SSH user used for datastore file transfers"),
    FieldSchema::string("sshPass")
        .required()
        .secret()
        .describe("SSH password"),
];

pub static PROVIDER_SCHEMA: ResourceSchema = ResourceSchema {
    type_token: "pulumi:providers:pve",
    description: "Provider configuration for a Proxmox VE cluster.",
    fields: PROVIDER_FIELDS,
    delete_before_replace: false,
};

/// Environment variables consulted by [`ProviderConfig::with_env_overrides`].
pub const ENV_URL: &str = "PVE_URL";
pub const ENV_USER: &str = "PVE_USER";
pub const ENV_TOKEN: &str = "PVE_TOKEN";
pub const ENV_SSH_USER: &str = "PVE_SSH_USER";
pub const ENV_SSH_PASS: &str = "PVE_SSH_PASS";

/// Provider endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(rename = "pveUrl")]
    pub endpoint_url: String,
    #[serde(rename = "pveUser")]
    pub user: String,
    #[serde(rename = "pveToken")]
    pub token: Sensitive<String>,
    #[serde(rename = "sshUser")]
    pub ssh_user: String,
    #[serde(rename = "sshPass")]
    pub ssh_pass: Sensitive<String>,
}

impl ProviderConfig {
    pub fn new(
        endpoint_url: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
        ssh_user: impl Into<String>,
        ssh_pass: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            user: user.into(),
            token: Sensitive::new(token.into()),
            ssh_user: ssh_user.into(),
            ssh_pass: Sensitive::new(ssh_pass.into()),
        }
    }

    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ProviderError::InvalidConfig(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: ProviderConfig = serde_yaml::from_str(&content).map_err(|e| {
            ProviderError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        info!(
            path = %path.display(),
            endpoint = %config.endpoint_url,
            "Loaded provider configuration"
        );
        Ok(config)
    }

    /// Apply `PVE_*` environment variable overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_URL) {
            debug!(source = ENV_URL, "Overriding endpoint");
            self.endpoint_url = url;
        }
        if let Some(user) = get(ENV_USER) {
            self.user = user;
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.token = Sensitive::new(token);
        }
        if let Some(ssh_user) = get(ENV_SSH_USER) {
            self.ssh_user = ssh_user;
        }
        if let Some(ssh_pass) = get(ENV_SSH_PASS) {
            self.ssh_pass = Sensitive::new(ssh_pass);
        }

        self
    }

    /// Check that every field is set and the endpoint looks like a URL.
    pub fn validate(&self) -> Result<()> {
        let token = PROVIDER_SCHEMA.type_token;
        let required = [
            ("pveUrl", self.endpoint_url.as_str()),
            ("pveUser", self.user.as_str()),
            ("pveToken", self.token.expose().as_str()),
            ("sshUser", self.ssh_user.as_str()),
            ("sshPass", self.ssh_pass.expose().as_str()),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ProviderError::missing(token, field));
            }
        }

        let url = &self.endpoint_url;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ProviderError::InvalidConfig(format!(
                "pveUrl must be an http(s) URL, got {}",
                self.endpoint_url
            )));
        }

        Ok(())
    }
}

impl ResourceModel for ProviderConfig {
    const KIND: ResourceKind = ResourceKind::Provider;

    fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("pveUrl".into(), self.endpoint_url.clone().into());
        props.insert("pveUser".into(), self.user.clone().into());
        props.insert("pveToken".into(), self.token.clone().into());
        props.insert("sshUser".into(), self.ssh_user.clone().into());
        props.insert("sshPass".into(), self.ssh_pass.clone().into());
        props
    }

    fn from_validated(props: &PropertyMap) -> Result<Self> {
        Ok(Self::new(
            string_at(Self::KIND, props, "pveUrl")?,
            string_at(Self::KIND, props, "pveUser")?,
            string_at(Self::KIND, props, "pveToken")?,
            string_at(Self::KIND, props, "sshUser")?,
            string_at(Self::KIND, props, "sshPass")?,
        ))
    }
}
