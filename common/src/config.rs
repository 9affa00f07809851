use crate::{
    error::ConfigError,
    topics::{DEFAULT_COMMAND_PREFIX, DEFAULT_STATE_TOPIC},
};

/// Fields copied from device reports into the observed state.
pub const DEFAULT_MONITORED_FIELDS: &[&str] = &[
    "rt",
    "rh",
    "mode",
    "fan",
    "coolicon",
    "heaticon",
    "fanicon",
    "hold",
    "filtrlvl",
    "clsp",
    "htsp",
    "opstat",
    "iducfm",
    "oat",
    "oducoiltmp",
];

/// Shorter bodies cannot hold a report envelope and are treated as malformed.
pub const MIN_REPORT_LEN: usize = 45;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub listen_port: u16,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_port: 8080,
            mqtt_host: "127.0.0.1".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
        }
    }
}

/// Values the rendered documents need to look like they came from the
/// vendor's cloud endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    pub api_server_address: String,
    pub serial: String,
}

impl DocumentContext {
    pub fn system_href(&self) -> String {
        format!("http://{}/systems/{}", self.api_server_address, self.serial)
    }

    pub fn system_resource_href(&self, resource: &str) -> String {
        format!("{}/{resource}", self.system_href())
    }

    pub fn rel_href(&self, rel: &str) -> String {
        format!("http://{}/rels/{rel}", self.api_server_address)
    }

    pub fn time_href(&self) -> String {
        format!("http://{}/time/", self.api_server_address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub network: NetworkConfig,
    pub document: DocumentContext,
    pub command_prefix: String,
    pub state_topic: String,
    pub monitored_fields: Vec<String>,
    pub min_report_len: usize,
}

impl BridgeConfig {
    pub fn new(document: DocumentContext) -> Self {
        Self {
            network: NetworkConfig::default(),
            document,
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            state_topic: DEFAULT_STATE_TOPIC.to_string(),
            monitored_fields: DEFAULT_MONITORED_FIELDS
                .iter()
                .map(|field| field.to_string())
                .collect(),
            min_report_len: MIN_REPORT_LEN,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let serial =
            non_empty("THERMOSTAT_SERIAL").ok_or(ConfigError::Missing("THERMOSTAT_SERIAL"))?;
        let api_server_address = non_empty("API_SERVER_ADDRESS")
            .unwrap_or_else(|| "www.api.ing.carrier.com".to_string());

        let mut config = Self::new(DocumentContext {
            api_server_address,
            serial,
        });

        if let Some(value) = non_empty("API_SERVER_LISTEN_PORT") {
            config.network.listen_port = parse_port("API_SERVER_LISTEN_PORT", &value)?;
        }
        if let Some(value) = non_empty("MQTT_SERVER") {
            config.network.mqtt_host = value;
        }
        if let Some(value) = non_empty("MQTT_PORT") {
            config.network.mqtt_port = parse_port("MQTT_PORT", &value)?;
        }
        if let Some(user) = non_empty("MQTT_USER") {
            config.network.mqtt_user = user;
            config.network.mqtt_pass = lookup("MQTT_PASS").unwrap_or_default();
        }
        if let Some(value) = non_empty("THERMOSTAT_COMMAND_TOPIC") {
            config.command_prefix = normalize_command_prefix(&value);
        }
        if let Some(value) = non_empty("THERMOSTAT_STATE_TOPIC") {
            config.state_topic = value.trim().to_string();
        }
        if let Some(value) = non_empty("THERMOSTAT_MONITORED_FIELDS") {
            config.monitored_fields = value
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }
}

fn parse_port(key: &'static str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
}

/// Accepts both `cmnd/thermostat` and the subscription form `cmnd/thermostat/#`.
fn normalize_command_prefix(value: &str) -> String {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_suffix('#').unwrap_or(trimmed);
    trimmed.trim_end_matches('/').to_string()
}
