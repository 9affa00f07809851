pub const DEFAULT_COMMAND_PREFIX: &str = "cmnd/thermostat";
pub const DEFAULT_STATE_TOPIC: &str = "stat/thermostat/state";

pub const CMD_OPERATING_MODE: &str = "operating_mode";
pub const CMD_FAN_MODE: &str = "fan_mode";
pub const CMD_HOLD: &str = "hold";
pub const CMD_TEMPERATURE: &str = "temperature";

pub const AVAILABILITY_SUFFIX: &str = "availability";
pub const PAYLOAD_ONLINE: &str = "online";
pub const PAYLOAD_OFFLINE: &str = "offline";

/// Wildcard filter covering every command sub-key under `prefix`.
pub fn command_filter(prefix: &str) -> String {
    format!("{prefix}/#")
}

pub fn availability_topic(state_topic: &str) -> String {
    format!("{state_topic}/{AVAILABILITY_SUFFIX}")
}

/// Returns the sub-key of `topic` when it sits directly under `prefix`.
pub fn command_suffix<'a>(prefix: &str, topic: &'a str) -> Option<&'a str> {
    topic
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|suffix| !suffix.is_empty() && !suffix.contains('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_suffix_requires_direct_child() {
        assert_eq!(
            command_suffix("cmnd/thermostat", "cmnd/thermostat/fan_mode"),
            Some("fan_mode")
        );
        assert_eq!(command_suffix("cmnd/thermostat", "cmnd/thermostat"), None);
        assert_eq!(command_suffix("cmnd/thermostat", "cmnd/thermostat/a/b"), None);
        assert_eq!(command_suffix("cmnd/thermostat", "cmnd/thermostatx/hold"), None);
    }

    #[test]
    fn derived_topics() {
        assert_eq!(command_filter("cmnd/thermostat"), "cmnd/thermostat/#");
        assert_eq!(
            availability_topic("stat/thermostat/state"),
            "stat/thermostat/state/availability"
        );
    }
}
