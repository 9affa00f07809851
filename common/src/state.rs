use std::collections::{BTreeMap, HashSet};

use serde::{Serialize, Serializer};

use crate::{codec::ReportField, error::EngineError};

/// Last value the device reported for each monitored field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedState {
    fields: BTreeMap<String, Option<String>>,
}

impl ObservedState {
    /// Merges one report. Fields outside `monitored` are skipped. With
    /// `first_wins` a repeated field keeps its first value from this report,
    /// otherwise the last occurrence overwrites earlier ones.
    pub fn merge(
        &mut self,
        report: Vec<ReportField>,
        monitored: &HashSet<String>,
        first_wins: bool,
    ) {
        let mut seen = HashSet::new();

        for (name, value) in report {
            if !monitored.contains(&name) {
                continue;
            }
            if first_wins && !seen.insert(name.clone()) {
                continue;
            }
            self.fields.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

}

impl Serialize for ObservedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.fields
                .iter()
                .map(|(name, value)| (name, value.as_deref().unwrap_or(""))),
        )
    }
}

/// Candidate configuration the operator wants on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredConfig {
    pub mode: Option<String>,
    pub fan: String,
    pub hold: String,
    pub clsp: Option<String>,
    pub htsp: Option<String>,
}

impl Default for DesiredConfig {
    fn default() -> Self {
        Self {
            mode: None,
            fan: "auto".to_string(),
            hold: "on".to_string(),
            clsp: None,
            htsp: None,
        }
    }
}

impl DesiredConfig {
    /// Copies mode and setpoints the device declared into fields no command
    /// has set yet.
    pub fn seed_from(&mut self, observed: &ObservedState) {
        let seed = |slot: &mut Option<String>, name: &str| {
            if slot.is_none() {
                *slot = observed.get(name).map(str::to_string);
            }
        };
        seed(&mut self.mode, "mode");
        seed(&mut self.clsp, "clsp");
        seed(&mut self.htsp, "htsp");
    }

    /// The setpoint the current mode acts on: `clsp` when cooling, `htsp`
    /// when heating, none otherwise.
    pub fn active_setpoint(&mut self) -> Option<&mut Option<String>> {
        match self.mode.as_deref() {
            Some("cool") => Some(&mut self.clsp),
            Some("heat") => Some(&mut self.htsp),
            _ => None,
        }
    }

    /// Every field the config document needs, or the first one missing.
    pub fn resolved(&self) -> Result<ResolvedConfig, EngineError> {
        Ok(ResolvedConfig {
            mode: required(&self.mode, "mode")?,
            fan: self.fan.clone(),
            hold: self.hold.clone(),
            clsp: required(&self.clsp, "clsp")?,
            htsp: required(&self.htsp, "htsp")?,
        })
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, EngineError> {
    value.clone().ok_or(EngineError::MissingDesiredField(name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub mode: String,
    pub fan: String,
    pub hold: String,
    pub clsp: String,
    pub htsp: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn monitored(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn report(pairs: &[(&str, Option<&str>)]) -> Vec<ReportField> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.map(str::to_string)))
            .collect()
    }

    #[test]
    fn merge_skips_unmonitored_fields() {
        let mut observed = ObservedState::default();
        observed.merge(
            report(&[("rt", Some("72")), ("serial", Some("X")), ("rh", Some("40"))]),
            &monitored(&["rt", "rh"]),
            false,
        );

        assert_eq!(observed.get("rt"), Some("72"));
        assert_eq!(observed.get("rh"), Some("40"));
        assert!(!observed.contains("serial"));
    }

    #[test]
    fn merge_policies_for_repeated_fields() {
        let fields = report(&[("opstat", Some("heat")), ("opstat", Some("off"))]);

        let mut last = ObservedState::default();
        last.merge(fields.clone(), &monitored(&["opstat"]), false);
        assert_eq!(last.get("opstat"), Some("off"));

        let mut first = ObservedState::default();
        first.merge(fields, &monitored(&["opstat"]), true);
        assert_eq!(first.get("opstat"), Some("heat"));
    }

    #[test]
    fn serializes_absent_values_as_empty_strings() {
        let mut observed = ObservedState::default();
        observed.merge(
            report(&[("rt", Some("72")), ("hold", None)]),
            &monitored(&["rt", "hold"]),
            false,
        );

        let json = serde_json::to_string(&observed).unwrap();
        assert_eq!(json, r#"{"hold":"","rt":"72"}"#);
    }

    #[test]
    fn seeding_keeps_commanded_values() {
        let mut observed = ObservedState::default();
        observed.merge(
            report(&[("mode", Some("cool")), ("clsp", Some("78")), ("htsp", Some("65"))]),
            &monitored(&["mode", "clsp", "htsp"]),
            false,
        );

        let mut desired = DesiredConfig {
            clsp: Some("74".to_string()),
            ..DesiredConfig::default()
        };
        desired.seed_from(&observed);

        assert_eq!(desired.mode.as_deref(), Some("cool"));
        assert_eq!(desired.clsp.as_deref(), Some("74"));
        assert_eq!(desired.htsp.as_deref(), Some("65"));
    }

    #[test]
    fn resolve_reports_first_missing_field() {
        let desired = DesiredConfig {
            mode: Some("heat".to_string()),
            ..DesiredConfig::default()
        };
        assert_eq!(
            desired.resolved().unwrap_err(),
            EngineError::MissingDesiredField("clsp")
        );
    }

    #[test]
    fn active_setpoint_follows_mode() {
        let mut desired = DesiredConfig {
            mode: Some("heat".to_string()),
            ..DesiredConfig::default()
        };
        *desired.active_setpoint().unwrap() = Some("68".to_string());
        assert_eq!(desired.htsp.as_deref(), Some("68"));
        assert_eq!(desired.clsp, None);

        desired.mode = Some("auto".to_string());
        assert!(desired.active_setpoint().is_none());
    }
}
