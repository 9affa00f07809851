use crate::topics::{CMD_FAN_MODE, CMD_HOLD, CMD_OPERATING_MODE, CMD_TEMPERATURE};

/// Device endpoints that carry a report body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEndpoint {
    Status,
    OutdoorStatus,
    EquipmentEvents,
}

impl ReportEndpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::OutdoorStatus => "odu_status",
            Self::EquipmentEvents => "equipment_events",
        }
    }

    /// Equipment events describe the currently active event only, so the
    /// first occurrence of a field in one report is the one kept.
    pub fn keeps_first_occurrence(self) -> bool {
        matches!(self, Self::EquipmentEvents)
    }
}

/// What a status poll tells the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    NoChange,
    Change,
}

impl PollDecision {
    pub fn from_pending(pending: bool) -> Self {
        if pending {
            Self::Change
        } else {
            Self::NoChange
        }
    }

    pub fn is_change(self) -> bool {
        self == Self::Change
    }

    /// Value of the `configHasChanges` element.
    pub fn as_flag(self) -> &'static str {
        match self {
            Self::NoChange => "off",
            Self::Change => "on",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Mode,
    Fan,
    Hold,
    Setpoint,
}

impl CommandKind {
    pub fn from_topic_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            CMD_OPERATING_MODE => Some(Self::Mode),
            CMD_FAN_MODE => Some(Self::Fan),
            CMD_HOLD => Some(Self::Hold),
            CMD_TEMPERATURE => Some(Self::Setpoint),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::Fan => "fan",
            Self::Hold => "hold",
            Self::Setpoint => "setpoint",
        }
    }
}

/// Result of a command against the desired configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Desired state changed and the change tracker is set.
    Applied,
    /// Setpoint dropped by the mode gate or equal to the current value.
    Ignored,
}
