use crate::types::ReportEndpoint;

/// What a device request asks for, keyed by the last path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRoute {
    Alive,
    Time,
    Config,
    Report(ReportEndpoint),
    /// Acknowledged with an empty body.
    Other,
}

impl DeviceRoute {
    pub fn classify(is_post: bool, path: &str) -> Self {
        let segment = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();

        match (is_post, segment) {
            (false, "Alive") => Self::Alive,
            (false, "time") => Self::Time,
            (false, "config") => Self::Config,
            (true, "status") => Self::Report(ReportEndpoint::Status),
            (true, "odu_status") => Self::Report(ReportEndpoint::OutdoorStatus),
            (true, "equipment_events") => Self::Report(ReportEndpoint::EquipmentEvents),
            _ => Self::Other,
        }
    }
}
