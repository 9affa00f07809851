//! Documents served to the device, as typed records.
//!
//! Only `configHasChanges` in the status document and the desired fields in
//! the config document are driven by the bridge. Everything else is fixed
//! content the device firmware insists on seeing.

use std::io;

use chrono::{DateTime, Utc};

use crate::{
    config::DocumentContext, error::CodecError, state::ResolvedConfig, types::PollDecision,
    xml::XmlWriter,
};

pub const DOCUMENT_VERSION: &str = "1.9";
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

const PING_RATES: &[(&str, &str)] = &[
    ("pingRate", "0"),
    ("dealerConfigPingRate", "0"),
    ("weatherPingRate", "14400"),
    ("equipEventsPingRate", "0"),
    ("historyPingRate", "0"),
    ("iduFaultsPingRate", "0"),
    ("iduStatusPingRate", "86400"),
    ("oduFaultsPingRate", "0"),
    ("oduStatusPingRate", "0"),
];

const UNUSED_CHANGE_FLAGS: &[&str] = &[
    "dealerConfigHasChanges",
    "dealerHasChanges",
    "oduConfigHasChanges",
    "iduConfigHasChanges",
    "utilityEventsHasChanges",
];

const DEVICE_SETTINGS: &[(&str, &str)] = &[
    ("blight", "10"),
    ("timeFormat", "12"),
    ("dst", "on"),
    ("volume", "high"),
    ("soundType", "click"),
    ("scrLockout", "off"),
    ("scrLockoutCode", "0000"),
    ("humSetpoint", "45"),
    ("dehumSetpoint", "45"),
];

/// Heating setpoint used for the wake and return periods of the program.
const PROGRAM_COMFORT_HTSP: &str = "71";

pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomLink {
    pub rel: String,
    pub href: String,
}

impl AtomLink {
    fn write(&self, writer: &mut XmlWriter) -> io::Result<()> {
        writer.empty(
            "atom:link",
            &[("rel", self.rel.as_str()), ("href", self.href.as_str())],
        )?;
        Ok(())
    }
}

fn system_links(context: &DocumentContext, resource: &str) -> Vec<AtomLink> {
    vec![
        AtomLink {
            rel: "self".to_string(),
            href: context.system_resource_href(resource),
        },
        AtomLink {
            rel: context.rel_href("system"),
            href: context.system_href(),
        },
    ]
}

const ROOT_ATTRS: &[(&str, &str)] = &[
    ("version", DOCUMENT_VERSION),
    ("xmlns:atom", ATOM_NAMESPACE),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDocument {
    pub links: Vec<AtomLink>,
    pub timestamp: DateTime<Utc>,
    pub decision: PollDecision,
}

impl StatusDocument {
    pub fn new(context: &DocumentContext, decision: PollDecision, now: DateTime<Utc>) -> Self {
        Self {
            links: system_links(context, "status"),
            timestamp: now,
            decision,
        }
    }

    pub fn to_xml(&self) -> Result<String, CodecError> {
        let mut writer = XmlWriter::new();
        writer.open("status", ROOT_ATTRS)?;
        for link in &self.links {
            link.write(&mut writer)?;
        }
        writer.text("timestamp", &format_timestamp(self.timestamp))?;
        for &(tag, rate) in PING_RATES {
            writer.text(tag, rate)?;
        }
        writer.text("configHasChanges", self.decision.as_flag())?;
        for &tag in UNUSED_CHANGE_FLAGS {
            writer.text(tag, "off")?;
        }
        writer.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDocument {
    pub link: AtomLink,
    pub utc: DateTime<Utc>,
}

impl TimeDocument {
    pub fn new(context: &DocumentContext, now: DateTime<Utc>) -> Self {
        Self {
            link: AtomLink {
                rel: "self".to_string(),
                href: context.time_href(),
            },
            utc: now,
        }
    }

    pub fn to_xml(&self) -> Result<String, CodecError> {
        let mut writer = XmlWriter::new();
        writer.open("time", ROOT_ATTRS)?;
        self.link.write(&mut writer)?;
        writer.text("utc", &format_timestamp(self.utc))?;
        writer.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramPeriod {
    pub id: u8,
    pub time: &'static str,
    pub htsp: String,
    pub clsp: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDay {
    pub id: u8,
    pub periods: Vec<ProgramPeriod>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: u8,
    pub name: String,
    pub hold: String,
    pub htsp: String,
    pub clsp: String,
    pub program: Vec<ProgramDay>,
}

impl Zone {
    fn write(&self, writer: &mut XmlWriter) -> io::Result<()> {
        let id = self.id.to_string();
        writer
            .open("zone", &[("id", id.as_str())])?
            .text("name", &self.name)?
            .text("hold", &self.hold)?
            .empty("otmr", &[])?
            .text("htsp", &self.htsp)?
            .text("clsp", &self.clsp)?
            .open("program", &[])?;
        for day in &self.program {
            let day_id = day.id.to_string();
            writer.open("day", &[("id", day_id.as_str())])?;
            for period in &day.periods {
                let period_id = period.id.to_string();
                writer
                    .open("period", &[("id", period_id.as_str())])?
                    .text("time", period.time)?
                    .text("htsp", &period.htsp)?
                    .text("clsp", &period.clsp)?
                    .close()?;
            }
            writer.close()?;
        }
        writer.close()?.close()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    pub links: Vec<AtomLink>,
    pub timestamp: DateTime<Utc>,
    pub mode: String,
    pub fan: String,
    pub zones: Vec<Zone>,
}

impl ConfigDocument {
    pub fn new(context: &DocumentContext, desired: &ResolvedConfig, now: DateTime<Utc>) -> Self {
        let mut links = system_links(context, "config");
        links.push(AtomLink {
            rel: context.rel_href("dealer_config"),
            href: context.system_resource_href("dealer_config"),
        });

        Self {
            links,
            timestamp: now,
            mode: desired.mode.clone(),
            fan: desired.fan.clone(),
            zones: vec![Zone {
                id: 1,
                name: "Zone 1".to_string(),
                hold: desired.hold.clone(),
                htsp: desired.htsp.clone(),
                clsp: desired.clsp.clone(),
                program: weekly_program(desired),
            }],
        }
    }

    pub fn to_xml(&self) -> Result<String, CodecError> {
        let mut writer = XmlWriter::new();
        writer.open("config", ROOT_ATTRS)?;
        for link in &self.links {
            link.write(&mut writer)?;
        }
        writer
            .text("timestamp", &format_timestamp(self.timestamp))?
            .text("mode", &self.mode)?
            .text("fan", &self.fan)?;
        for &(tag, value) in DEVICE_SETTINGS {
            writer.text(tag, value)?;
        }
        writer.empty("utilityEvent", &[])?.open("zones", &[])?;
        for zone in &self.zones {
            zone.write(&mut writer)?;
        }
        writer.finish()
    }
}

/// Same four periods every day; every period carries the desired cooling
/// setpoint so the device schedule never fights the operator.
fn weekly_program(desired: &ResolvedConfig) -> Vec<ProgramDay> {
    let periods = [
        ("06:00", PROGRAM_COMFORT_HTSP),
        ("08:00", desired.htsp.as_str()),
        ("17:00", PROGRAM_COMFORT_HTSP),
        ("22:00", desired.htsp.as_str()),
    ];

    (1..=7)
        .map(|day| ProgramDay {
            id: day,
            periods: periods
                .iter()
                .zip(1..)
                .map(|(&(time, htsp), id)| ProgramPeriod {
                    id,
                    time,
                    htsp: htsp.to_string(),
                    clsp: desired.clsp.clone(),
                })
                .collect(),
        })
        .collect()
}
