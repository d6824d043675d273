//! Per-event presentation profiles.
//!
//! Screens used to carry their own copy of the colour/logo tables keyed by
//! free-form event names. The catalog is built once at start-up, lives in
//! `AppState`, and is the only place those values are defined.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKey {
    RenderAtl,
    Atw,
    GovTechCon,
}

impl EventKey {
    pub const ALL: [EventKey; 3] = [EventKey::RenderAtl, EventKey::Atw, EventKey::GovTechCon];

    /// Event name as stored in the `events` collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKey::RenderAtl => "RenderATL",
            EventKey::Atw => "ATW",
            EventKey::GovTechCon => "GovTechCon",
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventKey {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventTheme {
    pub background: &'static str,
    pub primary: &'static str,
    pub text: &'static str,
    pub link: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventProfile {
    pub key: EventKey,
    pub name: &'static str,
    pub theme: EventTheme,
    /// Asset path of the event logo in the app bundle.
    pub logo: &'static str,
    /// Slot labels offered on the availability form. These must match shift
    /// `time_label`s exactly for the scheduler to pair them.
    pub availability_slots: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct EventCatalog {
    profiles: HashMap<EventKey, EventProfile>,
}

const DEFAULT_SLOTS: [&str; 4] = [
    "7am - 1pm",
    "1pm - 7pm",
    "4pm - 9pm (Render)",
    "9pm - 12am (Render)",
];

impl EventCatalog {
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();

        profiles.insert(
            EventKey::RenderAtl,
            EventProfile {
                key: EventKey::RenderAtl,
                name: EventKey::RenderAtl.as_str(),
                theme: EventTheme {
                    background: "#fdf0e2",
                    primary: "#fe88df",
                    text: "#711b43",
                    link: "#fe88df",
                },
                logo: "assets/images/PinkPeachIcon.png",
                availability_slots: DEFAULT_SLOTS.to_vec(),
            },
        );
        profiles.insert(
            EventKey::Atw,
            EventProfile {
                key: EventKey::Atw,
                name: EventKey::Atw.as_str(),
                theme: EventTheme {
                    background: "#f5f5f5",
                    primary: "#ffb89e",
                    text: "#4f2b91",
                    link: "#ffb89e",
                },
                logo: "assets/images/ATWLogo.jpg",
                availability_slots: DEFAULT_SLOTS.to_vec(),
            },
        );
        profiles.insert(
            EventKey::GovTechCon,
            EventProfile {
                key: EventKey::GovTechCon,
                name: EventKey::GovTechCon.as_str(),
                theme: EventTheme {
                    background: "#FFFFFF",
                    primary: "#17A2C0",
                    text: "#161F4A",
                    link: "#17A2C0",
                },
                logo: "assets/images/GovTechConLogo.png",
                availability_slots: vec!["8am - 12pm", "11am - 4pm", "1pm - 6pm"],
            },
        );

        EventCatalog { profiles }
    }

    pub fn get(&self, key: EventKey) -> &EventProfile {
        // `builtin` registers every key
        &self.profiles[&key]
    }

    /// Profile for a stored event name. Unknown names get the RenderATL profile.
    pub fn profile_for(&self, event_name: &str) -> &EventProfile {
        let key = event_name.parse().unwrap_or(EventKey::RenderAtl);
        self.get(key)
    }
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_event_names() {
        assert_eq!("RenderATL".parse::<EventKey>().unwrap(), EventKey::RenderAtl);
        assert_eq!("govtechcon".parse::<EventKey>().unwrap(), EventKey::GovTechCon);
        assert!("Unknown".parse::<EventKey>().is_err());
    }

    #[test]
    fn every_key_has_a_profile() {
        let catalog = EventCatalog::builtin();
        for key in EventKey::ALL {
            assert_eq!(catalog.get(key).key, key);
        }
    }

    #[test]
    fn unknown_event_falls_back_to_render() {
        let catalog = EventCatalog::builtin();
        let profile = catalog.profile_for("SomeOtherConf");
        assert_eq!(profile.key, EventKey::RenderAtl);
        assert_eq!(profile.theme.primary, "#fe88df");
    }

    #[test]
    fn govtech_has_its_own_slots() {
        let catalog = EventCatalog::builtin();
        let slots = &catalog.get(EventKey::GovTechCon).availability_slots;
        assert_eq!(slots, &vec!["8am - 12pm", "11am - 4pm", "1pm - 6pm"]);
    }
}
