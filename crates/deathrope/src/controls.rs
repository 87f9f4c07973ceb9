//! Per-controller key bindings, persisted as JSON.
//!
//! The file holds [`CONTROLLER_SLOTS`] binding sets. A missing or corrupted
//! file is regenerated with the defaults. Reading raw device input is the
//! game's job; [`InputSource`] is how it plugs in.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::settings::{SettingsError, io_error, write_json};

/// Number of local controllers.
pub const CONTROLLER_SLOTS: usize = 4;

/// Device axis names paired with the friendly names shown in the config
/// screen and read through [`InputSource::axis`].
const AXES: [(&str, &str); 16] = [
    ("Joystick 1 Axis 1", "Horizontal1"),
    ("Joystick 2 Axis 1", "Horizontal2"),
    ("Joystick 3 Axis 1", "Horizontal3"),
    ("Joystick 4 Axis 1", "Horizontal4"),
    ("Joystick 1 Axis 4", "Horizontal1.5"),
    ("Joystick 2 Axis 4", "Horizontal2.5"),
    ("Joystick 3 Axis 4", "Horizontal3.5"),
    ("Joystick 4 Axis 4", "Horizontal4.5"),
    ("Joystick 1 Axis 2", "Vertical1"),
    ("Joystick 2 Axis 2", "Vertical2"),
    ("Joystick 3 Axis 2", "Vertical3"),
    ("Joystick 4 Axis 2", "Vertical4"),
    ("Joystick 1 Axis 5", "Vertical1.5"),
    ("Joystick 2 Axis 5", "Vertical2.5"),
    ("Joystick 3 Axis 5", "Vertical3.5"),
    ("Joystick 4 Axis 5", "Vertical4.5"),
];

/// Device name for a friendly axis name, e.g. `"Horizontal1"` ->
/// `"Joystick 1 Axis 1"`.
pub fn device_axis(friendly: &str) -> Option<&'static str> {
    AXES.iter().find(|(_, f)| *f == friendly).map(|(d, _)| *d)
}

/// Friendly name for a device axis name.
pub fn friendly_axis(device: &str) -> Option<&'static str> {
    AXES.iter().find(|(d, _)| *d == device).map(|(_, f)| *f)
}

/// Live device state, supplied by the game.
pub trait InputSource {
    /// Current value of a friendly-named axis, in `-1.0..=1.0`.
    fn axis(&self, name: &str) -> f32;
    /// Whether a key or button is held.
    fn key(&self, key: &str) -> bool;
}

// ---------------------------------------------------------------------------
// ControlInput
// ---------------------------------------------------------------------------

/// One binding: an analog axis, a key (or key pair for a digital axis),
/// or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlInput {
    /// Stored under the device axis name.
    Axis { axis: String },
    Keys {
        #[serde(rename = "keyPos")]
        key_pos: String,
        #[serde(rename = "keyNeg", default, skip_serializing_if = "Option::is_none")]
        key_neg: Option<String>,
    },
    #[default]
    Unbound,
}

impl ControlInput {
    /// Binds a friendly axis name. Names missing from the lookup table are
    /// stored as given.
    pub fn axis(friendly: &str) -> Self {
        Self::Axis {
            axis: device_axis(friendly).unwrap_or(friendly).to_string(),
        }
    }

    pub fn key(key: &str) -> Self {
        Self::Keys {
            key_pos: key.to_string(),
            key_neg: None,
        }
    }

    /// A digital axis: `positive` reads 1.0, `negative` reads -1.0.
    pub fn keys(positive: &str, negative: &str) -> Self {
        Self::Keys {
            key_pos: positive.to_string(),
            key_neg: Some(negative.to_string()),
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, Self::Unbound)
    }

    /// Current value: the axis value, or 1.0 / -1.0 / 0.0 for keys.
    pub fn value(&self, input: &impl InputSource) -> f32 {
        match self {
            Self::Axis { axis } => input.axis(friendly_axis(axis).unwrap_or(axis)),
            Self::Keys { key_pos, key_neg } => {
                if input.key(key_pos) {
                    1.0
                } else if key_neg.as_deref().is_some_and(|k| input.key(k)) {
                    -1.0
                } else {
                    0.0
                }
            }
            Self::Unbound => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Bindings for one controller slot. Every action has a primary and an
/// alternate binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub name: String,
    /// Slot number, starting at 1.
    pub number: usize,
    #[serde(default)]
    pub horiz_axis: ControlInput,
    #[serde(default)]
    pub horiz_axis_alt: ControlInput,
    #[serde(default)]
    pub vert_axis: ControlInput,
    #[serde(default)]
    pub vert_axis_alt: ControlInput,
    #[serde(default)]
    pub jump_button: ControlInput,
    #[serde(default)]
    pub jump_button_alt: ControlInput,
    #[serde(default)]
    pub dash_button: ControlInput,
    #[serde(default)]
    pub dash_button_alt: ControlInput,
    #[serde(default)]
    pub power_up_button: ControlInput,
    #[serde(default)]
    pub power_up_button_alt: ControlInput,
}

impl Controls {
    /// Unbound controls for slot `number`.
    pub fn unbound(number: usize) -> Self {
        Self {
            name: format!("Player {number}"),
            number,
            horiz_axis: ControlInput::Unbound,
            horiz_axis_alt: ControlInput::Unbound,
            vert_axis: ControlInput::Unbound,
            vert_axis_alt: ControlInput::Unbound,
            jump_button: ControlInput::Unbound,
            jump_button_alt: ControlInput::Unbound,
            dash_button: ControlInput::Unbound,
            dash_button_alt: ControlInput::Unbound,
            power_up_button: ControlInput::Unbound,
            power_up_button_alt: ControlInput::Unbound,
        }
    }

    /// Factory bindings: joystick `number` for everyone, plus keyboard
    /// alternates on slot 1.
    pub fn default_for(number: usize) -> Self {
        let mut c = Self::unbound(number);
        c.horiz_axis = ControlInput::axis(&format!("Horizontal{number}"));
        c.vert_axis = ControlInput::axis(&format!("Vertical{number}"));
        c.jump_button = ControlInput::key(&format!("Joystick{number}Button4"));
        c.dash_button = ControlInput::key(&format!("Joystick{number}Button8"));
        c.power_up_button = ControlInput::key(&format!("Joystick{number}Button2"));

        if number == 1 {
            c.horiz_axis_alt = ControlInput::keys("D", "A");
            c.vert_axis_alt = ControlInput::keys("W", "S");
            c.jump_button_alt = ControlInput::key("Space");
            c.dash_button_alt = ControlInput::key("Q");
            c.power_up_button_alt = ControlInput::key("Z");
        }
        c
    }

    /// Primary axis unless it reads zero, then the alternate.
    pub fn horizontal(&self, input: &impl InputSource) -> f32 {
        either_axis(&self.horiz_axis, &self.horiz_axis_alt, input)
    }

    pub fn vertical(&self, input: &impl InputSource) -> f32 {
        either_axis(&self.vert_axis, &self.vert_axis_alt, input)
    }

    pub fn jump(&self, input: &impl InputSource) -> bool {
        either_pressed(&self.jump_button, &self.jump_button_alt, input)
    }

    pub fn dash(&self, input: &impl InputSource) -> bool {
        either_pressed(&self.dash_button, &self.dash_button_alt, input)
    }

    pub fn power_up(&self, input: &impl InputSource) -> bool {
        either_pressed(&self.power_up_button, &self.power_up_button_alt, input)
    }
}

fn either_axis(primary: &ControlInput, alt: &ControlInput, input: &impl InputSource) -> f32 {
    let value = primary.value(input);
    if value != 0.0 { value } else { alt.value(input) }
}

fn either_pressed(primary: &ControlInput, alt: &ControlInput, input: &impl InputSource) -> bool {
    primary.value(input) == 1.0 || alt.value(input) == 1.0
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// On-disk layout: `{ "controls": [ ... ] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    pub controls: Vec<Controls>,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            controls: (1..=CONTROLLER_SLOTS).map(Controls::default_for).collect(),
        }
    }
}

/// Loads and saves [`Controls`] in a JSON file.
#[derive(Debug, Clone)]
pub struct ControlsStore {
    path: PathBuf,
}

impl ControlsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bindings for `slot` (1-based).
    ///
    /// A missing file is generated first. If the file is corrupted or
    /// lacks the slot, it is regenerated and the slot's defaults returned.
    pub fn load_slot(&self, slot: usize) -> Result<Controls, SettingsError> {
        check_slot(slot)?;
        match self.read()? {
            Some(mut config) if config.controls.len() >= slot => Ok(config.controls.swap_remove(slot - 1)),
            _ => {
                tracing::warn!(path = %self.path.display(), "controls file corrupted, regenerating");
                self.generate_default()?;
                Ok(Controls::default_for(slot))
            }
        }
    }

    /// Stores `controls` in the slot named by `controls.number`.
    ///
    /// A corrupted file is regenerated and the save applied to the fresh
    /// defaults.
    pub fn save_slot(&self, controls: &Controls) -> Result<(), SettingsError> {
        check_slot(controls.number)?;
        let mut config = match self.read()? {
            Some(config) if config.controls.len() == CONTROLLER_SLOTS => config,
            _ => {
                tracing::warn!(path = %self.path.display(), "controls file corrupted, regenerating");
                self.generate_default()?
            }
        };
        config.controls[controls.number - 1] = controls.clone();
        write_json(&self.path, &config)
    }

    /// Overwrites the file with factory bindings for every slot.
    pub fn generate_default(&self) -> Result<ControlsConfig, SettingsError> {
        let config = ControlsConfig::default();
        write_json(&self.path, &config)?;
        Ok(config)
    }

    /// Parses the file, generating it first if missing. `None` means the
    /// content did not parse.
    fn read(&self) -> Result<Option<ControlsConfig>, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "controls file not found, generating defaults");
                return self.generate_default().map(Some);
            }
            Err(source) => return Err(io_error(&self.path, source)),
        };
        Ok(serde_json::from_str(&text).ok())
    }
}

fn check_slot(slot: usize) -> Result<(), SettingsError> {
    if (1..=CONTROLLER_SLOTS).contains(&slot) {
        Ok(())
    } else {
        Err(SettingsError::InvalidSlot {
            slot,
            max: CONTROLLER_SLOTS,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;

    #[derive(Default)]
    struct FakeInput {
        axes: HashMap<&'static str, f32>,
        keys: HashSet<&'static str>,
    }

    impl InputSource for FakeInput {
        fn axis(&self, name: &str) -> f32 {
            self.axes.get(name).copied().unwrap_or(0.0)
        }

        fn key(&self, key: &str) -> bool {
            self.keys.contains(key)
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("deathrope-controls-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_axis_lookup_both_ways() {
        assert_eq!(device_axis("Vertical3.5"), Some("Joystick 3 Axis 5"));
        assert_eq!(friendly_axis("Joystick 2 Axis 1"), Some("Horizontal2"));
        assert_eq!(device_axis("Throttle"), None);
    }

    #[test]
    fn test_default_slot_one_has_keyboard_alternates() {
        let c = Controls::default_for(1);
        assert_eq!(c.name, "Player 1");
        assert_eq!(c.horiz_axis, ControlInput::Axis { axis: "Joystick 1 Axis 1".into() });
        assert_eq!(c.horiz_axis_alt, ControlInput::keys("D", "A"));
        assert_eq!(c.jump_button, ControlInput::key("Joystick1Button4"));
        assert_eq!(c.jump_button_alt, ControlInput::key("Space"));
        assert_eq!(c.power_up_button_alt, ControlInput::key("Z"));
    }

    #[test]
    fn test_default_other_slots_have_no_alternates() {
        let c = Controls::default_for(3);
        assert_eq!(c.dash_button, ControlInput::key("Joystick3Button8"));
        assert!(!c.dash_button_alt.is_bound());
        assert!(!c.horiz_axis_alt.is_bound());
    }

    #[test]
    fn test_binding_json_shapes() {
        let json = serde_json::to_value(ControlInput::keys("W", "S")).unwrap();
        assert_eq!(json, serde_json::json!({ "keyPos": "W", "keyNeg": "S" }));

        let axis: ControlInput = serde_json::from_str(r#"{ "axis": "Joystick 1 Axis 2" }"#).unwrap();
        assert_eq!(axis, ControlInput::axis("Vertical1"));
    }

    #[test]
    fn test_horizontal_falls_back_to_alternate() {
        let c = Controls::default_for(1);
        let mut input = FakeInput::default();
        assert_eq!(c.horizontal(&input), 0.0);

        input.keys.insert("A");
        assert_eq!(c.horizontal(&input), -1.0);

        input.axes.insert("Horizontal1", 0.5);
        assert_eq!(c.horizontal(&input), 0.5);
    }

    #[test]
    fn test_buttons_read_either_binding() {
        let c = Controls::default_for(1);
        let mut input = FakeInput::default();
        assert!(!c.jump(&input));

        input.keys.insert("Space");
        assert!(c.jump(&input));

        input.keys.insert("Joystick1Button8");
        assert!(c.dash(&input));
        assert!(!c.power_up(&input));
    }

    #[test]
    fn test_load_slot_generates_missing_file() {
        let path = temp_path("missing.json");
        let _ = fs::remove_file(&path);
        let store = ControlsStore::new(&path);

        let c = store.load_slot(2).unwrap();

        assert_eq!(c, Controls::default_for(2));
        let written: ControlsConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.controls.len(), CONTROLLER_SLOTS);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_slot_corrupted_file_regenerates() {
        let path = temp_path("corrupt.json");
        fs::write(&path, "controls = broken").unwrap();
        let store = ControlsStore::new(&path);

        assert_eq!(store.load_slot(4).unwrap(), Controls::default_for(4));
        assert_eq!(
            serde_json::from_str::<ControlsConfig>(&fs::read_to_string(&path).unwrap()).unwrap(),
            ControlsConfig::default()
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_slot_then_load() {
        let path = temp_path("save.json");
        let _ = fs::remove_file(&path);
        let store = ControlsStore::new(&path);
        let mut c = Controls::default_for(2);
        c.jump_button_alt = ControlInput::key("RightShift");

        store.save_slot(&c).unwrap();

        assert_eq!(store.load_slot(2).unwrap(), c);
        assert_eq!(store.load_slot(1).unwrap(), Controls::default_for(1));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_slot_over_corrupted_file() {
        let path = temp_path("save-corrupt.json");
        fs::write(&path, "[]").unwrap();
        let store = ControlsStore::new(&path);
        let c = Controls::unbound(3);

        store.save_slot(&c).unwrap();

        assert_eq!(store.load_slot(3).unwrap(), c);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_slot_out_of_range_is_error() {
        let store = ControlsStore::new(temp_path("unused.json"));
        assert!(matches!(store.load_slot(0), Err(SettingsError::InvalidSlot { slot: 0, .. })));
        assert!(matches!(
            store.save_slot(&Controls::unbound(5)),
            Err(SettingsError::InvalidSlot { slot: 5, .. })
        ));
    }
}
