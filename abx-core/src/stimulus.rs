use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use string_cache::DefaultAtom as Atom;

lazy_static! {
    static ref LAP_RE: Regex = Regex::new(r"lap(\d+)").unwrap();
    static ref SEG_RE: Regex = Regex::new(r"seg(\d+)").unwrap();
}

/// Experimental modality a stimulus belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Visual fingerprint image
    Viz,
    /// Heatmap image
    Heat,
    /// Audio clip
    Aud,
}

impl Condition {
    pub const ALL: [Condition; 3] = [Condition::Viz, Condition::Heat, Condition::Aud];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Viz => "viz",
            Condition::Heat => "heat",
            Condition::Aud => "aud",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown condition `{0}` (expected viz, heat or aud)")]
pub struct UnknownCondition(pub String);

impl FromStr for Condition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viz" => Ok(Condition::Viz),
            "heat" => Ok(Condition::Heat),
            "aud" => Ok(Condition::Aud),
            _ => Err(UnknownCondition(s.to_string())),
        }
    }
}

/// Source identity of a stimulus; the matching key between X and A/B.
///
/// Interned, so cloning a driver into every trial is a refcount bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Driver(Atom);

impl Driver {
    pub fn new(name: &str) -> Self {
        Driver(Atom::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Driver {
    fn from(s: &str) -> Self {
        Driver::new(s)
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialOrd for Driver {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Driver {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Serialize for Driver {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Driver {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Driver::new(&name))
    }
}

/// Media type of an asset, decided by its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Audio,
    Unsupported,
}

impl AssetKind {
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if [".png", ".jpg", ".jpeg"].iter().any(|ext| lower.ends_with(ext)) {
            AssetKind::Image
        } else if [".wav", ".mp3", ".ogg", ".flac"]
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            AssetKind::Audio
        } else {
            AssetKind::Unsupported
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Audio => "audio",
            AssetKind::Unsupported => "unsupported",
        }
    }
}

/// Lap and segment numbers embedded in an asset file name (`..._lap12_seg3_...`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PathMeta {
    pub lap: Option<u32>,
    pub seg: Option<u32>,
}

impl PathMeta {
    pub fn parse(path: &str) -> Self {
        Self {
            lap: capture_number(&LAP_RE, path),
            seg: capture_number(&SEG_RE, path),
        }
    }
}

fn capture_number(re: &Regex, haystack: &str) -> Option<u32> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One scanned stimulus asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusRecord {
    pub condition: Condition,
    pub driver: Driver,
    pub path: String,
}

impl StimulusRecord {
    pub fn new(condition: Condition, driver: impl Into<Driver>, path: impl Into<String>) -> Self {
        Self {
            condition,
            driver: driver.into(),
            path: path.into(),
        }
    }

    pub fn kind(&self) -> AssetKind {
        AssetKind::from_path(&self.path)
    }

    pub fn meta(&self) -> PathMeta {
        PathMeta::parse(&self.path)
    }
}

/// Flat, read-only collection of stimulus records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StimulusPool {
    records: Vec<StimulusRecord>,
}

impl StimulusPool {
    pub fn new(records: Vec<StimulusRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[StimulusRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose condition is in `conditions`, in pool order
    pub fn eligible<'a, 'c>(
        &'a self,
        conditions: &'c [Condition],
    ) -> impl Iterator<Item = &'a StimulusRecord> + use<'a, 'c> {
        self.records
            .iter()
            .filter(move |r| conditions.contains(&r.condition))
    }

    /// Number of records per condition, for diagnostics
    pub fn count_by_condition(&self, condition: Condition) -> usize {
        self.records
            .iter()
            .filter(|r| r.condition == condition)
            .count()
    }
}

impl FromIterator<StimulusRecord> for StimulusPool {
    fn from_iter<I: IntoIterator<Item = StimulusRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
