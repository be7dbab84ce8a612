//! Known controller identities
//!
//! The table order is the preference order used when several interfaces
//! qualify: earlier entries win. New variants are appended.

use std::cmp::Ordering;
use std::fmt;

use crate::identity::{contains_ignore_case, CandidateInterface, DeviceIdentity, ParsedIdentity};

/// Seewo / CVTE vendor id
pub const VID_CVTE: u16 = 0x1FF7;
/// Alternate vendor id used by some board generations
pub const VID_CVTE_ALT: u16 = 0x222A;
/// Vendor id of the 309 controller bridge
pub const VID_309: u16 = 0x10E0;

/// Product id shared by the sixth to eighth generation controllers
pub const PID_GEN6: u16 = 0x0F33;

/// Controller variants with a fixed position in the preference order
pub mod known {
    use super::*;

    pub const COMMON: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F15, "mi_00&col02");
    pub const MCU_638: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F15, "mi_00");
    pub const MCU_309: DeviceIdentity = DeviceIdentity::new(VID_309, 0xAA55, "col01");
    pub const MCU_551: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F15, "mi_00");
    pub const TOUCH: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0001, "col03");
    pub const MCU_551_B2: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F21, "mi_00&col02");
    pub const GEN5: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F26, "mi_00");
    pub const FOUR_SIDES_INFRARED: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F50, "mi_00");
    pub const FLATFROG_TOUCH_FRAME: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F28, "mi_00");
    pub const GEN6: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "mi_00").with_revision(0x0300);
    pub const GEN6_ABROAD: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F27, "mi_00");
    pub const GEN7: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "").with_revision(0x0450);
    pub const GEN7_FOUR_SIDES: DeviceIdentity =
        DeviceIdentity::new(VID_CVTE, PID_GEN6, "mi_00").with_revision(0x0451);
    pub const GEN7_PLUS_FOUR_SIDES: DeviceIdentity =
        DeviceIdentity::new(VID_CVTE, PID_GEN6, "mi_00").with_revision(0x045B);
    pub const GEN7_MULTI_LEFT: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "").with_revision(0x045D);
    pub const GEN7_MULTI_MIDDLE: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "").with_revision(0x045E);
    pub const GEN7_MULTI_RIGHT: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "").with_revision(0x045F);
    pub const GEN8: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "").with_revision(0x0550);
    pub const GEN8_MULTI_LEFT: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "").with_revision(0x0555);
    pub const GEN8_MULTI_MIDDLE: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "").with_revision(0x0556);
    pub const GEN8_MULTI_RIGHT: DeviceIdentity = DeviceIdentity::new(VID_CVTE, PID_GEN6, "").with_revision(0x0557);
    /// Podium variant: recognized, but never preferred over anything else
    pub const PODIUM: DeviceIdentity = DeviceIdentity::new(VID_CVTE, 0x0F31, "mi_00");
}

/// Coarse rule for controllers missing from the table
pub mod generic {
    pub const VIDS: &[u16] = &[super::VID_CVTE, super::VID_CVTE_ALT];

    pub const PID_RANGES: &[(u16, u16)] = &[(0x0001, 0x0020), (0x0F20, 0x0F30), (0x0F32, 0x0F3F)];

    /// Interface role fragments of the controller endpoint
    pub const INTERFACE_KEYS: &[&str] = &["mi_00", "col03"];
}

const TABLE: &[(&str, DeviceIdentity)] = &[
    ("Common", known::COMMON),
    ("638", known::MCU_638),
    ("309", known::MCU_309),
    ("551", known::MCU_551),
    ("Touch", known::TOUCH),
    ("551 B2", known::MCU_551_B2),
    ("V", known::GEN5),
    ("Four-sides infrared blackboard", known::FOUR_SIDES_INFRARED),
    ("FlatFrog touch frame", known::FLATFROG_TOUCH_FRAME),
    ("VI", known::GEN6),
    ("VI abroad", known::GEN6_ABROAD),
    ("VII", known::GEN7),
    ("VII four-sides infrared blackboard", known::GEN7_FOUR_SIDES),
    ("VII plus four-sides infrared blackboard", known::GEN7_PLUS_FOUR_SIDES),
    ("VII multi-screen left", known::GEN7_MULTI_LEFT),
    ("VII multi-screen middle", known::GEN7_MULTI_MIDDLE),
    ("VII multi-screen right", known::GEN7_MULTI_RIGHT),
    ("VIII", known::GEN8),
    ("VIII multi-screen left", known::GEN8_MULTI_LEFT),
    ("VIII multi-screen middle", known::GEN8_MULTI_MIDDLE),
    ("VIII multi-screen right", known::GEN8_MULTI_RIGHT),
];

/// Preference of a candidate; lower sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(u32);

impl Rank {
    /// Candidate accepted without matching any table entry
    pub const UNRANKED: Rank = Rank(10_000);
    /// Podium variant, after everything else
    pub const RESERVED: Rank = Rank(10_001);

    pub const fn position(index: u32) -> Self {
        Rank(index)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Rank::UNRANKED => write!(f, "unranked"),
            Rank::RESERVED => write!(f, "reserved"),
            Rank(n) => write!(f, "#{}", n),
        }
    }
}

/// A catalog entry with its precomputed rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub identity: DeviceIdentity,
    pub rank: Rank,
}

/// Ordered table of controller identities
#[derive(Debug, Clone)]
pub struct IdentityCatalog {
    entries: Vec<CatalogEntry>,
    reserved: Vec<CatalogEntry>,
}

impl IdentityCatalog {
    /// Catalog of all known controller variants
    pub fn builtin() -> Self {
        Self::from_table(TABLE, &[("Podium", known::PODIUM)])
    }

    /// Build a catalog from ordered entries plus reserved entries
    pub fn from_table(
        table: &[(&'static str, DeviceIdentity)],
        reserved: &[(&'static str, DeviceIdentity)],
    ) -> Self {
        let entries = table
            .iter()
            .enumerate()
            .map(|(i, &(name, identity))| CatalogEntry {
                name,
                identity,
                rank: Rank::position(i as u32),
            })
            .collect();
        let reserved = reserved
            .iter()
            .map(|&(name, identity)| CatalogEntry {
                name,
                identity,
                rank: Rank::RESERVED,
            })
            .collect();
        Self { entries, reserved }
    }

    /// Ranked entries in preference order
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Entries that are recognized for sorting only
    pub fn reserved(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.reserved.iter()
    }

    /// First ranked entry matching a parsed candidate
    ///
    /// Reserved entries are never returned, so a reserved variant is not
    /// accepted as a controller through the table.
    pub fn lookup(&self, parsed: &ParsedIdentity, path: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.identity.matches(parsed, path))
    }

    /// First ranked entry whose textual form appears in an unparseable path
    pub fn lookup_text(&self, path: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.identity.matches_text(path))
    }

    /// First ranked entry matching a candidate, parsed or not
    pub fn entry_for(&self, candidate: &CandidateInterface) -> Option<&CatalogEntry> {
        match ParsedIdentity::parse(candidate) {
            Some(parsed) => self.lookup(&parsed, &candidate.path),
            None => self.lookup_text(&candidate.path),
        }
    }

    fn reserved_for(&self, candidate: &CandidateInterface) -> Option<&CatalogEntry> {
        match ParsedIdentity::parse(candidate) {
            Some(parsed) => self
                .reserved
                .iter()
                .find(|e| e.identity.matches(&parsed, &candidate.path)),
            None => self.reserved.iter().find(|e| e.identity.matches_text(&candidate.path)),
        }
    }

    /// Rank of a candidate, [`Rank::UNRANKED`] if no entry matches
    pub fn rank(&self, candidate: &CandidateInterface) -> Rank {
        self.entry_for(candidate)
            .or_else(|| self.reserved_for(candidate))
            .map_or(Rank::UNRANKED, |e| e.rank)
    }

    /// Compare two candidates by rank
    pub fn compare(&self, a: &CandidateInterface, b: &CandidateInterface) -> Ordering {
        self.rank(a).cmp(&self.rank(b))
    }
}

impl Default for IdentityCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Check the coarse rule for controllers missing from the table
pub fn matches_generic(parsed: &ParsedIdentity, path: &str) -> bool {
    generic::VIDS.contains(&parsed.vendor_id)
        && generic::PID_RANGES
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&parsed.product_id))
        && generic::INTERFACE_KEYS.iter().any(|key| {
            contains_ignore_case(&parsed.key_fragment, key) || contains_ignore_case(path, key)
        })
}

/// Human-readable variant name for a candidate
pub fn variant_name(catalog: &IdentityCatalog, candidate: &CandidateInterface) -> Option<&'static str> {
    catalog
        .entry_for(candidate)
        .or_else(|| catalog.reserved_for(candidate))
        .map(|e| e.name)
}
