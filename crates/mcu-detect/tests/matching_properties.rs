//! Property tests for identity matching

use mcu_detect::catalog::IdentityCatalog;
use mcu_detect::{CandidateInterface, DetectedDevice, DeviceIdentity, DeviceMatcher, ParsedIdentity};
use proptest::prelude::*;

fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["", "mi_00", "col03", "mi_00&col02"])
}

proptest! {
    /// A pattern without a revision accepts every revision
    #[test]
    fn prop_revision_wildcard(
        vid in any::<u16>(),
        pid in any::<u16>(),
        frag in fragment(),
        rev in any::<u16>(),
    ) {
        let pattern = DeviceIdentity::new(vid, pid, frag);
        let path = format!(r"\\?\hid#vid_{:04x}&pid_{:04x}&{}#1#2", vid, pid, frag);
        let candidate = CandidateInterface::new(path.clone(), rev);
        let parsed = ParsedIdentity::parse(&candidate).unwrap();
        prop_assert!(pattern.matches(&parsed, &path));
    }

    /// Unknown revisions on the candidate side match pinned patterns too
    #[test]
    fn prop_unknown_candidate_revision(pattern_rev in 1u16..) {
        let pattern = DeviceIdentity::new(0x1FF7, 0x0F33, "").with_revision(pattern_rev);
        let candidate = CandidateInterface::new(r"\\?\hid#vid_1ff7&pid_0f33&mi_00#1#2", 0);
        let parsed = ParsedIdentity::parse(&candidate).unwrap();
        prop_assert!(pattern.matches(&parsed, &candidate.path));
    }

    /// Every table entry accepts its own path with any revision when unpinned
    #[test]
    fn prop_catalog_entries_accept_themselves(index in 0usize..21, rev in any::<u16>()) {
        let catalog = IdentityCatalog::builtin();
        let entry = catalog.entries().nth(index).unwrap();
        let identity = entry.identity;
        let revision = if identity.revision == 0 { rev } else { identity.revision };
        let candidate = CandidateInterface::new(
            format!(r"\\?\hid#vid_{:04x}&pid_{:04x}&{}#1#2", identity.vendor_id, identity.product_id, identity.name_fragment),
            revision,
        );

        let matcher = DeviceMatcher::new();
        prop_assert!(matcher.accepts(&candidate, &DetectedDevice::new()));
        prop_assert!(catalog.rank(&candidate) <= entry.rank);
    }
}

#[test]
fn parses_reference_path() {
    let candidate = CandidateInterface::new(r"\\?\hid#vid_1ff7&pid_0f15&mi_00&col02#6&xyz#{guid}", 0);
    let parsed = ParsedIdentity::parse(&candidate).unwrap();
    assert_eq!(parsed.vendor_id, 0x1FF7);
    assert_eq!(parsed.product_id, 0x0F15);
    assert_eq!(parsed.key_fragment, "mi_00&col02");
}
