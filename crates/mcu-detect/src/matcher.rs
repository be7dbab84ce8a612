//! Candidate filtering and ranking

use tracing::{debug, trace};

use crate::catalog::{matches_generic, IdentityCatalog};
use crate::identity::{CandidateInterface, DetectedDevice, ParsedIdentity};

/// Picks the controller interfaces out of everything the host reports
#[derive(Debug, Clone, Default)]
pub struct DeviceMatcher {
    catalog: IdentityCatalog,
}

impl DeviceMatcher {
    /// Create a matcher over the builtin catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: IdentityCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &IdentityCatalog {
        &self.catalog
    }

    /// Whether a single candidate is plausibly a controller
    ///
    /// Accepted if it is the bound device, matches any catalog entry, or
    /// satisfies the coarse vendor/product-range rule. Unparseable paths are
    /// checked for the textual form of a catalog entry.
    pub fn accepts(&self, candidate: &CandidateInterface, detected: &DetectedDevice) -> bool {
        if detected.is(candidate) {
            return true;
        }
        match ParsedIdentity::parse(candidate) {
            Some(parsed) => {
                self.catalog.lookup(&parsed, &candidate.path).is_some()
                    || matches_generic(&parsed, &candidate.path)
            }
            None => self.catalog.lookup_text(&candidate.path).is_some(),
        }
    }

    /// Filter and rank candidates
    ///
    /// The result is sorted by catalog rank, keeping discovery order for
    /// ties. If `detected` is unbound it is bound to the best candidate.
    pub fn find_all(
        &self,
        candidates: Vec<CandidateInterface>,
        detected: &mut DetectedDevice,
    ) -> Vec<CandidateInterface> {
        let total = candidates.len();
        let bound: &DetectedDevice = detected;
        let mut accepted: Vec<CandidateInterface> = candidates
            .into_iter()
            .filter(|c| {
                let ok = self.accepts(c, bound);
                trace!("Candidate {} {}", c, if ok { "accepted" } else { "rejected" });
                ok
            })
            .collect();

        // sort_by_cached_key is stable
        accepted.sort_by_cached_key(|c| self.catalog.rank(c));

        debug!("{} of {} interface(s) look like a controller", accepted.len(), total);

        if let Some(best) = accepted.first() {
            if detected.bind_if_unset(best) {
                debug!("Default device set to {}", best);
            }
        }
        accepted
    }
}
