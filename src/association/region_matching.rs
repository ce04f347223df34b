//! Carry region identity from the previous step to the current one.
//!
//! Each correspondence votes for every `(previous region, current region)`
//! pair whose rectangles contain its previous-frame and current-frame
//! keypoint respectively. A previous region is then mapped to the current
//! region with the most votes. Ties go to the lower current box id, so the
//! result depends only on the inputs.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::FusionError;
use crate::frame::{
    BoxId, Correspondence, DetectedRegion, Keypoint, RegionIdentityMap, check_correspondences,
};

/// Vote counts keyed by `(previous box id, current box id)`.
pub type VoteTable = BTreeMap<(BoxId, BoxId), usize>;

/// Tally correspondence votes between previous and current regions.
pub fn count_region_votes(
    correspondences: &[Correspondence],
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    prev_regions: &[DetectedRegion],
    curr_regions: &[DetectedRegion],
) -> Result<VoteTable, FusionError> {
    check_correspondences(correspondences, kpts_prev, kpts_curr)?;

    let mut votes = VoteTable::new();
    let mut prev_hits: Vec<BoxId> = Vec::new();
    for c in correspondences {
        let pt_prev = &kpts_prev[c.prev_idx].pt;
        let pt_curr = &kpts_curr[c.curr_idx].pt;

        prev_hits.clear();
        prev_hits.extend(
            prev_regions
                .iter()
                .filter(|r| r.roi.contains(pt_prev))
                .map(|r| r.box_id),
        );
        if prev_hits.is_empty() {
            continue;
        }

        for curr in curr_regions.iter().filter(|r| r.roi.contains(pt_curr)) {
            for &prev_id in &prev_hits {
                *votes.entry((prev_id, curr.box_id)).or_insert(0) += 1;
            }
        }
    }
    Ok(votes)
}

/// Pick, for every previous region with at least one vote, the current region
/// with the highest count. Ties resolve to the lower current box id.
pub fn best_matches_from_votes(votes: &VoteTable) -> RegionIdentityMap {
    let mut best: BTreeMap<BoxId, (BoxId, usize)> = BTreeMap::new();
    // keys iterate in ascending (prev, curr) order, so a strict comparison
    // keeps the lowest current id among equal counts
    for (&(prev_id, curr_id), &count) in votes {
        match best.get_mut(&prev_id) {
            Some(entry) if count > entry.1 => *entry = (curr_id, count),
            Some(_) => {}
            None => {
                best.insert(prev_id, (curr_id, count));
            }
        }
    }
    best.into_iter()
        .map(|(prev_id, (curr_id, _))| (prev_id, curr_id))
        .collect()
}

/// Map each previous-frame region to its best current-frame region.
///
/// Previous regions that no correspondence links to any current region get
/// no entry: their track ends at this step.
pub fn match_bounding_boxes(
    correspondences: &[Correspondence],
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    prev_regions: &[DetectedRegion],
    curr_regions: &[DetectedRegion],
) -> Result<RegionIdentityMap, FusionError> {
    let votes =
        count_region_votes(correspondences, kpts_prev, kpts_curr, prev_regions, curr_regions)?;
    let best = best_matches_from_votes(&votes);

    for (prev_id, curr_id) in &best {
        debug!(
            prev = %prev_id,
            curr = %curr_id,
            votes = votes.get(&(*prev_id, *curr_id)).copied().unwrap_or(0),
            "region match"
        );
    }
    if best.len() < prev_regions.len() {
        debug!(
            unmatched = prev_regions.len() - best.len(),
            "previous regions without votes"
        );
    }
    Ok(best)
}
