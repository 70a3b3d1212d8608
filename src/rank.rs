use crate::track::TrackRecord;

/// Order results for display: oldest upload first.
///
/// `created_at` is fixed-width and zero-padded, so comparing the raw text is
/// chronological. The sort is stable: tracks sharing a timestamp keep the
/// order the search API returned them in. Duration plays no part.
pub fn rank(tracks: &mut [TrackRecord]) {
  tracks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
}
