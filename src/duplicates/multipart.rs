//! Multi-disc / multi-part release detection.

use crate::parser::has_disc_marker;

/// Whether a bucket's filenames form one multi-part release.
///
/// True when at least 60% of two or more filenames carry a disc/part marker.
/// The threshold is permissive on purpose: a set where one disc lacks its
/// marker is still kept intact.
#[must_use]
pub fn is_multi_part<S: AsRef<str>>(filenames: &[S]) -> bool {
    if filenames.len() < 2 {
        return false;
    }
    let marked = filenames
        .iter()
        .filter(|name| has_disc_marker(name.as_ref()))
        .count();
    // marked / len >= 0.6 without floating point
    marked * 5 >= filenames.len() * 3
}
