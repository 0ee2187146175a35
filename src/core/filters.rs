use crate::models::{DeckFilters, User};

/// Gender value that disables the gender filter
pub const ANY_GENDER: &str = "all";

/// Check if a user may appear in the viewer's deck at all
#[inline]
pub fn is_discoverable(candidate: &User, viewer_id: i64) -> bool {
    candidate.id != viewer_id && candidate.visible
}

/// Check if a candidate passes the optional deck filters
///
/// Gender is an exact match unless absent, blank or "all". City is a
/// case-insensitive substring match once trimmed; a candidate without a
/// city never passes an active city filter.
#[inline]
pub fn matches_deck_filters(candidate: &User, filters: &DeckFilters) -> bool {
    if let Some(gender) = filters.gender.as_deref() {
        if !gender.is_empty()
            && gender != ANY_GENDER
            && candidate.gender.as_deref() != Some(gender) {
            return false;
        }
    }

    if let Some(city) = filters.city_contains.as_deref() {
        let needle = city.trim().to_lowercase();
        if !needle.is_empty() {
            let found = candidate
                .city
                .as_deref()
                .map(|c| c.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }
    }

    true
}
