//! Matching of car-tagged posts against a user's registered vehicles.
//!
//! # Invariants
//! - Untagged posts match every user.
//! - Year ranges only narrow a match when both sides carry one.

use crate::model::year_range::YearRange;
use serde::{Deserialize, Serialize};

/// A vehicle registered by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVehicle {
    pub name: String,
    pub year_range: Option<YearRange>,
}

/// A car reference attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarTag {
    pub display_name: String,
    pub year_range: Option<YearRange>,
}

/// Items that can carry car tags.
pub trait CarTagged {
    fn car_tags(&self) -> &[CarTag];
}

/// Returns whether a post with `post_tags` is relevant to any of `vehicles`.
pub fn post_matches_vehicles(vehicles: &[UserVehicle], post_tags: &[CarTag]) -> bool {
    if post_tags.is_empty() {
        return true;
    }

    vehicles.iter().any(|vehicle| {
        let vehicle_key = match_key(&vehicle.name);
        post_tags.iter().any(|tag| {
            let tag_key = match_key(&tag.display_name);
            if !tag_key.contains(&vehicle_key) && !vehicle_key.contains(&tag_key) {
                return false;
            }
            match (&vehicle.year_range, &tag.year_range) {
                (Some(owned), Some(tagged)) => owned.overlaps(tagged),
                _ => true,
            }
        })
    })
}

/// Keeps the items relevant to `vehicles`, preserving order.
pub fn filter_by_vehicles<'a, T: CarTagged>(
    items: &'a [T],
    vehicles: &[UserVehicle],
) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| post_matches_vehicles(vehicles, item.car_tags()))
        .collect()
}

fn match_key(name: &str) -> String {
    name.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
