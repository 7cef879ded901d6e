//! Per-user check-in trails.

use std::collections::BTreeMap;

use hotspot_checkin_models::{CheckIn, UserId};
use hotspot_geography_models::Point;

/// Groups check-ins by user, keeping each user's points in the order they
/// appear in `checkins`.
#[must_use]
pub fn group_by_user<'a>(checkins: impl IntoIterator<Item = &'a CheckIn>) -> BTreeMap<UserId, Vec<Point>> {
    let mut trails: BTreeMap<UserId, Vec<Point>> = BTreeMap::new();
    for checkin in checkins {
        if let Some(points) = trails.get_mut(&checkin.user_id) {
            points.push(checkin.point);
        } else {
            trails.insert(checkin.user_id.clone(), vec![checkin.point]);
        }
    }
    trails
}
