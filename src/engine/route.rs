use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog;
use crate::models::parcel::{ParcelStatus, RouteStep};

pub const DEFAULT_STOPS: usize = 5;
pub const CUSTOMS_FALLBACK: &str = "International Customs Facility";

/// Builds `pickup, k transit stops, customs checkpoint, destination`.
///
/// Transit stops and the checkpoint are drawn without replacement from the
/// catalog, minus the two endpoints. When the pool runs dry the checkpoint
/// falls back to [`CUSTOMS_FALLBACK`].
pub fn generate_route<R: Rng + ?Sized>(
    pickup: &str,
    destination: &str,
    stops: usize,
    rng: &mut R,
) -> Vec<RouteStep> {
    let mut pool: Vec<String> = catalog::labels()
        .filter(|label| label != pickup && label != destination)
        .collect();
    pool.shuffle(rng);

    let mut candidates = pool.into_iter();
    let mut route = Vec::with_capacity(stops + 3);

    route.push(step(pickup.to_string(), ParcelStatus::Created, false));
    route.extend(
        candidates
            .by_ref()
            .take(stops)
            .map(|location| step(location, ParcelStatus::InTransit, false)),
    );

    let customs = candidates
        .next()
        .unwrap_or_else(|| CUSTOMS_FALLBACK.to_string());
    route.push(step(customs, ParcelStatus::InTransit, true));
    route.push(step(destination.to_string(), ParcelStatus::Delivered, false));

    route
}

fn step(location: String, status: ParcelStatus, customs: bool) -> RouteStep {
    RouteStep {
        location,
        status,
        customs,
    }
}
