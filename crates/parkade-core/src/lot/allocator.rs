use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::domain::{CapacityClass, LicensePlate, Occupancy, Spot, SpotId, VehicleSize};
use super::store::{SpotStore, StoreError};

/// Per floor and capacity class occupancy counts at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub floor: u32,
    pub capacity: CapacityClass,
    pub available: usize,
    pub total: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AllocatorError {
    #[error("spot {0} does not exist")]
    SpotNotFound(SpotId),
    #[error("spot {0} is not occupied")]
    SpotNotOccupied(SpotId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Assigns spots to vehicles. Every read or write of occupancy happens while holding the
/// allocator lock, and nothing inside the critical section awaits.
pub struct SpotAllocator<S> {
    store: Arc<S>,
    lock: Mutex<()>,
}

impl<S> SpotAllocator<S>
where
    S: SpotStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Occupies the lowest-floor compatible spot, breaking ties by spot id. `None` means the lot
    /// has no compatible spot free.
    pub async fn allocate(
        &self,
        size: VehicleSize,
        plate: &LicensePlate,
    ) -> Result<Option<Spot>, AllocatorError> {
        let _guard = self.lock.lock().await;

        let candidate = self
            .store
            .available_spots()?
            .into_iter()
            .filter(|spot| spot.capacity.fits(size))
            .min_by(|a, b| (a.floor, &a.id).cmp(&(b.floor, &b.id)));

        let Some(spot) = candidate else {
            return Ok(None);
        };

        let occupied = self
            .store
            .set_occupancy(&spot.id, Occupancy::Occupied(plate.clone()))?;
        debug!(spot = %occupied.id, floor = occupied.floor, %plate, "spot allocated");
        Ok(Some(occupied))
    }

    /// Frees a spot. Releasing a spot that is already free is rejected without side effects.
    pub async fn release(&self, spot_id: &SpotId) -> Result<Spot, AllocatorError> {
        let _guard = self.lock.lock().await;

        let spot = self
            .store
            .spot(spot_id)?
            .ok_or_else(|| AllocatorError::SpotNotFound(spot_id.clone()))?;
        if spot.is_available() {
            return Err(AllocatorError::SpotNotOccupied(spot_id.clone()));
        }

        let released = self.store.set_occupancy(spot_id, Occupancy::Available)?;
        debug!(spot = %released.id, floor = released.floor, "spot released");
        Ok(released)
    }

    pub async fn availability(&self) -> Result<Vec<AvailabilityEntry>, AllocatorError> {
        let _guard = self.lock.lock().await;

        let mut groups: BTreeMap<(u32, &'static str), AvailabilityEntry> = BTreeMap::new();
        for spot in self.store.spots()? {
            let entry = groups
                .entry((spot.floor, spot.capacity.label()))
                .or_insert_with(|| AvailabilityEntry {
                    floor: spot.floor,
                    capacity: spot.capacity,
                    available: 0,
                    total: 0,
                });
            entry.total += 1;
            if spot.is_available() {
                entry.available += 1;
            }
        }

        Ok(groups.into_values().collect())
    }

    pub async fn has_capacity(&self, size: VehicleSize) -> Result<bool, AllocatorError> {
        let _guard = self.lock.lock().await;

        Ok(self
            .store
            .available_spots()?
            .iter()
            .any(|spot| spot.capacity.fits(size)))
    }
}
