use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::domain::{LicensePlate, Occupancy, Spot, SpotId, Ticket, TicketId};

/// Storage abstraction for spots and tickets.
///
/// Implementations hold data only. Occupancy is written exclusively by the allocator and tickets
/// exclusively by the session service, each while holding its own lock, so a store never needs
/// to coordinate multi-step updates itself.
pub trait SpotStore: Send + Sync {
    fn add_spot(&self, spot: Spot) -> Result<(), StoreError>;
    /// Inserts every spot or none of them. Any id already stored, or repeated within the batch,
    /// is a conflict.
    fn add_spots(&self, spots: Vec<Spot>) -> Result<(), StoreError>;
    fn spot(&self, id: &SpotId) -> Result<Option<Spot>, StoreError>;
    fn spots(&self) -> Result<Vec<Spot>, StoreError>;
    fn available_spots(&self) -> Result<Vec<Spot>, StoreError>;
    fn set_occupancy(&self, id: &SpotId, occupancy: Occupancy) -> Result<Spot, StoreError>;

    fn add_session(&self, ticket: Ticket) -> Result<(), StoreError>;
    fn session(&self, id: TicketId) -> Result<Option<Ticket>, StoreError>;
    fn update_session(&self, ticket: Ticket) -> Result<(), StoreError>;
    fn active_session_for_vehicle(
        &self,
        plate: &LicensePlate,
    ) -> Result<Option<Ticket>, StoreError>;
    /// Drops the plate index entry of a ticket. The ticket record itself is kept.
    fn complete_session(&self, id: TicketId) -> Result<(), StoreError>;
    fn active_sessions(&self) -> Result<Vec<Ticket>, StoreError>;
    fn sessions(&self) -> Result<Vec<Ticket>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct Tables {
    spots: BTreeMap<SpotId, Spot>,
    tickets: BTreeMap<TicketId, Ticket>,
    active_by_plate: HashMap<LicensePlate, TicketId>,
}

/// Volatile store backing a single process.
#[derive(Default)]
pub struct InMemorySpotStore {
    tables: Mutex<Tables>,
}

impl InMemorySpotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl SpotStore for InMemorySpotStore {
    fn add_spot(&self, spot: Spot) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.spots.contains_key(&spot.id) {
            return Err(StoreError::Conflict);
        }
        tables.spots.insert(spot.id.clone(), spot);
        Ok(())
    }

    fn add_spots(&self, spots: Vec<Spot>) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let mut batch = BTreeSet::new();
        for spot in &spots {
            if tables.spots.contains_key(&spot.id) || !batch.insert(&spot.id) {
                return Err(StoreError::Conflict);
            }
        }
        for spot in spots {
            tables.spots.insert(spot.id.clone(), spot);
        }
        Ok(())
    }

    fn spot(&self, id: &SpotId) -> Result<Option<Spot>, StoreError> {
        Ok(self.tables()?.spots.get(id).cloned())
    }

    fn spots(&self) -> Result<Vec<Spot>, StoreError> {
        Ok(self.tables()?.spots.values().cloned().collect())
    }

    fn available_spots(&self) -> Result<Vec<Spot>, StoreError> {
        Ok(self
            .tables()?
            .spots
            .values()
            .filter(|spot| spot.is_available())
            .cloned()
            .collect())
    }

    fn set_occupancy(&self, id: &SpotId, occupancy: Occupancy) -> Result<Spot, StoreError> {
        let mut tables = self.tables()?;
        let spot = tables.spots.get_mut(id).ok_or(StoreError::NotFound)?;
        spot.occupancy = occupancy;
        Ok(spot.clone())
    }

    fn add_session(&self, ticket: Ticket) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.tickets.contains_key(&ticket.id) {
            return Err(StoreError::Conflict);
        }
        if ticket.is_active() {
            if tables.active_by_plate.contains_key(&ticket.plate) {
                return Err(StoreError::Conflict);
            }
            tables
                .active_by_plate
                .insert(ticket.plate.clone(), ticket.id);
        }
        tables.tickets.insert(ticket.id, ticket);
        Ok(())
    }

    fn session(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tables()?.tickets.get(&id).cloned())
    }

    fn update_session(&self, ticket: Ticket) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        match tables.tickets.get_mut(&ticket.id) {
            Some(stored) => {
                *stored = ticket;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn active_session_for_vehicle(
        &self,
        plate: &LicensePlate,
    ) -> Result<Option<Ticket>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .active_by_plate
            .get(plate)
            .and_then(|id| tables.tickets.get(id))
            .cloned())
    }

    fn complete_session(&self, id: TicketId) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let plate = tables
            .tickets
            .get(&id)
            .map(|ticket| ticket.plate.clone())
            .ok_or(StoreError::NotFound)?;
        if tables.active_by_plate.get(&plate) == Some(&id) {
            tables.active_by_plate.remove(&plate);
        }
        Ok(())
    }

    fn active_sessions(&self) -> Result<Vec<Ticket>, StoreError> {
        let tables = self.tables()?;
        let mut active: Vec<Ticket> = tables
            .active_by_plate
            .values()
            .filter_map(|id| tables.tickets.get(id))
            .cloned()
            .collect();
        active.sort_by_key(|ticket| ticket.id);
        Ok(active)
    }

    fn sessions(&self) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.tables()?.tickets.values().cloned().collect())
    }
}
