use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::allocator::{AllocatorError, AvailabilityEntry, SpotAllocator};
use super::clock::Clock;
use super::domain::{
    CapacityClass, LicensePlate, Spot, SpotId, Ticket, TicketCompleted, TicketId, TicketState,
    Vehicle, VehicleSize,
};
use super::fees::{FeeCalculator, FeeError, RateTable};
use super::layout::LotLayout;
use super::store::{SpotStore, StoreError};

/// Identifier counters owned by one service instance. Only reachable through the session lock.
#[derive(Debug, Clone, Default)]
struct SessionLedger {
    last_ticket: u64,
    last_floor: u32,
    spot_sequences: BTreeMap<CapacityClass, u32>,
}

impl SessionLedger {
    /// Id the next stored ticket will take. Committed with `record_ticket` once the ticket is
    /// persisted, so failed check-ins leave no gaps.
    fn upcoming_ticket_id(&self) -> TicketId {
        TicketId(self.last_ticket + 1)
    }

    fn record_ticket(&mut self, id: TicketId) {
        self.last_ticket = id.0;
    }

    fn next_spot_id(&mut self, capacity: CapacityClass) -> SpotId {
        let sequence = self.spot_sequences.entry(capacity).or_insert(0);
        *sequence += 1;
        SpotId::sequenced(capacity, *sequence)
    }
}

/// Check-in/check-out orchestration over the allocator, fee table, and store.
///
/// Check-in and check-out hold the session lock for their whole duration and take the allocator
/// lock inside it. The allocator never calls back into the service, so the order is always
/// session then allocator.
pub struct ParkingSessionService<S, C> {
    store: Arc<S>,
    allocator: SpotAllocator<S>,
    fees: FeeCalculator,
    clock: Arc<C>,
    ledger: Mutex<SessionLedger>,
}

impl<S, C> ParkingSessionService<S, C>
where
    S: SpotStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, rates: RateTable) -> Self {
        Self {
            allocator: SpotAllocator::new(store.clone()),
            store,
            fees: FeeCalculator::new(rates),
            clock,
            ledger: Mutex::new(SessionLedger::default()),
        }
    }

    /// Adds `layout.floors` floors above any floors created by earlier calls. Meant to run before
    /// traffic starts.
    pub async fn initialize(&self, layout: &LotLayout) -> Result<Vec<Spot>, SessionServiceError> {
        if layout.floors == 0 {
            return Err(SessionServiceError::InvalidLayout(
                "a lot needs at least one floor".to_string(),
            ));
        }
        if layout.spots_per_floor() == 0 {
            return Err(SessionServiceError::InvalidLayout(
                "a floor needs at least one spot".to_string(),
            ));
        }

        let mut ledger = self.ledger.lock().await;
        let overflow = || {
            SessionServiceError::InvalidLayout(format!(
                "{} more floors exceed the floor numbering range",
                layout.floors
            ))
        };
        let first_floor = ledger.last_floor.checked_add(1).ok_or_else(overflow)?;
        let last_floor = ledger
            .last_floor
            .checked_add(layout.floors)
            .ok_or_else(overflow)?;

        let mut staged = ledger.clone();
        let mut created = Vec::new();
        for floor in first_floor..=last_floor {
            for (&capacity, &count) in &layout.spots_per_floor {
                for _ in 0..count {
                    created.push(Spot::new(staged.next_spot_id(capacity), floor, capacity));
                }
            }
        }
        self.store.add_spots(created.clone())?;
        staged.last_floor = last_floor;
        *ledger = staged;

        info!(
            floors = layout.floors,
            spots = created.len(),
            first_floor,
            "parking lot initialized"
        );
        Ok(created)
    }

    /// Opens a ticket for `vehicle`. `Ok(None)` means no compatible spot is free.
    pub async fn check_in(&self, vehicle: &Vehicle) -> Result<Option<Ticket>, SessionServiceError> {
        let mut ledger = self.ledger.lock().await;

        if let Some(active) = self.store.active_session_for_vehicle(&vehicle.plate)? {
            return Err(SessionServiceError::AlreadyParked {
                plate: vehicle.plate.clone(),
                ticket: active.id,
            });
        }

        let Some(spot) = self
            .allocator
            .allocate(vehicle.size, &vehicle.plate)
            .await?
        else {
            warn!(plate = %vehicle.plate, vehicle = %vehicle.size, "no compatible spot available");
            return Ok(None);
        };

        let ticket = Ticket {
            id: ledger.upcoming_ticket_id(),
            plate: vehicle.plate.clone(),
            vehicle_size: vehicle.size,
            spot_id: spot.id.clone(),
            floor: spot.floor,
            entered_at: self.clock.now(),
            state: TicketState::Active,
        };

        if let Err(err) = self.store.add_session(ticket.clone()) {
            if let Err(rollback) = self.allocator.release(&spot.id).await {
                warn!(spot = %spot.id, error = %rollback, "failed to roll back allocation");
            }
            return Err(err.into());
        }
        ledger.record_ticket(ticket.id);

        info!(
            ticket = %ticket.id,
            plate = %ticket.plate,
            spot = %ticket.spot_id,
            floor = ticket.floor,
            "vehicle checked in"
        );
        Ok(Some(ticket))
    }

    /// Closes the active ticket for `plate`, charging for the elapsed time and freeing its spot.
    pub async fn check_out(&self, plate: &LicensePlate) -> Result<Ticket, SessionServiceError> {
        let _ledger = self.ledger.lock().await;

        let ticket = self.store.active_session_for_vehicle(plate)?.ok_or_else(|| {
            SessionServiceError::NoActiveSession {
                plate: plate.clone(),
            }
        })?;

        let now = self.clock.now();
        let hours = ticket.hours_parked(now);
        let fee = self.fees.compute_fee(ticket.vehicle_size, hours)?;
        let completed = ticket.complete(now, fee)?;

        self.store.update_session(completed.clone())?;
        self.store.complete_session(completed.id)?;
        self.allocator.release(&completed.spot_id).await?;

        info!(
            ticket = %completed.id,
            plate = %completed.plate,
            spot = %completed.spot_id,
            hours,
            %fee,
            "vehicle checked out"
        );
        Ok(completed)
    }

    /// Point-in-time availability per floor and capacity class. Not taken under the session
    /// lock, so the result may be stale by the time the caller acts on it.
    pub async fn availability(&self) -> Result<Vec<AvailabilityEntry>, SessionServiceError> {
        Ok(self.allocator.availability().await?)
    }

    pub async fn has_capacity(&self, size: VehicleSize) -> Result<bool, SessionServiceError> {
        Ok(self.allocator.has_capacity(size).await?)
    }

    pub fn active_sessions(&self) -> Result<Vec<Ticket>, SessionServiceError> {
        Ok(self.store.active_sessions()?)
    }

    pub fn session(&self, id: TicketId) -> Result<Option<Ticket>, SessionServiceError> {
        Ok(self.store.session(id)?)
    }

    /// Every ticket ever issued, ordered by id.
    pub fn history(&self) -> Result<Vec<Ticket>, SessionServiceError> {
        Ok(self.store.sessions()?)
    }
}

/// Error raised by the session service.
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error("vehicle {plate} is already parked under ticket {ticket}")]
    AlreadyParked { plate: LicensePlate, ticket: TicketId },
    #[error("vehicle {plate} has no active ticket")]
    NoActiveSession { plate: LicensePlate },
    #[error(transparent)]
    AlreadyCompleted(#[from] TicketCompleted),
    #[error("invalid lot layout: {0}")]
    InvalidLayout(String),
    #[error(transparent)]
    Fee(#[from] FeeError),
    #[error(transparent)]
    Allocator(#[from] AllocatorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
