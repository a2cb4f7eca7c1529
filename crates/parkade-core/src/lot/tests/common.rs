use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::lot::{
    CapacityClass, InMemorySpotStore, LicensePlate, LotLayout, ManualClock, Occupancy,
    ParkingSessionService, RateTable, Spot, SpotAllocator, SpotId, SpotStore, StoreError, Ticket,
    TicketId, Vehicle, VehicleSize,
};

pub(super) type TestService = ParkingSessionService<InMemorySpotStore, ManualClock>;

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) store: Arc<InMemorySpotStore>,
    pub(super) clock: Arc<ManualClock>,
}

pub(super) fn opening_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 2, 7, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) async fn harness(layout: LotLayout) -> Harness {
    let store = Arc::new(InMemorySpotStore::new());
    let clock = Arc::new(ManualClock::new(opening_time()));
    let service = Arc::new(ParkingSessionService::new(
        store.clone(),
        clock.clone(),
        RateTable::default(),
    ));
    service
        .initialize(&layout)
        .await
        .expect("layout initializes");
    Harness {
        service,
        store,
        clock,
    }
}

pub(super) fn single_floor(small: u32, medium: u32, large: u32) -> LotLayout {
    LotLayout::new(1)
        .with_spots(CapacityClass::SmallOnly, small)
        .with_spots(CapacityClass::MediumCapable, medium)
        .with_spots(CapacityClass::LargeCapable, large)
}

pub(super) fn motorcycle(plate: &str) -> Vehicle {
    Vehicle::new(plate, VehicleSize::Small)
}

pub(super) fn car(plate: &str) -> Vehicle {
    Vehicle::new(plate, VehicleSize::Medium).with_owner("Dana Whitfield")
}

pub(super) fn bus(plate: &str) -> Vehicle {
    Vehicle::new(plate, VehicleSize::Large)
}

/// Store and allocator seeded with hand-picked spots, bypassing layout numbering.
pub(super) fn seeded_allocator(
    spots: &[(&str, u32, CapacityClass)],
) -> (SpotAllocator<InMemorySpotStore>, Arc<InMemorySpotStore>) {
    let store = Arc::new(InMemorySpotStore::new());
    for (id, floor, capacity) in spots {
        store
            .add_spot(Spot::new(SpotId::new(*id), *floor, *capacity))
            .expect("unique spot id");
    }
    (SpotAllocator::new(store.clone()), store)
}

/// In-memory store whose ticket writes can be switched to fail.
#[derive(Default)]
pub(super) struct FlakyStore {
    inner: InMemorySpotStore,
    fail_add_session: AtomicBool,
    fail_update_session: AtomicBool,
}

impl FlakyStore {
    pub(super) fn fail_add_session(&self, fail: bool) {
        self.fail_add_session.store(fail, Ordering::SeqCst);
    }

    pub(super) fn fail_update_session(&self, fail: bool) {
        self.fail_update_session.store(fail, Ordering::SeqCst);
    }

    fn injected(switch: &AtomicBool) -> Result<(), StoreError> {
        if switch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

impl SpotStore for FlakyStore {
    fn add_spot(&self, spot: Spot) -> Result<(), StoreError> {
        self.inner.add_spot(spot)
    }

    fn add_spots(&self, spots: Vec<Spot>) -> Result<(), StoreError> {
        self.inner.add_spots(spots)
    }

    fn spot(&self, id: &SpotId) -> Result<Option<Spot>, StoreError> {
        self.inner.spot(id)
    }

    fn spots(&self) -> Result<Vec<Spot>, StoreError> {
        self.inner.spots()
    }

    fn available_spots(&self) -> Result<Vec<Spot>, StoreError> {
        self.inner.available_spots()
    }

    fn set_occupancy(&self, id: &SpotId, occupancy: Occupancy) -> Result<Spot, StoreError> {
        self.inner.set_occupancy(id, occupancy)
    }

    fn add_session(&self, ticket: Ticket) -> Result<(), StoreError> {
        Self::injected(&self.fail_add_session)?;
        self.inner.add_session(ticket)
    }

    fn session(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        self.inner.session(id)
    }

    fn update_session(&self, ticket: Ticket) -> Result<(), StoreError> {
        Self::injected(&self.fail_update_session)?;
        self.inner.update_session(ticket)
    }

    fn active_session_for_vehicle(
        &self,
        plate: &LicensePlate,
    ) -> Result<Option<Ticket>, StoreError> {
        self.inner.active_session_for_vehicle(plate)
    }

    fn complete_session(&self, id: TicketId) -> Result<(), StoreError> {
        self.inner.complete_session(id)
    }

    fn active_sessions(&self) -> Result<Vec<Ticket>, StoreError> {
        self.inner.active_sessions()
    }

    fn sessions(&self) -> Result<Vec<Ticket>, StoreError> {
        self.inner.sessions()
    }
}

pub(super) async fn flaky_service(
    layout: LotLayout,
) -> (
    ParkingSessionService<FlakyStore, ManualClock>,
    Arc<FlakyStore>,
    Arc<ManualClock>,
) {
    let store = Arc::new(FlakyStore::default());
    let clock = Arc::new(ManualClock::new(opening_time()));
    let service = ParkingSessionService::new(store.clone(), clock.clone(), RateTable::default());
    service
        .initialize(&layout)
        .await
        .expect("layout initializes");
    (service, store, clock)
}
