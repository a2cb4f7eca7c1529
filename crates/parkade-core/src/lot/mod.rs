//! Spot inventory, allocation, and ticket sessions for a multi-floor parking facility.
//!
//! [`ParkingSessionService`] is the entry point: it owns ticket numbering and the session lock,
//! and drives the [`SpotAllocator`] and [`FeeCalculator`] against a [`SpotStore`].

pub mod allocator;
pub mod clock;
pub mod domain;
pub mod fees;
pub mod layout;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use allocator::{AllocatorError, AvailabilityEntry, SpotAllocator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::{
    CapacityClass, LicensePlate, Money, Occupancy, Spot, SpotId, Ticket, TicketCompleted,
    TicketId, TicketState, Vehicle, VehicleSize,
};
pub use fees::{FeeCalculator, FeeError, Rate, RateTable};
pub use layout::LotLayout;
pub use service::{ParkingSessionService, SessionServiceError};
pub use store::{InMemorySpotStore, SpotStore, StoreError};
