use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vehicle size class. Ordering follows physical size so capacity checks can compare ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleSize {
    Small,
    Medium,
    Large,
}

impl VehicleSize {
    pub const fn ordered() -> [Self; 3] {
        [Self::Small, Self::Medium, Self::Large]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Everyday name of the vehicle kind parked in this class.
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Small => "motorcycle",
            Self::Medium => "car",
            Self::Large => "bus",
        }
    }
}

impl fmt::Display for VehicleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.kind())
    }
}

impl FromStr for VehicleSize {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "small" | "motorcycle" | "bike" => Ok(Self::Small),
            "medium" | "car" => Ok(Self::Medium),
            "large" | "bus" | "truck" => Ok(Self::Large),
            other => Err(format!(
                "unknown vehicle class '{other}' (expected motorcycle, car, or bus)"
            )),
        }
    }
}

/// Largest vehicle class a spot can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityClass {
    SmallOnly,
    MediumCapable,
    LargeCapable,
}

impl CapacityClass {
    pub const fn ordered() -> [Self; 3] {
        [Self::SmallOnly, Self::MediumCapable, Self::LargeCapable]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SmallOnly => "small",
            Self::MediumCapable => "medium",
            Self::LargeCapable => "large",
        }
    }

    /// Spot id prefix. Prefixes follow the class order so that on a shared floor the
    /// lexicographic id tie-break offers the smallest compatible class first.
    pub const fn prefix(self) -> char {
        match self {
            Self::SmallOnly => 'A',
            Self::MediumCapable => 'B',
            Self::LargeCapable => 'C',
        }
    }

    pub const fn max_size(self) -> VehicleSize {
        match self {
            Self::SmallOnly => VehicleSize::Small,
            Self::MediumCapable => VehicleSize::Medium,
            Self::LargeCapable => VehicleSize::Large,
        }
    }

    pub fn fits(self, size: VehicleSize) -> bool {
        size <= self.max_size()
    }
}

/// License plate, the unique key of a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicensePlate(pub String);

impl LicensePlate {
    pub fn new(plate: impl Into<String>) -> Self {
        Self(plate.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicensePlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub plate: LicensePlate,
    pub size: VehicleSize,
    pub owner: Option<String>,
}

impl Vehicle {
    pub fn new(plate: impl Into<String>, size: VehicleSize) -> Self {
        Self {
            plate: LicensePlate::new(plate),
            size,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Spot identifier. Compared lexicographically when breaking allocation ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpotId(pub String);

impl SpotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub(crate) fn sequenced(class: CapacityClass, sequence: u32) -> Self {
        Self(format!("{}-{sequence:03}", class.prefix()))
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "plate", rename_all = "snake_case")]
pub enum Occupancy {
    Available,
    Occupied(LicensePlate),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    pub id: SpotId,
    pub floor: u32,
    pub capacity: CapacityClass,
    pub occupancy: Occupancy,
}

impl Spot {
    pub fn new(id: SpotId, floor: u32, capacity: CapacityClass) -> Self {
        Self {
            id,
            floor,
            capacity,
            occupancy: Occupancy::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.occupancy, Occupancy::Available)
    }

    pub fn occupant(&self) -> Option<&LicensePlate> {
        match &self.occupancy {
            Occupancy::Available => None,
            Occupancy::Occupied(plate) => Some(plate),
        }
    }
}

/// Ticket identifier, assigned from a strictly increasing per-service counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{:06}", self.0)
    }
}

/// Amount of money in cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub u64);

impl Money {
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = String;

    /// Parses `D`, `D.C`, or `D.CC` decimal text.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let invalid = || format!("'{raw}' is not a valid amount (expected e.g. 2.50)");
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() || fraction.len() > 2 {
            return Err(invalid());
        }
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let cents = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse::<u64>().map_err(|_| invalid())?,
        };
        whole
            .checked_mul(100)
            .and_then(|value| value.checked_add(cents))
            .map(Self)
            .ok_or_else(invalid)
    }
}

/// Lifecycle state of a ticket. A ticket is either still open or closed with both exit time and
/// fee recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TicketState {
    Active,
    Completed {
        exited_at: DateTime<Utc>,
        fee: Money,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub plate: LicensePlate,
    pub vehicle_size: VehicleSize,
    pub spot_id: SpotId,
    pub floor: u32,
    pub entered_at: DateTime<Utc>,
    pub state: TicketState,
}

impl Ticket {
    pub fn is_active(&self) -> bool {
        matches!(self.state, TicketState::Active)
    }

    pub fn exited_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            TicketState::Active => None,
            TicketState::Completed { exited_at, .. } => Some(exited_at),
        }
    }

    pub fn fee(&self) -> Option<Money> {
        match self.state {
            TicketState::Active => None,
            TicketState::Completed { fee, .. } => Some(fee),
        }
    }

    /// Elapsed time since entry in fractional hours.
    pub fn hours_parked(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now.signed_duration_since(self.entered_at);
        let seconds = elapsed.num_seconds() as f64 + f64::from(elapsed.subsec_nanos()) / 1e9;
        seconds / 3_600.0
    }

    pub fn complete(self, exited_at: DateTime<Utc>, fee: Money) -> Result<Self, TicketCompleted> {
        match self.state {
            TicketState::Active => Ok(Self {
                state: TicketState::Completed { exited_at, fee },
                ..self
            }),
            TicketState::Completed { .. } => Err(TicketCompleted(self.id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ticket {0} has already been completed")]
pub struct TicketCompleted(pub TicketId);
