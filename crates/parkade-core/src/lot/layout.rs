use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::CapacityClass;

/// Shape of a block of identical floors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotLayout {
    pub floors: u32,
    pub spots_per_floor: BTreeMap<CapacityClass, u32>,
}

impl LotLayout {
    pub fn new(floors: u32) -> Self {
        Self {
            floors,
            spots_per_floor: BTreeMap::new(),
        }
    }

    pub fn with_spots(mut self, capacity: CapacityClass, per_floor: u32) -> Self {
        self.spots_per_floor.insert(capacity, per_floor);
        self
    }

    pub fn spots_per_floor(&self) -> u32 {
        self.spots_per_floor.values().sum()
    }

    pub fn total_spots(&self) -> u64 {
        u64::from(self.floors) * u64::from(self.spots_per_floor())
    }
}

impl Default for LotLayout {
    fn default() -> Self {
        Self::new(3)
            .with_spots(CapacityClass::SmallOnly, 4)
            .with_spots(CapacityClass::MediumCapable, 8)
            .with_spots(CapacityClass::LargeCapable, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_multiply_floors_by_per_floor_counts() {
        let layout = LotLayout::new(2)
            .with_spots(CapacityClass::SmallOnly, 3)
            .with_spots(CapacityClass::LargeCapable, 1);
        assert_eq!(layout.spots_per_floor(), 4);
        assert_eq!(layout.total_spots(), 8);
        assert_eq!(LotLayout::default().total_spots(), 42);
    }
}
