//! Data models for shipment volume and vehicle loading plans.
//!
//! This module defines the fundamental data structures:
//! - `BoxRecord`: A validated box row with dimensions (cm) and quantity
//! - `VehicleType`: A named vehicle class with capacity (m³) and per-use cost
//! - `LoadingPlan`: A count assignment across vehicle types with derived totals

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::types::{Dimensions, Priced, Volumetric, validation};

/// Validation error for vehicle type definitions.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidName(String),
    InvalidCapacity(String),
    InvalidCost(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidName(msg) => write!(f, "Invalid vehicle name: {}", msg),
            ValidationError::InvalidCapacity(msg) => write!(f, "Invalid capacity: {}", msg),
            ValidationError::InvalidCost(msg) => write!(f, "Invalid cost: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A box row that survived input coercion.
///
/// # Fields
/// * `length`, `width`, `height` - Dimensions in cm, positive and finite
/// * `quantity` - Number of identical boxes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct BoxRecord {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub quantity: u64,
}

impl BoxRecord {
    pub const DEFAULT_QUANTITY: u64 = 1;

    /// Creates a record, returning `None` for non-positive or non-finite dimensions.
    pub fn new(length: f64, width: f64, height: f64, quantity: u64) -> Option<Self> {
        let dims = Dimensions::new(length, width, height);
        if !dims.is_valid() {
            return None;
        }
        Some(Self {
            length,
            width,
            height,
            quantity,
        })
    }

    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length, self.width, self.height)
    }

    /// Volume of a single box in m³.
    pub fn unit_volume_m3(&self) -> f64 {
        self.dimensions().volume_m3()
    }

    /// Volume of all boxes of this row in m³.
    pub fn total_volume_m3(&self) -> f64 {
        self.unit_volume_m3() * self.quantity as f64
    }
}

impl Volumetric for BoxRecord {
    fn volume_m3(&self) -> f64 {
        self.total_volume_m3()
    }
}

/// A named vehicle class with fixed volumetric capacity and per-shipment cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "name": "20 ft", "capacity": 30.0, "cost": 150.0 }))]
pub struct VehicleType {
    pub name: String,
    /// Maximum load volume in m³.
    pub capacity: f64,
    /// Cost per use.
    pub cost: f64,
}

impl VehicleType {
    /// Creates a new vehicle type with validation.
    pub fn new(name: impl Into<String>, capacity: f64, cost: f64) -> Result<Self, ValidationError> {
        let name = name.into();
        validation::validate_name(&name).map_err(ValidationError::InvalidName)?;
        validation::validate_capacity(capacity).map_err(ValidationError::InvalidCapacity)?;
        validation::validate_cost(cost).map_err(ValidationError::InvalidCost)?;
        Ok(Self {
            name: name.trim().to_string(),
            capacity,
            cost,
        })
    }

    /// The three vehicle classes the dashboard starts with.
    pub fn default_fleet() -> Vec<VehicleType> {
        vec![
            VehicleType {
                name: "20 ft".to_string(),
                capacity: 30.0,
                cost: 150.0,
            },
            VehicleType {
                name: "24 ft".to_string(),
                capacity: 40.0,
                cost: 200.0,
            },
            VehicleType {
                name: "32 ft".to_string(),
                capacity: 60.0,
                cost: 300.0,
            },
        ]
    }
}

impl Volumetric for VehicleType {
    fn volume_m3(&self) -> f64 {
        self.capacity
    }
}

impl Priced for VehicleType {
    fn cost(&self) -> f64 {
        self.cost
    }
}

/// How many vehicles of one type a plan uses.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct VehicleCount {
    /// Index into the vehicle type list the plan was computed for.
    pub type_index: usize,
    pub name: String,
    pub count: u32,
}

/// A count assignment across vehicle types with derived totals.
///
/// `counts` is parallel to the vehicle type list the plan was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadingPlan {
    pub counts: Vec<u32>,
    pub total_capacity: f64,
    pub total_cost: f64,
}

impl LoadingPlan {
    /// Builds a plan from a count vector, deriving capacity and cost.
    ///
    /// Counts beyond the end of `vehicles` are ignored.
    pub fn from_counts(counts: Vec<u32>, vehicles: &[VehicleType]) -> Self {
        let (total_capacity, total_cost) = counts.iter().zip(vehicles.iter()).fold(
            (0.0, 0.0),
            |(capacity, cost), (&count, vehicle)| {
                (
                    capacity + count as f64 * vehicle.capacity,
                    cost + count as f64 * vehicle.cost,
                )
            },
        );
        Self {
            counts,
            total_capacity,
            total_cost,
        }
    }

    /// Total number of vehicles used.
    pub fn vehicle_count(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }

    /// Checks whether the plan covers the given volume.
    pub fn covers(&self, required_volume: f64, epsilon: f64) -> bool {
        self.total_capacity + epsilon >= required_volume
    }

    /// Capacity left over after loading `required_volume`.
    pub fn spare_capacity(&self, required_volume: f64) -> f64 {
        self.total_capacity - required_volume
    }

    /// Share of the plan's capacity taken by `required_volume`, in percent.
    pub fn utilization_percent(&self, required_volume: f64) -> f64 {
        if self.total_capacity <= 0.0 {
            return 0.0;
        }
        (required_volume / self.total_capacity) * 100.0
    }

    /// Named, non-zero counts in vehicle type order.
    pub fn vehicle_counts(&self, vehicles: &[VehicleType]) -> Vec<VehicleCount> {
        self.counts
            .iter()
            .zip(vehicles.iter())
            .enumerate()
            .filter(|(_, (count, _))| **count > 0)
            .map(|(type_index, (&count, vehicle))| VehicleCount {
                type_index,
                name: vehicle.name.clone(),
                count,
            })
            .collect()
    }

    /// Human readable summary such as `1 × 20 ft + 1 × 24 ft`.
    pub fn describe(&self, vehicles: &[VehicleType]) -> String {
        let parts: Vec<String> = self
            .vehicle_counts(vehicles)
            .into_iter()
            .map(|entry| format!("{} × {}", entry.count, entry.name))
            .collect();
        if parts.is_empty() {
            "no vehicles".to_string()
        } else {
            parts.join(" + ")
        }
    }
}

impl Volumetric for LoadingPlan {
    fn volume_m3(&self) -> f64 {
        self.total_capacity
    }
}

impl Priced for LoadingPlan {
    fn cost(&self) -> f64 {
        self.total_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    #[test]
    fn box_record_rejects_invalid_dimensions() {
        assert!(BoxRecord::new(10.0, 10.0, 10.0, 1).is_some());
        assert!(BoxRecord::new(0.0, 10.0, 10.0, 1).is_none());
        assert!(BoxRecord::new(10.0, -1.0, 10.0, 1).is_none());
        assert!(BoxRecord::new(10.0, 10.0, f64::NAN, 1).is_none());
    }

    #[test]
    fn box_record_volume_scales_with_quantity() {
        let record = BoxRecord::new(100.0, 50.0, 60.0, 2).unwrap();
        assert!((record.unit_volume_m3() - 0.3).abs() < EPSILON_GENERAL);
        assert!((record.total_volume_m3() - 0.6).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn vehicle_type_validation() {
        assert!(VehicleType::new("20 ft", 30.0, 150.0).is_ok());
        assert!(VehicleType::new("free", 30.0, 0.0).is_ok());
        assert!(matches!(
            VehicleType::new("", 30.0, 150.0),
            Err(ValidationError::InvalidName(_))
        ));
        assert!(matches!(
            VehicleType::new("20 ft", 0.0, 150.0),
            Err(ValidationError::InvalidCapacity(_))
        ));
        assert!(matches!(
            VehicleType::new("20 ft", 30.0, -1.0),
            Err(ValidationError::InvalidCost(_))
        ));
    }

    #[test]
    fn vehicle_type_trims_name() {
        let vehicle = VehicleType::new("  24 ft ", 40.0, 200.0).unwrap();
        assert_eq!(vehicle.name, "24 ft");
    }

    #[test]
    fn loading_plan_derives_totals() {
        let fleet = VehicleType::default_fleet();
        let plan = LoadingPlan::from_counts(vec![1, 1, 0], &fleet);
        assert!((plan.total_capacity - 70.0).abs() < EPSILON_GENERAL);
        assert!((plan.total_cost - 350.0).abs() < EPSILON_GENERAL);
        assert_eq!(plan.vehicle_count(), 2);
        assert!(plan.covers(65.0, EPSILON_GENERAL));
        assert!(!plan.covers(70.5, EPSILON_GENERAL));
        assert!((plan.spare_capacity(65.0) - 5.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn loading_plan_describes_non_zero_counts() {
        let fleet = VehicleType::default_fleet();
        let plan = LoadingPlan::from_counts(vec![2, 0, 1], &fleet);
        assert_eq!(plan.describe(&fleet), "2 × 20 ft + 1 × 32 ft");

        let counts = plan.vehicle_counts(&fleet);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[1].type_index, 2);

        let empty = LoadingPlan::from_counts(vec![0, 0, 0], &fleet);
        assert!(empty.is_empty());
        assert_eq!(empty.describe(&fleet), "no vehicles");
        assert_eq!(empty.utilization_percent(10.0), 0.0);
    }
}
