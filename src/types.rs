//! Common types and traits for volume and cost calculations.
//!
//! Boxes are measured in centimetres, vehicle capacities in cubic metres.
//! This module holds the conversion between the two and the small trait
//! abstractions shared by boxes, vehicle types and loading plans.

/// Cubic centimetres per cubic metre.
pub const CM3_PER_M3: f64 = 1_000_000.0;

/// Global numerical tolerance for floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-9;

/// Box dimensions in centimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    #[inline]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    /// Volume in cm³.
    #[inline]
    pub fn volume_cm3(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Volume in m³.
    #[inline]
    pub fn volume_m3(&self) -> f64 {
        self.volume_cm3() / CM3_PER_M3
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid(&self) -> bool {
        [self.length, self.width, self.height]
            .iter()
            .all(|value| *value > 0.0 && value.is_finite())
    }
}

/// Trait for anything that occupies or offers volume, in m³.
pub trait Volumetric {
    fn volume_m3(&self) -> f64;
}

/// Trait for anything with a per-use cost.
pub trait Priced {
    fn cost(&self) -> f64;
}

/// Formats a volume for display with two decimals.
pub fn format_volume(volume_m3: f64) -> String {
    format!("{:.2}", volume_m3)
}

/// Compares two floats with a tolerance, treating near-equal values as equal.
pub fn compare_with_epsilon(a: f64, b: f64, eps: f64) -> std::cmp::Ordering {
    if (a - b).abs() <= eps {
        std::cmp::Ordering::Equal
    } else if a < b {
        std::cmp::Ordering::Less
    } else {
        std::cmp::Ordering::Greater
    }
}

/// Validation helpers shared by the model constructors.
pub mod validation {

    /// Validates a vehicle capacity in m³.
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_capacity(value: f64) -> Result<(), String> {
        if value.is_nan() {
            return Err("Capacity must not be NaN".to_string());
        }
        if value.is_infinite() {
            return Err("Capacity must not be infinite".to_string());
        }
        if value <= 0.0 {
            return Err(format!("Capacity must be positive, got: {}", value));
        }
        Ok(())
    }

    /// Validates a per-use cost. Zero is allowed.
    pub fn validate_cost(value: f64) -> Result<(), String> {
        if value.is_nan() {
            return Err("Cost must not be NaN".to_string());
        }
        if value.is_infinite() {
            return Err("Cost must not be infinite".to_string());
        }
        if value < 0.0 {
            return Err(format!("Cost must not be negative, got: {}", value));
        }
        Ok(())
    }

    /// Validates a vehicle type name.
    pub fn validate_name(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Vehicle name must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_dimensions_volume_conversion() {
        let dims = Dimensions::new(100.0, 50.0, 60.0);
        assert!((dims.volume_cm3() - 300_000.0).abs() < EPSILON_GENERAL);
        assert!((dims.volume_m3() - 0.3).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_dimensions_validity() {
        assert!(Dimensions::new(1.0, 2.0, 3.0).is_valid());
        assert!(!Dimensions::new(0.0, 2.0, 3.0).is_valid());
        assert!(!Dimensions::new(1.0, -2.0, 3.0).is_valid());
        assert!(!Dimensions::new(1.0, 2.0, f64::NAN).is_valid());
        assert!(!Dimensions::new(f64::INFINITY, 2.0, 3.0).is_valid());
    }

    #[test]
    fn test_format_volume_rounds_to_two_decimals() {
        assert_eq!(format_volume(0.6), "0.60");
        assert_eq!(format_volume(45.0), "45.00");
        assert_eq!(format_volume(1.005_1), "1.01");
    }

    #[test]
    fn test_compare_with_epsilon() {
        assert_eq!(compare_with_epsilon(1.0, 1.0 + 1e-12, 1e-9), Ordering::Equal);
        assert_eq!(compare_with_epsilon(1.0, 2.0, 1e-9), Ordering::Less);
        assert_eq!(compare_with_epsilon(3.0, 2.0, 1e-9), Ordering::Greater);
    }

    #[test]
    fn test_validation_capacity() {
        assert!(validation::validate_capacity(30.0).is_ok());
        assert!(validation::validate_capacity(0.0).is_err());
        assert!(validation::validate_capacity(-1.0).is_err());
        assert!(validation::validate_capacity(f64::NAN).is_err());
        assert!(validation::validate_capacity(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validation_cost() {
        assert!(validation::validate_cost(150.0).is_ok());
        assert!(validation::validate_cost(0.0).is_ok());
        assert!(validation::validate_cost(-0.5).is_err());
        assert!(validation::validate_cost(f64::NAN).is_err());
    }

    #[test]
    fn test_validation_name() {
        assert!(validation::validate_name("20 ft").is_ok());
        assert!(validation::validate_name("   ").is_err());
    }
}
