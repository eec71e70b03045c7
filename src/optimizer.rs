//! Loading plan optimization.
//!
//! Exhaustive search over vehicle count combinations:
//! - each vehicle type is bounded by the count it would need on its own
//! - every combination inside those bounds is checked for coverage
//! - feasible plans are ranked by total cost, then vehicle count
//!
//! The search space grows with the product of all bounds, so it is only
//! meant for a handful of vehicle types. `OptimizerSettings::max_combinations`
//! refuses anything larger instead of running away.

use std::cmp::Ordering;

use crate::model::{LoadingPlan, VehicleType};
use crate::types::{EPSILON_GENERAL, Priced, Volumetric, compare_with_epsilon};

/// Settings for the plan enumeration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OptimizerSettings {
    /// Upper limit for the number of count combinations to enumerate
    pub max_combinations: u64,
    /// Tolerance when comparing total capacity against the required volume
    pub capacity_epsilon: f64,
    /// Costs within this distance of the cheapest plan in a group are
    /// ranked by vehicle count instead
    pub cost_epsilon: f64,
}

impl OptimizerSettings {
    pub const DEFAULT_MAX_COMBINATIONS: u64 = 1_000_000;
    pub const DEFAULT_CAPACITY_EPSILON: f64 = EPSILON_GENERAL;
    pub const DEFAULT_COST_EPSILON: f64 = EPSILON_GENERAL;
    /// Largest accepted tolerance for both epsilons.
    pub const MAX_EPSILON: f64 = 1e-6;

    /// Creates a builder for custom settings.
    pub fn builder() -> OptimizerSettingsBuilder {
        OptimizerSettingsBuilder::default()
    }
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            max_combinations: Self::DEFAULT_MAX_COMBINATIONS,
            capacity_epsilon: Self::DEFAULT_CAPACITY_EPSILON,
            cost_epsilon: Self::DEFAULT_COST_EPSILON,
        }
    }
}

/// Builder for OptimizerSettings.
#[derive(Clone, Debug, Default)]
pub struct OptimizerSettingsBuilder {
    settings: OptimizerSettings,
}

impl OptimizerSettingsBuilder {
    pub fn max_combinations(mut self, limit: u64) -> Self {
        self.settings.max_combinations = limit;
        self
    }

    /// Clamped to `0..=MAX_EPSILON`.
    pub fn capacity_epsilon(mut self, epsilon: f64) -> Self {
        self.settings.capacity_epsilon = bounded_epsilon(epsilon);
        self
    }

    /// Clamped to `0..=MAX_EPSILON`.
    pub fn cost_epsilon(mut self, epsilon: f64) -> Self {
        self.settings.cost_epsilon = bounded_epsilon(epsilon);
        self
    }

    pub fn build(self) -> OptimizerSettings {
        self.settings
    }
}

fn bounded_epsilon(epsilon: f64) -> f64 {
    if epsilon.is_nan() {
        0.0
    } else {
        epsilon.clamp(0.0, OptimizerSettings::MAX_EPSILON)
    }
}

/// Outcome of a planning run.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanningStatus {
    /// At least one feasible plan was found.
    Planned,
    /// The shipment has no volume, so there is nothing to load.
    NoVolume,
    /// No vehicle types were supplied.
    NoVehicles,
    /// No combination within the bounds covers the volume.
    NoFeasiblePlan,
    /// The bounded search space exceeds the configured limit.
    SearchSpaceTooLarge { combinations: u128, limit: u64 },
}

impl PlanningStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PlanningStatus::Planned => "planned",
            PlanningStatus::NoVolume => "no_volume",
            PlanningStatus::NoVehicles => "no_vehicles",
            PlanningStatus::NoFeasiblePlan => "no_feasible_plan",
            PlanningStatus::SearchSpaceTooLarge { .. } => "search_space_too_large",
        }
    }

    pub fn is_planned(&self) -> bool {
        matches!(self, PlanningStatus::Planned)
    }
}

impl std::fmt::Display for PlanningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanningStatus::Planned => write!(f, "Loading plan found"),
            PlanningStatus::NoVolume => {
                write!(f, "Shipment has no volume; no vehicle is needed")
            }
            PlanningStatus::NoVehicles => write!(f, "No vehicle types available"),
            PlanningStatus::NoFeasiblePlan => {
                write!(f, "No combination of vehicles covers the shipment volume")
            }
            PlanningStatus::SearchSpaceTooLarge {
                combinations,
                limit,
            } => write!(
                f,
                "Search space of {} combinations exceeds the limit of {}",
                combinations, limit
            ),
        }
    }
}

/// Result of the plan enumeration.
#[derive(Clone, Debug)]
pub struct PlanningResult {
    pub required_volume: f64,
    /// Per-type upper count bounds, parallel to the vehicle list.
    pub bounds: Vec<u32>,
    /// Number of count combinations that were evaluated.
    pub combinations_checked: u64,
    /// Feasible plans, cheapest first.
    pub plans: Vec<LoadingPlan>,
    pub status: PlanningStatus,
}

impl PlanningResult {
    fn without_plans(required_volume: f64, bounds: Vec<u32>, status: PlanningStatus) -> Self {
        Self {
            required_volume,
            bounds,
            combinations_checked: 0,
            plans: Vec::new(),
            status,
        }
    }

    /// The cheapest feasible plan, if any.
    pub fn recommended(&self) -> Option<&LoadingPlan> {
        self.plans.first()
    }

    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Upper count bound per vehicle type: the count needed if that type alone
/// carried the whole shipment.
pub fn count_bounds(required_volume: f64, vehicles: &[VehicleType]) -> Vec<u32> {
    vehicles
        .iter()
        .map(|vehicle| {
            if !(required_volume > 0.0) || !(vehicle.capacity > 0.0) {
                return 0;
            }
            let bound = (required_volume / vehicle.capacity).ceil();
            if !bound.is_finite() || bound >= u32::MAX as f64 {
                u32::MAX
            } else {
                bound as u32
            }
        })
        .collect()
}

/// Size of the search space spanned by the bounds, saturating at `u128::MAX`.
fn combination_count(bounds: &[u32]) -> u128 {
    bounds.iter().fold(1u128, |acc, &bound| {
        acc.saturating_mul(bound as u128 + 1)
    })
}

/// Enumerates feasible loading plans with default settings.
///
/// # Parameters
/// * `required_volume` - Shipment volume in m³
/// * `vehicles` - Available vehicle types in display order
pub fn enumerate_plans(required_volume: f64, vehicles: &[VehicleType]) -> PlanningResult {
    enumerate_plans_with_settings(required_volume, vehicles, OptimizerSettings::default())
}

/// Enumerates feasible loading plans.
///
/// Walks every count vector within `count_bounds`, skips the all-zero one,
/// keeps those that cover `required_volume` and ranks them with `rank_plans`.
pub fn enumerate_plans_with_settings(
    required_volume: f64,
    vehicles: &[VehicleType],
    settings: OptimizerSettings,
) -> PlanningResult {
    let bounds = count_bounds(required_volume, vehicles);

    if vehicles.is_empty() {
        return PlanningResult::without_plans(required_volume, bounds, PlanningStatus::NoVehicles);
    }
    if !(required_volume > 0.0) {
        return PlanningResult::without_plans(required_volume, bounds, PlanningStatus::NoVolume);
    }

    let combinations = combination_count(&bounds);
    if combinations > settings.max_combinations as u128 {
        return PlanningResult::without_plans(
            required_volume,
            bounds,
            PlanningStatus::SearchSpaceTooLarge {
                combinations,
                limit: settings.max_combinations,
            },
        );
    }

    let mut plans = Vec::new();
    let mut combinations_checked = 0u64;
    let mut counts = vec![0u32; vehicles.len()];

    'enumerate: loop {
        combinations_checked += 1;
        let plan = LoadingPlan::from_counts(counts.clone(), vehicles);
        if !plan.is_empty() && plan.covers(required_volume, settings.capacity_epsilon) {
            plans.push(plan);
        }

        // Odometer step, last vehicle type turning fastest.
        let mut idx = counts.len();
        loop {
            if idx == 0 {
                break 'enumerate;
            }
            idx -= 1;
            if counts[idx] < bounds[idx] {
                counts[idx] += 1;
                break;
            }
            counts[idx] = 0;
        }
    }

    rank_plans(&mut plans, &settings);

    let status = if plans.is_empty() {
        PlanningStatus::NoFeasiblePlan
    } else {
        PlanningStatus::Planned
    };

    PlanningResult {
        required_volume,
        bounds,
        combinations_checked,
        plans,
        status,
    }
}

/// Sorts plans by total cost, then fewest vehicles, then count vector in
/// vehicle type order.
///
/// Costs are ordered exactly first. Plans whose cost lies within
/// `cost_epsilon` of the cheapest plan of their group then count as tied.
pub fn rank_plans(plans: &mut [LoadingPlan], settings: &OptimizerSettings) {
    plans.sort_by(|a, b| a.cost().total_cmp(&b.cost()));

    let mut start = 0;
    while start < plans.len() {
        let anchor = plans[start].cost();
        let tied = plans[start..]
            .iter()
            .take_while(|plan| {
                compare_with_epsilon(plan.cost(), anchor, settings.cost_epsilon) == Ordering::Equal
            })
            .count()
            .max(1);
        plans[start..start + tied].sort_by(compare_tied_plans);
        start += tied;
    }
}

fn compare_tied_plans(a: &LoadingPlan, b: &LoadingPlan) -> Ordering {
    a.vehicle_count()
        .cmp(&b.vehicle_count())
        .then_with(|| a.counts.cmp(&b.counts))
}

/// The first vehicle type, in list order, that carries the whole shipment on
/// its own.
#[derive(Clone, Debug, PartialEq)]
pub struct SingleVehicleRecommendation {
    pub type_index: usize,
    pub vehicle: VehicleType,
}

/// First-fit over the vehicle list: returns the earliest type whose capacity
/// alone covers the volume.
///
/// Returns `None` when the shipment is empty or exceeds every vehicle.
pub fn recommend_single_vehicle(
    required_volume: f64,
    vehicles: &[VehicleType],
    settings: &OptimizerSettings,
) -> Option<SingleVehicleRecommendation> {
    if !(required_volume > 0.0) {
        return None;
    }

    vehicles
        .iter()
        .enumerate()
        .find(|(_, vehicle)| vehicle.volume_m3() + settings.capacity_epsilon >= required_volume)
        .map(|(type_index, vehicle)| SingleVehicleRecommendation {
            type_index,
            vehicle: vehicle.clone(),
        })
}
