use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::model::VehicleType;
use crate::optimizer::OptimizerSettings;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub fleet: FleetConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            fleet: FleetConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("LOAD_IT_NOW_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse LOAD_IT_NOW_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("LOAD_IT_NOW_API_PORT") {
            Some(raw) => parse_port(&raw).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            eprintln!(
                "⚠️ LOAD_IT_NOW_API_PORT must not be 0. Using {}.",
                ApiConfig::DEFAULT_PORT
            );
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!(
                "⚠️ Could not parse LOAD_IT_NOW_API_PORT ('{}'): {}. Using {}.",
                raw,
                err,
                ApiConfig::DEFAULT_PORT
            );
            None
        }
    }
}

/// Default vehicle types offered to the dashboard.
#[derive(Clone, Debug)]
pub struct FleetConfig {
    vehicles: Vec<VehicleType>,
}

impl FleetConfig {
    const FLEET_VAR: &'static str = "LOAD_IT_NOW_FLEET";

    fn from_env() -> Self {
        let vehicles = match env_string(Self::FLEET_VAR) {
            Some(raw) => match parse_fleet(&raw) {
                Ok(vehicles) => {
                    println!(
                        "🚚 Using {} vehicle type(s) from {}",
                        vehicles.len(),
                        Self::FLEET_VAR
                    );
                    vehicles
                }
                Err(err) => {
                    eprintln!(
                        "⚠️ Could not parse {} ('{}'): {}. Using default fleet.",
                        Self::FLEET_VAR,
                        raw,
                        err
                    );
                    VehicleType::default_fleet()
                }
            },
            None => VehicleType::default_fleet(),
        };

        Self { vehicles }
    }

    /// Vehicle types used when a request does not bring its own.
    pub fn vehicles(&self) -> &[VehicleType] {
        &self.vehicles
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            vehicles: VehicleType::default_fleet(),
        }
    }
}

/// Parses `name:capacity:cost` entries separated by `;`.
fn parse_fleet(raw: &str) -> Result<Vec<VehicleType>, String> {
    let mut vehicles = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        // Names may contain ':' themselves, so split from the right.
        let mut parts = entry.rsplitn(3, ':');
        let (Some(cost), Some(capacity), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("entry '{}' must look like name:capacity:cost", entry));
        };
        let capacity = capacity
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("capacity of '{}': {}", entry, err))?;
        let cost = cost
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("cost of '{}': {}", entry, err))?;
        let vehicle = VehicleType::new(name, capacity, cost).map_err(|err| err.to_string())?;
        vehicles.push(vehicle);
    }

    if vehicles.is_empty() {
        return Err("no vehicle types given".to_string());
    }
    Ok(vehicles)
}

/// Configuration for the plan enumeration.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    settings: OptimizerSettings,
    single_vehicle_hint: bool,
}

impl OptimizerConfig {
    const MAX_COMBINATIONS_VAR: &'static str = "LOAD_IT_NOW_PLANNER_MAX_COMBINATIONS";
    const CAPACITY_EPSILON_VAR: &'static str = "LOAD_IT_NOW_PLANNER_CAPACITY_EPSILON";
    const COST_EPSILON_VAR: &'static str = "LOAD_IT_NOW_PLANNER_COST_EPSILON";
    const SINGLE_VEHICLE_HINT_VAR: &'static str = "LOAD_IT_NOW_PLANNER_SINGLE_VEHICLE_HINT";
    const DEFAULT_SINGLE_VEHICLE_HINT: bool = true;

    fn from_env() -> Self {
        let max_combinations = load_u64_with_warning(
            Self::MAX_COMBINATIONS_VAR,
            OptimizerSettings::DEFAULT_MAX_COMBINATIONS,
            |value| value > 0,
            "must be greater than 0",
            "Warning: Adjusted search limit changes which shipments can be planned",
        );

        let capacity_epsilon = load_f64_with_warning(
            Self::CAPACITY_EPSILON_VAR,
            OptimizerSettings::DEFAULT_CAPACITY_EPSILON,
            is_valid_epsilon,
            "must be between 0 and 1e-6",
            "Warning: Adjusted capacity tolerance may accept slightly undersized plans",
        );

        let cost_epsilon = load_f64_with_warning(
            Self::COST_EPSILON_VAR,
            OptimizerSettings::DEFAULT_COST_EPSILON,
            is_valid_epsilon,
            "must be between 0 and 1e-6",
            "Warning: Adjusted cost tolerance changes how ties are ranked",
        );

        let single_vehicle_hint = env_string(Self::SINGLE_VEHICLE_HINT_VAR)
            .and_then(|raw| parse_bool(&raw, Self::SINGLE_VEHICLE_HINT_VAR))
            .unwrap_or(Self::DEFAULT_SINGLE_VEHICLE_HINT);

        let settings = OptimizerSettings::builder()
            .max_combinations(max_combinations)
            .capacity_epsilon(capacity_epsilon)
            .cost_epsilon(cost_epsilon)
            .build();

        Self {
            settings,
            single_vehicle_hint,
        }
    }

    /// Returns the configured OptimizerSettings.
    pub fn settings(&self) -> OptimizerSettings {
        self.settings
    }

    /// Whether responses carry the single-vehicle recommendation.
    pub fn single_vehicle_hint(&self) -> bool {
        self.single_vehicle_hint
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            settings: OptimizerSettings::default(),
            single_vehicle_hint: Self::DEFAULT_SINGLE_VEHICLE_HINT,
        }
    }
}

/// Tolerances only absorb floating-point rounding.
fn is_valid_epsilon(value: f64) -> bool {
    (0.0..=OptimizerSettings::MAX_EPSILON).contains(&value)
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            eprintln!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    let Some(raw) = env_string(var_name) else {
        return default;
    };
    match raw.parse::<f64>() {
        Ok(value) if validator(value) => {
            let tolerance = default.abs().max(1.0) * 1e-12;
            if (value - default).abs() > tolerance {
                println!("⚠️ {} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Ok(_) => {
            eprintln!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            eprintln!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

fn load_u64_with_warning(
    var_name: &str,
    default: u64,
    validator: impl Fn(u64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> u64 {
    let Some(raw) = env_string(var_name) else {
        return default;
    };
    match raw.replace('_', "").parse::<u64>() {
        Ok(value) if validator(value) => {
            if value != default {
                println!("⚠️ {} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Ok(_) => {
            eprintln!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            eprintln!(
                "⚠️ Could not parse {} ('{}') as integer: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        for raw in ["1", "true", "yes", "y", "on", "TRUE", "Yes", " on "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(true), "{}", raw);
        }
    }

    #[test]
    fn test_parse_bool_false_values() {
        for raw in ["0", "false", "no", "n", "off", "FALSE", "No", "  0  "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(false), "{}", raw);
        }
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("3000"), Some(3000));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port("http"), None);
    }

    #[test]
    fn test_parse_fleet_entries() {
        let fleet = parse_fleet("20 ft:30:150; 24 ft : 40 : 200 ;32 ft:60:300;").unwrap();
        assert_eq!(fleet, VehicleType::default_fleet());
    }

    #[test]
    fn test_parse_fleet_allows_colon_in_name() {
        let fleet = parse_fleet("Box truck: long:45.5:210").unwrap();
        assert_eq!(fleet.len(), 1);
        assert_eq!(fleet[0].name, "Box truck: long");
        assert_eq!(fleet[0].capacity, 45.5);
        assert_eq!(fleet[0].cost, 210.0);
    }

    #[test]
    fn test_parse_fleet_rejects_invalid_entries() {
        assert!(parse_fleet("").is_err());
        assert!(parse_fleet("20 ft:30").is_err());
        assert!(parse_fleet("20 ft:abc:150").is_err());
        assert!(parse_fleet("20 ft:0:150").is_err());
        assert!(parse_fleet("20 ft:30:-1").is_err());
        assert!(parse_fleet(":30:150").is_err());
    }

    #[test]
    fn test_epsilon_validation() {
        assert!(is_valid_epsilon(0.0));
        assert!(is_valid_epsilon(OptimizerSettings::DEFAULT_CAPACITY_EPSILON));
        assert!(is_valid_epsilon(1e-6));
        assert!(!is_valid_epsilon(0.5));
        assert!(!is_valid_epsilon(50.0));
        assert!(!is_valid_epsilon(-1e-9));
        assert!(!is_valid_epsilon(f64::NAN));
        assert!(!is_valid_epsilon(f64::INFINITY));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(FleetConfig::default().vehicles().len(), 3);
        let optimizer = OptimizerConfig::default();
        assert_eq!(optimizer.settings(), OptimizerSettings::default());
        assert!(optimizer.single_vehicle_hint());
    }
}
