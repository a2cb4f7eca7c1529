use crate::cli::parse_hours;
use crate::render::{render_availability, render_receipts};
use chrono::{Duration, Utc};
use clap::Args;
use parkade_core::config::AppConfig;
use parkade_core::error::AppError;
use parkade_core::lot::{
    FeeCalculator, InMemorySpotStore, ManualClock, ParkingSessionService, SessionServiceError,
    Vehicle, VehicleSize,
};
use parkade_core::telemetry;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of motorcycles arriving at once
    #[arg(long, default_value_t = 6)]
    pub(crate) motorcycles: u32,
    /// Number of cars arriving at once
    #[arg(long, default_value_t = 24)]
    pub(crate) cars: u32,
    /// Number of buses arriving at once
    #[arg(long, default_value_t = 4)]
    pub(crate) buses: u32,
    /// Simulated length of every stay, in hours
    #[arg(long, default_value_t = 2.5, value_parser = parse_hours)]
    pub(crate) stay_hours: f64,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            motorcycles: 6,
            cars: 24,
            buses: 4,
            stay_hours: 2.5,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct AvailabilityArgs {
    /// Emit JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Vehicle class: motorcycle, car, or bus
    #[arg(long)]
    pub(crate) vehicle: VehicleSize,
    /// Length of the stay in hours
    #[arg(long, value_parser = parse_hours)]
    pub(crate) hours: f64,
}

type DemoService = ParkingSessionService<InMemorySpotStore, ManualClock>;

fn fleet(args: &DemoArgs) -> Vec<Vehicle> {
    let mut vehicles = Vec::new();
    for (size, count) in [
        (VehicleSize::Large, args.buses),
        (VehicleSize::Medium, args.cars),
        (VehicleSize::Small, args.motorcycles),
    ] {
        for index in 1..=count {
            let plate = format!("{}-{index:03}", size.kind().to_ascii_uppercase());
            vehicles.push(Vehicle::new(plate, size));
        }
    }
    vehicles
}

fn stay_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(
        environment = ?config.environment,
        floors = config.lot.floors,
        "starting parking demo"
    );

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let service: Arc<DemoService> = Arc::new(ParkingSessionService::new(
        Arc::new(InMemorySpotStore::new()),
        clock.clone(),
        config.rates.clone(),
    ));
    service.initialize(&config.lot).await?;

    println!("Parking facility demo");
    println!(
        "Lot: {} floors, {} spots per floor",
        config.lot.floors,
        config.lot.spots_per_floor()
    );
    render_availability("Opening availability", &service.availability().await?);

    let vehicles = fleet(&args);
    info!(arrivals = vehicles.len(), "simulating concurrent arrivals");
    let mut arrivals = Vec::with_capacity(vehicles.len());
    for vehicle in vehicles {
        let service = service.clone();
        arrivals.push(tokio::spawn(async move {
            let ticket = service.check_in(&vehicle).await?;
            Ok::<_, AppError>((vehicle, ticket))
        }));
    }

    let mut parked = Vec::new();
    let mut turned_away = Vec::new();
    for arrival in arrivals {
        match arrival.await?? {
            (vehicle, Some(_)) => parked.push(vehicle.plate),
            (vehicle, None) => turned_away.push(vehicle),
        }
    }

    println!("\nArrivals: {} parked, {} turned away", parked.len(), turned_away.len());
    for vehicle in &turned_away {
        println!("- {} ({}) found no compatible spot", vehicle.plate, vehicle.size);
    }
    render_availability("Peak availability", &service.availability().await?);

    clock.advance(stay_duration(args.stay_hours));

    let mut departures = Vec::with_capacity(parked.len());
    for plate in parked {
        let service = service.clone();
        departures.push(tokio::spawn(async move { service.check_out(&plate).await }));
    }
    let mut receipts = Vec::with_capacity(departures.len());
    for departure in departures {
        receipts.push(departure.await??);
    }
    receipts.sort_by_key(|ticket| ticket.id);

    render_receipts(&receipts);
    render_availability("Closing availability", &service.availability().await?);
    Ok(())
}

pub(crate) async fn run_availability(args: AvailabilityArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = ParkingSessionService::new(
        Arc::new(InMemorySpotStore::new()),
        Arc::new(ManualClock::new(Utc::now())),
        config.rates.clone(),
    );
    service.initialize(&config.lot).await?;
    let entries = service.availability().await?;

    if args.json {
        let body = serde_json::to_string_pretty(&entries).map_err(std::io::Error::from)?;
        println!("{body}");
    } else {
        render_availability("Availability", &entries);
    }
    Ok(())
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let fees = FeeCalculator::new(config.rates);
    let fee = fees
        .compute_fee(args.vehicle, args.hours)
        .map_err(SessionServiceError::from)?;
    println!("{} parked for {:.2} hours: ${}", args.vehicle, args.hours, fee);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::MAX_STAY_HOURS;

    #[test]
    fn fleet_lists_buses_first_with_kind_prefixed_plates() {
        let args = DemoArgs {
            motorcycles: 1,
            cars: 2,
            buses: 1,
            stay_hours: 1.0,
        };
        let plates: Vec<String> = fleet(&args)
            .into_iter()
            .map(|vehicle| vehicle.plate.0)
            .collect();
        assert_eq!(plates, vec!["BUS-001", "CAR-001", "CAR-002", "MOTORCYCLE-001"]);
    }

    #[test]
    fn stay_duration_converts_fractional_hours() {
        assert_eq!(stay_duration(2.5), Duration::minutes(150));
        assert_eq!(stay_duration(0.0), Duration::zero());
        assert_eq!(
            stay_duration(MAX_STAY_HOURS),
            Duration::hours(MAX_STAY_HOURS as i64)
        );
    }
}
