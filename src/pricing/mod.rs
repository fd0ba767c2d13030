//! Tariff table and price calculator.
//!
//! The calculator is pure and deterministic: identical inputs always yield an
//! identical breakdown. Every persistence path recomputes the price here and
//! rejects the booking if pricing fails — client-supplied totals are never
//! trusted.

use crate::{
    domain::{PriceBreakdown, ServiceType, VehicleClass},
    error::{AppError, Result},
};

/// Flat surcharge for airport pickups and dropoffs, in cents.
pub const AIRPORT_FEE_CENTS: i64 = 500;

/// Per-seat charge for child seats, in cents.
pub const CHILD_SEAT_CENTS: i64 = 500;

pub struct Tariff {
    pub base_cents: i64,
    pub per_km_cents: i64,
    pub per_hour_cents: i64,
    pub max_passengers: i64,
}

impl VehicleClass {
    pub fn tariff(&self) -> Tariff {
        match self {
            VehicleClass::Sedan => Tariff {
                base_cents: 2500,
                per_km_cents: 100,
                per_hour_cents: 4000,
                max_passengers: 3,
            },
            VehicleClass::Estate => Tariff {
                base_cents: 3000,
                per_km_cents: 120,
                per_hour_cents: 4500,
                max_passengers: 4,
            },
            VehicleClass::Minivan => Tariff {
                base_cents: 4500,
                per_km_cents: 150,
                per_hour_cents: 6000,
                max_passengers: 6,
            },
            VehicleClass::Minibus => Tariff {
                base_cents: 6500,
                per_km_cents: 190,
                per_hour_cents: 8000,
                max_passengers: 8,
            },
        }
    }
}

/// Computes the authoritative price for a trip.
///
/// Routed services charge base fare plus a per-km distance charge; hourly
/// hire charges base fare plus a started-hour rate. Fails when no vehicle is
/// selected, when a routed trip has no positive distance, or when the
/// resulting total is not positive.
pub fn quote(
    service_type: ServiceType,
    vehicle: Option<VehicleClass>,
    distance_km: f64,
    duration_min: i64,
    child_seats: i64,
) -> Result<PriceBreakdown> {
    let vehicle =
        vehicle.ok_or_else(|| AppError::Validation("Please select a vehicle".to_string()))?;
    let tariff = vehicle.tariff();

    let distance_cents = match service_type {
        ServiceType::AirportTransfer | ServiceType::Intercity => {
            if distance_km <= 0.0 || !distance_km.is_finite() {
                return Err(AppError::Validation(
                    "Unable to price this route".to_string(),
                ));
            }
            (distance_km * tariff.per_km_cents as f64).round() as i64
        }
        ServiceType::Hourly => {
            let hours = (duration_min.max(0) + 59) / 60;
            tariff.per_hour_cents * hours.max(1)
        }
    };

    let airport_fee_cents = match service_type {
        ServiceType::AirportTransfer => AIRPORT_FEE_CENTS,
        _ => 0,
    };

    let child_seat_cents = CHILD_SEAT_CENTS * child_seats.max(0);

    let total_cents =
        tariff.base_cents + distance_cents + airport_fee_cents + child_seat_cents;
    if total_cents <= 0 {
        return Err(AppError::Validation(
            "Unable to price this route".to_string(),
        ));
    }

    Ok(PriceBreakdown {
        base_cents: tariff.base_cents,
        distance_cents,
        airport_fee_cents,
        child_seat_cents,
        total_cents,
    })
}
