use aerocab::{
    domain::{
        generate_booking_reference, Booking, BookingStatus, PaymentMethod, PaymentStatus,
        ServiceType, VehicleClass,
    },
    pricing,
    repository::{BookingRepository, SqliteBookingRepository},
};
use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::{internet::en::SafeEmail, name::en::Name, phone_number::en::PhoneNumber},
    Fake,
};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::sqlite::SqlitePoolOptions;

#[derive(Parser)]
#[command(about = "Seed the bookings database with demo data")]
struct Args {
    /// Number of bookings to create
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// Database URL (falls back to DATABASE_URL, then sqlite:aerocab.db)
    #[arg(long)]
    database_url: Option<String>,
}

const PICKUP_ADDRESSES: &[&str] = &[
    "Lisbon Airport Terminal 1",
    "Porto Airport Arrivals",
    "Faro Airport Terminal",
    "Av. da Liberdade 120, Lisbon",
    "Rua de Santa Catarina 45, Porto",
];

const DROPOFF_ADDRESSES: &[&str] = &[
    "Hotel Avenida Palace, Lisbon",
    "Praia da Rocha, Portimão",
    "Cascais Marina",
    "Ribeira Square, Porto",
    "Albufeira Old Town",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("Seeding {} demo bookings...", args.count);

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:aerocab.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let repo = SqliteBookingRepository::new(db_pool.clone());
    let mut rng = rand::thread_rng();

    for i in 0..args.count {
        let service_type = *[
            ServiceType::AirportTransfer,
            ServiceType::Intercity,
            ServiceType::Hourly,
        ]
        .choose(&mut rng)
        .unwrap();
        let vehicle = *[
            VehicleClass::Sedan,
            VehicleClass::Estate,
            VehicleClass::Minivan,
            VehicleClass::Minibus,
        ]
        .choose(&mut rng)
        .unwrap();

        let distance_km = rng.gen_range(5.0..80.0_f64).round();
        let duration_min = rng.gen_range(20..180);
        let child_seats = rng.gen_range(0..3);
        let price = pricing::quote(
            service_type,
            Some(vehicle),
            distance_km,
            duration_min,
            child_seats,
        )?;

        let requires_route = service_type.requires_route();
        let now = Utc::now();
        let booking = Booking {
            id: generate_booking_reference(),
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            booking_status: BookingStatus::Confirmed,
            stripe_session_id: None,
            stripe_payment_intent: None,
            service_type,
            pickup_address: PICKUP_ADDRESSES.choose(&mut rng).unwrap().to_string(),
            pickup_lat: None,
            pickup_lng: None,
            dropoff_address: requires_route
                .then(|| DROPOFF_ADDRESSES.choose(&mut rng).unwrap().to_string()),
            dropoff_lat: None,
            dropoff_lng: None,
            pickup_at: now + Duration::days(rng.gen_range(1..14)),
            distance_km,
            duration_min,
            vehicle,
            passengers: rng.gen_range(1..5),
            luggage: rng.gen_range(0..4),
            child_seats,
            price,
            currency: "EUR".to_string(),
            customer_name: Name().fake(),
            customer_email: SafeEmail().fake(),
            customer_phone: PhoneNumber().fake(),
            flight_number: matches!(service_type, ServiceType::AirportTransfer)
                .then(|| format!("TP{}", rng.gen_range(1000..9999))),
            special_requests: None,
            created_at: now,
            updated_at: now,
        };

        let created = repo.create(booking).await?;
        println!(
            "  [{}/{}] {} — {} ({} EUR)",
            i + 1,
            args.count,
            created.id,
            created.pickup_address,
            created.price.total_display()
        );
    }

    println!("Done.");
    Ok(())
}
