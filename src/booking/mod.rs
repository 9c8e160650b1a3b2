//! The booking form: trip options, contact details and submission.

use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking;
use crate::error::{AppError, AppResult};
use crate::locations::resolver::LocationResolver;
use crate::locations::{LocationRole, ResolvedLocation, MAX_STOPS};
use crate::payment::{is_plausible_email, PaymentMethod, PaymentRegistry};
use crate::routing::{RouteDistance, RouteDistanceCalculator};

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const REFERENCE_LEN: usize = 8;
const MIN_HOURLY_HOURS: u32 = 2;
const MAX_HOURLY_HOURS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Sedan,
    Suv,
    Van,
    Sprinter,
    Limousine,
}

impl VehicleType {
    pub fn passenger_capacity(self) -> u32 {
        match self {
            VehicleType::Sedan => 3,
            VehicleType::Suv => 6,
            VehicleType::Van => 10,
            VehicleType::Sprinter => 14,
            VehicleType::Limousine => 8,
        }
    }

    pub fn luggage_capacity(self) -> u32 {
        match self {
            VehicleType::Sedan => 3,
            VehicleType::Suv => 6,
            VehicleType::Van => 10,
            VehicleType::Sprinter => 14,
            VehicleType::Limousine => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Sedan => "sedan",
            VehicleType::Suv => "suv",
            VehicleType::Van => "van",
            VehicleType::Sprinter => "sprinter",
            VehicleType::Limousine => "limousine",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripType {
    OneWay,
    RoundTrip { return_at: DateTime<Utc> },
    Hourly { hours: u32 },
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one_way",
            TripType::RoundTrip { .. } => "round_trip",
            TripType::Hourly { .. } => "hourly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Everything the customer submits. Also the shape of a saved draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingForm {
    pub contact: ContactDetails,
    pub pickup: ResolvedLocation,
    pub dropoff: ResolvedLocation,
    #[serde(default)]
    pub stops: Vec<ResolvedLocation>,
    pub vehicle: VehicleType,
    pub trip: TripType,
    pub passengers: u32,
    #[serde(default)]
    pub luggage: u32,
    pub pickup_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub payment: PaymentMethod,
}

impl BookingForm {
    pub fn validate(&self, payments: &PaymentRegistry, now: DateTime<Utc>) -> AppResult<()> {
        let contact = &self.contact;
        if contact.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        if !is_plausible_email(&contact.email) {
            return Err(AppError::BadRequest("A valid email is required".to_string()));
        }
        if contact.phone.chars().filter(|c| c.is_ascii_digit()).count() < 7 {
            return Err(AppError::BadRequest("A valid phone number is required".to_string()));
        }

        check_location(&self.pickup, LocationRole::Pickup, "Pickup")?;
        check_location(&self.dropoff, LocationRole::Dropoff, "Dropoff")?;
        if self.stops.len() > MAX_STOPS as usize {
            return Err(AppError::BadRequest(format!(
                "At most {} stops are allowed",
                MAX_STOPS
            )));
        }
        for stop in &self.stops {
            check_location(stop, LocationRole::Stop, "Stop")?;
        }

        if self.passengers == 0 {
            return Err(AppError::BadRequest(
                "At least 1 passenger is required".to_string(),
            ));
        }
        if self.passengers > self.vehicle.passenger_capacity() {
            return Err(AppError::BadRequest(format!(
                "A {} seats at most {} passengers",
                self.vehicle.as_str(),
                self.vehicle.passenger_capacity()
            )));
        }
        if self.luggage > self.vehicle.luggage_capacity() {
            return Err(AppError::BadRequest(format!(
                "A {} holds at most {} bags",
                self.vehicle.as_str(),
                self.vehicle.luggage_capacity()
            )));
        }

        if self.pickup_at <= now {
            return Err(AppError::BadRequest(
                "Pickup time must be in the future".to_string(),
            ));
        }
        match self.trip {
            TripType::OneWay => {}
            TripType::RoundTrip { return_at } if return_at <= self.pickup_at => {
                return Err(AppError::BadRequest(
                    "Return time must be after pickup time".to_string(),
                ));
            }
            TripType::RoundTrip { .. } => {}
            TripType::Hourly { hours }
                if !(MIN_HOURLY_HOURS..=MAX_HOURLY_HOURS).contains(&hours) =>
            {
                return Err(AppError::BadRequest(format!(
                    "Hourly bookings must be between {} and {} hours",
                    MIN_HOURLY_HOURS, MAX_HOURLY_HOURS
                )));
            }
            TripType::Hourly { .. } => {}
        }

        payments
            .validate(&self.payment, now.date_naive())
            .map_err(AppError::BadRequest)
    }

    /// Replace every client-supplied location with its server-side rebuild.
    pub async fn verified(mut self, resolver: &LocationResolver) -> AppResult<Self> {
        self.pickup = verify_location(resolver, &self.pickup, "Pickup").await?;
        self.dropoff = verify_location(resolver, &self.dropoff, "Dropoff").await?;
        let mut stops = Vec::with_capacity(self.stops.len());
        for stop in &self.stops {
            stops.push(verify_location(resolver, stop, "Stop").await?);
        }
        self.stops = stops;
        Ok(self)
    }
}

/// Admin ids the index does not know are rejected outright.
pub async fn verify_location(
    resolver: &LocationResolver,
    location: &ResolvedLocation,
    label: &str,
) -> AppResult<ResolvedLocation> {
    resolver.verify(location).await.ok_or_else(|| {
        AppError::BadRequest(format!("{} location is not a known admin location", label))
    })
}

fn check_location(location: &ResolvedLocation, role: LocationRole, label: &str) -> AppResult<()> {
    if location.role != role {
        return Err(AppError::BadRequest(format!(
            "{} location has role {:?}",
            label, location.role
        )));
    }
    if !location.is_validated() {
        return Err(AppError::BadRequest(format!(
            "{} location must be selected from the suggestions",
            label
        )));
    }
    Ok(())
}

pub fn generate_reference<R: Rng>(rng: &mut R) -> String {
    (0..REFERENCE_LEN)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect()
}

/// Stored booking as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    pub id: Uuid,
    pub reference: String,
    pub contact: ContactDetails,
    pub pickup: ResolvedLocation,
    pub dropoff: ResolvedLocation,
    pub stops: Vec<ResolvedLocation>,
    pub distance_yards: i64,
    pub vehicle: String,
    pub trip: TripType,
    pub passengers: i32,
    pub luggage: i32,
    pub pickup_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub payment: PaymentMethod,
    pub payment_summary: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn from_model(model: booking::Model, payments: &PaymentRegistry) -> AppResult<Self> {
        let decode = |what: &str, e: serde_json::Error| {
            AppError::Internal(format!("Stored booking {} has malformed {}: {}", model.id, what, e))
        };

        let pickup =
            serde_json::from_value(model.pickup.clone()).map_err(|e| decode("pickup", e))?;
        let dropoff =
            serde_json::from_value(model.dropoff.clone()).map_err(|e| decode("dropoff", e))?;
        let stops =
            serde_json::from_value(model.stops.clone()).map_err(|e| decode("stops", e))?;
        let payment: PaymentMethod =
            serde_json::from_value(model.payment.clone()).map_err(|e| decode("payment", e))?;

        let trip = match (model.trip_type.as_str(), model.return_at, model.hourly_hours) {
            ("round_trip", Some(return_at), _) => TripType::RoundTrip {
                return_at: return_at.with_timezone(&Utc),
            },
            ("hourly", _, Some(hours)) => TripType::Hourly {
                hours: hours.max(0) as u32,
            },
            ("one_way", _, _) => TripType::OneWay,
            (other, _, _) => {
                return Err(AppError::Internal(format!(
                    "Stored booking {} has unknown trip type {}",
                    model.id, other
                )));
            }
        };

        let payment_summary = payments.render(&payment).map_err(AppError::Internal)?;

        Ok(Self {
            id: model.id,
            reference: model.reference,
            contact: ContactDetails {
                name: model.customer_name,
                email: model.customer_email,
                phone: model.customer_phone,
            },
            pickup,
            dropoff,
            stops,
            distance_yards: model.distance_yards,
            vehicle: model.vehicle_type,
            trip,
            passengers: model.passengers,
            luggage: model.luggage,
            pickup_at: model.pickup_at.with_timezone(&Utc),
            notes: model.notes,
            payment,
            payment_summary,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

/// Verify the locations, validate the form, measure the route and store the booking.
pub async fn submit(
    db: &DatabaseConnection,
    resolver: &LocationResolver,
    calculator: &RouteDistanceCalculator,
    payments: &PaymentRegistry,
    form: BookingForm,
) -> AppResult<(booking::Model, RouteDistance)> {
    let form = form.verified(resolver).await?;
    form.validate(payments, Utc::now())?;

    let distance = calculator
        .distance_between(&form.pickup, &form.dropoff, &form.stops)
        .await?;

    let reference = unused_reference(db).await?;
    let to_json = |value: serde_json::Result<serde_json::Value>| {
        value.map_err(|e| AppError::Internal(format!("Failed to encode booking: {}", e)))
    };

    let (return_at, hourly_hours): (Option<DateTimeWithTimeZone>, Option<i32>) = match form.trip {
        TripType::OneWay => (None, None),
        TripType::RoundTrip { return_at } => (Some(return_at.into()), None),
        TripType::Hourly { hours } => (None, Some(hours as i32)),
    };

    let new_booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        reference: Set(reference),
        customer_name: Set(form.contact.name.trim().to_string()),
        customer_email: Set(form.contact.email.trim().to_string()),
        customer_phone: Set(form.contact.phone.trim().to_string()),
        pickup: Set(to_json(serde_json::to_value(&form.pickup))?),
        dropoff: Set(to_json(serde_json::to_value(&form.dropoff))?),
        stops: Set(to_json(serde_json::to_value(&form.stops))?),
        distance_yards: Set(distance.yards),
        vehicle_type: Set(form.vehicle.as_str().to_string()),
        trip_type: Set(form.trip.as_str().to_string()),
        passengers: Set(form.passengers as i32),
        luggage: Set(form.luggage as i32),
        pickup_at: Set(form.pickup_at.into()),
        return_at: Set(return_at),
        hourly_hours: Set(hourly_hours),
        notes: Set(form.notes.filter(|n| !n.trim().is_empty())),
        payment: Set(to_json(serde_json::to_value(&form.payment))?),
        status: Set("pending".to_string()),
        created_at: Set(Utc::now().into()),
    };

    let booking = new_booking.insert(db).await?;
    tracing::info!(
        booking_id = %booking.id,
        reference = %booking.reference,
        distance_yards = booking.distance_yards,
        "Booking created"
    );

    Ok((booking, distance))
}

async fn unused_reference(db: &DatabaseConnection) -> AppResult<String> {
    for _ in 0..5 {
        let reference = generate_reference(&mut rand::thread_rng());
        let existing = booking::Entity::find()
            .filter(booking::Column::Reference.eq(&reference))
            .one(db)
            .await?;
        if existing.is_none() {
            return Ok(reference);
        }
    }
    Err(AppError::Internal(
        "Failed to allocate a booking reference".to_string(),
    ))
}
