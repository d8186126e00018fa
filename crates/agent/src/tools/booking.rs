//! In-memory booking store and the argument shapes of the booking tools

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Rescheduled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Rescheduled => "rescheduled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "rescheduled" => Ok(Self::Rescheduled),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub service_type: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: u32,
    pub customer_name: String,
    pub customer_email: String,
    pub notes: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_duration() -> u32 {
    60
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBookingArgs {
    pub service_type: String,
    pub date: String,
    pub time: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: String,
}

/// Only the fields that are present change. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBookingArgs {
    pub booking_id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `status` accepts any [`BookingStatus`] or `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(BookingStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: BookingStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "" | "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetBookingArgs {
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<StatusFilter>,
}

impl GetBookingArgs {
    /// Booking id to look up, if one was supplied
    pub fn lookup_id(&self) -> Option<&str> {
        non_empty(&self.booking_id)
    }

    fn matches(&self, booking: &Booking) -> bool {
        non_empty(&self.customer_email).map_or(true, |email| booking.customer_email == email)
            && non_empty(&self.date).map_or(true, |date| booking.date == date)
            && self.status.unwrap_or_default().matches(booking.status)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Bookings in insertion order behind one lock.
///
/// Clones share the same underlying store.
#[derive(Debug, Clone, Default)]
pub struct BookingStore {
    bookings: Arc<Mutex<Vec<Booking>>>,
}

impl BookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Booking>> {
        self.bookings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(&self, args: CreateBookingArgs) -> Booking {
        let now = Utc::now();
        let booking = Booking {
            booking_id: Uuid::new_v4().to_string(),
            service_type: args.service_type,
            date: args.date,
            time: args.time,
            duration_minutes: args.duration_minutes,
            customer_name: args.customer_name,
            customer_email: args.customer_email,
            notes: args.notes,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };

        self.lock().push(booking.clone());
        debug!("booking {} created", booking.booking_id);
        booking
    }

    /// Apply the supplied fields. Returns the updated booking and the names
    /// of the fields that changed, or `None` for an unknown id.
    pub fn update(&self, args: UpdateBookingArgs) -> Option<(Booking, Vec<&'static str>)> {
        let mut bookings = self.lock();
        let booking = bookings
            .iter_mut()
            .find(|b| b.booking_id == args.booking_id)?;

        let mut updated = Vec::new();
        if let Some(date) = args.date {
            booking.date = date;
            updated.push("date");
        }
        if let Some(time) = args.time {
            booking.time = time;
            updated.push("time");
        }
        if let Some(duration) = args.duration_minutes {
            booking.duration_minutes = duration;
            updated.push("duration_minutes");
        }
        if let Some(status) = args.status {
            booking.status = status;
            updated.push("status");
        }
        if let Some(notes) = args.notes {
            booking.notes = notes;
            updated.push("notes");
        }
        booking.updated_at = Utc::now();

        debug!("booking {} updated: {:?}", booking.booking_id, updated);
        Some((booking.clone(), updated))
    }

    pub fn get(&self, booking_id: &str) -> Option<Booking> {
        self.lock()
            .iter()
            .find(|b| b.booking_id == booking_id)
            .cloned()
    }

    /// All bookings passing the filters, in insertion order
    pub fn find(&self, filter: &GetBookingArgs) -> Vec<Booking> {
        self.lock()
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Booking> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Insert the demo booking: a personal training session two days out.
    pub fn seed_sample(&self) -> Booking {
        let date = (Local::now() + Duration::days(2))
            .format("%Y-%m-%d")
            .to_string();

        self.create(CreateBookingArgs {
            service_type: "personal_training".to_string(),
            date,
            time: "10:00".to_string(),
            customer_name: "John Doe".to_string(),
            customer_email: "john@example.com".to_string(),
            duration_minutes: default_duration(),
            notes: "First session".to_string(),
        })
    }
}
