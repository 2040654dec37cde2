//! Per-service appointment slot booking.
//!
//! Each appointment service persists one JSON array of
//! `{"time": "...", "studentId": "..."}` records under
//! `appointments_{service}`. Slots come from a fixed time-of-day catalog;
//! the slot strings are parsed as times on an arbitrary reference day for
//! ordering only; no real dates are involved anywhere.
//!
//! # Invariants
//!
//! 1. At most one booking per (service, slot): a second booking for a
//!    taken slot is rejected and the stored list is unchanged.
//! 2. Bookings are append-only in this scope; cancellation is out of
//!    scope.
//! 3. Undecodable stored JSON degrades to an empty list, never an error.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Slot already taken | Earlier booking | `Err(SlotTaken)` |
//! | Service closed/unknown | Status gate | `Err(ServiceClosed)` |
//! | Slot not in catalog | Caller typo | `Err(UnknownSlot)` |
//! | Corrupt stored JSON | External tampering | Reads as empty list (logged) |
//! | Concurrent book in two tabs | Read-then-write race | Both may persist; last write wins |

use std::cmp::Ordering;

use campusq_store::keys::{appointments_key, APPOINTMENTS_PREFIX};
use campusq_store::{KeyValueStore, StoreError};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::service::Directory;

/// The fixed slot catalog, in display order. Not derived from bookings.
pub const TIME_SLOTS: [&str; 9] = [
    "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM", "02:00 PM", "02:30 PM", "03:00 PM",
    "03:30 PM", "04:00 PM",
];

/// A time-of-day slot label such as `"10:30 AM"`.
///
/// Ordering parses the label as a 12-hour clock time; labels that fail
/// to parse sort after every valid one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTime(String);

impl SlotTime {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Minutes since midnight, or `None` for a malformed label.
    #[must_use]
    pub fn minutes_of_day(&self) -> Option<u32> {
        use chrono::Timelike;
        let t = NaiveTime::parse_from_str(&self.0, "%I:%M %p").ok()?;
        Some(t.hour() * 60 + t.minute())
    }

    /// Whether the label is one of the nine catalog slots.
    #[must_use]
    pub fn in_catalog(&self) -> bool {
        TIME_SLOTS.contains(&self.0.as_str())
    }

    fn sort_key(&self) -> u32 {
        self.minutes_of_day().unwrap_or(u32::MAX)
    }
}

impl PartialOrd for SlotTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SlotTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl std::fmt::Display for SlotTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted booking, in the stored wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Slot label (catalog form, e.g. `"02:30 PM"`).
    pub time: String,
    /// The booking student's identity string.
    #[serde(rename = "studentId")]
    pub student_id: String,
}

/// A booking joined with its service, as shown on "my appointments".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSummary {
    pub service_id: String,
    pub service_name: String,
    pub slot: SlotTime,
}

/// Expected rejections and storage faults from booking operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// The slot already has a booking for this service.
    SlotTaken { service: String, slot: String },
    /// The service is closed (or unknown) and accepts no bookings.
    ServiceClosed { service: String },
    /// The slot label is not in the fixed catalog.
    UnknownSlot { slot: String },
    /// The underlying write failed; persisted state is unchanged.
    Storage(StoreError),
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlotTaken { service, slot } => {
                write!(f, "slot {slot} for '{service}' is already booked")
            }
            Self::ServiceClosed { service } => {
                write!(f, "service '{service}' is not accepting bookings")
            }
            Self::UnknownSlot { slot } => write!(f, "unknown slot label '{slot}'"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl std::error::Error for BookingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err)
    }
}

/// Appointment booking model for one service.
#[derive(Debug, Clone)]
pub struct BookingModel<S> {
    store: S,
    directory: Directory,
    service: String,
}

impl<S: KeyValueStore> BookingModel<S> {
    /// Create a model over `store` for the service named `service_id`.
    #[must_use]
    pub fn new(store: S, directory: Directory, service_id: &str) -> Self {
        Self {
            store,
            directory,
            service: service_id.to_owned(),
        }
    }

    /// The service this model reads and writes.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service
    }

    /// The fixed slot catalog, in order.
    #[must_use]
    pub fn list_slots() -> Vec<SlotTime> {
        TIME_SLOTS.iter().map(|slot| SlotTime::new(*slot)).collect()
    }

    /// All bookings for this service. Corrupt stored JSON reads as empty.
    #[must_use]
    pub fn bookings(&self) -> Vec<BookingRecord> {
        decode_bookings(&self.store, &self.service)
    }

    /// Whether `slot` already has a booking.
    #[must_use]
    pub fn is_slot_taken(&self, slot: &str) -> bool {
        self.bookings().iter().any(|b| b.time == slot)
    }

    /// Catalog slots with no booking yet, in order.
    #[must_use]
    pub fn open_slots(&self) -> Vec<SlotTime> {
        let taken = self.bookings();
        TIME_SLOTS
            .iter()
            .filter(|slot| !taken.iter().any(|b| b.time == **slot))
            .map(|slot| SlotTime::new(*slot))
            .collect()
    }

    /// Book `slot` for `student`.
    ///
    /// The free-check and the append are a read-then-write pair with no
    /// atomicity across contexts; two tabs can both see the slot free
    /// and both "succeed", with the later write winning. Same gap as
    /// token issuance, same verdict: documented, not handled.
    pub fn book_slot(&self, slot: &str, student: &str) -> Result<(), BookingError> {
        if !TIME_SLOTS.contains(&slot) {
            return Err(BookingError::UnknownSlot { slot: slot.into() });
        }
        if !self.directory.is_open(&self.service) {
            return Err(BookingError::ServiceClosed {
                service: self.service.clone(),
            });
        }

        let mut bookings = self.bookings();
        if bookings.iter().any(|b| b.time == slot) {
            return Err(BookingError::SlotTaken {
                service: self.service.clone(),
                slot: slot.into(),
            });
        }

        bookings.push(BookingRecord {
            time: slot.into(),
            student_id: student.into(),
        });
        self.write_bookings(&bookings)?;
        debug!(service = %self.service, slot, student, "slot booked");
        Ok(())
    }

    fn write_bookings(&self, bookings: &[BookingRecord]) -> Result<(), StoreError> {
        // Serializing Vec<BookingRecord> cannot fail; fall back to "[]"
        // rather than panic if it ever does.
        let json =
            serde_json::to_string(bookings).unwrap_or_else(|_| String::from("[]"));
        self.store.set(&appointments_key(&self.service), &json)
    }
}

fn decode_bookings<S: KeyValueStore>(store: &S, service: &str) -> Vec<BookingRecord> {
    let Some(raw) = store.get(&appointments_key(service)) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(bookings) => bookings,
        Err(err) => {
            warn!(service, %err, "discarding undecodable booking list");
            Vec::new()
        }
    }
}

/// Every booking `student` holds, across all services, sorted by slot
/// time ascending.
///
/// Scans the whole namespace for `appointments_*` keys; the store has
/// no per-user index. Keys for services missing from the directory are
/// skipped.
#[must_use]
pub fn my_bookings<S: KeyValueStore>(
    store: &S,
    directory: &Directory,
    student: &str,
) -> Vec<BookingSummary> {
    let mut out = Vec::new();
    for key in store.keys() {
        if !key.starts_with(APPOINTMENTS_PREFIX) {
            continue;
        }
        let Some(service) = campusq_store::keys::service_of_appointments_key(&key) else {
            continue;
        };
        let Some(service) = directory.find(service) else {
            continue;
        };
        for booking in decode_bookings(store, &service.id) {
            if booking.student_id == student {
                out.push(BookingSummary {
                    service_id: service.id.clone(),
                    service_name: service.name.clone(),
                    slot: SlotTime::new(booking.time),
                });
            }
        }
    }
    out.sort_by(|a, b| a.slot.cmp(&b.slot));
    out
}

/// Seed the demo booking lists the original deployment ships with.
///
/// Writes only when a service has no stored list yet, so real bookings
/// are never clobbered.
pub fn seed_demo_bookings<S: KeyValueStore>(store: &S) -> Result<(), StoreError> {
    let seeds: [(&str, &[(&str, &str)]); 3] = [
        (
            "hod-cse",
            &[
                ("10:30 AM", "Student ID 12345"),
                ("02:00 PM", "Student ID 67890"),
            ],
        ),
        ("proctor-jane", &[("11:00 AM", "Student ID 54321")]),
        ("admin-office", &[]),
    ];
    for (service, entries) in seeds {
        let key = appointments_key(service);
        if store.get(&key).is_some() {
            continue;
        }
        let bookings: Vec<BookingRecord> = entries
            .iter()
            .map(|(time, student)| BookingRecord {
                time: (*time).to_owned(),
                student_id: (*student).to_owned(),
            })
            .collect();
        let json =
            serde_json::to_string(&bookings).unwrap_or_else(|_| String::from("[]"));
        store.set(&key, &json)?;
    }
    Ok(())
}
