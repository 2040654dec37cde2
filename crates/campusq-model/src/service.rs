//! Service directory: the catalog collaborator, reduced to what the
//! models need.
//!
//! The directory owns service identity, kind, and open/closed status.
//! Status gates new tokens and bookings; everything else about a service
//! (icons, descriptions, rendering) belongs to the UI layer and is
//! carried here only as display metadata.

/// How a service is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Walk-up token queue (mess halls, gates, gyms).
    Queue,
    /// Time-slot appointment booking (staff offices).
    Appointment,
}

/// Whether a service currently accepts new tokens/bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Open,
    Closed,
}

/// One campus service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Unique id, used in every storage key touching this service.
    pub id: String,
    /// Human-readable name, joined into booking summaries.
    pub name: String,
    pub kind: ServiceKind,
    pub status: ServiceStatus,
    pub description: String,
}

impl Service {
    /// Convenience constructor used by the seed catalog and tests.
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        kind: ServiceKind,
        status: ServiceStatus,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            kind,
            status,
            description: description.to_owned(),
        }
    }
}

/// Lookup table of known services.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    services: Vec<Service>,
}

impl Directory {
    /// An empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from an explicit service list.
    #[must_use]
    pub fn from_services(services: Vec<Service>) -> Self {
        Self { services }
    }

    /// The stock campus catalog the original deployment ships with.
    #[must_use]
    pub fn campus() -> Self {
        use ServiceKind::{Appointment, Queue};
        use ServiceStatus::{Closed, Open};
        Self::from_services(vec![
            Service::new(
                "mens-mess-1",
                "Men's Mess 1",
                Queue,
                Open,
                "Join the queue for the main men's mess.",
            ),
            Service::new(
                "womens-mess-1",
                "Women's Mess 1",
                Queue,
                Open,
                "Queue up for the main women's mess.",
            ),
            Service::new(
                "main-gym",
                "Main Gym",
                Queue,
                Closed,
                "Check gym occupancy and join the waitlist.",
            ),
            Service::new(
                "hod-cse",
                "HOD - CSE Dept.",
                Appointment,
                Open,
                "Book an appointment with the Head of Department.",
            ),
            Service::new(
                "proctor-jane",
                "Proctor - Jane Doe",
                Appointment,
                Open,
                "Schedule a meeting with your proctor.",
            ),
            Service::new(
                "admin-office",
                "Admin Office",
                Appointment,
                Closed,
                "Book a slot for administrative services.",
            ),
            Service::new(
                "out-pass-gate-1",
                "Out-Pass Gate 1",
                Queue,
                Open,
                "Join the queue for out-pass verification.",
            ),
        ])
    }

    /// Look up a service by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Whether `id` names a known, currently open service.
    ///
    /// Unknown ids read as not open, so mutations against them are
    /// rejected rather than creating orphan state.
    #[must_use]
    pub fn is_open(&self, id: &str) -> bool {
        self.find(id)
            .is_some_and(|s| s.status == ServiceStatus::Open)
    }

    /// All services, in catalog order.
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }
}
