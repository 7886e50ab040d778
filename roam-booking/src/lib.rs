pub mod availability;
pub mod error;
pub mod manager;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod repository;
pub mod views;

pub use availability::AvailabilityChecker;
pub use error::{LifecycleError, LifecycleResult};
pub use manager::{LifecycleManager, NewHostBooking, NewPackageBooking, StatusDecision, TransitionOutcome};
pub use models::{
    BookingStatus, CancelledBy, CustomerSnapshot, GatewayReceipt, PaymentMethod, PaymentStatus, Reservation,
    ReservationKind, TransitionError,
};
pub use notifications::{FailingNotifier, RecordingNotifier, SideEffectError, SideEffectHandle, SideEffects};
pub use orchestrator::{PaymentConfirmation, PaymentOrchestrator, StaticGateway};
pub use repository::{ReservationFilter, ReservationRepository};
pub use views::{reservation_json, BookingSummary};
