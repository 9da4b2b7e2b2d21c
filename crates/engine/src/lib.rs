pub use audit::{AuditAction, AuditEntity, AuditEntry};
pub use bookings::{ACTIVE_STATUSES, Booking, BookingStatus, MAX_HEADCOUNT};
pub use cadastur::NameComparison;
pub use commands::{
    AuditFilter, BookingFilter, BookingPatch, ExpeditionFilter, ExpeditionNew, ExpeditionPatch,
    MediaNew, Page, PaymentCapture, PaymentRefund, ReserveCmd, ReviewNew, SignupCmd, TrailFilter,
    TrailNew, TrailPatch, UserFilter, UserPatch,
};
pub use commission::{Commission, CommissionRates, CommissionSource, DEFAULT_COMMISSION_BPS};
pub use currency::Currency;
pub use dashboard::{BookingCounts, DashboardMetrics, Revenue};
pub use error::EngineError;
pub use expeditions::{Availability, Expedition, ExpeditionStatus};
pub use media::{Media, MediaKind};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, TrailState};
pub use password::DEFAULT_PASSWORD_COST;
pub use payments::{Payment, PaymentMethod, PaymentStatus};
pub use refund::{RefundQuote, RefundWindow};
pub use retry::RetryPolicy;
pub use reviews::Review;
pub use trails::{Difficulty, Trail};
pub use users::{Actor, Role, User};

mod audit;
mod bookings;
pub mod cadastur;
mod commands;
pub mod commission;
mod currency;
mod dashboard;
mod error;
mod expeditions;
mod locks;
mod media;
mod money;
mod ops;
mod password;
mod payments;
pub mod refund;
mod retry;
mod reviews;
mod trails;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
