//! Mapping between engine values and wire types.

use api_types::{
    admin::{AuditAction, AuditEntity},
    booking::{BookingStatus, CommissionSource},
    expedition::ExpeditionStatus,
    media::MediaKind,
    payment::{PaymentMethod, PaymentStatus},
    trail::Difficulty,
    user::Role,
};

pub(crate) fn currency_from_api(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Brl => engine::Currency::Brl,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Eur => engine::Currency::Eur,
    }
}

pub(crate) fn currency_to_api(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Brl => api_types::Currency::Brl,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Eur => api_types::Currency::Eur,
    }
}

pub(crate) fn role_from_api(role: Role) -> engine::Role {
    match role {
        Role::Admin => engine::Role::Admin,
        Role::Guide => engine::Role::Guide,
        Role::Trekker => engine::Role::Trekker,
    }
}

pub(crate) fn role_to_api(role: engine::Role) -> Role {
    match role {
        engine::Role::Admin => Role::Admin,
        engine::Role::Guide => Role::Guide,
        engine::Role::Trekker => Role::Trekker,
    }
}

pub(crate) fn difficulty_from_api(difficulty: Difficulty) -> engine::Difficulty {
    match difficulty {
        Difficulty::Easy => engine::Difficulty::Easy,
        Difficulty::Moderate => engine::Difficulty::Moderate,
        Difficulty::Hard => engine::Difficulty::Hard,
        Difficulty::Extreme => engine::Difficulty::Extreme,
    }
}

pub(crate) fn difficulty_to_api(difficulty: engine::Difficulty) -> Difficulty {
    match difficulty {
        engine::Difficulty::Easy => Difficulty::Easy,
        engine::Difficulty::Moderate => Difficulty::Moderate,
        engine::Difficulty::Hard => Difficulty::Hard,
        engine::Difficulty::Extreme => Difficulty::Extreme,
    }
}

pub(crate) fn expedition_status_from_api(status: ExpeditionStatus) -> engine::ExpeditionStatus {
    match status {
        ExpeditionStatus::Draft => engine::ExpeditionStatus::Draft,
        ExpeditionStatus::Published => engine::ExpeditionStatus::Published,
        ExpeditionStatus::Scheduled => engine::ExpeditionStatus::Scheduled,
        ExpeditionStatus::InProgress => engine::ExpeditionStatus::InProgress,
        ExpeditionStatus::Cancelled => engine::ExpeditionStatus::Cancelled,
        ExpeditionStatus::Completed => engine::ExpeditionStatus::Completed,
    }
}

pub(crate) fn expedition_status_to_api(status: engine::ExpeditionStatus) -> ExpeditionStatus {
    match status {
        engine::ExpeditionStatus::Draft => ExpeditionStatus::Draft,
        engine::ExpeditionStatus::Published => ExpeditionStatus::Published,
        engine::ExpeditionStatus::Scheduled => ExpeditionStatus::Scheduled,
        engine::ExpeditionStatus::InProgress => ExpeditionStatus::InProgress,
        engine::ExpeditionStatus::Cancelled => ExpeditionStatus::Cancelled,
        engine::ExpeditionStatus::Completed => ExpeditionStatus::Completed,
    }
}

pub(crate) fn booking_status_from_api(status: BookingStatus) -> engine::BookingStatus {
    match status {
        BookingStatus::Pending => engine::BookingStatus::Pending,
        BookingStatus::Confirmed => engine::BookingStatus::Confirmed,
        BookingStatus::Cancelled => engine::BookingStatus::Cancelled,
        BookingStatus::Refunded => engine::BookingStatus::Refunded,
    }
}

pub(crate) fn booking_status_to_api(status: engine::BookingStatus) -> BookingStatus {
    match status {
        engine::BookingStatus::Pending => BookingStatus::Pending,
        engine::BookingStatus::Confirmed => BookingStatus::Confirmed,
        engine::BookingStatus::Cancelled => BookingStatus::Cancelled,
        engine::BookingStatus::Refunded => BookingStatus::Refunded,
    }
}

pub(crate) fn commission_source_to_api(source: engine::CommissionSource) -> CommissionSource {
    match source {
        engine::CommissionSource::Global => CommissionSource::Global,
        engine::CommissionSource::GuideOverride => CommissionSource::GuideOverride,
        engine::CommissionSource::BookingOverride => CommissionSource::BookingOverride,
    }
}

pub(crate) fn media_kind_from_api(kind: MediaKind) -> engine::MediaKind {
    match kind {
        MediaKind::Image => engine::MediaKind::Image,
        MediaKind::Video => engine::MediaKind::Video,
    }
}

pub(crate) fn media_kind_to_api(kind: engine::MediaKind) -> MediaKind {
    match kind {
        engine::MediaKind::Image => MediaKind::Image,
        engine::MediaKind::Video => MediaKind::Video,
    }
}

pub(crate) fn payment_method_from_api(method: PaymentMethod) -> engine::PaymentMethod {
    match method {
        PaymentMethod::Pix => engine::PaymentMethod::Pix,
        PaymentMethod::CreditCard => engine::PaymentMethod::CreditCard,
        PaymentMethod::Boleto => engine::PaymentMethod::Boleto,
        PaymentMethod::BankTransfer => engine::PaymentMethod::BankTransfer,
        PaymentMethod::Cash => engine::PaymentMethod::Cash,
        PaymentMethod::Other => engine::PaymentMethod::Other,
    }
}

pub(crate) fn payment_method_to_api(method: engine::PaymentMethod) -> PaymentMethod {
    match method {
        engine::PaymentMethod::Pix => PaymentMethod::Pix,
        engine::PaymentMethod::CreditCard => PaymentMethod::CreditCard,
        engine::PaymentMethod::Boleto => PaymentMethod::Boleto,
        engine::PaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
        engine::PaymentMethod::Cash => PaymentMethod::Cash,
        engine::PaymentMethod::Other => PaymentMethod::Other,
    }
}

pub(crate) fn payment_status_to_api(status: engine::PaymentStatus) -> PaymentStatus {
    match status {
        engine::PaymentStatus::Paid => PaymentStatus::Paid,
        engine::PaymentStatus::Refunded => PaymentStatus::Refunded,
    }
}

pub(crate) fn audit_action_from_api(action: AuditAction) -> engine::AuditAction {
    match action {
        AuditAction::BookingReserved => engine::AuditAction::BookingReserved,
        AuditAction::BookingUpdated => engine::AuditAction::BookingUpdated,
        AuditAction::BookingCancelled => engine::AuditAction::BookingCancelled,
        AuditAction::BookingDeleted => engine::AuditAction::BookingDeleted,
        AuditAction::CommissionOverridden => engine::AuditAction::CommissionOverridden,
        AuditAction::PaymentCaptured => engine::AuditAction::PaymentCaptured,
        AuditAction::PaymentRefunded => engine::AuditAction::PaymentRefunded,
    }
}

pub(crate) fn audit_action_to_api(action: engine::AuditAction) -> AuditAction {
    match action {
        engine::AuditAction::BookingReserved => AuditAction::BookingReserved,
        engine::AuditAction::BookingUpdated => AuditAction::BookingUpdated,
        engine::AuditAction::BookingCancelled => AuditAction::BookingCancelled,
        engine::AuditAction::BookingDeleted => AuditAction::BookingDeleted,
        engine::AuditAction::CommissionOverridden => AuditAction::CommissionOverridden,
        engine::AuditAction::PaymentCaptured => AuditAction::PaymentCaptured,
        engine::AuditAction::PaymentRefunded => AuditAction::PaymentRefunded,
    }
}

pub(crate) fn audit_entity_from_api(entity: AuditEntity) -> engine::AuditEntity {
    match entity {
        AuditEntity::Booking => engine::AuditEntity::Booking,
        AuditEntity::User => engine::AuditEntity::User,
        AuditEntity::Payment => engine::AuditEntity::Payment,
    }
}

pub(crate) fn audit_entity_to_api(entity: engine::AuditEntity) -> AuditEntity {
    match entity {
        engine::AuditEntity::Booking => AuditEntity::Booking,
        engine::AuditEntity::User => AuditEntity::User,
        engine::AuditEntity::Payment => AuditEntity::Payment,
    }
}

pub(crate) fn page_to_api<T, U>(page: engine::Page<T>, f: impl FnMut(T) -> U) -> api_types::Page<U> {
    let total_pages = page.total_pages();
    api_types::Page {
        items: page.items.into_iter().map(f).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages,
    }
}
