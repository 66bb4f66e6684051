//! [`Command`] definition.

pub mod cancel_order;
pub mod complete_pickup;
pub mod confirm_payment;
pub mod confirm_storage_receipt;
pub mod create_order;
pub mod create_promo_code;
pub mod expire_order;
pub mod extend_order;
pub mod get_or_create_user;
pub mod initiate_payment;
pub mod override_order_status;
pub mod record_promo_usage;
pub mod record_reminder;
pub mod set_promo_code_active;
mod transition;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    cancel_order::CancelOrder, complete_pickup::CompletePickup,
    confirm_payment::ConfirmPayment,
    confirm_storage_receipt::ConfirmStorageReceipt, create_order::CreateOrder,
    create_promo_code::CreatePromoCode, expire_order::ExpireOrder,
    extend_order::ExtendOrder, get_or_create_user::GetOrCreateUser,
    initiate_payment::InitiatePayment,
    override_order_status::OverrideOrderStatus,
    record_promo_usage::RecordPromoUsage, record_reminder::RecordReminder,
    set_promo_code_active::SetPromoCodeActive, transition::TransitionError,
};
