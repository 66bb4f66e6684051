//! Domain definitions.

pub mod catalog;
pub mod notification;
pub mod order;
pub mod pricing;
pub mod promo;
pub mod unit;
pub mod user;

pub use self::{
    catalog::Catalog, notification::Notification, order::Order,
    promo::PromoCode, unit::Unit, user::User,
};
