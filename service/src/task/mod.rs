//! Background [`Task`]s definitions.

mod background;
pub mod dispatch_notifications;
pub mod sweep_orders;

pub use common::Handler as Task;

pub use self::{
    background::{Background, Failure as BackgroundFailure},
    dispatch_notifications::DispatchNotifications,
    sweep_orders::SweepOrders,
};
