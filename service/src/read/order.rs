//! [`Order`] read model definition.
//!
//! [`Order`]: crate::domain::Order

pub mod list {
    //! [`Order`]s list definitions.

    use common::Date;

    use crate::domain::{order, user, Order};

    /// Filter of [`Order`]s to be listed.
    ///
    /// Criteria are combined with a logical `AND`; an empty [`Filter`]
    /// matches every [`Order`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`order::Status`] the [`Order`]s should be in.
        pub status: Option<order::Status>,

        /// ID of the [`User`] owning the [`Order`]s.
        ///
        /// [`User`]: crate::domain::User
        pub user_id: Option<user::Id>,

        /// [`Date`] before which the [`Order`]s' rental should end.
        pub ends_before: Option<Date>,

        /// Indicator whether only paid [`Order`]s with goods still to be
        /// collected should be listed.
        pub awaiting_delivery: bool,
    }

    impl Filter {
        /// [`Filter`] of [`Order`]s overdue as of the provided [`Date`].
        #[must_use]
        pub fn overdue(today: Date) -> Self {
            Self {
                status: Some(order::Status::InStorage),
                ends_before: Some(today),
                ..Self::default()
            }
        }

        /// Indicates whether the provided [`Order`] satisfies this [`Filter`].
        #[must_use]
        pub fn matches(&self, order: &Order) -> bool {
            let Self {
                status,
                user_id,
                ends_before,
                awaiting_delivery,
            } = *self;

            status.map_or(true, |s| order.status == s)
                && user_id.map_or(true, |id| order.user_id == id)
                && ends_before.map_or(true, |date| {
                    order.end_date.is_some_and(|end| end.coerce() < date)
                })
                && (!awaiting_delivery
                    || order.status == order::Status::Paid
                        && order.is_delivery_required
                        && !order.is_delivered)
        }
    }
}
