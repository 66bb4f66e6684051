//! [`Command`] for initiating the payment of an [`Order`].

use common::operations::{By, Select};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{order, Order},
    infra::{database, payment, Database},
    Service,
};

use super::{Command, TransitionError};

/// [`Command`] for initiating the payment of an [`Order`] awaiting it.
///
/// Returns the [`payment::Reference`] the customer should follow to pay.
#[derive(Clone, Copy, Debug)]
pub struct InitiatePayment {
    /// ID of the [`Order`] to be paid.
    pub order_id: order::Id,
}

impl<Db> Command<InitiatePayment> for Service<Db>
where
    Db: Database<
        Select<By<Option<Order>, order::Id>>,
        Ok = Option<Order>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = payment::Reference;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: InitiatePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let InitiatePayment { order_id } = cmd;

        let order = self
            .database()
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;

        order
            .ensure_awaiting_payment()
            .map_err(E::InvalidTransition)
            .map_err(tracerr::wrap!())?;

        let reference = self.config().payment.reference(&payment::Invoice {
            order_id,
            amount: order.final_price,
        });
        log::info!(%order_id, amount = %order.final_price, "payment initiated");

        Ok(reference)
    }
}

/// Error of [`InitiatePayment`] [`Command`] execution.
pub type ExecutionError = TransitionError;

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::order::spec::order, error, infra::Database as _,
        spec::service, Command as _,
    };

    use super::InitiatePayment;

    #[tokio::test]
    async fn links_to_checkout() {
        let (svc, _inbox) = service();
        let o = order(6120);
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let reference = svc
            .execute(InitiatePayment { order_id: o.id })
            .await
            .unwrap();

        assert!(reference.as_ref().contains(&format!("order={}", o.id)));
        assert!(reference.as_ref().contains("amount=6120&currency=RUB"));
    }

    #[tokio::test]
    async fn requires_created_order() {
        let (svc, _inbox) = service();
        let mut o = order(1000);
        _ = o.confirm_payment(svc.today()).unwrap();
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let err = svc
            .execute(InitiatePayment { order_id: o.id })
            .await
            .unwrap_err();

        assert_eq!(err.as_ref().kind(), error::Kind::InvalidTransition);
    }
}
