//! [`Command`] for recording a usage of a [`PromoCode`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use tracerr::Traced;

use crate::{
    domain::{promo, PromoCode},
    infra::{database, Database},
    Service,
};

use super::{set_promo_code_active, Command};

/// [`Command`] for incrementing the usage counter of a [`PromoCode`].
#[derive(Clone, Debug)]
pub struct RecordPromoUsage {
    /// [`promo::Code`] of the used [`PromoCode`].
    pub code: promo::Code,
}

impl<Db> Command<RecordPromoUsage> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<PromoCode, promo::Code>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<PromoCode>, promo::Code>>,
            Ok = Option<PromoCode>,
            Err = Traced<database::Error>,
        > + Database<Update<PromoCode>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = PromoCode;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordPromoUsage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordPromoUsage { code } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid lost updates of the counter.
        tx.execute(Lock(By::new(code.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut promo = tx
            .execute(Select(By::<Option<PromoCode>, _>::new(code.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PromoCodeNotExists(code))
            .map_err(tracerr::wrap!())?;
        promo.record_usage();

        tx.execute(Update(promo.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(promo)
    }
}

/// Error of [`RecordPromoUsage`] [`Command`] execution.
pub type ExecutionError = set_promo_code_active::ExecutionError;

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::SetPromoCodeActive,
        domain::promo::{self, spec::promo},
        error,
        infra::Database as _,
        spec::service,
        Command as _,
    };

    use super::RecordPromoUsage;

    #[tokio::test]
    async fn counts_concurrent_usages() {
        let (svc, _inbox) = service();
        let p = promo("popular", 5);
        svc.database().execute(Insert(p.clone())).await.unwrap();

        let (a, b, c) = tokio::join!(
            svc.execute(RecordPromoUsage { code: p.code.clone() }),
            svc.execute(RecordPromoUsage { code: p.code.clone() }),
            svc.execute(RecordPromoUsage { code: p.code.clone() }),
        );
        _ = (a.unwrap(), b.unwrap());

        assert_eq!(c.unwrap().usage_count, promo::UsageCount::from(3));
    }

    #[tokio::test]
    async fn deactivation_keeps_usages() {
        let (svc, _inbox) = service();
        let p = promo("toggle", 5);
        svc.database().execute(Insert(p.clone())).await.unwrap();
        _ = svc
            .execute(RecordPromoUsage {
                code: p.code.clone(),
            })
            .await
            .unwrap();

        let off = svc
            .execute(SetPromoCodeActive {
                code: p.code.clone(),
                is_active: false,
            })
            .await
            .unwrap();

        assert!(!off.is_active);
        assert_eq!(off.usage_count, promo::UsageCount::from(1));

        let err = svc
            .execute(RecordPromoUsage {
                code: promo::Code::new("unknown").unwrap(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.as_ref().kind(), error::Kind::NotFound);
    }
}
