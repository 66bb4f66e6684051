//! [`Query`] collection related to [`PromoCode`]s.

use common::{
    operations::{By, Select},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::{promo, PromoCode},
    infra::{database, Database},
    Query, Service,
};

use super::DatabaseQuery;

/// Queries a [`PromoCode`] by its [`promo::Code`].
pub type ByCode = DatabaseQuery<By<Option<PromoCode>, promo::Code>>;

/// Queries all the [`PromoCode`]s along with their usage counters, most
/// recent first.
pub type List = DatabaseQuery<By<Vec<PromoCode>, ()>>;

/// [`Query`] checking whether a promo code may be applied at the provided
/// [`Date`].
///
/// Never records a usage.
#[derive(Clone, Debug)]
pub struct Validate {
    /// Promo code as entered by a customer.
    pub code: String,

    /// [`Date`] to validate the promo code at.
    pub as_of: Date,
}

impl<Db> Query<Validate> for Service<Db>
where
    Db: Database<
        Select<By<Option<PromoCode>, promo::Code>>,
        Ok = Option<PromoCode>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = promo::Validation;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Validate { code, as_of }: Validate,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(code) = promo::Code::new(code) else {
            return Ok(Err(promo::Rejection::NotFound).into());
        };

        let promo = self
            .database()
            .execute(Select(By::<Option<PromoCode>, _>::new(code)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(promo
            .ok_or(promo::Rejection::NotFound)
            .and_then(|p| p.validate(as_of))
            .into())
    }
}

/// [`Query`] listing [`PromoCode`]s applicable at the provided [`Date`].
#[derive(Clone, Copy, Debug)]
pub struct ListActive {
    /// [`Date`] the [`PromoCode`]s should be applicable at.
    pub as_of: Date,
}

impl<Db> Query<ListActive> for Service<Db>
where
    Db: Database<
        Select<By<Vec<PromoCode>, ()>>,
        Ok = Vec<PromoCode>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<PromoCode>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ListActive { as_of }: ListActive,
    ) -> Result<Self::Ok, Self::Err> {
        let mut all = self
            .database()
            .execute(Select(By::<Vec<PromoCode>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        all.retain(|p| p.validate(as_of).is_ok());
        Ok(all)
    }
}

#[cfg(test)]
mod spec {
    use common::{operations::Insert, Date, Percent};

    use crate::{
        domain::promo::{self, spec::promo},
        infra::Database as _,
        spec::service,
        Query as _,
    };

    use super::{List, ListActive, Validate};

    fn date(y: i32, m: u8, d: u8) -> Date {
        Date::from_calendar(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn validates_without_usage() {
        let (svc, _inbox) = service();
        let mut p = promo("spring", 15);
        p.active_from = Some(date(2025, 3, 1).coerce());
        svc.database().execute(Insert(p)).await.unwrap();

        let early = svc
            .execute(Validate {
                code: "spring".to_owned(),
                as_of: date(2025, 2, 1),
            })
            .await
            .unwrap();
        assert!(!early.is_valid);
        assert_eq!(early.reason, Some(promo::Rejection::NotYetActive));

        let ok = svc
            .execute(Validate {
                code: " Spring ".to_owned(),
                as_of: date(2025, 3, 1),
            })
            .await
            .unwrap();
        assert!(ok.is_valid);
        assert_eq!(ok.discount, Percent::new(15));

        for code in ["", "unknown"] {
            let missing = svc
                .execute(Validate {
                    code: code.to_owned(),
                    as_of: date(2025, 3, 1),
                })
                .await
                .unwrap();
            assert_eq!(missing.reason, Some(promo::Rejection::NotFound));
        }

        let all = svc.execute(List::by(())).await.unwrap();
        assert_eq!(all[0].usage_count, promo::UsageCount::default());
    }

    #[tokio::test]
    async fn lists_active_only() {
        let (svc, _inbox) = service();
        let mut off = promo("off", 10);
        off.is_active = false;
        let mut over = promo("over", 10);
        over.active_to = Some(date(2024, 12, 31).coerce());
        let on = promo("on", 10);
        for p in [off, over, on] {
            svc.database().execute(Insert(p)).await.unwrap();
        }

        let active = svc
            .execute(ListActive {
                as_of: date(2025, 1, 1),
            })
            .await
            .unwrap();

        assert_eq!(
            active.iter().map(|p| p.code.as_ref()).collect::<Vec<_>>(),
            ["ON"],
        );
        assert_eq!(svc.execute(List::by(())).await.unwrap().len(), 3);
    }
}
