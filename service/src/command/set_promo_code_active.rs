//! [`Command`] for (de)activating a [`PromoCode`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{promo, PromoCode},
    error,
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for enabling or disabling a [`PromoCode`].
///
/// Disabling doesn't affect [`Order`]s the [`PromoCode`] was already applied
/// to.
///
/// [`Order`]: crate::domain::Order
#[derive(Clone, Debug)]
pub struct SetPromoCodeActive {
    /// [`promo::Code`] of the [`PromoCode`].
    pub code: promo::Code,

    /// Indicator whether the [`PromoCode`] should be enabled.
    pub is_active: bool,
}

impl<Db> Command<SetPromoCodeActive> for Service<Db>
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
        cmd: SetPromoCodeActive,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetPromoCodeActive { code, is_active } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
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
        promo.is_active = is_active;

        tx.execute(Update(promo.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(code = %promo.code, is_active, "`PromoCode` is toggled");

        Ok(promo)
    }
}

/// Error of [`SetPromoCodeActive`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`PromoCode`] with the provided [`promo::Code`] does not exist.
    #[display("`PromoCode(code: {_0})` does not exist")]
    PromoCodeNotExists(#[error(not(source))] promo::Code),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(_) => error::Kind::Internal,
            Self::PromoCodeNotExists(_) => error::Kind::NotFound,
        }
    }
}
