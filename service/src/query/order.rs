//! [`Query`] collection related to [`Order`]s.

use common::operations::By;

use crate::{
    domain::{order, Order},
    read::order::list::Filter,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Order`] by its [`order::Id`].
pub type ById = DatabaseQuery<By<Option<Order>, order::Id>>;

/// Queries [`Order`]s matching a [`Filter`], most recent first.
pub type List = DatabaseQuery<By<Vec<Order>, Filter>>;

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{
            order::{
                self,
                spec::{date, order},
            },
            user,
        },
        infra::Database as _,
        read::order::list::Filter,
        spec::service,
        Query as _,
    };

    use super::{ById, List};

    #[tokio::test]
    async fn lists_operator_views() {
        let (svc, _inbox) = service();
        let owner = user::Id::new();

        let mut mine = order(1000);
        mine.user_id = owner;
        let mut overdue = order(2000);
        _ = overdue.confirm_payment(date(2025, 1, 1)).unwrap();
        overdue.receive().unwrap();
        let mut awaiting = order(3000);
        awaiting.is_delivery_required = true;
        _ = awaiting.confirm_payment(date(2025, 3, 1)).unwrap();
        for o in [&mine, &overdue, &awaiting] {
            svc.database().execute(Insert(o.clone())).await.unwrap();
        }

        let all = svc.execute(List::by(Filter::default())).await.unwrap();
        assert_eq!(all.len(), 3);

        let by_user = svc
            .execute(List::by(Filter {
                user_id: Some(owner),
                ..Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(by_user.iter().map(|o| o.id).collect::<Vec<_>>(), [mine.id]);

        let late = svc
            .execute(List::by(Filter::overdue(date(2025, 2, 15))))
            .await
            .unwrap();
        assert_eq!(late.iter().map(|o| o.id).collect::<Vec<_>>(), [overdue.id]);

        let to_collect = svc
            .execute(List::by(Filter {
                awaiting_delivery: true,
                ..Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(
            to_collect.iter().map(|o| o.id).collect::<Vec<_>>(),
            [awaiting.id],
        );

        let found = svc.execute(ById::by(mine.id)).await.unwrap();
        assert_eq!(found.map(|o| o.id), Some(mine.id));
        let missing = svc.execute(ById::by(order::Id::new())).await.unwrap();
        assert!(missing.is_none());
    }
}
