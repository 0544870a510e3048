use crate::{
    entities::{order, order_item, Order, OrderItem},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Order store collaborator: fetch-by-id with a "must be unpaid" filter and
/// the conditional paid-flag update.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Fetches an order regardless of paid state, with its items in
    /// insertion order.
    pub async fn find_with_items(
        &self,
        id: i64,
    ) -> Result<Option<(order::Model, Vec<order_item::Model>)>, ServiceError> {
        let Some(order) = Order::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };
        let items = order
            .find_related(OrderItem)
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(Some((order, items)))
    }

    /// Fetches an order only if it is still unpaid, with its items.
    pub async fn find_unpaid_with_items(
        &self,
        id: i64,
    ) -> Result<Option<(order::Model, Vec<order_item::Model>)>, ServiceError> {
        let Some(order) = Order::find_by_id(id)
            .filter(order::Column::Paid.eq(false))
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };
        let items = order
            .find_related(OrderItem)
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(Some((order, items)))
    }

    /// Marks an order paid via a single conditional write: the update only
    /// matches rows where `paid` is still false, which closes the race
    /// between concurrently delivered duplicate confirmations.
    ///
    /// Returns true when this call performed the transition, false when the
    /// order was already paid or does not exist.
    #[instrument(skip(self))]
    pub async fn mark_paid(&self, id: i64) -> Result<bool, ServiceError> {
        let result = Order::update_many()
            .col_expr(order::Column::Paid, Expr::value(true))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Paid.eq(false))
            .exec(&*self.db)
            .await?;

        let transitioned = result.rows_affected > 0;
        if transitioned {
            info!(order_id = id, "order marked paid");
        }
        Ok(transitioned)
    }

    /// Records the gateway session id on the order. Best-effort bookkeeping;
    /// the caller treats failures as non-fatal.
    pub async fn record_gateway_session(
        &self,
        id: i64,
        session_id: &str,
    ) -> Result<(), ServiceError> {
        Order::update_many()
            .col_expr(order::Column::StripeId, Expr::value(session_id))
            .filter(order::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}
