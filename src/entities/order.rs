use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Persisted order row. Created by the surrounding shop application; this
/// core only reads the monetary fields and flips `paid` exactly once.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,

    /// False until a verified gateway confirmation arrives. Mutable exactly
    /// once, false to true, via a conditional update.
    pub paid: bool,

    /// Backend-computed discount in currency units. Authoritative; client
    /// numbers are never consulted.
    pub discount: Decimal,

    /// Authoritative order total in currency units. Zero means "not stored";
    /// the settlement builder then falls back to subtotal minus discount.
    pub total: Decimal,

    pub coupon_id: Option<i64>,

    /// Gateway session id recorded best-effort after session creation.
    pub stripe_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
