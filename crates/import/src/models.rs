//! Entity models as the producer writes them to the bus.
//!
//! Money is stored as `{value, currency}` with `value` an integer count of
//! 10^-5 units. Timestamps are `{secs_since_epoch, nanos_since_epoch}` and
//! are exported with second precision. Linked entities are exported as their
//! integer index.

use std::collections::BTreeMap;

use majorka_core::{Codec, Column, EntityId, Value, MONEY_SCALE};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::entity::Entity;

/// Suffix of the column carrying a money field's currency.
pub const CURRENCY_SUFFIX: &str = "_currency";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Money {
    pub value: i64,
    pub currency: String,
}

impl Money {
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.value, MONEY_SCALE)
    }

    fn to_value(&self) -> Value {
        Value::Money {
            amount: self.amount(),
            currency: self.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Timestamp {
    pub secs_since_epoch: i64,
    #[serde(default)]
    pub nanos_since_epoch: u32,
}

impl Timestamp {
    /// UTC wall-clock time, truncated to seconds.
    pub fn datetime(&self) -> Option<PrimitiveDateTime> {
        let t = OffsetDateTime::from_unix_timestamp(self.secs_since_epoch).ok()?;
        Some(PrimitiveDateTime::new(t.date(), t.time()))
    }

    pub fn date(&self) -> Option<Date> {
        self.datetime().map(|dt| dt.date())
    }

    fn to_value(self) -> Option<Value> {
        self.datetime().map(Value::DateTime)
    }
}

/// Money columns: the amount and its currency.
fn money_columns(name: &str) -> [Column; 2] {
    [
        Column::new(name, Codec::Money),
        Column::new(format!("{}{}", name, CURRENCY_SUFFIX), Codec::String),
    ]
}

fn indices(ids: &[EntityId]) -> Value {
    Value::Array(ids.iter().map(|id| Value::UInt(id.index)).collect())
}

// ──────────────────────────────────────────────
// Campaign
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Campaign {
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub offers: Vec<EntityId>,
    #[serde(default)]
    pub paused_offers: Vec<EntityId>,
    #[serde(default)]
    pub optimize: bool,
    #[serde(default)]
    pub optimization_paused: bool,
    #[serde(default)]
    pub hit_limit_for_optimization: u64,
    #[serde(default)]
    pub slicing_attrs: Vec<String>,
}

impl Entity for Campaign {
    const KIND: &'static str = "Campaign";
    const TABLE: &'static str = "campaigns";

    fn fields() -> Vec<Column> {
        vec![
            Column::new("name", Codec::String),
            Column::new("alias", Codec::String),
            Column::new("offers", Codec::array(Codec::UInt64)),
            Column::new("paused_offers", Codec::array(Codec::UInt64)),
            Column::new("optimize", Codec::Bool),
            Column::new("optimization_paused", Codec::Bool),
            Column::new("hit_limit_for_optimization", Codec::UInt64),
            Column::new("slicing_attrs", Codec::array(Codec::String)),
        ]
    }

    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "name" => Value::text(&self.name),
            "alias" => Value::text(&self.alias),
            "offers" => indices(&self.offers),
            "paused_offers" => indices(&self.paused_offers),
            "optimize" => Value::Bool(self.optimize),
            "optimization_paused" => Value::Bool(self.optimization_paused),
            "hit_limit_for_optimization" => Value::UInt(self.hit_limit_for_optimization),
            "slicing_attrs" => Value::Array(self.slicing_attrs.iter().map(Value::text).collect()),
            _ => return None,
        })
    }
}

// ──────────────────────────────────────────────
// Offer
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Offer {
    pub name: String,
    #[serde(default)]
    pub url_template: String,
}

impl Entity for Offer {
    const KIND: &'static str = "Offer";
    const TABLE: &'static str = "offers";

    fn fields() -> Vec<Column> {
        vec![
            Column::new("name", Codec::String),
            Column::new("url_template", Codec::String),
        ]
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::text(&self.name)),
            "url_template" => Some(Value::text(&self.url_template)),
            _ => None,
        }
    }
}

// ──────────────────────────────────────────────
// Conversion
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Conversion {
    pub time: Timestamp,
    pub external_id: String,
    pub status: String,
    pub revenue: Money,
}

impl Entity for Conversion {
    const KIND: &'static str = "Conversions";
    const TABLE: &'static str = "conversions";

    fn fields() -> Vec<Column> {
        let mut fields = vec![
            Column::new("time", Codec::DateTime),
            Column::new("external_id", Codec::String),
            Column::new("status", Codec::String),
        ];
        fields.extend(money_columns("revenue"));
        fields
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "time" => self.time.to_value(),
            "external_id" => Some(Value::text(&self.external_id)),
            "status" => Some(Value::text(&self.status)),
            "revenue" => Some(self.revenue.to_value()),
            "revenue_currency" => Some(Value::text(&self.revenue.currency)),
            _ => None,
        }
    }

    fn created(&self) -> Option<Date> {
        self.time.date()
    }
}

// ──────────────────────────────────────────────
// Hit
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    pub time: Timestamp,
    pub campaign_id: EntityId,
    pub destination_id: EntityId,
    #[serde(default)]
    pub click_id: String,
    pub cost: Money,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

impl Entity for Hit {
    const KIND: &'static str = "Hits";
    const TABLE: &'static str = "hits";

    fn fields() -> Vec<Column> {
        let mut fields = vec![
            Column::new("time", Codec::DateTime),
            Column::new("campaign_id", Codec::UInt64),
            Column::new("destination_id", Codec::UInt64),
            Column::new("click_id", Codec::String),
        ];
        fields.extend(money_columns("cost"));
        fields
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "time" => self.time.to_value(),
            "campaign_id" => Some(Value::UInt(self.campaign_id.index)),
            "destination_id" => Some(Value::UInt(self.destination_id.index)),
            "click_id" => Some(Value::text(&self.click_id)),
            "cost" => Some(self.cost.to_value()),
            "cost_currency" => Some(Value::text(&self.cost.currency)),
            _ => None,
        }
    }

    fn dimensions(&self) -> Option<&BTreeMap<String, String>> {
        Some(&self.dimensions)
    }

    fn created(&self) -> Option<Date> {
        self.time.date()
    }
}

/// Bus kinds the importer knows how to load, in import order.
pub const KNOWN_KINDS: [&str; 4] = [Campaign::KIND, Offer::KIND, Conversion::KIND, Hit::KIND];
