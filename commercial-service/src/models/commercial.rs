//! Commercial record model for commercial-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// How a commission or incentive value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Percentage,
    Fixed,
}

impl AdjustmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentKind::Percentage => "percentage",
            AdjustmentKind::Fixed => "fixed",
        }
    }

    /// Case-insensitive parse; any kind other than "percentage" is a flat amount.
    pub fn from_string(s: &str) -> Self {
        if s.eq_ignore_ascii_case("percentage") {
            AdjustmentKind::Percentage
        } else {
            AdjustmentKind::Fixed
        }
    }
}

/// Commercial record: raw buying/selling inputs plus derived amounts.
/// Derived fields are recomputed from the inputs on every write and are
/// never edited independently.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommercialRecord {
    pub commercial_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub buying_currency: String,
    pub buying_amount: Decimal,
    pub buying_vat_included: bool,
    pub buying_vat_percent: Decimal,
    pub commissionable: bool,
    pub commission_kind: String,
    pub commission_value: Option<Decimal>,
    pub selling_currency: String,
    pub selling_price: Decimal,
    pub selling_vat_included: bool,
    pub selling_vat_percent: Decimal,
    pub incentive: bool,
    pub incentive_kind: String,
    pub incentive_value: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub auto_exchange: bool,
    pub net_buying: Decimal,
    pub gross_buying: Decimal,
    pub net_selling: Decimal,
    pub gross_selling: Decimal,
    pub profit: Decimal,
    pub profit_margin_percent: Decimal,
    pub markup_percent: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a commercial record.
#[derive(Debug, Clone, Validate)]
pub struct CreateCommercialRecord {
    pub booking_id: Option<Uuid>,
    #[validate(length(equal = 3, message = "Buying currency must be a 3-letter code"))]
    pub buying_currency: String,
    pub buying_amount: Decimal,
    pub buying_vat_included: bool,
    pub buying_vat_percent: Decimal,
    pub commissionable: bool,
    pub commission_kind: AdjustmentKind,
    pub commission_value: Option<Decimal>,
    #[validate(length(equal = 3, message = "Selling currency must be a 3-letter code"))]
    pub selling_currency: String,
    pub selling_price: Decimal,
    pub selling_vat_included: bool,
    pub selling_vat_percent: Decimal,
    pub incentive: bool,
    pub incentive_kind: AdjustmentKind,
    pub incentive_value: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub auto_exchange: bool,
}

/// Input for updating a commercial record. Absent fields retain their
/// prior values; optional values are switched off via their flags, not by
/// clearing them.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateCommercialRecord {
    pub booking_id: Option<Uuid>,
    #[validate(length(equal = 3, message = "Buying currency must be a 3-letter code"))]
    pub buying_currency: Option<String>,
    pub buying_amount: Option<Decimal>,
    pub buying_vat_included: Option<bool>,
    pub buying_vat_percent: Option<Decimal>,
    pub commissionable: Option<bool>,
    pub commission_kind: Option<AdjustmentKind>,
    pub commission_value: Option<Decimal>,
    #[validate(length(equal = 3, message = "Selling currency must be a 3-letter code"))]
    pub selling_currency: Option<String>,
    pub selling_price: Option<Decimal>,
    pub selling_vat_included: Option<bool>,
    pub selling_vat_percent: Option<Decimal>,
    pub incentive: Option<bool>,
    pub incentive_kind: Option<AdjustmentKind>,
    pub incentive_value: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
    pub auto_exchange: Option<bool>,
}

impl UpdateCommercialRecord {
    /// Overlay the provided fields onto a stored record. Derived amounts
    /// are untouched here and must be recomputed before the record is
    /// written back.
    pub fn apply(&self, record: &mut CommercialRecord) {
        if let Some(booking_id) = self.booking_id {
            record.booking_id = Some(booking_id);
        }
        if let Some(ref currency) = self.buying_currency {
            record.buying_currency = currency.clone();
        }
        if let Some(amount) = self.buying_amount {
            record.buying_amount = amount;
        }
        if let Some(included) = self.buying_vat_included {
            record.buying_vat_included = included;
        }
        if let Some(percent) = self.buying_vat_percent {
            record.buying_vat_percent = percent;
        }
        if let Some(commissionable) = self.commissionable {
            record.commissionable = commissionable;
        }
        if let Some(kind) = self.commission_kind {
            record.commission_kind = kind.as_str().to_string();
        }
        if let Some(value) = self.commission_value {
            record.commission_value = Some(value);
        }
        if let Some(ref currency) = self.selling_currency {
            record.selling_currency = currency.clone();
        }
        if let Some(price) = self.selling_price {
            record.selling_price = price;
        }
        if let Some(included) = self.selling_vat_included {
            record.selling_vat_included = included;
        }
        if let Some(percent) = self.selling_vat_percent {
            record.selling_vat_percent = percent;
        }
        if let Some(incentive) = self.incentive {
            record.incentive = incentive;
        }
        if let Some(kind) = self.incentive_kind {
            record.incentive_kind = kind.as_str().to_string();
        }
        if let Some(value) = self.incentive_value {
            record.incentive_value = Some(value);
        }
        if let Some(rate) = self.exchange_rate {
            record.exchange_rate = Some(rate);
        }
        if let Some(auto_exchange) = self.auto_exchange {
            record.auto_exchange = auto_exchange;
        }
    }
}

/// Filter parameters for listing commercial records.
#[derive(Debug, Clone, Default)]
pub struct ListCommercialRecordsFilter {
    pub booking_id: Option<Uuid>,
    pub buying_currency: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}
