//! Pricing calculator for commercial records.
//!
//! One pricing pass derives every stored amount from the raw buying and
//! selling inputs: VAT extraction on both sides, commission and incentive
//! adjustments, exchange-rate conversion, and the profit ratios. The pass
//! is a pure function over its inputs; records absorb the result at the
//! persistence boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{AdjustmentKind, CommercialRecord, CreateCommercialRecord};

/// Raw buying/selling inputs consumed by one pricing pass.
#[derive(Debug, Clone)]
pub struct PricingInputs {
    pub buying_amount: Decimal,
    pub buying_vat_included: bool,
    pub buying_vat_percent: Decimal,
    pub commissionable: bool,
    pub commission_kind: AdjustmentKind,
    pub commission_value: Option<Decimal>,
    pub selling_price: Decimal,
    pub selling_vat_included: bool,
    pub selling_vat_percent: Decimal,
    pub incentive: bool,
    pub incentive_kind: AdjustmentKind,
    pub incentive_value: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
}

impl PricingInputs {
    /// Inputs for the creation flow.
    pub fn from_create(input: &CreateCommercialRecord) -> Self {
        Self {
            buying_amount: input.buying_amount,
            buying_vat_included: input.buying_vat_included,
            buying_vat_percent: input.buying_vat_percent,
            commissionable: input.commissionable,
            commission_kind: input.commission_kind,
            commission_value: input.commission_value,
            selling_price: input.selling_price,
            selling_vat_included: input.selling_vat_included,
            selling_vat_percent: input.selling_vat_percent,
            incentive: input.incentive,
            incentive_kind: input.incentive_kind,
            incentive_value: input.incentive_value,
            exchange_rate: input.exchange_rate,
        }
    }

    /// Inputs for the update flow, read back from a stored record after
    /// the update overlay has been applied. Kind columns are parsed
    /// leniently: anything other than "percentage" means a flat amount.
    pub fn from_record(record: &CommercialRecord) -> Self {
        Self {
            buying_amount: record.buying_amount,
            buying_vat_included: record.buying_vat_included,
            buying_vat_percent: record.buying_vat_percent,
            commissionable: record.commissionable,
            commission_kind: AdjustmentKind::from_string(&record.commission_kind),
            commission_value: record.commission_value,
            selling_price: record.selling_price,
            selling_vat_included: record.selling_vat_included,
            selling_vat_percent: record.selling_vat_percent,
            incentive: record.incentive,
            incentive_kind: AdjustmentKind::from_string(&record.incentive_kind),
            incentive_value: record.incentive_value,
            exchange_rate: record.exchange_rate,
        }
    }
}

/// Derived amounts produced by one pricing pass.
///
/// `net_buying`/`net_selling` are the post-adjustment, pre-conversion
/// amounts; the converted amounts exist only inside the pass and feed
/// profit, margin, and markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub net_buying: Decimal,
    pub gross_buying: Decimal,
    pub net_selling: Decimal,
    pub gross_selling: Decimal,
    pub profit: Decimal,
    pub profit_margin_percent: Decimal,
    pub markup_percent: Decimal,
    pub computed_utc: DateTime<Utc>,
}

/// Derive all stored amounts from the raw inputs.
///
/// Total over its domain: missing optional values and zero denominators
/// resolve to numeric defaults, never to an error.
pub fn price(inputs: &PricingInputs) -> Pricing {
    let (buying_net, buying_vat) = extract_vat(
        inputs.buying_amount,
        inputs.buying_vat_included,
        inputs.buying_vat_percent,
    );
    let gross_buying = buying_net + buying_vat;

    let (selling_net, selling_vat) = extract_vat(
        inputs.selling_price,
        inputs.selling_vat_included,
        inputs.selling_vat_percent,
    );
    let gross_selling = selling_net + selling_vat;

    // Commission is a buying-side cost, incentive a selling-side revenue
    // addition; neither crosses sides. Both apply after VAT extraction
    // and before conversion.
    let mut net_buying = buying_net;
    if inputs.commissionable {
        if let Some(value) = inputs.commission_value {
            net_buying += adjustment(net_buying, inputs.commission_kind, value);
        }
    }

    let mut net_selling = selling_net;
    if inputs.incentive {
        if let Some(value) = inputs.incentive_value {
            net_selling += adjustment(net_selling, inputs.incentive_kind, value);
        }
    }

    let rate = inputs
        .exchange_rate
        .filter(|rate| *rate > Decimal::ZERO)
        .unwrap_or(Decimal::ONE);
    let converted_buying = net_buying * rate;
    let converted_selling = net_selling * rate;

    let profit = converted_selling - converted_buying;

    Pricing {
        net_buying,
        gross_buying,
        net_selling,
        gross_selling,
        profit,
        profit_margin_percent: ratio_percent(profit, converted_selling),
        markup_percent: ratio_percent(profit, converted_buying),
        computed_utc: Utc::now(),
    }
}

/// Split an amount into net and VAT shares.
///
/// For VAT-inclusive amounts the net is back-calculated, but the VAT
/// share is taken on the stated amount rather than the net, so
/// net + VAT differs from the stated amount whenever the rate is
/// non-zero. Stored books reconcile against this arithmetic; keep it.
fn extract_vat(amount: Decimal, vat_included: bool, vat_percent: Decimal) -> (Decimal, Decimal) {
    if !vat_included {
        return (amount, Decimal::ZERO);
    }

    let divisor = Decimal::ONE + vat_percent / Decimal::ONE_HUNDRED;
    let net = if divisor.is_zero() {
        Decimal::ZERO
    } else {
        amount / divisor
    };

    (net, amount * vat_percent / Decimal::ONE_HUNDRED)
}

fn adjustment(net: Decimal, kind: AdjustmentKind, value: Decimal) -> Decimal {
    match kind {
        AdjustmentKind::Percentage => net * value / Decimal::ONE_HUNDRED,
        AdjustmentKind::Fixed => value,
    }
}

fn ratio_percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part / whole * Decimal::ONE_HUNDRED
    }
}
