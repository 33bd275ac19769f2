//! Domain models for commercial-service.

mod commercial;

pub use commercial::{
    AdjustmentKind, CommercialRecord, CreateCommercialRecord, ListCommercialRecordsFilter,
    UpdateCommercialRecord,
};
