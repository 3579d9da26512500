use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::schema::commerce::{PaymentMethod, PaymentStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,
}
