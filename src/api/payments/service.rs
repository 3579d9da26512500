use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repository::PaymentRepository;
use crate::api::orders::repository::OrderRepository;
use crate::schema::commerce::{
    NewPayment, OrderStatus, Payment, PaymentMethod, PaymentStatus,
};
use crate::schema::status::SoftDeletable;
use crate::shared::error::AppError;

pub struct PaymentService {
    repo: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl PaymentService {
    pub fn new(repo: Arc<dyn PaymentRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { repo, orders }
    }

    /// Mock payments settle at once and confirm the order; cash on delivery
    /// stays pending and leaves the order alone.
    pub async fn create(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        method: PaymentMethod,
    ) -> Result<Payment, AppError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .filter(|o| !o.is_deleted() && o.user_id == user_id)
            .ok_or_else(|| AppError::not_found("Order not found or does not belong to user"))?;
        if self.repo.find_by_order(order_id).await?.is_some() {
            return Err(AppError::bad_request("Order already has a payment"));
        }
        if order.status != OrderStatus::Pending {
            return Err(AppError::bad_request("Only pending orders can be paid"));
        }

        let new = match method {
            PaymentMethod::Mock => NewPayment {
                order_id,
                amount: order.total,
                method,
                status: PaymentStatus::Completed,
                transaction_id: Some(format!("mock_txn_{order_id}")),
                order_status: Some(OrderStatus::Confirmed),
            },
            PaymentMethod::Cod => NewPayment {
                order_id,
                amount: order.total,
                method,
                status: PaymentStatus::Pending,
                transaction_id: None,
                order_status: None,
            },
        };
        let payment = self.repo.create(new).await?;
        info!(%user_id, %order_id, payment_id = %payment.id, ?method, "payment recorded");
        Ok(payment)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = self.repo.list_for_user(user_id).await?;
        debug!(%user_id, count = payments.len(), "payments listed");
        Ok(payments)
    }

    /// Payments on someone else's order are reported as missing.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Payment, AppError> {
        let payment = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment not found"))?;
        let owns_order = self
            .orders
            .find_by_id(payment.order_id)
            .await?
            .is_some_and(|o| o.user_id == user_id);
        if !owns_order {
            return Err(AppError::not_found("Payment not found"));
        }
        Ok(payment)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment, AppError> {
        let payment = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment not found"))?;
        if payment.status.is_final() {
            return Err(AppError::bad_request(
                "Cannot update status of completed or refunded payment",
            ));
        }
        let updated = self.repo.update_status(id, status).await?;
        info!(payment_id = %id, from = ?payment.status, to = ?status, "payment status updated");
        Ok(updated)
    }
}
