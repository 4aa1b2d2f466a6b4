use std::sync::Arc;

use crate::{
    db::DbPool,
    dto::{
        orders::{OrderDetails, OrderPlacedResponse, OrderRequest},
        payments::{CreatePaymentOrderRequest, PaymentOrderResponse, VerifyPaymentRequest},
    },
    entities::order::{self, OrderStatus, PaymentMode, PaymentStatus, DEFAULT_COUNTRY_CODE},
    errors::ServiceError,
    services::{notifications::OrderNotifier, payment_gateway::PaymentGateway},
};
use metrics::counter;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub const ONLINE_VIA_COD_MESSAGE: &str =
    "Online payments must be processed through payment verification endpoint";

/// Gateway identifiers stored on an online order.
struct GatewayAudit {
    order_id: String,
    payment_id: String,
    signature: String,
}

/// Turns checkout submissions into persisted orders and notifies the shop
/// owner. The insert is the commit point; notification is best-effort.
#[derive(Clone)]
pub struct OrderIntakeService {
    db_pool: Arc<DbPool>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn OrderNotifier>,
}

/// `ORD` followed by 8 uppercase hex characters.
pub fn generate_order_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("ORD{}", simple[..8].to_ascii_uppercase())
}

impl OrderIntakeService {
    pub fn new(
        db_pool: Arc<DbPool>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            db_pool,
            gateway,
            notifier,
        }
    }

    /// Cash-on-delivery checkout.
    #[instrument(skip(self, request))]
    pub async fn place_cod_order(
        &self,
        request: OrderRequest,
    ) -> Result<OrderPlacedResponse, ServiceError> {
        if request.wants_online_payment() {
            return Err(ServiceError::InvalidRequest(
                ONLINE_VIA_COD_MESSAGE.to_string(),
            ));
        }
        let details = request.into_details()?;

        let stored = self
            .persist(details, PaymentMode::Cod, PaymentStatus::Pending, None)
            .await?;
        let (order_id, sid, warning) = self.notify_best_effort(stored).await;

        let message = if warning.is_none() {
            "Order placed successfully! We will contact you shortly."
        } else {
            "Order placed successfully!"
        };
        Ok(OrderPlacedResponse {
            success: true,
            message: message.to_string(),
            order_id,
            order_status: None,
            payment_status: None,
            whatsapp_message_sid: sid,
            warning,
        })
    }

    /// Creates a gateway order the storefront opens checkout with.
    #[instrument(skip(self, request))]
    pub async fn create_payment_order(
        &self,
        request: CreatePaymentOrderRequest,
    ) -> Result<PaymentOrderResponse, ServiceError> {
        let amount = request.amount()?;
        let currency = request.currency();

        let intent = self.gateway.create_payment_intent(amount, &currency).await?;

        Ok(PaymentOrderResponse {
            success: true,
            order_id: intent.intent_id,
            amount: intent.amount_minor_units,
            currency: intent.currency,
            razorpay_key_id: intent.public_key,
        })
    }

    /// Online checkout: the order is stored only once the gateway signature checks out.
    #[instrument(skip(self, request))]
    pub async fn place_verified_online_order(
        &self,
        request: VerifyPaymentRequest,
    ) -> Result<OrderPlacedResponse, ServiceError> {
        let (receipt, mut order_data) = request.into_parts()?;

        let blank_country = order_data
            .country_code
            .as_deref()
            .map_or(true, |c| c.trim().is_empty());
        if blank_country {
            order_data.country_code = Some(DEFAULT_COUNTRY_CODE.to_string());
        }
        let details = order_data.into_details()?;

        let valid = self.gateway.verify_payment_signature(
            &receipt.order_id,
            &receipt.payment_id,
            &receipt.signature,
        )?;
        if !valid {
            counter!("storefront.payments.verification_failed", 1);
            warn!(
                razorpay_order_id = %receipt.order_id,
                razorpay_payment_id = %receipt.payment_id,
                "Payment signature mismatch; order not created"
            );
            return Err(ServiceError::PaymentVerificationFailed);
        }

        let audit = GatewayAudit {
            order_id: receipt.order_id,
            payment_id: receipt.payment_id,
            signature: receipt.signature,
        };
        let stored = self
            .persist(
                details,
                PaymentMode::Online,
                PaymentStatus::Completed,
                Some(audit),
            )
            .await?;
        let order_status = stored.order_status;
        let payment_status = stored.payment_status;
        let (order_id, sid, warning) = self.notify_best_effort(stored).await;

        Ok(OrderPlacedResponse {
            success: true,
            message: "Payment verified and order placed successfully!".to_string(),
            order_id,
            order_status: Some(order_status),
            payment_status: Some(payment_status),
            whatsapp_message_sid: sid,
            warning,
        })
    }

    async fn persist(
        &self,
        details: OrderDetails,
        payment_mode: PaymentMode,
        payment_status: PaymentStatus,
        audit: Option<GatewayAudit>,
    ) -> Result<order::Model, ServiceError> {
        let db = &*self.db_pool;

        let mut order = order::ActiveModel {
            order_id: Set(generate_order_id()),
            product_title: Set(details.product_title),
            size: Set(details.size),
            quantity: Set(details.quantity),
            price: Set(details.price),
            total_amount: Set(details.total_amount),
            full_name: Set(details.full_name),
            mobile: Set(details.mobile),
            country_code: Set(details.country_code),
            house_flat_no: Set(details.house_flat_no),
            street_locality: Set(details.street_locality),
            city: Set(details.city),
            state: Set(details.state),
            pin_code: Set(details.pin_code),
            payment_mode: Set(payment_mode),
            payment_status: Set(payment_status),
            order_status: Set(OrderStatus::Confirmed),
            razorpay_order_id: Set(None),
            razorpay_payment_id: Set(None),
            razorpay_signature: Set(None),
            whatsapp_message_sid: Set(None),
            ..Default::default()
        };
        if let Some(audit) = audit {
            order.razorpay_order_id = Set(Some(audit.order_id));
            order.razorpay_payment_id = Set(Some(audit.payment_id));
            order.razorpay_signature = Set(Some(audit.signature));
        }

        let stored = order.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to store order");
            ServiceError::DatabaseError(e)
        })?;

        let mode_label = match payment_mode {
            PaymentMode::Cod => "COD",
            PaymentMode::Online => "ONLINE",
        };
        counter!("storefront.orders.created", 1, "payment_mode" => mode_label);
        info!(
            order_id = %stored.order_id,
            payment_mode = mode_label,
            total = %stored.total_amount,
            "Order created"
        );
        Ok(stored)
    }

    /// Sends the owner notification and records its message id. Failures
    /// never undo the order; they come back as a warning.
    async fn notify_best_effort(
        &self,
        stored: order::Model,
    ) -> (String, Option<String>, Option<String>) {
        let order_id = stored.order_id.clone();
        info!(order_id = %order_id, "Sending WhatsApp notification");

        match self.notifier.send_order_notification(&stored).await {
            Ok(sid) => {
                let mut active = stored.into_active_model();
                active.whatsapp_message_sid = Set(Some(sid.clone()));
                if let Err(e) = active.update(&*self.db_pool).await {
                    // The message went out; only the bookkeeping is lost.
                    error!(order_id = %order_id, error = %e, "Failed to record notification sid");
                }
                info!(order_id = %order_id, message_sid = %sid, "Notification sent");
                (order_id, Some(sid), None)
            }
            Err(e) => {
                counter!("storefront.notifications.failed", 1);
                warn!(order_id = %order_id, error = %e, "WhatsApp notification failed");
                let warning = format!("WhatsApp notification could not be sent: {}", e);
                (order_id, None, Some(warning))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_ids_have_fixed_shape() {
        let id = generate_order_id();
        assert_eq!(id.len(), 11);
        assert!(id.starts_with("ORD"));
        assert!(id[3..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        assert_ne!(generate_order_id(), id);
    }
}
