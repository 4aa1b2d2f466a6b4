use crate::config::MessagingConfig;
use crate::entities::order::{self, PaymentMode};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};

/// Failures of the messaging adapter. Always downgraded to a warning by callers.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Twilio credentials not configured. Missing: {}", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    #[error("Twilio WhatsApp Error: {0}")]
    Transport(String),

    #[error("Twilio WhatsApp Error: {status} {body}")]
    Provider { status: u16, body: String },
}

#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Sends the order summary and returns the provider's message id.
    async fn send_order_notification(&self, order: &order::Model)
        -> Result<String, NotificationError>;
}

/// Renders the plain-text summary sent to the shop owner.
pub fn format_order_message(order: &order::Model) -> String {
    let payment_line = match order.payment_mode {
        PaymentMode::Online => "Online (PAID)",
        PaymentMode::Cod => "Cash on Delivery",
    };

    format!(
        "🛍️ *New Order Received!*\n\
         \n\
         📦 *Order Details:*\n\
         Order ID: {order_id}\n\
         Product: {product}\n\
         Size: {size}\n\
         Quantity: {quantity}\n\
         Total: ₹{total:.2}\n\
         Payment: {payment_line}\n\
         \n\
         👤 *Customer Details:*\n\
         Name: {name}\n\
         Mobile: {country_code} {mobile}\n\
         \n\
         📍 *Delivery Address:*\n\
         House/Flat: {house}\n\
         Street: {street}\n\
         City: {city}\n\
         State: {state}\n\
         PIN Code: {pin}\n\
         \n\
         Please process this order!",
        order_id = order.order_id,
        product = order.product_title,
        size = order.size,
        quantity = order.quantity,
        total = order.total_amount,
        payment_line = payment_line,
        name = order.full_name,
        country_code = order.country_code,
        mobile = order.mobile,
        house = order.house_flat_no,
        street = order.street_locality,
        city = order.city,
        state = order.state,
        pin = order.pin_code,
    )
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

struct Credentials<'a> {
    account_sid: &'a str,
    auth_token: &'a str,
    from: &'a str,
    to: &'a str,
}

/// Twilio WhatsApp messaging client.
#[derive(Clone)]
pub struct TwilioWhatsAppNotifier {
    client: reqwest::Client,
    config: MessagingConfig,
}

impl TwilioWhatsAppNotifier {
    pub fn new(config: MessagingConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn credentials(&self) -> Result<Credentials<'_>, NotificationError> {
        let cfg = &self.config;
        let mut missing = Vec::new();
        if cfg.account_sid.is_none() {
            missing.push("TWILIO_ACCOUNT_SID");
        }
        if cfg.auth_token.is_none() {
            missing.push("TWILIO_AUTH_TOKEN");
        }
        if cfg.whatsapp_from.is_none() {
            missing.push("TWILIO_WHATSAPP_FROM");
        }
        if cfg.whatsapp_to.is_none() {
            missing.push("TWILIO_WHATSAPP_TO");
        }

        match (
            cfg.account_sid.as_deref(),
            cfg.auth_token.as_deref(),
            cfg.whatsapp_from.as_deref(),
            cfg.whatsapp_to.as_deref(),
        ) {
            (Some(account_sid), Some(auth_token), Some(from), Some(to)) => Ok(Credentials {
                account_sid,
                auth_token,
                from,
                to,
            }),
            _ => Err(NotificationError::Configuration { missing }),
        }
    }
}

#[async_trait]
impl OrderNotifier for TwilioWhatsAppNotifier {
    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    async fn send_order_notification(
        &self,
        order: &order::Model,
    ) -> Result<String, NotificationError> {
        let creds = self.credentials()?;
        let body = format_order_message(order);

        let response = self
            .client
            .post(format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                self.config.base_url, creds.account_sid
            ))
            .basic_auth(creds.account_sid, Some(creds.auth_token))
            .form(&[("Body", body.as_str()), ("From", creds.from), ("To", creds.to)])
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        info!(
            message_sid = %message.sid,
            status = message.status.as_deref().unwrap_or("unknown"),
            "WhatsApp notification sent"
        );
        Ok(message.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::order::{OrderStatus, PaymentStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    pub(crate) fn sample_order(mode: PaymentMode) -> order::Model {
        order::Model {
            id: 1,
            order_id: "ORD1A2B3C4D".into(),
            product_title: "Polo".into(),
            size: "M".into(),
            quantity: 2,
            price: dec!(399.00),
            total_amount: dec!(798),
            full_name: "Asha Rao".into(),
            mobile: "9876543210".into(),
            country_code: "+91".into(),
            house_flat_no: "12B".into(),
            street_locality: "MG Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            pin_code: "560001".into(),
            payment_mode: mode,
            payment_status: PaymentStatus::Pending,
            razorpay_order_id: None,
            razorpay_payment_id: None,
            razorpay_signature: None,
            order_status: OrderStatus::Confirmed,
            whatsapp_message_sid: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn message_lists_fields_in_order() {
        let text = format_order_message(&sample_order(PaymentMode::Cod));
        let markers = [
            "Order ID: ORD1A2B3C4D",
            "Product: Polo",
            "Size: M",
            "Quantity: 2",
            "Total: ₹798.00",
            "Payment: Cash on Delivery",
            "Name: Asha Rao",
            "Mobile: +91 9876543210",
            "House/Flat: 12B",
            "Street: MG Road",
            "City: Bengaluru",
            "State: Karnataka",
            "PIN Code: 560001",
        ];

        let mut cursor = 0;
        for marker in markers {
            let pos = text[cursor..]
                .find(marker)
                .unwrap_or_else(|| panic!("{marker} missing or out of order"));
            cursor += pos + marker.len();
        }
    }

    #[test]
    fn online_orders_are_marked_paid() {
        let text = format_order_message(&sample_order(PaymentMode::Online));
        assert!(text.contains("Payment: Online (PAID)"));
    }

    #[tokio::test]
    async fn missing_configuration_lists_every_key() {
        let notifier = TwilioWhatsAppNotifier::new(MessagingConfig {
            account_sid: Some("AC123".into()),
            auth_token: None,
            whatsapp_from: None,
            whatsapp_to: Some("whatsapp:+919999999999".into()),
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let err = notifier
            .send_order_notification(&sample_order(PaymentMode::Cod))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Twilio credentials not configured. Missing: TWILIO_AUTH_TOKEN, TWILIO_WHATSAPP_FROM"
        );
    }
}
