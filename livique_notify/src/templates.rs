//! Plain, inline-styled email bodies. Every value that came from a customer is HTML-escaped.
use std::fmt::Write;

use chrono::{DateTime, Utc};
use livique_engine::{db_types::Order, events::ReconciliationRequiredEvent};

use crate::{mail::Email, push::PushMessage};

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn item_rows(order: &Order) -> (String, String) {
    let mut html = String::new();
    let mut text = String::new();
    for item in &order.items {
        let _ = write!(
            html,
            "<tr><td>{}</td><td align=\"right\">{}</td><td align=\"right\">{}</td><td align=\"right\">{}</td></tr>",
            escape(&item.name),
            item.quantity,
            item.unit_price,
            item.line_total()
        );
        let _ = writeln!(text, "  {} x {} @ {} = {}", item.quantity, item.name, item.unit_price, item.line_total());
    }
    (html, text)
}

fn totals(order: &Order) -> (String, String) {
    let html = format!(
        "<p>Subtotal: {}<br/>Delivery: {}<br/><strong>Total: {}</strong></p>",
        order.subtotal, order.delivery_charges, order.total
    );
    let text = format!("Subtotal: {}\nDelivery: {}\nTotal: {}\n", order.subtotal, order.delivery_charges, order.total);
    (html, text)
}

fn address_lines(order: &Order) -> String {
    let a = &order.address;
    format!("{}, {}, {}, {} {} (phone {})", a.full_name, a.street, a.city, a.state, a.zip_code, a.mobile)
}

/// Confirmation for the customer. Returns `None` if we have no address to send it to.
pub fn customer_confirmation(order: &Order) -> Option<Email> {
    let to = order.contact.email.clone()?;
    let name = order.contact.display_name();
    let (rows, lines) = item_rows(order);
    let (totals_html, totals_text) = totals(order);
    let id = order.order_id.as_str();
    let html = format!(
        "<h2>Thank you for your order, {name}!</h2>\
         <p>Your order <strong>{id}</strong> is confirmed. Payment: {method} ({status}).</p>\
         <table>{rows}</table>{totals_html}\
         <p>Delivering to: {address}</p>",
        name = escape(name),
        method = order.payment_method,
        status = order.payment_status,
        address = escape(&address_lines(order)),
    );
    let text = format!(
        "Thank you for your order, {name}!\n\nOrder {id} is confirmed. Payment: {} ({}).\n\n{lines}\n{totals_text}\nDelivering \
         to: {}\n",
        order.payment_method,
        order.payment_status,
        address_lines(order)
    );
    Some(Email { to, subject: format!("Your Livique order {id} is confirmed"), html, text })
}

/// New-order alert for the storefront operator.
pub fn operator_new_order(order: &Order, operator: &str) -> Email {
    let (rows, lines) = item_rows(order);
    let (totals_html, totals_text) = totals(order);
    let id = order.order_id.as_str();
    let customer = order.contact.display_name();
    let email = order.contact.email.as_deref().unwrap_or("no email");
    let html = format!(
        "<h2>New order {id}</h2><p>Customer: {} &lt;{}&gt; (user {})<br/>Payment: {} ({})</p>\
         <table>{rows}</table>{totals_html}<p>Ship to: {}</p>",
        escape(customer),
        escape(email),
        escape(order.user_id.as_str()),
        order.payment_method,
        order.payment_status,
        escape(&address_lines(order)),
    );
    let text = format!(
        "New order {id}\nCustomer: {customer} <{email}> (user {})\nPayment: {} ({})\n\n{lines}\n{totals_text}\nShip to: {}\n",
        order.user_id,
        order.payment_method,
        order.payment_status,
        address_lines(order)
    );
    Email { to: operator.to_string(), subject: format!("New order {id} ({})", order.total), html, text }
}

/// Shipment update for the customer. Returns `None` if we have no address to send it to.
pub fn tracking_update(order: &Order, tracking_id: &str) -> Option<Email> {
    let to = order.contact.email.clone()?;
    let id = order.order_id.as_str();
    let name = order.contact.display_name();
    let html = format!(
        "<h2>Your order {id} has shipped</h2><p>Hi {}, your tracking id is <strong>{}</strong>.</p>",
        escape(name),
        escape(tracking_id)
    );
    let text = format!("Hi {name}, your order {id} has shipped. Tracking id: {tracking_id}\n");
    Some(Email { to, subject: format!("Your Livique order {id} has shipped"), html, text })
}

pub fn operator_tracking_update(order: &Order, tracking_id: &str, operator: &str) -> Email {
    let id = order.order_id.as_str();
    let text = format!("Order {id} was marked as shipped with tracking id {tracking_id}\n");
    Email {
        to: operator.to_string(),
        subject: format!("Order {id} shipped"),
        html: format!("<p>{}</p>", escape(text.trim())),
        text,
    }
}

/// Alert for a payment that was captured by the gateway but has no matching order.
pub fn reconciliation_alert(ev: &ReconciliationRequiredEvent, operator: &str) -> Email {
    let text = format!(
        "A gateway payment was captured but the order could not be saved. Refund it or create the order by hand.\n\n\
         Gateway order: {}\nGateway payment: {}\nUser: {}\nError: {}\n",
        ev.gateway_order_id, ev.gateway_payment_id, ev.user_id, ev.error
    );
    Email {
        to: operator.to_string(),
        subject: format!("ACTION REQUIRED: unrecorded payment {}", ev.gateway_payment_id),
        html: format!("<pre>{}</pre>", escape(&text)),
        text,
    }
}

pub fn otp_email(to: &str, code: &str, expires_at: DateTime<Utc>) -> Email {
    let minutes = (expires_at - Utc::now()).num_minutes().max(1);
    let text = format!("Your Livique verification code is {code}. It expires in {minutes} minutes.\n");
    Email {
        to: to.to_string(),
        subject: "Your Livique verification code".to_string(),
        html: format!("<p>Your Livique verification code is <strong>{code}</strong>.</p><p>It expires in {minutes} minutes.</p>"),
        text,
    }
}

pub fn admin_push(order: &Order) -> PushMessage {
    PushMessage {
        title: format!("New order {}", order.order_id.as_str()),
        body: format!("{} from {} ({})", order.total, order.contact.display_name(), order.payment_method),
        url: Some(format!("/admin/orders/{}", order.order_id.as_str())),
    }
}
