//! Best-effort fan-out of order notifications.
//!
//! The dispatcher is driven by engine events, which are only published after an order has been committed. Nothing
//! in here returns an error to its caller: every failure is logged and counted in the [`DispatchReport`], and nothing
//! is retried. Each outbound call is bounded by the configured timeout, and admin push messages go out as an
//! unordered concurrent batch, so one dead subscription can not hold up the others.
use std::{future::Future, sync::Arc, time::Duration};

use futures_util::future::join_all;
use livique_engine::{
    db_types::{Order, PushSubscription},
    events::{EventHooks, ReconciliationRequiredEvent},
    traits::PushSubscriptionManagement,
};
use log::*;

use crate::{
    mail::{Email, Mailer},
    push::{PushMessage, PushSender},
    templates,
    NotificationError,
};

/// What happened to a single notification fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub emails_sent: usize,
    pub emails_failed: usize,
    pub pushes_sent: usize,
    pub pushes_failed: usize,
    pub subscriptions_pruned: usize,
}

pub struct NotificationDispatcher<M, P, S> {
    mailer: M,
    push: P,
    subscriptions: S,
    operator_email: Option<String>,
    timeout: Duration,
}

pub(crate) async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, NotificationError>
where F: Future<Output = Result<T, NotificationError>> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(NotificationError::Timeout(timeout.as_millis())),
    }
}

impl<M, P, S> NotificationDispatcher<M, P, S>
where
    M: Mailer,
    P: PushSender,
    S: PushSubscriptionManagement,
{
    pub fn new(mailer: M, push: P, subscriptions: S, operator_email: Option<String>, timeout: Duration) -> Self {
        Self { mailer, push, subscriptions, operator_email, timeout }
    }

    async fn deliver(&self, email: Email, report: &mut DispatchReport) {
        let subject = email.subject.clone();
        let to = email.to.clone();
        match with_timeout(self.timeout, self.mailer.send(email)).await {
            Ok(()) => {
                report.emails_sent += 1;
                debug!("✉️ Sent \"{subject}\" to {to}");
            },
            Err(e) => {
                report.emails_failed += 1;
                warn!("✉️ Could not send \"{subject}\" to {to}. {e}");
            },
        }
    }

    async fn broadcast(&self, message: PushMessage, report: &mut DispatchReport) {
        let subs = match with_timeout(self.timeout, async {
            self.subscriptions.fetch_subscriptions().await.map_err(|e| NotificationError::Store(e.to_string()))
        })
        .await
        {
            Ok(subs) => subs,
            Err(e) => {
                warn!("🔔️ Could not load push subscriptions. {e}");
                return;
            },
        };
        if subs.is_empty() {
            trace!("🔔️ No admin push subscriptions registered");
            return;
        }
        let sends = subs.iter().map(|sub| {
            let message = &message;
            async move { (sub, with_timeout(self.timeout, self.push.send(sub, message)).await) }
        });
        let results: Vec<(&PushSubscription, Result<(), NotificationError>)> = join_all(sends).await;
        for (sub, result) in results {
            match result {
                Ok(()) => report.pushes_sent += 1,
                Err(NotificationError::SubscriptionGone) => {
                    report.pushes_failed += 1;
                    let removal = with_timeout(self.timeout, async {
                        self.subscriptions
                            .remove_subscription(&sub.endpoint)
                            .await
                            .map_err(|e| NotificationError::Store(e.to_string()))
                    });
                    match removal.await {
                        Ok(_) => {
                            report.subscriptions_pruned += 1;
                            info!("🔔️ Removed expired push subscription #{}", sub.id);
                        },
                        Err(e) => warn!("🔔️ Could not remove expired push subscription #{}. {e}", sub.id),
                    }
                },
                Err(e) => {
                    report.pushes_failed += 1;
                    warn!("🔔️ Push to subscription #{} failed. {e}", sub.id);
                },
            }
        }
    }

    /// Customer confirmation (if the order has an email), operator alert and admin push for a new order.
    pub async fn notify_order_created(&self, order: &Order) -> DispatchReport {
        let mut report = DispatchReport::default();
        match templates::customer_confirmation(order) {
            Some(email) => self.deliver(email, &mut report).await,
            None => debug!("✉️ Order {} has no customer email. Skipping the confirmation.", order.order_id),
        }
        if let Some(operator) = &self.operator_email {
            self.deliver(templates::operator_new_order(order, operator), &mut report).await;
        }
        self.broadcast(templates::admin_push(order), &mut report).await;
        info!("📬️ Notifications for new order {} done. {report:?}", order.order_id);
        report
    }

    /// Shipment emails for the customer and operator. There is no push for tracking updates.
    pub async fn notify_tracking_assigned(&self, order: &Order, tracking_id: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        if let Some(email) = templates::tracking_update(order, tracking_id) {
            self.deliver(email, &mut report).await;
        }
        if let Some(operator) = &self.operator_email {
            self.deliver(templates::operator_tracking_update(order, tracking_id, operator), &mut report).await;
        }
        info!("📬️ Tracking notifications for {} done. {report:?}", order.order_id);
        report
    }

    /// Tells the operator about a captured payment that has no order.
    pub async fn notify_reconciliation_required(&self, event: &ReconciliationRequiredEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        match &self.operator_email {
            Some(operator) => self.deliver(templates::reconciliation_alert(event, operator), &mut report).await,
            None => error!(
                "📬️ No operator email configured. Gateway payment {} needs manual reconciliation.",
                event.gateway_payment_id
            ),
        }
        report
    }

    /// Event hooks that route engine events into this dispatcher.
    pub fn hooks(self: Arc<Self>) -> EventHooks {
        let mut hooks = EventHooks::default();
        let d = Arc::clone(&self);
        hooks.on_order_created(move |ev| {
            let d = Arc::clone(&d);
            Box::pin(async move {
                d.notify_order_created(&ev.order).await;
            })
        });
        let d = Arc::clone(&self);
        hooks.on_tracking_assigned(move |ev| {
            let d = Arc::clone(&d);
            Box::pin(async move {
                d.notify_tracking_assigned(&ev.order, &ev.tracking_id).await;
            })
        });
        let d = self;
        hooks.on_reconciliation_required(move |ev| {
            let d = Arc::clone(&d);
            Box::pin(async move {
                d.notify_reconciliation_required(&ev).await;
            })
        });
        hooks
    }
}
