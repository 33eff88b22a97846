use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{ApprovalRequestedEvent, EventHandler, EventProducer, Handler, InvoiceResolvedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub approval_requested_producer: Vec<EventProducer<ApprovalRequestedEvent>>,
    pub invoice_resolved_producer: Vec<EventProducer<InvoiceResolvedEvent>>,
}

pub struct EventHandlers {
    pub on_approval_requested: Option<EventHandler<ApprovalRequestedEvent>>,
    pub on_invoice_resolved: Option<EventHandler<InvoiceResolvedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_approval_requested = hooks.on_approval_requested.map(|f| EventHandler::new(buffer_size, f));
        let on_invoice_resolved = hooks.on_invoice_resolved.map(|f| EventHandler::new(buffer_size, f));
        Self { on_approval_requested, on_invoice_resolved }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_approval_requested {
            result.approval_requested_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_invoice_resolved {
            result.invoice_resolved_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_approval_requested {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_invoice_resolved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_approval_requested: Option<Handler<ApprovalRequestedEvent>>,
    pub on_invoice_resolved: Option<Handler<InvoiceResolvedEvent>>,
}

impl EventHooks {
    pub fn on_approval_requested<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ApprovalRequestedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_approval_requested = Some(Arc::new(f));
        self
    }

    pub fn on_invoice_resolved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(InvoiceResolvedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_invoice_resolved = Some(Arc::new(f));
        self
    }
}
