use std::sync::Arc;

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        FulfillShipmentCommand, FulfillmentOutcome, FulfillmentValidation, LineShortage, StockKey,
    },
    stock::{StockError, StockStore},
};

lazy_static! {
    static ref SHIPMENT_FULFILLMENTS: IntCounter = IntCounter::new(
        "shipment_fulfillments_total",
        "Total number of committed shipment fulfillments"
    )
    .expect("metric can be created");
    static ref SHIPMENT_FULFILLMENT_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "shipment_fulfillment_failures_total",
            "Total number of failed shipment fulfillments"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
    static ref SHIPMENT_FULFILLED_QUANTITY: IntCounter = IntCounter::new(
        "shipment_fulfilled_quantity_total",
        "Total quantity of stock shipped through fulfillment"
    )
    .expect("metric can be created");
}

/// Coordinates decrementing every line of a shipment as one logical unit.
///
/// The store only guarantees per-record atomicity, so a multi-line shipment
/// is fulfilled as a sequence of conditional decrements with explicit
/// compensation: on the first failing line, every decrement already applied
/// in this attempt is re-incremented in reverse order before the rejection
/// is returned. Concurrent observers of raw quantities may see a partial
/// decrement before compensation completes; the fulfillment outcome is the
/// unit of visible truth.
#[derive(Clone)]
pub struct FulfillmentService {
    store: Arc<dyn StockStore>,
    event_sender: Option<EventSender>,
}

impl FulfillmentService {
    pub fn new(store: Arc<dyn StockStore>, event_sender: Option<EventSender>) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Fulfills a shipment: decrements every line from the source location,
    /// all-or-nothing.
    ///
    /// Returns `Committed` when every line was taken, `Rejected` with the
    /// failing line's shortage when stock was insufficient (after all
    /// partial decrements were compensated), `ServiceError::NotFound` for a
    /// line that references no stock record, and
    /// `ServiceError::InvariantViolation` if a compensating increment
    /// failed, which means the ledger needs investigation.
    #[instrument(skip(self, command), fields(shipment_id = %command.shipment_id, lines = command.lines.len()))]
    pub async fn fulfill_shipment(
        &self,
        command: FulfillShipmentCommand,
    ) -> Result<FulfillmentOutcome, ServiceError> {
        command.validate().map_err(|e| {
            SHIPMENT_FULFILLMENT_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            ServiceError::ValidationError(format!("invalid fulfillment request: {}", e))
        })?;

        let shipment_id = command.shipment_id;
        let to_branch_id = command.to_branch_id.clone();
        let store = Arc::clone(&self.store);

        // The decrement loop and any compensation run on a detached task: a
        // caller dropping this future mid-flight must never strand partial
        // decrements.
        let outcome = tokio::spawn(apply_lines(store, self.event_sender.clone(), command))
            .await
            .map_err(|e| {
                SHIPMENT_FULFILLMENT_FAILURES
                    .with_label_values(&["internal_error"])
                    .inc();
                ServiceError::InternalError(format!("fulfillment task failed: {}", e))
            })?
            .map_err(|err| {
                SHIPMENT_FULFILLMENT_FAILURES
                    .with_label_values(&[failure_label(&err)])
                    .inc();
                err
            })?;

        match &outcome {
            FulfillmentOutcome::Committed { total_quantity, .. } => {
                SHIPMENT_FULFILLMENTS.inc();
                SHIPMENT_FULFILLED_QUANTITY.inc_by(*total_quantity as u64);
                info!(%shipment_id, %to_branch_id, total_quantity, "shipment fulfilled");

                if let Some(sender) = &self.event_sender {
                    let _ = sender
                        .send(Event::ShipmentFulfilled {
                            shipment_id,
                            to_branch_id,
                            total_quantity: *total_quantity,
                        })
                        .await;
                }
            }
            FulfillmentOutcome::Rejected { shortage, .. } => {
                SHIPMENT_FULFILLMENT_FAILURES
                    .with_label_values(&["insufficient_stock"])
                    .inc();
                warn!(
                    %shipment_id,
                    item_id = %shortage.item_id,
                    requested = shortage.requested_quantity,
                    available = shortage.available_quantity,
                    "shipment rejected for insufficient stock"
                );

                if let Some(sender) = &self.event_sender {
                    let _ = sender
                        .send(Event::ShipmentRejected {
                            shipment_id,
                            category: shortage.category,
                            item_id: shortage.item_id.clone(),
                            shortage: shortage.shortage,
                        })
                        .await;
                }
            }
        }

        Ok(outcome)
    }

    /// Read-only availability snapshot for every line of a shipment.
    ///
    /// Advisory only: stock can change between this check and fulfillment.
    /// The authoritative check is the conditional decrement inside
    /// [`Self::fulfill_shipment`].
    #[instrument(skip(self, command), fields(shipment_id = %command.shipment_id))]
    pub async fn check_availability(
        &self,
        command: &FulfillShipmentCommand,
    ) -> Result<FulfillmentValidation, ServiceError> {
        command.validate()?;

        let mut shortages = Vec::new();
        let mut available_lines = 0;

        for line in &command.lines {
            let key = command.line_key(line);
            match self.store.get_available(&key).await {
                Ok(on_hand) if on_hand.quantity >= line.quantity => available_lines += 1,
                Ok(on_hand) => shortages.push(LineShortage {
                    category: line.category,
                    item_id: line.item_id.clone(),
                    item_name: Some(on_hand.item_name),
                    requested_quantity: line.quantity,
                    available_quantity: on_hand.quantity,
                    shortage: line.quantity - on_hand.quantity,
                }),
                Err(StockError::NotFound { .. }) => shortages.push(LineShortage {
                    category: line.category,
                    item_id: line.item_id.clone(),
                    item_name: None,
                    requested_quantity: line.quantity,
                    available_quantity: 0,
                    shortage: line.quantity,
                }),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(FulfillmentValidation {
            can_fulfill: shortages.is_empty(),
            total_lines: command.lines.len(),
            available_lines,
            shortages,
        })
    }
}

fn failure_label(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::NotFound(_) => "not_found",
        ServiceError::InvariantViolation(_) => "invariant_violation",
        ServiceError::DatabaseError(_) => "database_error",
        _ => "internal_error",
    }
}

/// Decrements every line in request order, compensating already-applied
/// lines in reverse order on the first failure. Every applied operation,
/// compensating increments included, is reported as a stock event.
async fn apply_lines(
    store: Arc<dyn StockStore>,
    events: Option<EventSender>,
    command: FulfillShipmentCommand,
) -> Result<FulfillmentOutcome, ServiceError> {
    let mut applied: Vec<(StockKey, i64)> = Vec::with_capacity(command.lines.len());

    for line in &command.lines {
        let key = command.line_key(line);
        match store.try_decrement(&key, line.quantity).await {
            Ok(()) => {
                if let Some(sender) = &events {
                    let _ = sender
                        .send(Event::StockDecremented {
                            category: line.category,
                            branch_id: command.from_branch_id.clone(),
                            item_id: line.item_id.clone(),
                            amount: line.quantity,
                        })
                        .await;
                }
                applied.push((key, line.quantity));
            }
            Err(StockError::Insufficient {
                requested,
                available,
                ..
            }) => {
                compensate(store.as_ref(), events.as_ref(), &applied).await?;
                let item_name = store
                    .get_available(&key)
                    .await
                    .ok()
                    .map(|on_hand| on_hand.item_name);
                return Ok(FulfillmentOutcome::Rejected {
                    shipment_id: command.shipment_id,
                    shortage: LineShortage {
                        category: line.category,
                        item_id: line.item_id.clone(),
                        item_name,
                        requested_quantity: requested,
                        available_quantity: available,
                        shortage: requested - available,
                    },
                });
            }
            Err(err @ StockError::NotFound { .. }) => {
                compensate(store.as_ref(), events.as_ref(), &applied).await?;
                return Err(ServiceError::NotFound(err.to_string()));
            }
            Err(StockError::Database(err)) => {
                compensate(store.as_ref(), events.as_ref(), &applied).await?;
                return Err(ServiceError::DatabaseError(err));
            }
        }
    }

    let total_quantity = command.lines.iter().map(|line| line.quantity).sum();
    Ok(FulfillmentOutcome::Committed {
        shipment_id: command.shipment_id,
        total_quantity,
    })
}

/// Re-applies already-taken decrements as increments, newest first. A
/// failure here means a record vanished or the backend broke between the
/// decrement and its inverse; that is ledger corruption, not a business
/// condition, and is surfaced as an invariant violation.
async fn compensate(
    store: &dyn StockStore,
    events: Option<&EventSender>,
    applied: &[(StockKey, i64)],
) -> Result<(), ServiceError> {
    for (key, amount) in applied.iter().rev() {
        if let Err(err) = store.increment(key, *amount).await {
            error!(%key, amount, %err, "compensating increment failed; stock ledger is inconsistent");
            return Err(ServiceError::InvariantViolation(format!(
                "compensation failed for {}: {}",
                key, err
            )));
        }
        if let Some(sender) = events {
            let _ = sender
                .send(Event::StockIncremented {
                    category: key.category,
                    branch_id: key.branch_id.clone(),
                    item_id: key.item_id.clone(),
                    amount: *amount,
                })
                .await;
        }
    }
    Ok(())
}
