//! Un-coalesced forwarding: one frame request per call.
//!
//! Each [`forward_frame`] call asks the clock for its own frame, evaluates its
//! single transformer when that frame fires and delivers a one-element batch.
//! Nothing is shared between calls, so `N` calls cost `N` clock requests.
//! Passthrough batches carry `frame_seq = 0`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use contracts::{Batch, ContractError, DeliveryChannel, FrameClock, SubscriberId, Transformer};
use observability::{record_batch_delivered, record_frame_requested, record_transformer_failure};
use tracing::warn;

use crate::panic_message;

/// Forward one transformer on its own frame.
pub fn forward_frame<R, C, D>(
    clock: &C,
    delivery: Arc<D>,
    subscriber_id: impl Into<SubscriberId>,
    transformer: Transformer<R>,
) where
    R: Send + 'static,
    C: FrameClock + ?Sized,
    D: DeliveryChannel<R> + ?Sized + 'static,
{
    let subscriber_id = subscriber_id.into();
    record_frame_requested();

    clock.request_frame(Box::new(move |timestamp| {
        let result = match panic::catch_unwind(AssertUnwindSafe(|| transformer(timestamp))) {
            Ok(result) => result,
            Err(payload) => {
                record_transformer_failure(&subscriber_id);
                warn!(
                    subscriber = %subscriber_id,
                    timestamp,
                    message = %panic_message(&*payload),
                    "passthrough transformer panicked"
                );
                return;
            }
        };

        let batch = Batch {
            subscriber_id: subscriber_id.clone(),
            frame_seq: 0,
            timestamp,
            results: vec![result],
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| delivery.deliver(batch)))
            .unwrap_or_else(|payload| {
                Err(ContractError::Other(format!(
                    "delivery channel panicked: {}",
                    panic_message(&*payload)
                )))
            });
        record_batch_delivered(&subscriber_id, 1, outcome.is_ok());
        if let Err(e) = outcome {
            warn!(subscriber = %subscriber_id, timestamp, error = %e, "passthrough delivery failed");
        }
    }));
}
