use std::{
    ops::ControlFlow,
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    time::{Duration, Instant},
};

use rust_socketio::{client::Client, ClientBuilder, Event, Payload, RawClient};
use serde_json::{json, Value};
use url::Url;

use super::errors::ApiClientError;
use super::models::{JobStatus, ListenOutcome};

pub(crate) const SUBSCRIBE_EVENT: &str = "job-check";
pub(crate) const STATUS_EVENT: &str = "job-status";

/// What the socket worker thread forwards to the listening caller.
#[derive(Debug)]
pub(crate) enum SocketEvent {
    Status(JobStatus),
    Error(String),
    Closed,
}

#[allow(deprecated)]
fn payload_values(payload: Payload) -> Vec<Value> {
    match payload {
        Payload::Text(values) => values,
        Payload::String(raw) => match serde_json::from_str(&raw) {
            Ok(value) => vec![value],
            Err(e) => {
                log::warn!("Ignoring undecodable {STATUS_EVENT} payload: {e}");
                vec![]
            }
        },
        Payload::Binary(bytes) => {
            log::warn!("Ignoring {} byte binary {STATUS_EVENT} payload", bytes.len());
            vec![]
        }
    }
}

fn forward(tx: &Sender<SocketEvent>, event: SocketEvent) {
    // The receiver is gone once the caller stopped listening
    if tx.send(event).is_err() {
        log::trace!("Dropping socket event, listener already finished");
    }
}

/// Ids the service can't know about: null, `0`, or an empty string.
pub(crate) fn is_blank_id(check_id: &Value) -> bool {
    match check_id {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

pub(crate) fn subscription_payload(check_id: &Value) -> Value {
    json!({ "jobid": check_id })
}

/// Connect to the push endpoint and ask for status events of `check_id`.
///
/// Events arrive on the returned channel in the order the socket
/// delivered them.
pub(crate) fn subscribe(
    url: &Url,
    check_id: &Value,
) -> Result<(Client, Receiver<SocketEvent>), ApiClientError> {
    let (tx, rx) = mpsc::channel();
    let status_tx = tx.clone();
    let error_tx = tx.clone();
    let close_tx = tx;

    log::debug!("Connecting to {url} for job {check_id}");
    let socket = ClientBuilder::new(url.as_str())
        .on(STATUS_EVENT, move |payload: Payload, _: RawClient| {
            for value in payload_values(payload) {
                forward(&status_tx, SocketEvent::Status(JobStatus::new(value)));
            }
        })
        .on(Event::Error, move |payload: Payload, _: RawClient| {
            let message = payload_values(payload)
                .into_iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            forward(&error_tx, SocketEvent::Error(message));
        })
        .on(Event::Close, move |_: Payload, _: RawClient| {
            forward(&close_tx, SocketEvent::Closed);
        })
        .connect()?;

    socket.emit(SUBSCRIBE_EVENT, subscription_payload(check_id))?;

    Ok((socket, rx))
}

/// Dispatch status events to `callback` until the job terminates, the
/// callback breaks, or `timeout` runs out.
///
/// The terminal event itself is dispatched before returning. Nothing is
/// read from `events` afterwards.
pub(crate) fn pump<F>(
    events: &Receiver<SocketEvent>,
    timeout: Option<Duration>,
    mut callback: F,
) -> Result<ListenOutcome, ApiClientError>
where
    F: FnMut(&JobStatus) -> ControlFlow<()>,
{
    let deadline = timeout.map(|t| (Instant::now() + t, t));

    loop {
        let event = match deadline {
            None => events.recv().unwrap_or(SocketEvent::Closed),
            Some((deadline, limit)) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match events.recv_timeout(remaining) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => {
                        return Err(ApiClientError::ListenTimeout(limit))
                    }
                    Err(RecvTimeoutError::Disconnected) => SocketEvent::Closed,
                }
            }
        };

        match event {
            SocketEvent::Status(status) => {
                log::debug!("Received {STATUS_EVENT}: {}", status.raw());
                let flow = callback(&status);

                if status.error() {
                    return Ok(ListenOutcome::Failed(status));
                }
                if status.is_complete() {
                    return Ok(ListenOutcome::Completed(status));
                }
                if flow.is_break() {
                    return Ok(ListenOutcome::Cancelled);
                }
            }
            SocketEvent::Error(message) => return Err(ApiClientError::Subscription(message)),
            SocketEvent::Closed => {
                return Err(ApiClientError::Subscription(
                    "connection closed before the job finished".to_owned(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn status(value: Value) -> SocketEvent {
        SocketEvent::Status(JobStatus::new(value))
    }

    #[test]
    fn test_dispatches_until_complete() {
        let (tx, rx) = mpsc::channel();
        tx.send(status(json!({"error": 0, "percent": 50}))).unwrap();
        tx.send(status(json!({"error": 0, "percent": 100}))).unwrap();
        tx.send(status(json!({"error": 0, "percent": 30}))).unwrap();

        let mut seen = vec![];
        let outcome = pump(&rx, None, |s| {
            seen.push(s.raw().clone());
            ControlFlow::Continue(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                json!({"error": 0, "percent": 50}),
                json!({"error": 0, "percent": 100})
            ]
        );
        assert_eq!(
            outcome,
            ListenOutcome::Completed(JobStatus::new(json!({"error": 0, "percent": 100})))
        );
        // The event after completion is never consumed
        assert!(matches!(rx.try_recv(), Ok(SocketEvent::Status(_))));
    }

    #[test]
    fn test_error_flag_stops_listening() {
        let (tx, rx) = mpsc::channel();
        tx.send(status(json!({"error": 1, "percent": 20}))).unwrap();

        let mut calls = 0;
        let outcome = pump(&rx, None, |_| {
            calls += 1;
            ControlFlow::Continue(())
        })
        .unwrap();

        assert_eq!(calls, 1);
        assert!(matches!(outcome, ListenOutcome::Failed(_)));
    }

    #[test]
    fn test_callback_can_cancel() {
        let (tx, rx) = mpsc::channel();
        tx.send(status(json!({"error": 0, "percent": 10}))).unwrap();
        tx.send(status(json!({"error": 0, "percent": 20}))).unwrap();

        let mut calls = 0;
        let outcome = pump(&rx, None, |_| {
            calls += 1;
            ControlFlow::Break(())
        })
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(outcome, ListenOutcome::Cancelled);
    }

    #[test]
    fn test_timeout_without_terminal_event() {
        let (tx, rx) = mpsc::channel();
        tx.send(status(json!({"error": 0, "percent": 10}))).unwrap();

        let err = pump(&rx, Some(Duration::from_millis(50)), |_| {
            ControlFlow::Continue(())
        })
        .unwrap_err();

        assert!(matches!(err, ApiClientError::ListenTimeout(_)));
        // Keep the sender alive so the timeout, not a disconnect, ends the wait
        drop(tx);
    }

    #[test]
    fn test_closed_socket_is_an_error() {
        let (tx, rx) = mpsc::channel();
        tx.send(status(json!({"error": 0, "percent": 10}))).unwrap();
        tx.send(SocketEvent::Closed).unwrap();

        let err = pump(&rx, None, |_| ControlFlow::Continue(())).unwrap_err();
        assert_eq!(err.error_code(), "E011");
    }

    #[test]
    fn test_dropped_sender_is_an_error() {
        let (tx, rx) = mpsc::channel::<SocketEvent>();
        drop(tx);

        let err = pump(&rx, Some(Duration::from_secs(5)), |_| {
            ControlFlow::Continue(())
        })
        .unwrap_err();
        assert!(matches!(err, ApiClientError::Subscription(_)));
    }

    #[test]
    fn test_socket_error_event() {
        let (tx, rx) = mpsc::channel();
        tx.send(SocketEvent::Error("handshake failed".to_owned()))
            .unwrap();

        let err = pump(&rx, None, |_| ControlFlow::Continue(())).unwrap_err();
        assert!(err.to_string().contains("handshake failed"));
    }

    #[test]
    fn test_subscription_keeps_id_type() {
        assert_eq!(subscription_payload(&json!(7)), json!({"jobid": 7}));
        assert_eq!(
            subscription_payload(&json!("a1b2")),
            json!({"jobid": "a1b2"})
        );
        assert_eq!(subscription_payload(&json!(7)).to_string(), r#"{"jobid":7}"#);
    }

    #[test]
    fn test_blank_ids() {
        assert!(is_blank_id(&Value::Null));
        assert!(is_blank_id(&json!("  ")));
        assert!(is_blank_id(&json!(0)));
        assert!(!is_blank_id(&json!(7)));
        assert!(!is_blank_id(&json!("7")));
    }

    #[test]
    fn test_payload_values_text() {
        let values = payload_values(Payload::Text(vec![json!({"percent": 5})]));
        assert_eq!(values, vec![json!({"percent": 5})]);
    }
}
