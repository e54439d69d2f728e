//! # WhatsApp Webhook Handler
//!
//! Turns a parsed notification payload into outbound replies. Every inbound
//! message gets exactly one reply, the fixed [`consts::AUTO_REPLY_BODY`], sent
//! in the order the messages were received.

use super::{
    client::{MessageSender, SendError},
    outgoing_schemas::OutboundMessage,
    schemas::WebhookPayload,
};
use crate::consts;

/// A message that can be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundMessage<'a> {
    pub from: &'a str,
    pub body: &'a str,
}

/// Extracts every answerable message from the webhook payload
///
/// Walks entries, then changes, then messages, preserving the received order.
/// Changes without a `messages` field contribute nothing, and messages without
/// a sender are skipped with a warning.
pub fn process_webhook_messages(payload: &WebhookPayload) -> Vec<InboundMessage<'_>> {
    payload
        .entry
        .iter()
        .flat_map(|entry| &entry.changes)
        .filter_map(|change| change.value.messages.as_ref())
        .flatten()
        .filter_map(|message| match message.sender() {
            Some(from) => Some(InboundMessage {
                from,
                body: message.text_body(),
            }),
            None => {
                logfire::warn!(
                    "Skipping message without sender: {message}",
                    message = format!("{message:?}")
                );
                None
            }
        })
        .collect::<Vec<_>>()
}

/// Builds the reply for one inbound message
pub fn build_reply(message: &InboundMessage<'_>) -> OutboundMessage {
    OutboundMessage::text(message.from, consts::AUTO_REPLY_BODY)
}

/// Sends one reply per inbound message
///
/// Stops at the first failed send and returns its error; replies already
/// delivered for earlier messages stay delivered.
///
/// # Returns
///
/// The number of replies sent
pub async fn process_webhook(
    payload: &WebhookPayload,
    sender: &dyn MessageSender,
) -> Result<usize, SendError> {
    let messages = process_webhook_messages(payload);
    logfire::info!(
        "Received webhook: entries={entries}, messages={messages}",
        entries = payload.entry.len() as i64,
        messages = messages.len() as i64
    );

    for (sent, message) in messages.iter().enumerate() {
        logfire::info!(
            "Message received from {from}: {body}",
            from = message.from.to_string(),
            body = message.body.to_string()
        );

        if let Err(e) = sender.send(&build_reply(message)).await {
            logfire::error!(
                "Reply to {from} failed after {sent} replies: {error}",
                from = message.from.to_string(),
                sent = sent as i64,
                error = e.to_string()
            );
            return Err(e);
        }
    }

    Ok(messages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::whatsapp::{
        client::MockMessageSender,
        outgoing_schemas::MessageKind,
        schemas::{Change, ChangeValue, Entry, Message, TextMessage},
    };
    use mockall::Sequence;

    fn message(from: &str, body: Option<&str>) -> Message {
        Message {
            from: Some(from.to_string()),
            text: body.map(|b| TextMessage {
                body: Some(b.to_string()),
            }),
        }
    }

    fn payload(changes: Vec<Option<Vec<Message>>>) -> WebhookPayload {
        WebhookPayload {
            entry: vec![Entry {
                changes: changes
                    .into_iter()
                    .map(|messages| Change {
                        value: ChangeValue {
                            messages,
                            ..Default::default()
                        },
                    })
                    .collect(),
            }],
        }
    }

    fn is_auto_reply_to(
        recipient: &'static str,
    ) -> impl Fn(&OutboundMessage) -> bool + Send + 'static {
        move |m| {
            m.recipient == recipient
                && m.kind
                    == MessageKind::Text {
                        body: consts::AUTO_REPLY_BODY.to_string(),
                    }
        }
    }

    #[test]
    fn test_process_webhook_messages_keeps_order() {
        let payload = WebhookPayload {
            entry: vec![
                Entry {
                    changes: vec![Change {
                        value: ChangeValue {
                            messages: Some(vec![message("1", None), message("2", None)]),
                            ..Default::default()
                        },
                    }],
                },
                Entry {
                    changes: vec![
                        Change {
                            value: ChangeValue::default(),
                        },
                        Change {
                            value: ChangeValue {
                                messages: Some(vec![message("3", Some("x"))]),
                                ..Default::default()
                            },
                        },
                    ],
                },
            ],
        };

        let from = process_webhook_messages(&payload)
            .iter()
            .map(|m| m.from)
            .collect::<Vec<_>>();

        assert_eq!(from, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_reply_ignores_inbound_text() {
        let reply = build_reply(&InboundMessage {
            from: "111",
            body: "quiero una pizza",
        });

        assert_eq!(reply, OutboundMessage::text("111", consts::AUTO_REPLY_BODY));
    }

    #[ntex::test]
    async fn test_one_reply_per_message() {
        let payload = payload(vec![Some(vec![message("111", Some("hi")), message("222", None)])]);

        let mut seq = Sequence::new();
        let mut sender = MockMessageSender::new();
        sender
            .expect_send()
            .withf(is_auto_reply_to("111"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sender
            .expect_send()
            .withf(is_auto_reply_to("222"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let result = process_webhook(&payload, &sender).await;

        assert_eq!(result, Ok(2));
    }

    #[ntex::test]
    async fn test_message_without_sender_is_skipped() {
        let anonymous = Message {
            from: None,
            text: None,
        };
        let payload = payload(vec![Some(vec![anonymous, message("222", Some("hi"))])]);

        let mut sender = MockMessageSender::new();
        sender
            .expect_send()
            .withf(is_auto_reply_to("222"))
            .times(1)
            .returning(|_| Ok(()));

        assert_eq!(process_webhook(&payload, &sender).await, Ok(1));
    }

    #[ntex::test]
    async fn test_no_messages_sends_nothing() {
        let payload = payload(vec![None]);

        let mut sender = MockMessageSender::new();
        sender.expect_send().never();

        assert_eq!(process_webhook(&payload, &sender).await, Ok(0));
    }

    #[ntex::test]
    async fn test_replayed_payload_is_sent_again() {
        let payload = payload(vec![Some(vec![message("111", Some("hi"))])]);

        let mut sender = MockMessageSender::new();
        sender
            .expect_send()
            .withf(is_auto_reply_to("111"))
            .times(2)
            .returning(|_| Ok(()));

        assert_eq!(process_webhook(&payload, &sender).await, Ok(1));
        assert_eq!(process_webhook(&payload, &sender).await, Ok(1));
    }

    #[ntex::test]
    async fn test_first_failure_stops_processing() {
        let payload = payload(vec![Some(vec![
            message("111", None),
            message("222", None),
            message("333", None),
        ])]);

        let mut seq = Sequence::new();
        let mut sender = MockMessageSender::new();
        sender
            .expect_send()
            .withf(is_auto_reply_to("111"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sender
            .expect_send()
            .withf(is_auto_reply_to("222"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(SendError::Provider {
                    status: 400,
                    body: "bad".into(),
                })
            });

        let result = process_webhook(&payload, &sender).await;

        assert_eq!(
            result,
            Err(SendError::Provider {
                status: 400,
                body: "bad".into()
            })
        );
    }
}
