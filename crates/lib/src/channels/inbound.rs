//! Inbound webhook payload: `{ object, entry: [ { messaging: [ event ] } ] }`.
//!
//! The body is kept as parsed JSON and read leniently, field by field, so the `object`
//! check never depends on the shape of anything below it. Missing or falsy lists read as
//! empty. A field that cannot be read at all (a list that is not a list, a property of
//! `null`, non-string message text) is a `PayloadError` for that event only; events
//! before it have already been handled.

use serde_json::{Number, Value};

/// Reply text used when the inbound message carries no text (attachments, stickers, ...).
pub const FALLBACK_REPLY_TEXT: &str = "Hvala na poruci!";

/// Value of `object` for Instagram messaging webhooks.
pub const INSTAGRAM_OBJECT: &str = "instagram";

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("`{0}` is not a list")]
    NotAList(&'static str),
    #[error("cannot read `{field}` of null {parent}")]
    NullParent {
        parent: &'static str,
        field: &'static str,
    },
    #[error("message text is not a string")]
    TextNotString,
}

/// One webhook body, read once and dropped after dispatch.
#[derive(Debug, Clone)]
pub struct WebhookPayload {
    body: Value,
}

impl WebhookPayload {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// `object` rendered for logs: the string itself, or the raw JSON when not a string.
    pub fn object(&self) -> Option<String> {
        match self.body.get("object")? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_instagram(&self) -> bool {
        self.body.get("object").and_then(Value::as_str) == Some(INSTAGRAM_OBJECT)
    }

    pub fn entries(&self) -> Result<Vec<WebhookEntry<'_>>, PayloadError> {
        let list = list_or_empty(self.body.get("entry"), "entry")?;
        Ok(list.iter().map(|raw| WebhookEntry { raw }).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WebhookEntry<'a> {
    raw: &'a Value,
}

impl<'a> WebhookEntry<'a> {
    pub fn messaging(&self) -> Result<Vec<MessagingEvent<'a>>, PayloadError> {
        let field = property(self.raw, "entry", "messaging")?;
        let list = list_or_empty(field, "messaging")?;
        Ok(list.iter().map(|raw| MessagingEvent { raw }).collect())
    }
}

/// Why an event gets no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a message (reads, reactions, postbacks, ...).
    NoMessage,
    /// The relay's own outgoing message reflected back.
    Echo,
    NoSender,
    /// Sender is the relay's own account.
    SelfLoopback,
}

/// Who to answer and with what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub recipient_id: String,
    pub text: String,
}

/// What the dispatcher does with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Reply(ReplyTarget),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy)]
pub struct MessagingEvent<'a> {
    raw: &'a Value,
}

impl<'a> MessagingEvent<'a> {
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    /// Decide whether this event gets a reply. `own_id` is the relay's account id; when unset,
    /// no loopback filtering happens. Only string sender ids can match it.
    pub fn action(&self, own_id: Option<&str>) -> Result<EventAction, PayloadError> {
        let Some(message) = property(self.raw, "event", "message")?.filter(|m| truthy(m)) else {
            return Ok(EventAction::Skip(SkipReason::NoMessage));
        };
        if property(message, "message", "is_echo")?.is_some_and(truthy) {
            return Ok(EventAction::Skip(SkipReason::Echo));
        }
        let sender_id = match property(self.raw, "event", "sender")?.filter(|s| truthy(s)) {
            Some(sender) => property(sender, "sender", "id")?,
            None => None,
        };
        let (recipient_id, loopback) = match sender_id {
            Some(Value::String(id)) if !id.is_empty() => (id.clone(), own_id == Some(id.as_str())),
            Some(Value::Number(n)) if number_truthy(n) => (n.to_string(), false),
            _ => return Ok(EventAction::Skip(SkipReason::NoSender)),
        };
        if loopback {
            return Ok(EventAction::Skip(SkipReason::SelfLoopback));
        }
        let text = match property(message, "message", "text")?.filter(|t| truthy(t)) {
            None => FALLBACK_REPLY_TEXT,
            Some(Value::String(t)) if t.trim().is_empty() => FALLBACK_REPLY_TEXT,
            Some(Value::String(t)) => t.trim(),
            Some(_) => return Err(PayloadError::TextNotString),
        };
        Ok(EventAction::Reply(ReplyTarget {
            recipient_id,
            text: text.to_string(),
        }))
    }
}

/// JSON truthiness: null, false, 0 and "" are falsy; everything else is truthy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => number_truthy(n),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn number_truthy(n: &Number) -> bool {
    n.as_f64().map_or(true, |f| f != 0.0)
}

/// Read `field` from `parent`. Reading from null fails; other non-objects have no fields.
fn property<'v>(
    parent: &'v Value,
    parent_name: &'static str,
    field: &'static str,
) -> Result<Option<&'v Value>, PayloadError> {
    match parent {
        Value::Null => Err(PayloadError::NullParent {
            parent: parent_name,
            field,
        }),
        Value::Object(map) => Ok(map.get(field)),
        _ => Ok(None),
    }
}

const NO_RECORDS: &[Value] = &[];

/// Falsy or missing reads as empty; strings hold no records; other non-arrays fail.
fn list_or_empty<'v>(
    value: Option<&'v Value>,
    name: &'static str,
) -> Result<&'v [Value], PayloadError> {
    match value {
        None => Ok(NO_RECORDS),
        Some(Value::Array(items)) => Ok(items),
        Some(Value::String(_)) => Ok(NO_RECORDS),
        Some(v) if !truthy(v) => Ok(NO_RECORDS),
        Some(_) => Err(PayloadError::NotAList(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action(event: Value, own_id: Option<&str>) -> Result<EventAction, PayloadError> {
        MessagingEvent::new(&event).action(own_id)
    }

    fn reply(id: &str, text: &str) -> EventAction {
        EventAction::Reply(ReplyTarget {
            recipient_id: id.to_string(),
            text: text.to_string(),
        })
    }

    #[test]
    fn reads_full_payload() {
        let payload = WebhookPayload::new(json!({
            "object": "instagram",
            "entry": [{
                "id": "17841400000000000",
                "time": 1700000000,
                "messaging": [{
                    "sender": {"id": "123"},
                    "recipient": {"id": "17841400000000000"},
                    "timestamp": 1700000000000u64,
                    "message": {"mid": "m_1", "text": "hi"}
                }]
            }]
        }));
        assert!(payload.is_instagram());
        let entries = payload.entries().unwrap();
        assert_eq!(entries.len(), 1);
        let events = entries[0].messaging().unwrap();
        assert_eq!(events[0].action(None).unwrap(), reply("123", "hi"));
    }

    #[test]
    fn object_must_be_the_instagram_string() {
        for body in [
            json!({"object": "page"}),
            json!({"object": 5}),
            json!({"object": ["instagram"]}),
            json!({"entry": []}),
            json!(null),
            json!([1, 2]),
        ] {
            assert!(!WebhookPayload::new(body).is_instagram());
        }
        assert_eq!(
            WebhookPayload::new(json!({"object": 5})).object().as_deref(),
            Some("5")
        );
    }

    #[test]
    fn missing_falsy_and_string_lists_are_empty() {
        for entry in [json!(null), json!(false), json!(0), json!(""), json!("abc")] {
            let payload = WebhookPayload::new(json!({"object": "instagram", "entry": entry}));
            assert!(payload.entries().unwrap().is_empty());
        }
        let payload = WebhookPayload::new(json!({
            "object": "instagram",
            "entry": [{"messaging": null}, {}, 7, "x"]
        }));
        for entry in payload.entries().unwrap() {
            assert!(entry.messaging().unwrap().is_empty());
        }
    }

    #[test]
    fn unreadable_lists_are_errors() {
        let payload = WebhookPayload::new(json!({"object": "instagram", "entry": {}}));
        assert!(matches!(payload.entries(), Err(PayloadError::NotAList("entry"))));

        let payload = WebhookPayload::new(json!({"object": "instagram", "entry": [null]}));
        let entries = payload.entries().unwrap();
        assert!(matches!(
            entries[0].messaging(),
            Err(PayloadError::NullParent { .. })
        ));

        let payload =
            WebhookPayload::new(json!({"object": "instagram", "entry": [{"messaging": 3}]}));
        let entries = payload.entries().unwrap();
        assert!(matches!(
            entries[0].messaging(),
            Err(PayloadError::NotAList("messaging"))
        ));
    }

    #[test]
    fn text_is_trimmed_and_empty_falls_back() {
        let got = action(json!({"sender": {"id": "1"}, "message": {"text": "  hello \n"}}), None);
        assert_eq!(got.unwrap(), reply("1", "hello"));

        for message in [
            json!({"text": "   "}),
            json!({"text": ""}),
            json!({"text": null}),
            json!({"text": 0}),
            json!({}),
            json!({"attachments": [{"type": "image"}]}),
            json!("just a string"),
        ] {
            let got = action(json!({"sender": {"id": "1"}, "message": message}), None);
            assert_eq!(got.unwrap(), reply("1", FALLBACK_REPLY_TEXT));
        }
    }

    #[test]
    fn non_string_text_is_an_error() {
        let got = action(json!({"sender": {"id": "1"}, "message": {"text": 7}}), None);
        assert!(matches!(got, Err(PayloadError::TextNotString)));
    }

    #[test]
    fn skips_non_message_echo_and_missing_sender() {
        for event in [
            json!({"sender": {"id": "1"}, "read": {"mid": "m"}}),
            json!({"sender": {"id": "1"}, "message": null}),
            json!({"sender": {"id": "1"}, "message": ""}),
        ] {
            assert_eq!(action(event, None).unwrap(), EventAction::Skip(SkipReason::NoMessage));
        }

        for is_echo in [json!(true), json!(1), json!("yes"), json!({})] {
            let event = json!({"sender": {"id": "1"}, "message": {"text": "x", "is_echo": is_echo}});
            assert_eq!(action(event, None).unwrap(), EventAction::Skip(SkipReason::Echo));
        }
        for is_echo in [json!(false), json!(0), json!(null), json!("")] {
            let event = json!({"sender": {"id": "1"}, "message": {"text": "x", "is_echo": is_echo}});
            assert_eq!(action(event, None).unwrap(), reply("1", "x"));
        }

        for event in [
            json!({"message": {"text": "x"}}),
            json!({"sender": null, "message": {"text": "x"}}),
            json!({"sender": {"id": ""}, "message": {"text": "x"}}),
            json!({"sender": {"id": 0}, "message": {"text": "x"}}),
            json!({"sender": "123", "message": {"text": "x"}}),
        ] {
            assert_eq!(action(event, None).unwrap(), EventAction::Skip(SkipReason::NoSender));
        }
    }

    #[test]
    fn null_event_is_an_error() {
        assert!(matches!(
            action(json!(null), None),
            Err(PayloadError::NullParent { .. })
        ));
    }

    #[test]
    fn skips_own_account_only_when_configured() {
        let event = json!({"sender": {"id": "999"}, "message": {"text": "x"}});
        assert_eq!(
            action(event.clone(), Some("999")).unwrap(),
            EventAction::Skip(SkipReason::SelfLoopback)
        );
        assert_eq!(action(event.clone(), Some("123")).unwrap(), reply("999", "x"));
        assert_eq!(action(event, None).unwrap(), reply("999", "x"));
    }

    #[test]
    fn numeric_sender_id_is_answered_but_never_loopback() {
        let event = json!({"sender": {"id": 999}, "message": {"text": "x"}});
        assert_eq!(action(event, Some("999")).unwrap(), reply("999", "x"));
    }
}
