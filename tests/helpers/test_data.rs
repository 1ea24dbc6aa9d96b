//! Test data helpers
//!
//! Seed documents for `events.json` and `form_templates.json`, plus builders
//! for public submissions and signed gateway payloads.

use serde_json::{json, Value};
use ClubPortal::services::payment::sign;

pub const KEY_ID: &str = "rzp_test_key";
pub const KEY_SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "club-admin-pass";

pub const FREE_EVENT_ID: i64 = 1;
pub const PAID_EVENT_ID: i64 = 2;
pub const TEAM_EVENT_ID: i64 = 3;
pub const CLOSED_EVENT_ID: i64 = 4;
pub const EXTERNAL_EVENT_ID: i64 = 5;
pub const DEADLINE_EVENT_ID: i64 = 6;

pub const FREE_TEMPLATE_ID: i64 = 1;
pub const PAID_TEMPLATE_ID: i64 = 2;
pub const TEAM_TEMPLATE_ID: i64 = 3;

/// Paid template amount in major units
pub const PAID_AMOUNT: f64 = 100.0;
pub const PAID_AMOUNT_MINOR: u64 = 10_000;

pub fn event(id: i64, name: &str, template_id: Option<i64>) -> Value {
    let mut event = json!({
        "id": id,
        "name": name,
        "date": "2099-03-14",
        "status": "upcoming",
        "registration_type": "internal",
        "allow_registration": true,
        "registration_deadline": { "date": "TBA" },
        "description": format!("{} at the main auditorium", name)
    });
    if let Some(template_id) = template_id {
        event["template_id"] = json!(template_id);
    }
    event
}

/// The event catalog every test context starts with
pub fn seed_events() -> Value {
    let mut closed = event(CLOSED_EVENT_ID, "Closed Talk", Some(FREE_TEMPLATE_ID));
    closed["allow_registration"] = json!(false);

    let mut external = event(EXTERNAL_EVENT_ID, "Partner Expo", None);
    external["registration_type"] = json!("external");

    let mut deadline = event(DEADLINE_EVENT_ID, "Deadline Jam", Some(FREE_TEMPLATE_ID));
    deadline["registration_deadline"] = json!({ "date": "2025-01-10" });

    json!({
        "next_id": 7,
        "events": [
            event(FREE_EVENT_ID, "Code Sprint", Some(FREE_TEMPLATE_ID)),
            event(PAID_EVENT_ID, "Hack Night", Some(PAID_TEMPLATE_ID)),
            event(TEAM_EVENT_ID, "Team Quest", Some(TEAM_TEMPLATE_ID)),
            closed,
            external,
            deadline,
        ]
    })
}

pub fn seed_templates() -> Value {
    json!([
        {
            "id": FREE_TEMPLATE_ID,
            "name": "Workshop form",
            "min_participants": 1,
            "max_participants": 1,
            "active": true,
            "custom_fields": [
                { "name": "name", "label": "Full Name", "type": "text", "required": true },
                { "name": "department", "label": "Department", "type": "text", "required": true },
                { "name": "personal_email", "label": "Personal Email", "type": "email", "unique": true }
            ]
        },
        {
            "id": PAID_TEMPLATE_ID,
            "name": "Paid hackathon form",
            "min_participants": 1,
            "max_participants": 1,
            "active": true,
            "payment_enabled": true,
            "payment_amount": PAID_AMOUNT,
            "custom_fields": [
                { "name": "name", "label": "Full Name", "type": "text", "required": true },
                { "name": "phone", "label": "Phone", "type": "tel" }
            ]
        },
        {
            "id": TEAM_TEMPLATE_ID,
            "name": "Team form",
            "min_participants": 2,
            "max_participants": 3,
            "active": true,
            "custom_fields": [
                { "name": "team_name", "label": "Team Name", "type": "text", "required": true }
            ]
        }
    ])
}

/// Valid submission for the free single-participant event
pub fn free_submission(email: &str) -> Value {
    json!({
        "submitter_email": email,
        "event_id": FREE_EVENT_ID,
        "name": "Asha Raman",
        "department": "CSE"
    })
}

/// Valid submission for the paid event
pub fn paid_submission(email: &str) -> Value {
    json!({
        "submitter_email": email,
        "event_id": PAID_EVENT_ID,
        "name": "Vikram Das",
        "phone": "9876543210"
    })
}

/// Valid submission for the team event with `members` participants
pub fn team_submission(email: &str, members: u32) -> Value {
    let mut submission = json!({
        "submitter_email": email,
        "event_id": TEAM_EVENT_ID,
        "num_participants": members,
        "team_name": "Null Pointers"
    });
    for n in 1..=members {
        submission[format!("participant_{}_name", n)] = json!(format!("Member {}", n));
        submission[format!("participant_{}_roll", n)] = json!(format!("22CS{:03}", n));
        submission[format!("participant_{}_email", n)] = json!(format!("member{}@kongu.edu", n));
    }
    submission
}

/// Checkout signature the gateway would hand the client
pub fn checkout_signature(order_id: &str, payment_id: &str) -> String {
    sign(KEY_SECRET, format!("{}|{}", order_id, payment_id).as_bytes()).expect("hmac accepts any key")
}

pub fn webhook_signature(body: &str) -> String {
    sign(WEBHOOK_SECRET, body.as_bytes()).expect("hmac accepts any key")
}

pub fn webhook_body(event: &str, payment_id: &str, order_id: &str) -> String {
    json!({
        "entity": "event",
        "event": event,
        "payload": {
            "payment": {
                "entity": { "id": payment_id, "order_id": order_id, "status": "captured" }
            }
        }
    })
    .to_string()
}
