use std::collections::BTreeMap;

use flow_anchor::recording::interaction_model::{
    InteractionKind, InteractionRecord, SourceAnchor, TargetElement,
};
use flow_anchor::recording::session::{Session, SessionStatus};

pub const BASE_URL: &str = "http://localhost:3000";
pub const LOGIN_FILE: &str = "src/pages/LoginPage.tsx";

/// Lines 6, 7 and 8 hold the email input, password input and submit button,
/// each opening tag at column 6.
pub const LOGIN_PAGE: &str = r#"import React from 'react';

export function LoginPage({ onSubmit }) {
  return (
    <form onSubmit={onSubmit}>
      <input type="email" name="email" />
      <input type="password" name="password" />
      <button type="submit">Submit</button>
    </form>
  );
}
"#;

// ============================================================================
// Interaction builders
// ============================================================================

pub fn target(tag: &str, selector: &str) -> TargetElement {
    TargetElement {
        tag_name: tag.to_string(),
        selector: selector.to_string(),
        ..TargetElement::default()
    }
}

pub fn with_attr(mut target: TargetElement, name: &str, value: &str) -> TargetElement {
    target.attributes.insert(name.to_string(), value.to_string());
    target
}

pub fn record(kind: InteractionKind, url: &str, target: TargetElement) -> InteractionRecord {
    InteractionRecord {
        kind,
        timestamp: 1_700_000_000_000,
        url: url.to_string(),
        target,
        value: None,
        key: None,
        source: None,
    }
}

pub fn click(selector: &str) -> InteractionRecord {
    record(InteractionKind::Click, &page("/"), target("button", selector))
}

pub fn input(selector: &str, value: &str) -> InteractionRecord {
    let mut r = record(InteractionKind::Input, &page("/"), target("input", selector));
    r.value = Some(value.to_string());
    r
}

pub fn navigate(path: &str) -> InteractionRecord {
    record(InteractionKind::Navigation, &page(path), TargetElement::default())
}

pub fn anchored(mut r: InteractionRecord, file: &str, line: u32, column: Option<u32>) -> InteractionRecord {
    r.source = Some(SourceAnchor {
        file_path: file.to_string(),
        line,
        column,
        component_name: None,
        component_chain: Vec::new(),
    });
    r
}

pub fn in_component(mut r: InteractionRecord, component: &str) -> InteractionRecord {
    if let Some(anchor) = r.source.as_mut() {
        anchor.component_name = Some(component.to_string());
    }
    r
}

pub fn page(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

// ============================================================================
// Sessions
// ============================================================================

/// navigate(/), fill email, fill password, click submit, navigate(/dashboard),
/// anchored to `LOGIN_PAGE` at `file`.
pub fn login_interactions(file: &str) -> Vec<InteractionRecord> {
    let email = with_attr(target("input", "form > input:nth-of-type(1)"), "type", "email");
    let password = with_attr(target("input", "form > input:nth-of-type(2)"), "type", "password");
    let mut submit = with_attr(target("button", "form > button"), "type", "submit");
    submit.text = Some("Submit".to_string());

    let mut email_input = record(InteractionKind::Input, &page("/"), email);
    email_input.value = Some("user@example.com".to_string());
    let mut password_input = record(InteractionKind::Input, &page("/"), password);
    password_input.value = Some("password123".to_string());
    let submit_click = record(InteractionKind::Click, &page("/"), submit);

    vec![
        navigate("/"),
        in_component(anchored(email_input, file, 6, Some(6)), "LoginPage"),
        in_component(anchored(password_input, file, 7, Some(6)), "LoginPage"),
        in_component(anchored(submit_click, file, 8, Some(6)), "LoginPage"),
        navigate("/dashboard"),
    ]
}

pub fn session_with(name: &str, interactions: Vec<InteractionRecord>) -> Session {
    Session {
        id: "session-1".to_string(),
        name: name.to_string(),
        status: SessionStatus::Stopped,
        start_url: page("/"),
        interactions,
        started_at: 1_700_000_000_000,
        updated_at: 1_700_000_060_000,
        ended_at: Some(1_700_000_060_000),
    }
}

pub fn attributes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
