//! URL-encoded body capture and form validation.
//!
//! The capture stage buffers form bodies ahead of the CSRF check and the
//! dispatcher, parses them in extended mode (bracketed keys become nested
//! objects, so `profile[surname]=Doe` nests), and exposes the result as a
//! [`FormData`] request extension while restoring the body for anything
//! downstream that still wants the raw bytes.

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Forms are tiny; anything larger is not a login or registration post.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Parsed form fields for the current request. Empty when the request had
/// no URL-encoded body.
#[derive(Clone, Debug)]
pub struct FormData(pub Value);

impl Default for FormData {
    fn default() -> Self {
        FormData(Value::Object(Map::new()))
    }
}

impl FormData {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

pub async fn form_body_middleware(req: Request, next: Next) -> Response {
    let is_form = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));

    if !is_form {
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    let form = FormData(parse_urlencoded(&bytes));
    let mut req = Request::from_parts(parts, Body::from(bytes));
    req.extensions_mut().insert(form);
    next.run(req).await
}

/// Parse a URL-encoded body into a JSON object, folding bracketed keys
/// into nested objects.
pub fn parse_urlencoded(bytes: &[u8]) -> Value {
    let mut root = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let segments = split_key(&key);
        insert_path(&mut root, &segments, value.into_owned());
    }
    Value::Object(root)
}

fn split_key(key: &str) -> Vec<&str> {
    let Some(open) = key.find('[') else {
        return vec![key];
    };

    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while let Some(tail) = rest.strip_prefix('[') {
        match tail.find(']') {
            Some(close) => {
                segments.push(&tail[..close]);
                rest = &tail[close + 1..];
            }
            None => {
                // Unterminated bracket: take the remainder as one segment.
                segments.push(tail);
                break;
            }
        }
    }
    segments
}

fn insert_path(root: &mut Map<String, Value>, segments: &[&str], value: String) {
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = entry.as_object_mut().unwrap();
    }
    current.insert(segments[segments.len() - 1].to_string(), Value::String(value));
}

/// Login form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

impl LoginForm {
    pub fn from_form(form: &FormData) -> Result<Self, String> {
        let login = required(form, "login").or_else(|_| required(form, "username"))?;
        let password = required(form, "password")?;
        Ok(LoginForm { login, password })
    }
}

/// Registration form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub given_name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn from_form(form: &FormData) -> Result<Self, String> {
        let given_name = required(form, "given_name")?;
        let surname = required(form, "surname")?;
        let email = required(form, "email")?;
        if !email.contains('@') {
            return Err("Email is not valid.".to_string());
        }
        let password = required(form, "password")?;
        Ok(RegistrationForm {
            given_name,
            surname,
            email,
            password,
        })
    }

    pub fn into_new_account(self) -> crate::models::NewAccount {
        crate::models::NewAccount {
            // The provider treats the email address as the login name.
            username: self.email.clone(),
            email: self.email,
            password: self.password,
            given_name: self.given_name,
            surname: self.surname,
        }
    }
}

fn required(form: &FormData, key: &str) -> Result<String, String> {
    form.get_str(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| format!("{} is required.", label(key)))
}

fn label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}
