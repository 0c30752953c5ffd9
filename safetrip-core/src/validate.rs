//! Request body schemas for the write endpoints.
//!
//! Every field is checked before failing so the client sees all problems at
//! once. Accepted string fields are HTML-escaped on the way in. Trip-end
//! bodies are the exception: they are read leniently and never rejected.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::sanitize::escape_html;
use crate::store::{HazardReport, LocationUpdate, TripEnd};
use crate::types::Severity;

/// A validated trip-start request.
#[derive(Debug, Clone, PartialEq)]
pub struct TripStart {
    pub user_id: String,
    pub start_location: String,
}

/// Collects field errors while reading a JSON object.
struct Fields<'a> {
    body: Option<&'a Map<String, Value>>,
    errors: Vec<String>,
}

impl<'a> Fields<'a> {
    fn new(body: &'a Value) -> Self {
        let mut errors = Vec::new();
        let body = body.as_object();
        if body.is_none() {
            errors.push("\"value\" must be of type object".to_string());
        }
        Self { body, errors }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.body.and_then(|b| b.get(name)).filter(|v| !v.is_null())
    }

    fn required_string(&mut self, name: &str) -> Option<String> {
        self.body?;
        match self.get(name) {
            None => {
                self.errors.push(format!("\"{name}\" is required"));
                None
            }
            Some(Value::String(s)) if s.is_empty() => {
                self.errors
                    .push(format!("\"{name}\" is not allowed to be empty"));
                None
            }
            Some(Value::String(s)) => Some(escape_html(s)),
            Some(_) => {
                self.errors.push(format!("\"{name}\" must be a string"));
                None
            }
        }
    }

    /// Numbers may arrive as JSON numbers or numeric strings.
    fn number(&mut self, name: &str, required: bool, min: Option<f64>, max: Option<f64>) -> Option<f64> {
        self.body?;
        let raw = match self.get(name) {
            None => {
                if required {
                    self.errors.push(format!("\"{name}\" is required"));
                }
                return None;
            }
            Some(v) => v,
        };
        let Some(value) = lenient_number(raw) else {
            self.errors.push(format!("\"{name}\" must be a number"));
            return None;
        };
        if let Some(min) = min.filter(|min| value < *min) {
            self.errors
                .push(format!("\"{name}\" must be greater than or equal to {min}"));
            return None;
        }
        if let Some(max) = max.filter(|max| value > *max) {
            self.errors
                .push(format!("\"{name}\" must be less than or equal to {max}"));
            return None;
        }
        Some(value)
    }

    fn severity(&mut self, name: &str) -> Option<Severity> {
        self.body?;
        match self.get(name) {
            None => {
                self.errors.push(format!("\"{name}\" is required"));
                None
            }
            Some(Value::String(s)) => {
                let parsed = Severity::parse(s);
                if parsed.is_none() {
                    self.errors
                        .push(format!("\"{name}\" must be one of [low, medium, high]"));
                }
                parsed
            }
            Some(_) => {
                self.errors.push(format!("\"{name}\" must be a string"));
                None
            }
        }
    }

    fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, ValidationError> {
        if !self.errors.is_empty() {
            return Err(ValidationError::new(self.errors));
        }
        build().ok_or_else(|| ValidationError::new(vec!["\"value\" is invalid".to_string()]))
    }
}

/// A finite JSON number or numeric string.
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// `userId` required; `latitude` in [-90, 90]; `longitude` in [-180, 180];
/// `speed` optional and non-negative; `timestamp` passed through.
pub fn location(body: &Value) -> Result<LocationUpdate, ValidationError> {
    let mut fields = Fields::new(body);
    let user_id = fields.required_string("userId");
    let latitude = fields.number("latitude", true, Some(-90.0), Some(90.0));
    let longitude = fields.number("longitude", true, Some(-180.0), Some(180.0));
    let speed = fields.number("speed", false, Some(0.0), None);
    let timestamp = fields.get("timestamp").cloned();
    fields.finish(|| {
        Some(LocationUpdate {
            user_id: user_id?,
            latitude: latitude?,
            longitude: longitude?,
            speed,
            timestamp,
        })
    })
}

/// `userId` and `startLocation` required.
pub fn trip_start(body: &Value) -> Result<TripStart, ValidationError> {
    let mut fields = Fields::new(body);
    let user_id = fields.required_string("userId");
    let start_location = fields.required_string("startLocation");
    fields.finish(|| {
        Some(TripStart {
            user_id: user_id?,
            start_location: start_location?,
        })
    })
}

/// `type`, `location`, `userId` required; `severity` one of low/medium/high.
pub fn hazard(body: &Value) -> Result<HazardReport, ValidationError> {
    let mut fields = Fields::new(body);
    let kind = fields.required_string("type");
    let severity = fields.severity("severity");
    let location = fields.required_string("location");
    let user_id = fields.required_string("userId");
    fields.finish(|| {
        Some(HazardReport {
            kind: kind?,
            severity: severity?,
            location: location?,
            user_id: user_id?,
        })
    })
}

/// Best-effort read of a trip-end body. Unusable fields become `None`.
///
/// A numeric `tripId` is compared as text; `distance` and `duration` accept
/// numeric strings.
pub fn trip_end(body: &Value) -> TripEnd {
    let field = |name: &str| body.get(name).filter(|v| !v.is_null());
    let trip_id = match field("tripId") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    TripEnd {
        trip_id,
        end_location: field("endLocation")
            .and_then(Value::as_str)
            .map(escape_html),
        distance: field("distance").and_then(lenient_number),
        duration: field("duration").and_then(lenient_number),
    }
}
