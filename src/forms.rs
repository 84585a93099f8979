//! Client-side drafts for the two creation forms. Each draft validates
//! itself before a payload is produced, so the app layer never submits a
//! request the backend is guaranteed to reject.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} is too long (maximum {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

pub const MAX_NAME_LENGTH: usize = 120;
pub const MAX_LICENSE_LENGTH: usize = 40;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

fn required_trimmed(field: &'static str, value: &str, max: usize) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Required { field });
    }
    if trimmed.chars().count() > max {
        return Err(FormError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Steps of the operator creation wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorStep {
    Identity,
    License,
    Contact,
}

impl OperatorStep {
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Identity => Some(Self::License),
            Self::License => Some(Self::Contact),
            Self::Contact => None,
        }
    }
}

/// In-progress operator form. Fields accumulate as the user advances; a
/// payload only exists once every step validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OperatorDraft {
    pub full_name: String,
    pub license_number: String,
    pub phone: String,
    pub home_base: String,
}

/// Wire shape of POST /api/v1/operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorPayload {
    pub full_name: String,
    pub license_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_base: Option<String>,
}

impl OperatorDraft {
    /// Validates a single wizard step, so the UI can block advancement
    /// without re-checking earlier steps.
    pub fn validate_step(&self, step: OperatorStep) -> Result<(), FormError> {
        match step {
            OperatorStep::Identity => {
                required_trimmed("full_name", &self.full_name, MAX_NAME_LENGTH)?;
            }
            OperatorStep::License => {
                let license =
                    required_trimmed("license_number", &self.license_number, MAX_LICENSE_LENGTH)?;
                if !license
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
                {
                    return Err(FormError::Invalid {
                        field: "license_number",
                        reason: "only letters, digits, and dashes are allowed",
                    });
                }
            }
            OperatorStep::Contact => {
                let phone = self.phone.trim();
                if !phone.is_empty()
                    && !phone
                        .chars()
                        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
                {
                    return Err(FormError::Invalid {
                        field: "phone",
                        reason: "contains characters that are not part of a phone number",
                    });
                }
            }
        }
        Ok(())
    }

    /// Runs every step and produces the request payload.
    pub fn into_payload(self) -> Result<OperatorPayload, FormError> {
        for step in [
            OperatorStep::Identity,
            OperatorStep::License,
            OperatorStep::Contact,
        ] {
            self.validate_step(step)?;
        }

        let none_if_empty = |s: String| {
            let trimmed = s.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        };

        Ok(OperatorPayload {
            full_name: self.full_name.trim().to_string(),
            license_number: self.license_number.trim().to_string(),
            phone: none_if_empty(self.phone),
            home_base: none_if_empty(self.home_base),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorkCostDraft {
    pub order_id: Option<String>,
    pub description: String,
    /// Money is carried in integer cents end to end.
    pub amount_cents: u64,
    /// ISO 8601 calendar date, e.g. `2026-08-24`.
    pub incurred_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCostPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub description: String,
    pub amount_cents: u64,
    pub incurred_on: String,
}

fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    if !digits(0..4) || !digits(5..7) || !digits(8..10) {
        return false;
    }
    let month: u8 = s[5..7].parse().unwrap_or(0);
    let day: u8 = s[8..10].parse().unwrap_or(0);
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

impl WorkCostDraft {
    pub fn into_payload(self) -> Result<WorkCostPayload, FormError> {
        let description =
            required_trimmed("description", &self.description, MAX_DESCRIPTION_LENGTH)?;

        if self.amount_cents == 0 {
            return Err(FormError::Invalid {
                field: "amount_cents",
                reason: "amount must be greater than zero",
            });
        }

        if !is_iso_date(self.incurred_on.trim()) {
            return Err(FormError::Invalid {
                field: "incurred_on",
                reason: "expected a calendar date like 2026-08-24",
            });
        }

        let order_id = self
            .order_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(WorkCostPayload {
            order_id,
            description,
            amount_cents: self.amount_cents,
            incurred_on: self.incurred_on.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_operator() -> OperatorDraft {
        OperatorDraft {
            full_name: "Maria Ortega".into(),
            license_number: "CDL-88421".into(),
            phone: "+1 555 010 2222".into(),
            home_base: "North Yard".into(),
        }
    }

    #[test]
    fn operator_steps_advance_in_order() {
        assert_eq!(OperatorStep::Identity.next(), Some(OperatorStep::License));
        assert_eq!(OperatorStep::License.next(), Some(OperatorStep::Contact));
        assert_eq!(OperatorStep::Contact.next(), None);
    }

    #[test]
    fn identity_step_requires_a_name() {
        let draft = OperatorDraft {
            full_name: "   ".into(),
            ..valid_operator()
        };
        assert_eq!(
            draft.validate_step(OperatorStep::Identity),
            Err(FormError::Required { field: "full_name" })
        );
    }

    #[test]
    fn license_step_rejects_odd_characters() {
        let draft = OperatorDraft {
            license_number: "CDL 88421!".into(),
            ..valid_operator()
        };
        assert!(matches!(
            draft.validate_step(OperatorStep::License),
            Err(FormError::Invalid {
                field: "license_number",
                ..
            })
        ));
    }

    #[test]
    fn contact_step_allows_an_empty_phone() {
        let draft = OperatorDraft {
            phone: String::new(),
            ..valid_operator()
        };
        assert_eq!(draft.validate_step(OperatorStep::Contact), Ok(()));
    }

    #[test]
    fn operator_payload_trims_and_drops_empty_optionals() {
        let draft = OperatorDraft {
            full_name: "  Maria Ortega  ".into(),
            home_base: "  ".into(),
            ..valid_operator()
        };
        let payload = draft.into_payload().unwrap();
        assert_eq!(payload.full_name, "Maria Ortega");
        assert_eq!(payload.home_base, None);
        assert_eq!(payload.phone.as_deref(), Some("+1 555 010 2222"));
    }

    #[test]
    fn work_cost_requires_positive_amount() {
        let draft = WorkCostDraft {
            description: "Fuel top-up".into(),
            amount_cents: 0,
            incurred_on: "2026-08-20".into(),
            order_id: None,
        };
        assert!(matches!(
            draft.into_payload(),
            Err(FormError::Invalid {
                field: "amount_cents",
                ..
            })
        ));
    }

    #[test]
    fn work_cost_validates_the_date_shape() {
        for bad in ["2026/08/20", "20-08-2026", "2026-13-01", "2026-08-00", "soon"] {
            let draft = WorkCostDraft {
                description: "Tolls".into(),
                amount_cents: 1500,
                incurred_on: bad.into(),
                order_id: None,
            };
            assert!(draft.into_payload().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn work_cost_payload_omits_blank_order_id() {
        let draft = WorkCostDraft {
            description: "Tolls".into(),
            amount_cents: 1500,
            incurred_on: "2026-08-20".into(),
            order_id: Some("  ".into()),
        };
        let payload = draft.into_payload().unwrap();
        assert_eq!(payload.order_id, None);

        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("order_id"));
    }
}
