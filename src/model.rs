use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pagination::ListController;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(OrderId);
typed_id!(OperatorId);
typed_id!(TruckId);
typed_id!(WorkCostId);
typed_id!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    InTransit,
    Finished,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "PENDING" | "OPEN" => Some(Self::Pending),
            "IN_TRANSIT" | "INTRANSIT" | "ACTIVE" => Some(Self::InTransit),
            "FINISHED" | "COMPLETED" | "DONE" => Some(Self::Finished),
            "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InTransit => "IN_TRANSIT",
            Self::Finished => "FINISHED",
            Self::Cancelled => "CANCELLED",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InTransit => "In transit",
            Self::Finished => "Finished",
            Self::Cancelled => "Cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruckStatus {
    #[default]
    Available,
    OnRoute,
    InMaintenance,
    Retired,
}

impl TruckStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::OnRoute => "ON_ROUTE",
            Self::InMaintenance => "IN_MAINTENANCE",
            Self::Retired => "RETIRED",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::OnRoute => "On route",
            Self::InMaintenance => "In maintenance",
            Self::Retired => "Retired",
        }
    }

    #[must_use]
    pub const fn can_be_assigned(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// One row of the order feed as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub reference: String,
    pub customer_name: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub assigned_operator_id: Option<OperatorId>,
    #[serde(default)]
    pub assigned_truck_id: Option<TruckId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSummary {
    pub id: OperatorId,
    pub full_name: String,
    pub license_number: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub home_base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckSummary {
    pub id: TruckId,
    pub plate: String,
    pub model_name: String,
    pub status: TruckStatus,
    #[serde(default)]
    pub capacity_kg: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCostSummary {
    pub id: WorkCostId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub description: String,
    pub amount_cents: u64,
    pub incurred_on: String,
}

/// Persisted session record, stored through the key-value capability.
/// The token passes through here only on its way to and from the platform
/// keystore; in memory it lives in [`RuntimeSecrets`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub display_name: String,
    pub token: String,
}

/// Runtime-only secrets: never serialized with the model.
#[derive(Default)]
pub struct RuntimeSecrets {
    pub token: Option<secrecy::SecretString>,
}

impl fmt::Debug for RuntimeSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeSecrets")
            .field("token_present", &self.token.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the persisted session to be read back.
    #[default]
    Loading,
    SignedOut,
    Authenticating,
    SignedIn {
        user_id: UserId,
        display_name: String,
    },
}

impl SessionState {
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
}

/// Which remotely-paginated collection an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Orders,
    Operators,
    Trucks,
    WorkCosts,
}

impl ListKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Operators => "operators",
            Self::Trucks => "trucks",
            Self::WorkCosts => "work_costs",
        }
    }
}

/// State of an in-flight form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Failed {
        message: String,
    },
}

impl SubmitState {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: crate::CoreConfig,
    pub session: SessionState,
    pub secrets: RuntimeSecrets,

    pub orders: ListController<OrderSummary>,
    pub operators: ListController<OperatorSummary>,
    pub trucks: ListController<TruckSummary>,
    pub work_costs: ListController<WorkCostSummary>,

    pub operator_submit: SubmitState,
    pub work_cost_submit: SubmitState,

    pub active_toast: Option<ToastMessage>,
}

impl Model {
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(ToastMessage {
            message: message.into(),
            kind,
        });
    }
}
