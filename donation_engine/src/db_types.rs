use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use cpg_common::Money;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------   TransactionRef    ---------------------------------------------------------
/// The opaque transaction reference assigned by the payment gateway when a charge is created. Unique per donation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TransactionRef(pub String);

impl FromStr for TransactionRef {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TransactionRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TransactionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    DonationStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DonationStatus {
    /// A charge has been created on the gateway, but no outcome has been reported yet.
    Pending,
    /// The gateway confirmed the payment. The fund has been credited.
    Complete,
    /// The charge failed, either at creation time or as reported by the gateway.
    Failed,
    /// The donation was refunded administratively. Terminal; never re-enters Pending.
    Refunded,
}

impl DonationStatus {
    /// A donation transitions out of Pending exactly once. Terminal statuses are never mutated again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DonationStatus::Pending)
    }
}

impl Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationStatus::Pending => write!(f, "Pending"),
            DonationStatus::Complete => write!(f, "Complete"),
            DonationStatus::Failed => write!(f, "Failed"),
            DonationStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for DonationStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Complete" => Ok(Self::Complete),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid donation status: {s}"))),
        }
    }
}

impl From<String> for DonationStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid donation status: {value}. But this conversion cannot fail. Defaulting to Pending");
            DonationStatus::Pending
        })
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MobileMoney,
    Card,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::MobileMoney
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::MobileMoney => write!(f, "mobile_money"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MobileMoney" | "mobile_money" => Ok(Self::MobileMoney),
            "Card" | "card" => Ok(Self::Card),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------      FundStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum FundStatus {
    Active,
    Archived,
}

impl Display for FundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FundStatus::Active => write!(f, "Active"),
            FundStatus::Archived => write!(f, "Archived"),
        }
    }
}

//--------------------------------------        Fund         ---------------------------------------------------------
/// A named pool of money with a running balance. The balance column is the single contended resource in the
/// system and is only ever mutated through guarded atomic updates. See [`crate::traits::FundManagement`].
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Fund {
    pub id: i64,
    pub title_en: String,
    pub title_fr: String,
    pub current_amount: Money,
    pub currency: String,
    pub status: FundStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFund {
    pub title_en: String,
    pub title_fr: String,
    pub currency: String,
}

impl NewFund {
    pub fn new<S: Into<String>>(title_en: S, title_fr: S) -> Self {
        Self {
            title_en: title_en.into(),
            title_fr: title_fr.into(),
            currency: cpg_common::XAF_CURRENCY_CODE.to_string(),
        }
    }
}

//--------------------------------------      Donation       ---------------------------------------------------------
/// A single payment attempt against a fund, tracked through a pending→terminal state machine.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Donation {
    pub id: i64,
    pub fund_id: i64,
    pub amount: Money,
    pub currency: String,
    pub status: DonationStatus,
    pub transaction_reference: TransactionRef,
    pub payment_method: PaymentMethod,
    pub is_anonymous: bool,
    pub is_recurring: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub fund_id: i64,
    pub amount: Money,
    pub currency: String,
    pub status: DonationStatus,
    pub transaction_reference: TransactionRef,
    pub payment_method: PaymentMethod,
    pub is_anonymous: bool,
    pub is_recurring: bool,
}

impl NewDonation {
    pub fn pending(fund_id: i64, amount: Money, reference: TransactionRef) -> Self {
        Self {
            fund_id,
            amount,
            currency: cpg_common::XAF_CURRENCY_CODE.to_string(),
            status: DonationStatus::Pending,
            transaction_reference: reference,
            payment_method: PaymentMethod::default(),
            is_anonymous: false,
            is_recurring: false,
        }
    }

    /// A donation attempt whose charge creation failed at the gateway. Still recorded, never silently dropped.
    pub fn failed(fund_id: i64, amount: Money, reference: TransactionRef) -> Self {
        Self { status: DonationStatus::Failed, ..Self::pending(fund_id, amount, reference) }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_flags(mut self, anonymous: bool, recurring: bool) -> Self {
        self.is_anonymous = anonymous;
        self.is_recurring = recurring;
        self
    }
}

//--------------------------------------     Withdrawal      ---------------------------------------------------------
/// An administrative debit against a fund. Immutable once created; deleting the record does NOT restore the
/// debited balance (correction-only operation, see the withdrawal API docs).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub fund_id: i64,
    pub amount: Money,
    pub currency: String,
    pub reason: String,
    pub reference: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub fund_id: i64,
    pub amount: Money,
    pub currency: String,
    pub reason: String,
    pub reference: Option<String>,
    pub created_by: String,
}

impl NewWithdrawal {
    pub fn new(fund_id: i64, amount: Money, reason: String, created_by: String) -> Self {
        Self {
            fund_id,
            amount,
            currency: cpg_common::XAF_CURRENCY_CODE.to_string(),
            reason,
            reference: None,
            created_by,
        }
    }

    pub fn with_reference(mut self, reference: String) -> Self {
        self.reference = Some(reference);
        self
    }
}

//--------------------------------------     Beneficiary     ---------------------------------------------------------
/// A gateway-registered payout destination. At most one beneficiary is active at a time; once any exist,
/// exactly one must remain active. The gateway is the source of truth for existence, local rows are a mirror.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: i64,
    pub gateway_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub provider: String,
    pub country: String,
    pub is_active: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBeneficiary {
    pub gateway_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub provider: String,
    pub country: String,
    pub status: String,
}

/// The subset of beneficiary fields an admin may edit locally. Identity fields (gateway id) are not among them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBeneficiary {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub provider: Option<String>,
    pub country: Option<String>,
}

impl UpdateBeneficiary {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.phone.is_none() &&
            self.email.is_none() &&
            self.provider.is_none() &&
            self.country.is_none()
    }
}

//--------------------------------------    ActivityEntry    ---------------------------------------------------------
/// A single append-only audit record. Never read by the ledger itself.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub actor_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub metadata: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivityEntry {
    pub actor_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub metadata: Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl NewActivityEntry {
    pub fn new<S: Into<String>>(actor_id: S, action: S, entity_type: S, entity_id: String, metadata: Value) -> Self {
        Self {
            actor_id: actor_id.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id,
            metadata,
            ip: None,
            user_agent: None,
        }
    }

    pub fn with_source(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip = ip;
        self.user_agent = user_agent;
        self
    }
}

//--------------------------------------        Role         ---------------------------------------------------------
/// Capability tags checked by the server's ACL layer. An operation declares the roles it requires and the
/// check is plain set containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    ReadAll,
    Write,
    SuperAdmin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::ReadAll => write!(f, "read_all"),
            Role::Write => write!(f, "write"),
            Role::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "read_all" | "readall" => Ok(Self::ReadAll),
            "write" => Ok(Self::Write),
            "super_admin" | "superadmin" => Ok(Self::SuperAdmin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}
