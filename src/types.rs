//! Core types for swarm request tracking.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a stored or submitted enum value is not in its
/// allowed set.
#[derive(Debug, Error)]
#[error("unknown {field} value: {value}")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Lifecycle status of a request.
///
/// `Reopened` is stored distinctly from `Open` so the presentation layer
/// can tell a reopened request from a fresh one. Both count as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    Reopened,
    Resolved,
    Discarded,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Reopened => "reopened",
            RequestStatus::Resolved => "resolved",
            RequestStatus::Discarded => "discarded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(RequestStatus::Open),
            "reopened" => Some(RequestStatus::Reopened),
            "resolved" => Some(RequestStatus::Resolved),
            "discarded" => Some(RequestStatus::Discarded),
            _ => None,
        }
    }

    /// Active requests accept Resolve/Discard and show up in reminders.
    pub fn is_active(&self) -> bool {
        matches!(self, RequestStatus::Open | RequestStatus::Reopened)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer entitlement tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entitlement {
    EnterpriseSignature,
    EnterprisePremier,
    EnterpriseStandard,
    OnlineCustomer,
}

impl Entitlement {
    pub const ALL: [Entitlement; 4] = [
        Entitlement::EnterpriseSignature,
        Entitlement::EnterprisePremier,
        Entitlement::EnterpriseStandard,
        Entitlement::OnlineCustomer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entitlement::EnterpriseSignature => "enterprise_signature",
            Entitlement::EnterprisePremier => "enterprise_premier",
            Entitlement::EnterpriseStandard => "enterprise_standard",
            Entitlement::OnlineCustomer => "online_customer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_str() == s)
    }

    /// Human-readable label used in forms and announcement cards.
    pub fn label(&self) -> &'static str {
        match self {
            Entitlement::EnterpriseSignature => "Enterprise Signature",
            Entitlement::EnterprisePremier => "Enterprise Premier",
            Entitlement::EnterpriseStandard => "Enterprise Standard",
            Entitlement::OnlineCustomer => "Online Customer",
        }
    }
}

/// Skill group the request should be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillGroup {
    Data,
    Runtime,
    PlatformWebServices,
    AccountManagement,
    Other,
}

impl SkillGroup {
    pub const ALL: [SkillGroup; 5] = [
        SkillGroup::Data,
        SkillGroup::Runtime,
        SkillGroup::PlatformWebServices,
        SkillGroup::AccountManagement,
        SkillGroup::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillGroup::Data => "data",
            SkillGroup::Runtime => "runtime",
            SkillGroup::PlatformWebServices => "platform_web_services",
            SkillGroup::AccountManagement => "account_management",
            SkillGroup::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillGroup::Data => "Data",
            SkillGroup::Runtime => "Runtime",
            SkillGroup::PlatformWebServices => "Platform/Web Services",
            SkillGroup::AccountManagement => "Account Management",
            SkillGroup::Other => "Other",
        }
    }
}

/// Support tier of the originating case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportTier {
    HighComplexity,
    GeneralUsage,
}

impl SupportTier {
    pub const ALL: [SupportTier; 2] = [SupportTier::HighComplexity, SupportTier::GeneralUsage];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportTier::HighComplexity => "high_complexity",
            SupportTier::GeneralUsage => "general_usage",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SupportTier::HighComplexity => "High Complexity",
            SupportTier::GeneralUsage => "General Usage",
        }
    }
}

/// Request priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Critical,
        Priority::Urgent,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }
}

/// A persisted swarm request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    pub ticket: String,
    pub entitlement: Entitlement,
    pub skill_group: SkillGroup,
    pub support_tier: SupportTier,
    pub priority: Priority,
    pub issue_description: String,
    pub help_required: String,
    /// Submitter identifier in the chat platform.
    pub user_id: String,
    /// Channel the request originated from (and is announced to).
    pub channel_id: String,
    /// Identifier of the announcement message. Attached exactly once,
    /// after the announcement exists; transition handlers look rows up by
    /// this key and nothing else.
    pub correlation_key: Option<String>,
    pub status: RequestStatus,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
    pub discarded_at: Option<i64>,
    pub updated_at: i64,
}

/// Raw form submission as delivered by the presentation layer.
///
/// All fields arrive as strings; validation into the typed enums happens
/// at create time so a bad select value surfaces as a field error rather
/// than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    pub ticket: String,
    pub entitlement: String,
    pub skill_group: String,
    pub support_tier: String,
    pub priority: String,
    pub issue_description: String,
    pub help_required: String,
}

/// One row of the append-only transition log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEvent {
    pub id: i64,
    pub request_id: i64,
    /// Status the request entered with this transition.
    pub status: RequestStatus,
    pub actor: Option<String>,
    pub timestamp: i64,
}

/// Aggregate request counts.
///
/// `open` counts both `open` and `reopened` rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total: i64,
    pub open: i64,
    pub resolved: i64,
    pub discarded: i64,
}
