//! Transaction request model and validation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Maximum identifier length accepted from callers
pub const IDENTIFIER_MAX_LEN: usize = 64;

/// Maximum comment length after sanitizing
pub const COMMENT_MAX_LEN: usize = 250;

/// Disposition requested for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispositionAction {
    #[serde(rename = "STP-Release")]
    StpRelease,
    #[serde(rename = "Release")]
    Release,
    #[serde(rename = "Block")]
    Block,
    #[serde(rename = "Reject")]
    Reject,
}

impl DispositionAction {
    pub const ALL: [DispositionAction; 4] = [
        DispositionAction::StpRelease,
        DispositionAction::Release,
        DispositionAction::Block,
        DispositionAction::Reject,
    ];

    /// Wire name used by the HTTP boundary and input files
    pub fn as_str(&self) -> &'static str {
        match self {
            DispositionAction::StpRelease => "STP-Release",
            DispositionAction::Release => "Release",
            DispositionAction::Block => "Block",
            DispositionAction::Reject => "Reject",
        }
    }

    /// Lowercase name used for screenshot files (`stp_release_1.png`)
    pub fn slug(&self) -> &'static str {
        match self {
            DispositionAction::StpRelease => "stp_release",
            DispositionAction::Release => "release",
            DispositionAction::Block => "block",
            DispositionAction::Reject => "reject",
        }
    }

    /// Every action except the fast-path release needs a manager
    pub fn needs_escalation(&self) -> bool {
        !matches!(self, DispositionAction::StpRelease)
    }
}

impl fmt::Display for DispositionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispositionAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "stp-release" => Ok(DispositionAction::StpRelease),
            "release" => Ok(DispositionAction::Release),
            "block" => Ok(DispositionAction::Block),
            "reject" => Ok(DispositionAction::Reject),
            _ => Err(ValidationError::UnknownAction(s.trim().to_string())),
        }
    }
}

/// Market / transaction type options offered by the BPM surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketType {
    Unclassified,
    ApsMt,
    CbprMx,
    SepaClassic,
    RitsMx,
    LynxMx,
    EnterpriseIso,
    ChapsMx,
    T2sMx,
    BessMt,
    ChipsMx,
    SepaInstant,
    Fedwire,
    TaiwanMx,
    ChatsMx,
    PepplusIat,
    TsfTrigger,
}

impl MarketType {
    pub const ALL: [MarketType; 17] = [
        MarketType::Unclassified,
        MarketType::ApsMt,
        MarketType::CbprMx,
        MarketType::SepaClassic,
        MarketType::RitsMx,
        MarketType::LynxMx,
        MarketType::EnterpriseIso,
        MarketType::ChapsMx,
        MarketType::T2sMx,
        MarketType::BessMt,
        MarketType::ChipsMx,
        MarketType::SepaInstant,
        MarketType::Fedwire,
        MarketType::TaiwanMx,
        MarketType::ChatsMx,
        MarketType::PepplusIat,
        MarketType::TsfTrigger,
    ];

    /// Option name as sent by form `value` attributes (`APS_MT`)
    pub fn name(&self) -> &'static str {
        match self {
            MarketType::Unclassified => "UNCLASSIFIED",
            MarketType::ApsMt => "APS_MT",
            MarketType::CbprMx => "CBPR_MX",
            MarketType::SepaClassic => "SEPA_CLASSIC",
            MarketType::RitsMx => "RITS_MX",
            MarketType::LynxMx => "LYNX_MX",
            MarketType::EnterpriseIso => "ENTERPRISE_ISO",
            MarketType::ChapsMx => "CHAPS_MX",
            MarketType::T2sMx => "T2S_MX",
            MarketType::BessMt => "BESS_MT",
            MarketType::ChipsMx => "CHIPS_MX",
            MarketType::SepaInstant => "SEPA_INSTANT",
            MarketType::Fedwire => "FEDWIRE",
            MarketType::TaiwanMx => "TAIWAN_MX",
            MarketType::ChatsMx => "CHATS_MX",
            MarketType::PepplusIat => "PEPPLUS_IAT",
            MarketType::TsfTrigger => "TSF_TRIGGER",
        }
    }

    /// Label displayed in the BPM option tree (`APS-MT`)
    pub fn label(&self) -> &'static str {
        match self {
            MarketType::Unclassified => "Unclassified",
            MarketType::ApsMt => "APS-MT",
            MarketType::CbprMx => "CBPR-MX",
            MarketType::SepaClassic => "SEPA-Classic",
            MarketType::RitsMx => "RITS-MX",
            MarketType::LynxMx => "LYNX-MX",
            MarketType::EnterpriseIso => "EnterpriseISO",
            MarketType::ChapsMx => "CHAPS-MX",
            MarketType::T2sMx => "T2S-MX",
            MarketType::BessMt => "BESS-MT",
            MarketType::ChipsMx => "CHIPS-MX",
            MarketType::SepaInstant => "SEPA-Instant",
            MarketType::Fedwire => "FEDWIRE",
            MarketType::TaiwanMx => "Taiwan-MX",
            MarketType::ChatsMx => "CHATS-MX",
            MarketType::PepplusIat => "PEPPLUS-IAT",
            MarketType::TsfTrigger => "TSF-TRIGGER",
        }
    }

    /// Resolve a caller-supplied market string.
    ///
    /// Exact option name wins first, then a case-insensitive match on the
    /// display label.
    pub fn resolve(input: &str) -> Option<MarketType> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        MarketType::ALL
            .iter()
            .copied()
            .find(|market| market.name() == input)
            .or_else(|| {
                MarketType::ALL
                    .iter()
                    .copied()
                    .find(|market| market.label().eq_ignore_ascii_case(input))
            })
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validated transaction identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField("transaction"));
        }
        let len = trimmed.chars().count();
        if len > IDENTIFIER_MAX_LEN {
            return Err(ValidationError::IdentifierTooLong(len));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')))
        {
            return Err(ValidationError::InvalidIdentifierChar(bad));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sanitized free-text comment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Comment(String);

impl Comment {
    /// Strip control characters and angle brackets, collapse whitespace,
    /// then enforce the length limit.
    pub fn sanitize(raw: &str) -> Result<Self, ValidationError> {
        let cleaned: String = raw
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .filter(|c| !matches!(c, '<' | '>'))
            .collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        let len = collapsed.chars().count();
        if len > COMMENT_MAX_LEN {
            return Err(ValidationError::CommentTooLong(len));
        }
        Ok(Self(collapsed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Who is driving the session for a given pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// First-line operator; non-STP actions are escalated
    Operator,
    /// Elevated second actor that applies escalated actions
    Manager,
}

/// Request body as received at the HTTP boundary or parsed from a file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionRequest {
    #[serde(default)]
    pub transaction: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub perform_on_latest: Option<bool>,
    #[serde(default)]
    pub force_retry: Option<bool>,
}

/// Validated, immutable processing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    id: TransactionId,
    action: DispositionAction,
    comment: Comment,
    market: Option<MarketType>,
    perform_on_latest: bool,
    force_retry: bool,
}

impl TransactionRequest {
    /// Minimal request with an empty comment and no market
    pub fn new(identifier: &str, action: DispositionAction) -> Result<Self, ValidationError> {
        Ok(Self {
            id: TransactionId::parse(identifier)?,
            action,
            comment: Comment::default(),
            market: None,
            perform_on_latest: false,
            force_retry: false,
        })
    }

    pub fn with_comment(mut self, comment: &str) -> Result<Self, ValidationError> {
        self.comment = Comment::sanitize(comment)?;
        Ok(self)
    }

    pub fn with_market(mut self, market: MarketType) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_perform_on_latest(mut self, flag: bool) -> Self {
        self.perform_on_latest = flag;
        self
    }

    pub fn with_force_retry(mut self, flag: bool) -> Self {
        self.force_retry = flag;
        self
    }

    /// Validate a raw request; every field is checked before automation starts.
    pub fn validate(raw: &RawTransactionRequest) -> Result<Self, ValidationError> {
        if raw.action.trim().is_empty() {
            return Err(ValidationError::MissingField("action"));
        }
        let action: DispositionAction = raw.action.parse()?;
        let market = match raw.transaction_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(
                MarketType::resolve(value)
                    .ok_or_else(|| ValidationError::UnknownMarket(value.to_string()))?,
            ),
        };

        let request = Self::new(&raw.transaction, action)?
            .with_comment(raw.comment.as_deref().unwrap_or_default())?
            .with_perform_on_latest(raw.perform_on_latest.unwrap_or(false))
            .with_force_retry(raw.force_retry.unwrap_or(false));

        Ok(match market {
            Some(market) => request.with_market(market),
            None => request,
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn action(&self) -> DispositionAction {
        self.action
    }

    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    pub fn market(&self) -> Option<MarketType> {
        self.market
    }

    pub fn perform_on_latest(&self) -> bool {
        self.perform_on_latest
    }

    pub fn force_retry(&self) -> bool {
        self.force_retry
    }
}
