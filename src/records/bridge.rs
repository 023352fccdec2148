//! Bridge records and the protocol-level bridge descriptor derived from them.
//!
//! Every pair-typed field holds the locking side at index 0 and the issuing
//! side at index 1.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Currency code of the native asset
pub const NATIVE_CURRENCY: &str = "XRP";

/// An issued currency: code plus issuing account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuedCurrency {
    pub currency: String,
    pub issuer: String,
}

/// How the native marker was written in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeSpelling {
    /// `"XRP"`
    Marker,
    /// `{"currency": "XRP"}`, as copied from a bridge bootstrap file
    Object,
}

/// One side's currency as persisted in a bridge record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCurrency", into = "RawCurrency")]
pub enum XChainCurrency {
    Native(NativeSpelling),
    Issued(IssuedCurrency),
}

impl XChainCurrency {
    pub fn native() -> Self {
        XChainCurrency::Native(NativeSpelling::Marker)
    }

    pub fn issued(currency: impl Into<String>, issuer: impl Into<String>) -> Self {
        XChainCurrency::Issued(IssuedCurrency {
            currency: currency.into(),
            issuer: issuer.into(),
        })
    }

    pub fn is_native(&self) -> bool {
        matches!(self, XChainCurrency::Native(_))
    }

    pub fn to_issue(&self) -> Issue {
        match self {
            XChainCurrency::Native(_) => Issue::Native,
            XChainCurrency::Issued(issued) => Issue::Issued(issued.clone()),
        }
    }
}

/// Wire shape of [`XChainCurrency`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCurrency {
    Marker(String),
    Object {
        currency: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issuer: Option<String>,
    },
}

impl TryFrom<RawCurrency> for XChainCurrency {
    type Error = String;

    fn try_from(raw: RawCurrency) -> Result<Self, Self::Error> {
        match raw {
            RawCurrency::Marker(marker) if marker == NATIVE_CURRENCY => {
                Ok(XChainCurrency::Native(NativeSpelling::Marker))
            }
            RawCurrency::Marker(other) => Err(format!(
                "expected \"{}\" or a currency object, found \"{}\"",
                NATIVE_CURRENCY, other
            )),
            RawCurrency::Object {
                currency,
                issuer: Some(issuer),
            } => Ok(XChainCurrency::Issued(IssuedCurrency { currency, issuer })),
            RawCurrency::Object {
                currency,
                issuer: None,
            } if currency == NATIVE_CURRENCY => Ok(XChainCurrency::Native(NativeSpelling::Object)),
            RawCurrency::Object {
                currency,
                issuer: None,
            } => Err(format!("currency \"{}\" has no issuer", currency)),
        }
    }
}

impl From<XChainCurrency> for RawCurrency {
    fn from(currency: XChainCurrency) -> Self {
        match currency {
            XChainCurrency::Native(NativeSpelling::Marker) => {
                RawCurrency::Marker(NATIVE_CURRENCY.to_string())
            }
            XChainCurrency::Native(NativeSpelling::Object) => RawCurrency::Object {
                currency: NATIVE_CURRENCY.to_string(),
                issuer: None,
            },
            XChainCurrency::Issued(IssuedCurrency { currency, issuer }) => RawCurrency::Object {
                currency,
                issuer: Some(issuer),
            },
        }
    }
}

/// A named bridge between two registered chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRecord {
    pub name: String,
    /// Chain names; not checked against the registered chains
    pub chains: [String; 2],
    #[serde(alias = "quorum")]
    pub num_witnesses: u32,
    pub door_accounts: [String; 2],
    #[serde(rename = "xchain_currencies")]
    pub currencies: [XChainCurrency; 2],
    pub signature_reward: String,
    pub create_account_amounts: [String; 2],
}

impl BridgeRecord {
    pub fn locking_chain(&self) -> &str {
        &self.chains[0]
    }

    pub fn issuing_chain(&self) -> &str {
        &self.chains[1]
    }

    pub fn descriptor(&self) -> BridgeDescriptor {
        derive_bridge_descriptor(self)
    }

    /// XRPL-formatted `XChainBridge` object
    pub fn to_xrpl(&self) -> Value {
        self.descriptor().to_xrpl()
    }
}

/// A bridge side's asset as the protocol sees it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Issue {
    Native,
    Issued(IssuedCurrency),
}

impl Issue {
    pub fn to_xrpl(&self) -> Value {
        match self {
            Issue::Native => json!({ "currency": NATIVE_CURRENCY }),
            Issue::Issued(issued) => json!({
                "currency": issued.currency,
                "issuer": issued.issuer,
            }),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::Native => f.write_str(NATIVE_CURRENCY),
            Issue::Issued(issued) => write!(f, "{}.{}", issued.currency, issued.issuer),
        }
    }
}

/// Protocol-level bridge identity used when signing cross-chain transactions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BridgeDescriptor {
    pub locking_door: String,
    pub locking_issue: Issue,
    pub issuing_door: String,
    pub issuing_issue: Issue,
}

impl BridgeDescriptor {
    pub fn to_xrpl(&self) -> Value {
        json!({
            "LockingChainDoor": self.locking_door,
            "LockingChainIssue": self.locking_issue.to_xrpl(),
            "IssuingChainDoor": self.issuing_door,
            "IssuingChainIssue": self.issuing_issue.to_xrpl(),
        })
    }
}

/// Map a bridge record onto the four-field protocol descriptor.
///
/// Addresses and currency codes pass through unchecked; the signing layer
/// rejects malformed values.
pub fn derive_bridge_descriptor(record: &BridgeRecord) -> BridgeDescriptor {
    BridgeDescriptor {
        locking_door: record.door_accounts[0].clone(),
        locking_issue: record.currencies[0].to_issue(),
        issuing_door: record.door_accounts[1].clone(),
        issuing_issue: record.currencies[1].to_issue(),
    }
}
