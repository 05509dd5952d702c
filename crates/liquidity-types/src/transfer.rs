//! Bank movements produced by pool creation and batch execution.
//!
//! Matching never touches the bank directly. It emits an ordered list of
//! transfers that the executor applies atomically once every pool of the
//! block has passed its invariant checks.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Coin, RequestSeq};

/// One bank movement. `request` ties escrow releases to the request they
/// settle; transfers that do not touch escrow leave it `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transfer {
    Send {
        from: AccountId,
        to: AccountId,
        coin: Coin,
        request: Option<RequestSeq>,
    },
    Mint {
        to: AccountId,
        coin: Coin,
        request: Option<RequestSeq>,
    },
    Burn {
        from: AccountId,
        coin: Coin,
        request: Option<RequestSeq>,
    },
}

impl Transfer {
    #[must_use]
    pub fn send(from: AccountId, to: AccountId, coin: Coin, request: Option<RequestSeq>) -> Self {
        Self::Send {
            from,
            to,
            coin,
            request,
        }
    }

    #[must_use]
    pub fn mint(to: AccountId, coin: Coin, request: Option<RequestSeq>) -> Self {
        Self::Mint { to, coin, request }
    }

    #[must_use]
    pub fn burn(from: AccountId, coin: Coin, request: Option<RequestSeq>) -> Self {
        Self::Burn {
            from,
            coin,
            request,
        }
    }

    #[must_use]
    pub fn coin(&self) -> &Coin {
        match self {
            Self::Send { coin, .. } | Self::Mint { coin, .. } | Self::Burn { coin, .. } => coin,
        }
    }

    #[must_use]
    pub fn request(&self) -> Option<RequestSeq> {
        match self {
            Self::Send { request, .. } | Self::Mint { request, .. } | Self::Burn { request, .. } => {
                *request
            }
        }
    }

    /// Account debited by this transfer, if any.
    #[must_use]
    pub fn source(&self) -> Option<&AccountId> {
        match self {
            Self::Send { from, .. } | Self::Burn { from, .. } => Some(from),
            Self::Mint { .. } => None,
        }
    }

    /// Account credited by this transfer, if any.
    #[must_use]
    pub fn destination(&self) -> Option<&AccountId> {
        match self {
            Self::Send { to, .. } | Self::Mint { to, .. } => Some(to),
            Self::Burn { .. } => None,
        }
    }

    /// Stable byte encoding used by result hashing.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let (tag, from, to) = match self {
            Self::Send { from, to, .. } => (b'S', from.as_str(), to.as_str()),
            Self::Mint { to, .. } => (b'M', "", to.as_str()),
            Self::Burn { from, .. } => (b'B', from.as_str(), ""),
        };
        let coin = self.coin();
        let mut out = Vec::with_capacity(64);
        out.push(tag);
        for field in [from, to, coin.denom.as_str()] {
            out.extend_from_slice(&(field.len() as u64).to_le_bytes());
            out.extend_from_slice(field.as_bytes());
        }
        let amount = coin.amount.normalize().to_string();
        out.extend_from_slice(&(amount.len() as u64).to_le_bytes());
        out.extend_from_slice(amount.as_bytes());
        out.extend_from_slice(&self.request().map_or(u64::MAX, |r| r.0).to_le_bytes());
        out
    }
}
