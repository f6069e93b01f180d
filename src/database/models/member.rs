use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SaccoError;

/// Lower-cased `0x`-prefixed 20-byte hex wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, SaccoError> {
        let lowered = raw.trim().to_ascii_lowercase();
        let hex_part = lowered
            .strip_prefix("0x")
            .ok_or_else(|| SaccoError::validation("Wallet address must start with 0x"))?;

        if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SaccoError::validation(
                "Wallet address must be 40 hexadecimal characters after 0x",
            ));
        }
        Ok(Self(lowered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234...abcd`
    pub fn shortened(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = SaccoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Member,
    Admin,
    SuperAdmin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "MEMBER",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl FromStr for Role {
    type Err = SaccoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEMBER" => Ok(Self::Member),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            other => Err(SaccoError::internal(format!("unknown member role {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub wallet_address: WalletAddress,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub is_approved: bool,
    pub is_active: bool,
    pub role: Role,
    pub total_savings: Decimal,
    pub total_loans_amount: Decimal, // outstanding principal
    pub registered_at: DateTime<Utc>,
}

impl Member {
    /// Approved and not deactivated.
    pub fn in_good_standing(&self) -> bool {
        self.is_approved && self.is_active
    }
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub wallet_address: WalletAddress,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub national_id: Option<String>,
}

/// Member row as listed in the admin console.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: i64,
    pub wallet_address: WalletAddress,
    pub name: String,
    pub email: String,
    pub is_approved: bool,
    pub is_active: bool,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
    pub savings_count: i64,
    pub loans_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_is_lowercased() {
        let addr = WalletAddress::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(addr.shortened(), "0xabcd...ef01");
    }

    #[test]
    fn wallet_address_rejects_bad_input() {
        assert!(WalletAddress::parse("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(WalletAddress::parse("0x1234").is_err());
        assert!(WalletAddress::parse("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn role_round_trips_through_its_column_value() {
        for role in [Role::Member, Role::Admin, Role::SuperAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!(!Role::Member.is_admin());
        assert!(Role::SuperAdmin.is_admin());
    }
}
