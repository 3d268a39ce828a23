//! Transfer-service records: agents, shares and users

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of registered transfer agent, integer-coded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ClientKind {
    /// Interactive app on a user machine
    Workstation,
    /// Dedicated transfer server
    Server,
    /// Site-wide server acting on behalf of users
    SiteServer,
}

impl ClientKind {
    /// Kinds that can represent the local machine of a user
    pub fn is_user_machine(self) -> bool {
        matches!(self, Self::Workstation | Self::SiteServer)
    }
}

impl TryFrom<u8> for ClientKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Workstation),
            1 => Ok(Self::Server),
            2 => Ok(Self::SiteServer),
            other => Err(format!("unknown client kind: {}", other)),
        }
    }
}

impl From<ClientKind> for u8 {
    fn from(kind: ClientKind) -> u8 {
        match kind {
            ClientKind::Workstation => 0,
            ClientKind::Server => 1,
            ClientKind::SiteServer => 2,
        }
    }
}

/// A registered transfer-service agent representing one machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Transfer-service record id (opaque)
    pub id: String,

    /// Agent code, conventionally the machine hostname
    pub code: String,

    /// Hardware identifiers (MAC addresses) registered for this agent
    pub host_ids: Vec<String>,

    /// Agent kind
    pub kind: ClientKind,

    /// Owning transfer-service user id
    pub user_id: String,
}

/// A named root storage mount known to the transfer service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub id: String,
    pub code: String,
    /// Whether this is the workspace default share
    pub default: bool,
}

impl Share {
    /// Environment variable carrying the local filesystem root for this share
    pub fn root_env_var(&self) -> String {
        format!("ACCSYN_{}_PATH", self.code.to_uppercase())
    }
}

/// Role of a transfer-service user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Employee,
    Restricted,
}

impl UserRole {
    /// Only admins and employees may run the integration
    pub fn can_run_integration(self) -> bool {
        matches!(self, Self::Admin | Self::Employee)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Employee => write!(f, "employee"),
            Self::Restricted => write!(f, "restricted"),
        }
    }
}

/// A transfer-service user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferUser {
    pub id: String,
    pub code: String,
    pub role: UserRole,
}
