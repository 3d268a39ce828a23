//! Local client identity resolution
//!
//! Maps this machine to a registered transfer agent by hostname, falling
//! back to MAC-address matching against the agent's registered hardware
//! identifiers. Best effort: virtualized or multi-NIC hosts may resolve no
//! MAC, in which case only the hostname can match.

use crate::domain::{Client, TransferUser};
use tracing::{debug, info};

/// Identity resolution errors; all fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("no transfer-service user registered with code {0}")]
    NoUser(String),
    #[error("user {user} has role {role}, expected admin or employee")]
    UnsupportedRole { user: String, role: String },
    #[error(
        "no transfer agent matches this machine (hostname: {hostname}, mac: {mac}); \
         install and set up the transfer client on this computer"
    )]
    NoClient { hostname: String, mac: String },
    #[error("could not determine local hostname: {0}")]
    Hostname(String),
}

/// The local machine's identifiers used for agent matching
#[derive(Debug, Clone)]
pub struct MachineIdent {
    pub hostname: String,
    /// Uppercase, `:`-separated; empty when no interface reports one
    pub mac_address: String,
}

impl MachineIdent {
    /// Gather identifiers from the local machine
    pub fn gather() -> Result<Self, IdentityError> {
        let hostname = hostname::get()
            .map_err(|e| IdentityError::Hostname(e.to_string()))?
            .to_string_lossy()
            .to_string();

        let mac_address = match mac_address::get_mac_address() {
            Ok(Some(mac)) => mac.to_string().to_uppercase(),
            // Hosts without a resolvable MAC fall back to hostname matching.
            Ok(None) | Err(_) => String::new(),
        };

        debug!(%hostname, mac = %mac_address, "Gathered machine identifiers");
        Ok(Self {
            hostname,
            mac_address,
        })
    }
}

/// Verify the acting user may run the integration
pub fn check_user_role(user: &TransferUser) -> Result<(), IdentityError> {
    if user.role.can_run_integration() {
        Ok(())
    } else {
        Err(IdentityError::UnsupportedRole {
            user: user.code.clone(),
            role: user.role.to_string(),
        })
    }
}

/// Pick the transfer agent representing this machine.
///
/// Hostname match on the agent code wins; otherwise the first agent whose
/// registered hardware identifiers contain the MAC, compared
/// case-insensitively. Only user-machine agent kinds are considered.
pub fn match_client<'a>(clients: &'a [Client], ident: &MachineIdent) -> Option<&'a Client> {
    let candidates = clients.iter().filter(|c| c.kind.is_user_machine());

    let mut mac_match = None;
    for client in candidates {
        if client.code == ident.hostname {
            return Some(client);
        }
        if mac_match.is_none() && !ident.mac_address.is_empty() {
            let matches = client
                .host_ids
                .iter()
                .any(|id| id.trim().eq_ignore_ascii_case(&ident.mac_address));
            if matches {
                mac_match = Some(client);
            }
        }
    }
    mac_match
}

/// Resolve the local agent, failing when none matches
pub fn resolve_client<'a>(
    clients: &'a [Client],
    ident: &MachineIdent,
) -> Result<&'a Client, IdentityError> {
    match match_client(clients, ident) {
        Some(client) => {
            info!(
                code = %client.code,
                id = %client.id,
                "Resolved local transfer agent"
            );
            Ok(client)
        }
        None => Err(IdentityError::NoClient {
            hostname: ident.hostname.clone(),
            mac: ident.mac_address.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClientKind;

    fn client(code: &str, host_ids: &[&str], kind: ClientKind) -> Client {
        Client {
            id: format!("id-{}", code),
            code: code.to_string(),
            host_ids: host_ids.iter().map(|s| s.to_string()).collect(),
            kind,
            user_id: "u1".to_string(),
        }
    }

    fn ident(hostname: &str, mac: &str) -> MachineIdent {
        MachineIdent {
            hostname: hostname.to_string(),
            mac_address: mac.to_string(),
        }
    }

    #[test]
    fn hostname_match_wins() {
        let clients = vec![
            client("other", &["AA:BB:CC:DD:EE:FF"], ClientKind::Workstation),
            client("laptop", &[], ClientKind::Workstation),
        ];
        let found = match_client(&clients, &ident("laptop", "AA:BB:CC:DD:EE:FF")).unwrap();
        assert_eq!(found.code, "laptop");
    }

    #[test]
    fn mac_match_is_case_insensitive() {
        let clients = vec![client(
            "render-01",
            &["aa:bb:cc:dd:ee:ff"],
            ClientKind::Workstation,
        )];
        let found = match_client(&clients, &ident("laptop", "AA:BB:CC:DD:EE:FF")).unwrap();
        assert_eq!(found.code, "render-01");
    }

    #[test]
    fn dedicated_servers_are_not_candidates() {
        let clients = vec![client("laptop", &[], ClientKind::Server)];
        assert!(match_client(&clients, &ident("laptop", "")).is_none());
    }

    #[test]
    fn no_match_is_fatal() {
        let clients = vec![client("other", &[], ClientKind::Workstation)];
        let err = resolve_client(&clients, &ident("laptop", "AA:BB:CC:DD:EE:FF")).unwrap_err();
        assert!(matches!(err, IdentityError::NoClient { .. }));
    }

    #[test]
    fn empty_mac_never_matches_hardware_ids() {
        let clients = vec![client("other", &[""], ClientKind::Workstation)];
        assert!(match_client(&clients, &ident("laptop", "")).is_none());
    }
}
