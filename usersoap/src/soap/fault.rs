//! SOAP Faults

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Codes de fault reconnus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCode {
    Client,
    Server,
    MustUnderstand,
}

impl FaultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultCode::Client => "Client",
            FaultCode::Server => "Server",
            FaultCode::MustUnderstand => "MustUnderstand",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultCode {
    type Err = String;

    /// Accepte aussi les formes préfixées (`soap:Client`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let local = s.rsplit(':').next().unwrap_or(s).trim();
        match local {
            "Client" => Ok(FaultCode::Client),
            "Server" => Ok(FaultCode::Server),
            "MustUnderstand" => Ok(FaultCode::MustUnderstand),
            other => Err(format!("unknown fault code: {other}")),
        }
    }
}

/// Erreur SOAP (Fault)
///
/// Terminal : un fault ne contient jamais d'autre charge utile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Fault")]
pub struct Fault {
    #[serde(rename = "faultcode")]
    pub fault_code: String,

    #[serde(rename = "faultstring", default)]
    pub fault_string: String,
}

impl Fault {
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            fault_code: code.as_str().to_string(),
            fault_string: message.into(),
        }
    }

    /// Code typé, `None` si le code reçu n'est pas reconnu
    pub fn code(&self) -> Option<FaultCode> {
        self.fault_code.parse().ok()
    }
}
