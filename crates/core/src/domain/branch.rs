// Branch Domain Model
//
// A saga branch is identified by (gid, branch_id); every call against it
// carries the operation kind the coordinator wants applied.

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Global transaction ID (assigned by the coordinator, opaque)
pub type Gid = String;

/// Branch ID within a global transaction
pub type BranchId = String;

const MAX_ID_LEN: usize = 128;
const MAX_OP_LEN: usize = 45;

/// Operation kind of a branch call
///
/// Open enumeration: coordinators with their own saga model may send op names
/// outside the known set; those are kept as `Custom` and deduplicated without
/// pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BranchOp {
    Action,
    Compensate,
    Try,
    Confirm,
    Cancel,
    Custom(String),
}

impl BranchOp {
    pub fn as_str(&self) -> &str {
        match self {
            BranchOp::Action => "action",
            BranchOp::Compensate => "compensate",
            BranchOp::Try => "try",
            BranchOp::Confirm => "confirm",
            BranchOp::Cancel => "cancel",
            BranchOp::Custom(name) => name,
        }
    }

    /// The op whose ledger row decides whether this one may run.
    pub fn paired(&self) -> Option<BranchOp> {
        match self {
            BranchOp::Action => Some(BranchOp::Compensate),
            BranchOp::Compensate => Some(BranchOp::Action),
            BranchOp::Try => Some(BranchOp::Cancel),
            BranchOp::Cancel => Some(BranchOp::Try),
            BranchOp::Confirm | BranchOp::Custom(_) => None,
        }
    }

    /// Undo-side ops (compensate, cancel)
    pub fn is_rollback(&self) -> bool {
        matches!(self, BranchOp::Compensate | BranchOp::Cancel)
    }

    /// Forward ops that have an undo (action, try)
    pub fn is_forward(&self) -> bool {
        matches!(self, BranchOp::Action | BranchOp::Try)
    }
}

impl fmt::Display for BranchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchOp {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let op = match s {
            "action" => BranchOp::Action,
            "compensate" => BranchOp::Compensate,
            "try" => BranchOp::Try,
            "confirm" => BranchOp::Confirm,
            "cancel" => BranchOp::Cancel,
            "" => return Err(DomainError::InvalidBarrier("op is empty".to_string())),
            other if other.len() > MAX_OP_LEN => {
                return Err(DomainError::InvalidBarrier(format!(
                    "op longer than {} bytes",
                    MAX_OP_LEN
                )))
            }
            other => BranchOp::Custom(other.to_string()),
        };
        Ok(op)
    }
}

impl TryFrom<String> for BranchOp {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BranchOp> for String {
    fn from(op: BranchOp) -> Self {
        op.as_str().to_string()
    }
}

/// One inbound call against a saga branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCall {
    /// Saga model of the caller ("saga", "tcc", ...). Diagnostic only.
    pub trans_type: String,
    pub gid: Gid,
    pub branch_id: BranchId,
    pub op: BranchOp,
}

impl BranchCall {
    /// Build a validated branch call
    pub fn new(
        trans_type: impl Into<String>,
        gid: impl Into<String>,
        branch_id: impl Into<String>,
        op: BranchOp,
    ) -> Result<Self> {
        let call = Self {
            trans_type: trans_type.into(),
            gid: gid.into(),
            branch_id: branch_id.into(),
            op,
        };
        call.validate()?;
        Ok(call)
    }

    /// Check field presence and column limits
    pub fn validate(&self) -> Result<()> {
        check_id("gid", &self.gid)?;
        check_id("branch_id", &self.branch_id)?;
        if self.trans_type.len() > MAX_OP_LEN {
            return Err(DomainError::InvalidBarrier(format!(
                "trans_type longer than {} bytes",
                MAX_OP_LEN
            )));
        }
        Ok(())
    }

    /// The call this one is checked against, if its op has a pair.
    pub fn paired_op(&self) -> Option<BranchOp> {
        self.op.paired()
    }

    /// Reject ops that do not belong on a forward endpoint
    pub fn expect_forward(&self) -> Result<()> {
        if !self.op.is_forward() {
            return Err(DomainError::InvalidBarrier(format!(
                "op {} not accepted by a forward branch",
                self.op
            )));
        }
        Ok(())
    }

    /// Reject ops that do not belong on a compensation endpoint
    pub fn expect_rollback(&self) -> Result<()> {
        if !self.op.is_rollback() {
            return Err(DomainError::InvalidBarrier(format!(
                "op {} not accepted by a compensation branch",
                self.op
            )));
        }
        Ok(())
    }
}

fn check_id(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidBarrier(format!("{} is empty", field)));
    }
    if value.len() > MAX_ID_LEN {
        return Err(DomainError::InvalidBarrier(format!(
            "{} longer than {} bytes",
            field, MAX_ID_LEN
        )));
    }
    Ok(())
}

/// Persisted ledger row (one attempted op of a branch)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub trans_type: String,
    pub gid: Gid,
    pub branch_id: BranchId,
    pub op: BranchOp,
    pub created_at: i64, // epoch ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_are_symmetric() {
        for op in [
            BranchOp::Action,
            BranchOp::Compensate,
            BranchOp::Try,
            BranchOp::Cancel,
        ] {
            let paired = op.paired().unwrap();
            assert_eq!(paired.paired(), Some(op.clone()));
            assert_ne!(op.is_rollback(), paired.is_rollback());
        }
        assert_eq!(BranchOp::Confirm.paired(), None);
    }

    #[test]
    fn test_parse_open_enumeration() {
        assert_eq!("action".parse::<BranchOp>().unwrap(), BranchOp::Action);
        assert_eq!(
            "msg".parse::<BranchOp>().unwrap(),
            BranchOp::Custom("msg".to_string())
        );
        assert!("".parse::<BranchOp>().is_err());
        assert!("x".repeat(46).parse::<BranchOp>().is_err());
    }

    #[test]
    fn test_op_serde_as_plain_string() {
        let json = serde_json::to_string(&BranchOp::Compensate).unwrap();
        assert_eq!(json, "\"compensate\"");

        let op: BranchOp = serde_json::from_str("\"cancel\"").unwrap();
        assert_eq!(op, BranchOp::Cancel);
    }

    #[test]
    fn test_branch_call_validation() {
        assert!(BranchCall::new("saga", "g1", "01", BranchOp::Action).is_ok());

        let err = BranchCall::new("saga", "  ", "01", BranchOp::Action).unwrap_err();
        assert!(err.to_string().contains("gid is empty"));

        let err = BranchCall::new("saga", "g1", "b".repeat(129), BranchOp::Action).unwrap_err();
        assert!(err.to_string().contains("branch_id longer"));
    }

    #[test]
    fn test_endpoint_side() {
        let call = |op| BranchCall::new("saga", "g1", "01", op).unwrap();

        assert!(call(BranchOp::Action).expect_forward().is_ok());
        assert!(call(BranchOp::Try).expect_forward().is_ok());
        assert!(call(BranchOp::Compensate).expect_forward().is_err());
        assert!(call(BranchOp::Confirm).expect_forward().is_err());

        assert!(call(BranchOp::Compensate).expect_rollback().is_ok());
        assert!(call(BranchOp::Cancel).expect_rollback().is_ok());
        assert!(call(BranchOp::Action).expect_rollback().is_err());
        assert!(call(BranchOp::Custom("refund".into())).expect_rollback().is_err());
    }
}
