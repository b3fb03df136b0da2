use chrono::{DateTime, Utc};
use kernel::id::AccessDenialId;
use uuid::Uuid;

use crate::domain::value_object::principal::{DenialReason, PrincipalKind};

/// Audit record appended for every request the guard rejects
#[derive(Debug, Clone)]
pub struct AccessDenial {
    pub denial_id: AccessDenialId,
    pub occurred_at: DateTime<Utc>,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    /// `METHOD path`
    pub operation: String,
    pub reason: DenialReason,
    pub presented_kind: Option<PrincipalKind>,
    pub presented_principal_id: Option<Uuid>,
}

impl AccessDenial {
    pub fn new(
        source_ip: Option<String>,
        user_agent: Option<String>,
        operation: String,
        reason: DenialReason,
        presented: Option<(PrincipalKind, Uuid)>,
    ) -> Self {
        Self {
            denial_id: AccessDenialId::new(),
            occurred_at: Utc::now(),
            source_ip,
            user_agent,
            operation,
            reason,
            presented_kind: presented.map(|(kind, _)| kind),
            presented_principal_id: presented.map(|(_, id)| id),
        }
    }
}
