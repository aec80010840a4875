//! Organization lookup by exact name (read only)

use crate::resource::call;
use async_trait::async_trait;
use connectkit::proto::Organization;
use connectkit::{OrganizationApi, OrganizationFilter};
use declarative::{Lookup, OperationContext, ReconcileError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SUMMARY: &str = "Client Error";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizationQuery {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationModel {
    pub id: Option<String>,
    pub name: String,
}

impl From<Organization> for OrganizationModel {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id.filter(|id| !id.is_empty()),
            name: org.name,
        }
    }
}

pub struct OrganizationLookup {
    api: Arc<dyn OrganizationApi>,
}

impl OrganizationLookup {
    pub fn new(api: Arc<dyn OrganizationApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Lookup for OrganizationLookup {
    type Filter = OrganizationQuery;
    type Model = OrganizationModel;

    async fn lookup(&self, ctx: &OperationContext, filter: &OrganizationQuery) -> Result<OrganizationModel> {
        let name = filter.name.as_str();
        log::debug!("Looking up organization {name:?}");

        let request = OrganizationFilter {
            name: Some(name.to_string()),
        };
        let mut orgs = call(ctx, SUMMARY, "", self.api.list_organizations(request)).await?;

        match orgs.len() {
            0 => Err(ReconcileError::NoMatch {
                summary: SUMMARY.to_string(),
                detail: format!("organization with name '{name}' not found"),
            }),
            1 => Ok(orgs.remove(0).into()),
            count => Err(ReconcileError::MultipleMatches {
                summary: SUMMARY.to_string(),
                detail: format!("multiple organizations with name '{name}' found"),
                count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::fake::FakeConnect;
    use connectkit::Code;

    fn lookup() -> (Arc<FakeConnect>, OrganizationLookup) {
        let fake = Arc::new(FakeConnect::new());
        (fake.clone(), OrganizationLookup::new(fake))
    }

    fn query(name: &str) -> OrganizationQuery {
        OrganizationQuery {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_lookup_exact_name() {
        let (fake, orgs) = lookup();
        fake.add_organization("org-1", "acme");
        fake.add_organization("org-2", "globex");

        let found = orgs.lookup(&OperationContext::new(), &query("globex")).await.unwrap();
        assert_eq!(
            found,
            OrganizationModel {
                id: Some("org-2".to_string()),
                name: "globex".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let (_fake, orgs) = lookup();
        let err = orgs.lookup(&OperationContext::new(), &query("nope")).await.unwrap_err();
        assert!(matches!(err, ReconcileError::NoMatch { .. }));
        assert_eq!(err.to_diagnostic().detail, "organization with name 'nope' not found");
    }

    #[tokio::test]
    async fn test_lookup_ambiguous() {
        let (fake, orgs) = lookup();
        fake.add_organization("org-1", "acme");
        fake.add_organization("org-2", "acme");

        let err = orgs.lookup(&OperationContext::new(), &query("acme")).await.unwrap_err();
        assert!(matches!(err, ReconcileError::MultipleMatches { count: 2, .. }));
        assert_eq!(err.to_diagnostic().detail, "multiple organizations with name 'acme' found");
    }

    #[tokio::test]
    async fn test_lookup_transport_failure() {
        let (fake, orgs) = lookup();
        fake.fail_next(Code::PermissionDenied);
        let err = orgs.lookup(&OperationContext::new(), &query("acme")).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Remote { .. }));
        assert_eq!(err.to_diagnostic().summary, SUMMARY);
    }
}
