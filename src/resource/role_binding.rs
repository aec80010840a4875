//! Role bindings
//!
//! Grants a role on one resource to either a user or a group. Like
//! attestation policies, the principal is written as one of two optional
//! blocks and held as an enum.

use crate::codec::non_empty_str;
use crate::resource::{call, deleted, present, state_id};
use async_trait::async_trait;
use connectkit::proto::role_binding::role_binding::Principal as WirePrincipal;
use connectkit::proto::{Group, Resource, RoleBinding, User};
use connectkit::{RoleBindingApi, RoleBindingFilter};
use declarative::{
    KindNames, Lookup, OperationContext, ReconcileError, Reconciler, ResourceState, Result,
    present_or_not_found, select_single,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NAMES: KindNames = KindNames::new("role binding", "role bindings");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User { subject: String },
    Group { claim_value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RoleBindingDocument", into = "RoleBindingDocument")]
pub struct RoleBindingModel {
    pub id: Option<String>,
    pub role_id: String,
    pub principal: Principal,
    pub resource: ResourceRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserBlock {
    subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupBlock {
    claim_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoleBindingDocument {
    #[serde(default)]
    id: Option<String>,
    role_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<UserBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<GroupBlock>,
    resource: ResourceRef,
}

impl TryFrom<RoleBindingDocument> for RoleBindingModel {
    type Error = String;

    fn try_from(doc: RoleBindingDocument) -> std::result::Result<Self, Self::Error> {
        let principal = match (doc.user, doc.group) {
            (Some(user), None) => Principal::User {
                subject: user.subject,
            },
            (None, Some(group)) => Principal::Group {
                claim_value: group.claim_value,
            },
            (None, None) => {
                return Err(
                    "Exactly one of user or group blocks must be configured, but none were provided."
                        .to_string(),
                );
            }
            (Some(_), Some(_)) => {
                return Err(
                    "Exactly one of user or group blocks must be configured, but multiple were provided."
                        .to_string(),
                );
            }
        };
        Ok(Self {
            id: doc.id,
            role_id: doc.role_id,
            principal,
            resource: doc.resource,
        })
    }
}

impl From<RoleBindingModel> for RoleBindingDocument {
    fn from(model: RoleBindingModel) -> Self {
        let (user, group) = match model.principal {
            Principal::User { subject } => (Some(UserBlock { subject }), None),
            Principal::Group { claim_value } => (None, Some(GroupBlock { claim_value })),
        };
        Self {
            id: model.id,
            role_id: model.role_id,
            user,
            group,
            resource: model.resource,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleBindingQuery {
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub user_subject: Option<String>,
    #[serde(default)]
    pub group_claim_value: Option<String>,
}

pub fn encode(model: &RoleBindingModel) -> RoleBinding {
    let principal = match &model.principal {
        Principal::User { subject } => WirePrincipal::User(User {
            subject: subject.clone(),
        }),
        Principal::Group { claim_value } => WirePrincipal::Group(Group {
            claim_value: claim_value.clone(),
        }),
    };
    RoleBinding {
        id: model.id.clone().unwrap_or_default(),
        role_id: model.role_id.clone(),
        principal: Some(principal),
        resource: Some(Resource {
            r#type: model.resource.kind.clone(),
            id: model.resource.id.clone(),
        }),
    }
}

fn decode(binding: RoleBinding) -> Result<RoleBindingModel> {
    let principal = match binding.principal {
        Some(WirePrincipal::User(user)) => Principal::User {
            subject: user.subject,
        },
        Some(WirePrincipal::Group(group)) => Principal::Group {
            claim_value: group.claim_value,
        },
        None => {
            return Err(ReconcileError::codec(
                "Error processing role binding",
                format!("role binding {:?} has no user or group", binding.id),
            ));
        }
    };
    let resource = binding.resource.unwrap_or_default();
    Ok(RoleBindingModel {
        id: non_empty_str(binding.id),
        role_id: binding.role_id,
        principal,
        resource: ResourceRef {
            kind: resource.r#type,
            id: resource.id,
        },
    })
}

/// Role bindings carry no server-assigned attributes besides the id
fn settle(response: RoleBinding, prior: Option<&RoleBindingModel>) -> Result<RoleBindingModel> {
    let mut model = decode(response)?;
    if model.id.is_none() {
        model.id = prior.and_then(|p| p.id.clone());
    }
    Ok(model)
}

pub struct RoleBindingReconciler {
    api: Arc<dyn RoleBindingApi>,
}

impl RoleBindingReconciler {
    pub fn new(api: Arc<dyn RoleBindingApi>) -> Self {
        Self { api }
    }

    async fn fetch(&self, ctx: &OperationContext, id: &str) -> Result<RoleBinding> {
        call(ctx, "Error reading role binding", "", self.api.get_role_binding(id)).await
    }
}

#[async_trait]
impl Reconciler for RoleBindingReconciler {
    type Model = RoleBindingModel;

    fn resource_type(&self) -> &'static str {
        "role_binding"
    }

    async fn create(&self, ctx: &OperationContext, declared: &RoleBindingModel) -> Result<RoleBindingModel> {
        let request = encode(&RoleBindingModel {
            id: None,
            ..declared.clone()
        });
        let response = call(
            ctx,
            "Error creating role binding",
            "",
            self.api.create_role_binding(request),
        )
        .await?;
        log::info!("Created role binding {:?}", response.id);
        settle(response, None)
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        state: &RoleBindingModel,
    ) -> Result<ResourceState<RoleBindingModel>> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(ResourceState::Absent);
        };
        match present(self.fetch(ctx, id).await)? {
            ResourceState::Present(binding) => settle(binding, Some(state)).map(ResourceState::Present),
            ResourceState::Absent => Ok(ResourceState::Absent),
        }
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        state: &RoleBindingModel,
        declared: &RoleBindingModel,
    ) -> Result<RoleBindingModel> {
        let id = state_id(state.id.as_ref()).ok_or_else(|| ReconcileError::MissingId {
            kind: NAMES.singular,
            detail: "Role binding ID not found in state.".to_string(),
        })?;

        let request = encode(&RoleBindingModel {
            id: Some(id.to_string()),
            ..declared.clone()
        });
        let response = call(
            ctx,
            "Error updating role binding",
            "",
            self.api.update_role_binding(request),
        )
        .await?;
        settle(response, Some(state))
    }

    async fn delete(&self, ctx: &OperationContext, state: &RoleBindingModel) -> Result<()> {
        let Some(id) = state_id(state.id.as_ref()) else {
            return Ok(());
        };
        deleted(call(ctx, "Error deleting role binding", "", self.api.destroy_role_binding(id)).await)
    }

    async fn import(&self, ctx: &OperationContext, key: &str) -> Result<RoleBindingModel> {
        let binding = present_or_not_found(present(self.fetch(ctx, key).await)?, NAMES, key)?;
        settle(binding, None)
    }
}

#[async_trait]
impl Lookup for RoleBindingReconciler {
    type Filter = RoleBindingQuery;
    type Model = RoleBindingModel;

    async fn lookup(
        &self,
        ctx: &OperationContext,
        filter: &RoleBindingQuery,
    ) -> Result<RoleBindingModel> {
        let summary = "Error reading role binding";
        let filter = RoleBindingFilter {
            role_id: filter.role_id.clone(),
            resource_type: filter.resource_type.clone(),
            resource_id: filter.resource_id.clone(),
            user_subject: filter.user_subject.clone(),
            group_claim_value: filter.group_claim_value.clone(),
        };
        let bindings = call(
            ctx,
            summary,
            "Could not list role bindings",
            self.api.list_role_bindings(filter),
        )
        .await?;
        let binding = select_single(bindings, NAMES, summary, |_| true)?;
        settle(binding, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::fake::FakeConnect;
    use connectkit::Code;
    use serde_json::json;

    fn reconciler() -> (Arc<FakeConnect>, RoleBindingReconciler) {
        let fake = Arc::new(FakeConnect::new());
        (fake.clone(), RoleBindingReconciler::new(fake))
    }

    fn declared(principal: Principal) -> RoleBindingModel {
        RoleBindingModel {
            id: None,
            role_id: "viewer".to_string(),
            principal,
            resource: ResourceRef {
                kind: "TrustZone".to_string(),
                id: "tz-1".to_string(),
            },
        }
    }

    fn user(subject: &str) -> Principal {
        Principal::User {
            subject: subject.to_string(),
        }
    }

    #[test]
    fn test_exactly_one_principal() {
        let resource = json!({ "type": "TrustZone", "id": "tz-1" });
        let both = json!({
            "role_id": "viewer",
            "user": { "subject": "alice" },
            "group": { "claim_value": "admins" },
            "resource": resource,
        });
        let err = serde_json::from_value::<RoleBindingModel>(both).unwrap_err();
        assert!(err.to_string().contains("but multiple were provided"));

        let none = json!({ "role_id": "viewer", "resource": resource });
        let err = serde_json::from_value::<RoleBindingModel>(none).unwrap_err();
        assert!(err.to_string().contains("but none were provided"));

        let group = json!({
            "role_id": "viewer",
            "group": { "claim_value": "admins" },
            "resource": resource,
        });
        let model = serde_json::from_value::<RoleBindingModel>(group).unwrap();
        assert_eq!(
            model.principal,
            Principal::Group {
                claim_value: "admins".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let (fake, bindings) = reconciler();
        let ctx = OperationContext::new();

        let state = bindings.create(&ctx, &declared(user("alice"))).await.unwrap();
        let id = state.id.clone().unwrap();
        assert_eq!(
            bindings.read(&ctx, &state).await.unwrap(),
            ResourceState::Present(state.clone())
        );

        let group = Principal::Group {
            claim_value: "admins".to_string(),
        };
        let updated = bindings.update(&ctx, &state, &declared(group)).await.unwrap();
        assert_eq!(updated.id.as_deref(), Some(id.as_str()));
        assert!(matches!(
            fake.role_binding(&id).unwrap().principal,
            Some(WirePrincipal::Group(_))
        ));

        bindings.delete(&ctx, &updated).await.unwrap();
        assert!(bindings.read(&ctx, &updated).await.unwrap().is_absent());
    }

    #[tokio::test]
    async fn test_read_reflects_remote_blanks() {
        let (fake, bindings) = reconciler();
        let ctx = OperationContext::new();
        let state = bindings.create(&ctx, &declared(user("alice"))).await.unwrap();

        let id = state.id.clone().unwrap();
        fake.edit_role_binding(&id, |b| {
            b.resource = None;
            b.principal = Some(WirePrincipal::User(User::default()));
        });

        let refreshed = bindings.read(&ctx, &state).await.unwrap().into_model().unwrap();
        assert_eq!(refreshed.id.as_deref(), Some(id.as_str()));
        assert_eq!(refreshed.resource, ResourceRef::default());
        assert_eq!(refreshed.principal, user(""));
    }

    #[test]
    fn test_codec_round_trip() {
        let with_user = RoleBindingModel {
            id: Some("rb-1".to_string()),
            ..declared(user("alice"))
        };
        let with_group = declared(Principal::Group {
            claim_value: "admins".to_string(),
        });
        for model in [with_user, with_group] {
            assert_eq!(decode(encode(&model)).unwrap(), model);
        }
    }

    #[tokio::test]
    async fn test_update_without_id() {
        let (fake, bindings) = reconciler();
        let err = bindings
            .update(
                &OperationContext::new(),
                &declared(user("alice")),
                &declared(user("alice")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Role binding ID not found in state.");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_error_surfaces() {
        let (fake, bindings) = reconciler();
        let ctx = OperationContext::new();
        let state = bindings.create(&ctx, &declared(user("alice"))).await.unwrap();

        fake.fail_next(Code::PermissionDenied);
        let err = bindings.delete(&ctx, &state).await.unwrap_err();
        assert_eq!(err.to_diagnostic().summary, "Error deleting role binding");
    }

    #[tokio::test]
    async fn test_lookup_by_subject() {
        let (_fake, bindings) = reconciler();
        let ctx = OperationContext::new();
        bindings.create(&ctx, &declared(user("alice"))).await.unwrap();
        bindings.create(&ctx, &declared(user("bob"))).await.unwrap();

        let query = RoleBindingQuery {
            user_subject: Some("bob".to_string()),
            ..RoleBindingQuery::default()
        };
        let found = bindings.lookup(&ctx, &query).await.unwrap();
        assert_eq!(found.principal, user("bob"));
    }
}
