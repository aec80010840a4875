//! In-memory Connect backend for tests
//!
//! Behaves like the server for the fields the reconcilers care about:
//! assigns ids, fills in the caller's organization when none is given,
//! answers NOT_FOUND for unknown ids, and records every call by method name.

use async_trait::async_trait;
use connectkit::proto::role_binding::role_binding::Principal;
use connectkit::proto::{
    ApBinding, AttestationPolicy, BundleEndpointProfile, Cluster, Federation, Organization,
    RoleBinding, TrustZone,
};
use connectkit::{
    ApBindingApi, ApBindingFilter, AttestationPolicyApi, AttestationPolicyFilter, ClusterApi,
    ClusterFilter, Code, Error, FederationApi, FederationFilter, OrganizationApi,
    OrganizationFilter, Result, RoleBindingApi, RoleBindingFilter, TrustZoneApi, TrustZoneFilter,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Organization assigned to entities created without one
pub const DEFAULT_ORG: &str = "org-42";

#[derive(Default)]
struct Store {
    trust_zones: BTreeMap<String, TrustZone>,
    clusters: BTreeMap<String, Cluster>,
    federations: BTreeMap<String, Federation>,
    policies: BTreeMap<String, AttestationPolicy>,
    ap_bindings: BTreeMap<String, ApBinding>,
    role_bindings: BTreeMap<String, RoleBinding>,
    organizations: Vec<Organization>,
    calls: Vec<&'static str>,
    next_id: u32,
    fail_next: Option<Code>,
    blank_responses: bool,
}

impl Store {
    fn begin(&mut self, method: &'static str) -> Result<()> {
        self.calls.push(method);
        match self.fail_next.take() {
            Some(code) => Err(Error::status(code, format!("injected failure in {method}"))),
            None => Ok(()),
        }
    }

    fn assign_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

#[derive(Default)]
pub struct FakeConnect {
    store: Mutex<Store>,
}

fn not_found(kind: &str, id: &str) -> Error {
    Error::status(Code::NotFound, format!("{kind} {id} not found"))
}

fn matches(filter: Option<&String>, value: Option<&String>) -> bool {
    filter.is_none_or(|want| value == Some(want))
}

fn with_default_org(org_id: Option<String>) -> Option<String> {
    org_id
        .filter(|org| !org.is_empty())
        .or_else(|| Some(DEFAULT_ORG.to_string()))
}

impl FakeConnect {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Method names of every call so far
    pub fn calls(&self) -> Vec<&'static str> {
        self.store().calls.clone()
    }

    /// Fail the next call with `code`
    pub fn fail_next(&self, code: Code) {
        self.store().fail_next = Some(code);
    }

    /// Answer updates with optional attributes left empty
    pub fn blank_responses(&self) {
        self.store().blank_responses = true;
    }

    pub fn add_organization(&self, id: &str, name: &str) {
        self.store().organizations.push(Organization {
            id: Some(id.to_string()),
            name: name.to_string(),
        });
    }

    pub fn insert_policy(&self, policy: AttestationPolicy) {
        let id = policy.id.clone().unwrap_or_default();
        self.store().policies.insert(id, policy);
    }

    pub fn trust_zone(&self, id: &str) -> Option<TrustZone> {
        self.store().trust_zones.get(id).cloned()
    }

    pub fn cluster(&self, id: &str) -> Option<Cluster> {
        self.store().clusters.get(id).cloned()
    }

    pub fn policy(&self, id: &str) -> Option<AttestationPolicy> {
        self.store().policies.get(id).cloned()
    }

    pub fn ap_binding(&self, id: &str) -> Option<ApBinding> {
        self.store().ap_bindings.get(id).cloned()
    }

    pub fn role_binding(&self, id: &str) -> Option<RoleBinding> {
        self.store().role_bindings.get(id).cloned()
    }

    // Out-of-band changes, as made by another client

    pub fn edit_trust_zone(&self, id: &str, edit: impl FnOnce(&mut TrustZone)) {
        if let Some(entity) = self.store().trust_zones.get_mut(id) {
            edit(entity);
        }
    }

    pub fn edit_cluster(&self, id: &str, edit: impl FnOnce(&mut Cluster)) {
        if let Some(entity) = self.store().clusters.get_mut(id) {
            edit(entity);
        }
    }

    pub fn edit_federation(&self, id: &str, edit: impl FnOnce(&mut Federation)) {
        if let Some(entity) = self.store().federations.get_mut(id) {
            edit(entity);
        }
    }

    pub fn edit_policy(&self, id: &str, edit: impl FnOnce(&mut AttestationPolicy)) {
        if let Some(entity) = self.store().policies.get_mut(id) {
            edit(entity);
        }
    }

    pub fn edit_ap_binding(&self, id: &str, edit: impl FnOnce(&mut ApBinding)) {
        if let Some(entity) = self.store().ap_bindings.get_mut(id) {
            edit(entity);
        }
    }

    pub fn edit_role_binding(&self, id: &str, edit: impl FnOnce(&mut RoleBinding)) {
        if let Some(entity) = self.store().role_bindings.get_mut(id) {
            edit(entity);
        }
    }
}

#[async_trait]
impl TrustZoneApi for FakeConnect {
    async fn create_trust_zone(&self, mut trust_zone: TrustZone) -> Result<TrustZone> {
        let mut store = self.store();
        store.begin("CreateTrustZone")?;
        let id = store.assign_id("tz");
        trust_zone.id = Some(id.clone());
        trust_zone.org_id = with_default_org(trust_zone.org_id);
        trust_zone.bundle_endpoint_url = format!("https://{}/bundle", trust_zone.trust_domain);
        trust_zone.bundle_endpoint_profile = BundleEndpointProfile::HttpsSpiffe as i32;
        store.trust_zones.insert(id, trust_zone.clone());
        Ok(trust_zone)
    }

    async fn get_trust_zone(&self, id: &str) -> Result<TrustZone> {
        let mut store = self.store();
        store.begin("GetTrustZone")?;
        store
            .trust_zones
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("trust zone", id))
    }

    async fn list_trust_zones(&self, filter: TrustZoneFilter) -> Result<Vec<TrustZone>> {
        let mut store = self.store();
        store.begin("ListTrustZones")?;
        Ok(store
            .trust_zones
            .values()
            .filter(|tz| {
                filter.name.as_ref().is_none_or(|n| *n == tz.name)
                    && filter
                        .trust_domain
                        .as_ref()
                        .is_none_or(|d| *d == tz.trust_domain)
                    && matches(filter.org_id.as_ref(), tz.org_id.as_ref())
            })
            .cloned()
            .collect())
    }

    async fn update_trust_zone(&self, trust_zone: TrustZone) -> Result<TrustZone> {
        let mut store = self.store();
        store.begin("UpdateTrustZone")?;
        let id = trust_zone.id.clone().unwrap_or_default();
        if !store.trust_zones.contains_key(&id) {
            return Err(not_found("trust zone", &id));
        }
        store.trust_zones.insert(id, trust_zone.clone());
        let mut response = trust_zone;
        if store.blank_responses {
            response.org_id = Some(String::new());
            response.is_management_zone = false;
            response.bundle_endpoint_url.clear();
        }
        Ok(response)
    }

    async fn destroy_trust_zone(&self, id: &str) -> Result<()> {
        let mut store = self.store();
        store.begin("DestroyTrustZone")?;
        store
            .trust_zones
            .remove(id)
            .map(drop)
            .ok_or_else(|| not_found("trust zone", id))
    }
}

#[async_trait]
impl ClusterApi for FakeConnect {
    async fn create_cluster(&self, mut cluster: Cluster) -> Result<Cluster> {
        let mut store = self.store();
        store.begin("CreateCluster")?;
        let id = store.assign_id("cluster");
        cluster.id = Some(id.clone());
        cluster.org_id = with_default_org(cluster.org_id);
        store.clusters.insert(id, cluster.clone());
        Ok(cluster)
    }

    async fn get_cluster(&self, id: &str) -> Result<Cluster> {
        let mut store = self.store();
        store.begin("GetCluster")?;
        store
            .clusters
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("cluster", id))
    }

    async fn list_clusters(&self, filter: ClusterFilter) -> Result<Vec<Cluster>> {
        let mut store = self.store();
        store.begin("ListClusters")?;
        Ok(store
            .clusters
            .values()
            .filter(|c| {
                matches(filter.name.as_ref(), c.name.as_ref())
                    && matches(filter.org_id.as_ref(), c.org_id.as_ref())
                    && matches(filter.trust_zone_id.as_ref(), c.trust_zone_id.as_ref())
            })
            .cloned()
            .collect())
    }

    async fn update_cluster(&self, cluster: Cluster) -> Result<Cluster> {
        let mut store = self.store();
        store.begin("UpdateCluster")?;
        let id = cluster.id.clone().unwrap_or_default();
        if !store.clusters.contains_key(&id) {
            return Err(not_found("cluster", &id));
        }
        store.clusters.insert(id, cluster.clone());
        let mut response = cluster;
        if store.blank_responses {
            response.org_id = None;
            response.oidc_issuer_url = Some(String::new());
            response.oidc_issuer_ca_cert.clear();
        }
        Ok(response)
    }

    async fn destroy_cluster(&self, id: &str) -> Result<()> {
        let mut store = self.store();
        store.begin("DestroyCluster")?;
        store
            .clusters
            .remove(id)
            .map(drop)
            .ok_or_else(|| not_found("cluster", id))
    }
}

#[async_trait]
impl FederationApi for FakeConnect {
    async fn create_federation(&self, mut federation: Federation) -> Result<Federation> {
        let mut store = self.store();
        store.begin("CreateFederation")?;
        let id = store.assign_id("fed");
        federation.id = Some(id.clone());
        federation.org_id = with_default_org(federation.org_id);
        store.federations.insert(id, federation.clone());
        Ok(federation)
    }

    async fn get_federation(&self, id: &str) -> Result<Federation> {
        let mut store = self.store();
        store.begin("GetFederation")?;
        store
            .federations
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("federation", id))
    }

    async fn list_federations(&self, filter: FederationFilter) -> Result<Vec<Federation>> {
        let mut store = self.store();
        store.begin("ListFederations")?;
        Ok(store
            .federations
            .values()
            .filter(|f| {
                matches(filter.org_id.as_ref(), f.org_id.as_ref())
                    && matches(filter.trust_zone_id.as_ref(), f.trust_zone_id.as_ref())
                    && matches(
                        filter.remote_trust_zone_id.as_ref(),
                        f.remote_trust_zone_id.as_ref(),
                    )
            })
            .cloned()
            .collect())
    }

    async fn destroy_federation(&self, id: &str) -> Result<()> {
        let mut store = self.store();
        store.begin("DestroyFederation")?;
        store
            .federations
            .remove(id)
            .map(drop)
            .ok_or_else(|| not_found("federation", id))
    }
}

#[async_trait]
impl AttestationPolicyApi for FakeConnect {
    async fn create_attestation_policy(
        &self,
        mut policy: AttestationPolicy,
    ) -> Result<AttestationPolicy> {
        let mut store = self.store();
        store.begin("CreateAttestationPolicy")?;
        let id = store.assign_id("ap");
        policy.id = Some(id.clone());
        policy.org_id = with_default_org(policy.org_id);
        store.policies.insert(id, policy.clone());
        Ok(policy)
    }

    async fn get_attestation_policy(&self, id: &str) -> Result<AttestationPolicy> {
        let mut store = self.store();
        store.begin("GetAttestationPolicy")?;
        store
            .policies
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("attestation policy", id))
    }

    async fn list_attestation_policies(
        &self,
        filter: AttestationPolicyFilter,
    ) -> Result<Vec<AttestationPolicy>> {
        let mut store = self.store();
        store.begin("ListAttestationPolicies")?;
        Ok(store
            .policies
            .values()
            .filter(|p| {
                filter.name.as_ref().is_none_or(|n| *n == p.name)
                    && matches(filter.org_id.as_ref(), p.org_id.as_ref())
            })
            .cloned()
            .collect())
    }

    async fn update_attestation_policy(
        &self,
        policy: AttestationPolicy,
    ) -> Result<AttestationPolicy> {
        let mut store = self.store();
        store.begin("UpdateAttestationPolicy")?;
        let id = policy.id.clone().unwrap_or_default();
        if !store.policies.contains_key(&id) {
            return Err(not_found("attestation policy", &id));
        }
        store.policies.insert(id, policy.clone());
        Ok(policy)
    }

    async fn destroy_attestation_policy(&self, id: &str) -> Result<()> {
        let mut store = self.store();
        store.begin("DestroyAttestationPolicy")?;
        store
            .policies
            .remove(id)
            .map(drop)
            .ok_or_else(|| not_found("attestation policy", id))
    }
}

#[async_trait]
impl ApBindingApi for FakeConnect {
    async fn create_ap_binding(&self, mut binding: ApBinding) -> Result<ApBinding> {
        let mut store = self.store();
        store.begin("CreateAPBinding")?;
        let id = store.assign_id("apb");
        binding.id = Some(id.clone());
        binding.org_id = with_default_org(binding.org_id);
        store.ap_bindings.insert(id, binding.clone());
        Ok(binding)
    }

    async fn list_ap_bindings(&self, filter: ApBindingFilter) -> Result<Vec<ApBinding>> {
        let mut store = self.store();
        store.begin("ListAPBindings")?;
        Ok(store
            .ap_bindings
            .values()
            .filter(|b| {
                matches(filter.org_id.as_ref(), b.org_id.as_ref())
                    && matches(filter.trust_zone_id.as_ref(), b.trust_zone_id.as_ref())
                    && matches(filter.policy_id.as_ref(), b.policy_id.as_ref())
            })
            .cloned()
            .collect())
    }

    async fn update_ap_binding(&self, binding: ApBinding) -> Result<ApBinding> {
        let mut store = self.store();
        store.begin("UpdateAPBinding")?;
        let id = binding.id.clone().unwrap_or_default();
        if !store.ap_bindings.contains_key(&id) {
            return Err(not_found("attestation policy binding", &id));
        }
        store.ap_bindings.insert(id, binding.clone());
        let mut response = binding;
        if store.blank_responses {
            response.org_id = Some(String::new());
        }
        Ok(response)
    }

    async fn destroy_ap_binding(&self, id: &str) -> Result<()> {
        let mut store = self.store();
        store.begin("DestroyAPBinding")?;
        store
            .ap_bindings
            .remove(id)
            .map(drop)
            .ok_or_else(|| not_found("attestation policy binding", id))
    }
}

#[async_trait]
impl RoleBindingApi for FakeConnect {
    async fn create_role_binding(&self, mut binding: RoleBinding) -> Result<RoleBinding> {
        let mut store = self.store();
        store.begin("CreateRoleBinding")?;
        let id = store.assign_id("rb");
        binding.id.clone_from(&id);
        store.role_bindings.insert(id, binding.clone());
        Ok(binding)
    }

    async fn get_role_binding(&self, id: &str) -> Result<RoleBinding> {
        let mut store = self.store();
        store.begin("GetRoleBinding")?;
        store
            .role_bindings
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("role binding", id))
    }

    async fn list_role_bindings(&self, filter: RoleBindingFilter) -> Result<Vec<RoleBinding>> {
        let mut store = self.store();
        store.begin("ListRoleBindings")?;
        Ok(store
            .role_bindings
            .values()
            .filter(|b| {
                let resource = b.resource.clone().unwrap_or_default();
                let (subject, claim) = match &b.principal {
                    Some(Principal::User(user)) => (Some(&user.subject), None),
                    Some(Principal::Group(group)) => (None, Some(&group.claim_value)),
                    None => (None, None),
                };
                filter.role_id.as_ref().is_none_or(|r| *r == b.role_id)
                    && filter
                        .resource_type
                        .as_ref()
                        .is_none_or(|t| *t == resource.r#type)
                    && filter.resource_id.as_ref().is_none_or(|i| *i == resource.id)
                    && matches(filter.user_subject.as_ref(), subject)
                    && matches(filter.group_claim_value.as_ref(), claim)
            })
            .cloned()
            .collect())
    }

    async fn update_role_binding(&self, binding: RoleBinding) -> Result<RoleBinding> {
        let mut store = self.store();
        store.begin("UpdateRoleBinding")?;
        if !store.role_bindings.contains_key(&binding.id) {
            return Err(not_found("role binding", &binding.id));
        }
        store
            .role_bindings
            .insert(binding.id.clone(), binding.clone());
        Ok(binding)
    }

    async fn destroy_role_binding(&self, id: &str) -> Result<()> {
        let mut store = self.store();
        store.begin("DestroyRoleBinding")?;
        store
            .role_bindings
            .remove(id)
            .map(drop)
            .ok_or_else(|| not_found("role binding", id))
    }
}

#[async_trait]
impl OrganizationApi for FakeConnect {
    async fn list_organizations(&self, filter: OrganizationFilter) -> Result<Vec<Organization>> {
        let mut store = self.store();
        store.begin("ListOrganizations")?;
        Ok(store
            .organizations
            .iter()
            .filter(|o| filter.name.as_ref().is_none_or(|n| *n == o.name))
            .cloned()
            .collect())
    }
}
