//! In-memory implementations of every repository port.
//!
//! [`InMemoryStore`] stands in for the canonical database and
//! [`InMemoryBridgingStore`] for the bridging database. Both can be switched
//! offline to exercise connection failures, and the bridging store can be
//! told to fail a number of inserts to drive the mirror-pending path.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use pagination::PageRequest;

use crate::domain::ports::{
    ActivityLogError, ActivityLogRepository, ActivityRecord, BridgingRepository,
    BridgingRepositoryError, GlucoseTestRepository, GlucoseTestRepositoryError,
    PatientRepository, PatientRepositoryError, PermissionRepository, PermissionRepositoryError,
    StoreHealthCheck, StoreHealthCheckError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    BridgingSnapshot, DashboardSummary, EffectivePermissions, GlucoseTest, GlucoseTestDetail,
    GlucoseTestFilter, GlucoseTestId, GlucoseTestUpdate, NewGlucoseTest, NewUser, Patient,
    PatientId, Permission, PermissionDiff, PermissionId, Role, RoleId, UserAccount, UserId,
    UserProfile, ValidationState, permission_names,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn page_slice<T>(rows: Vec<T>, page: Option<PageRequest>) -> Vec<T> {
    match page {
        None => rows,
        Some(page) => rows
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .collect(),
    }
}

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, UserAccount>,
    user_roles: BTreeMap<UserId, RoleId>,
    roles: BTreeMap<RoleId, Role>,
    permissions: BTreeMap<PermissionId, Permission>,
    grants: BTreeSet<(RoleId, PermissionId)>,
    patients: BTreeMap<PatientId, Patient>,
    tests: BTreeMap<GlucoseTestId, GlucoseTest>,
    next_user: i64,
    next_test: i64,
    grant_writes: u64,
}

impl State {
    fn detail(&self, test: &GlucoseTest) -> GlucoseTestDetail {
        let patient = test.patient_id.and_then(|id| self.patients.get(&id));
        GlucoseTestDetail {
            test: test.clone(),
            patient_name: patient.map(|p| p.name.clone()),
            patient_code: patient.and_then(|p| p.patient_code.clone()),
        }
    }

    fn newest_first(&self) -> Vec<&GlucoseTest> {
        let mut rows: Vec<&GlucoseTest> = self.tests.values().collect();
        rows.sort_by(|a, b| b.date_time.cmp(&a.date_time).then(b.id.cmp(&a.id)));
        rows
    }
}

/// Canonical store double: users, registry, patients and glucose tests.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    offline: AtomicBool,
}

/// Role ids created by [`InMemoryStore::seeded`].
pub mod seed {
    pub const ADMIN_ROLE: i64 = 1;
    pub const NURSE_ROLE: i64 = 2;
    pub const DEFAULT_ROLE: i64 = 3;
    pub const BRIDGING_ROLE: i64 = 5;
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles 1 (all permissions), 2 (create/view/update), 3 (view) and 5
    /// (bridging read), the eight named permissions and two patients.
    pub fn seeded() -> Self {
        let store = Self::new();
        let names = [
            permission_names::CREATE_TEST_GLUCOSA,
            permission_names::VIEW_TEST_GLUCOSA,
            permission_names::UPDATE_TEST_GLUCOSA,
            permission_names::DELETE_TEST_GLUCOSA,
            permission_names::ASSIGN_PERMISSION,
            permission_names::VIEW_BRIDGING_GLUCOSE_TEST,
            permission_names::VIEW_DASHBOARD,
            permission_names::CREATE_MAPPING_PATIENT,
        ];
        for (index, name) in (1_i64..).zip(names) {
            store.add_permission(index, name);
        }
        store.add_role(seed::ADMIN_ROLE, "Admin");
        store.add_role(seed::NURSE_ROLE, "Perawat");
        store.add_role(seed::DEFAULT_ROLE, "User");
        store.add_role(seed::BRIDGING_ROLE, "Bridging");
        for permission in 1..=8 {
            store.grant(seed::ADMIN_ROLE, permission);
        }
        for permission in [1, 2, 3] {
            store.grant(seed::NURSE_ROLE, permission);
        }
        store.grant(seed::DEFAULT_ROLE, 2);
        store.grant(seed::BRIDGING_ROLE, 6);
        store.add_patient(1, "Budi Santoso", Some("P-0001"));
        store.add_patient(2, "Siti Aminah", Some("P-0002"));
        store
    }

    pub fn add_role(&self, id: i64, name: &str) {
        lock(&self.state).roles.insert(
            RoleId::new(id),
            Role {
                id: RoleId::new(id),
                name: name.to_owned(),
                description: None,
            },
        );
    }

    pub fn add_permission(&self, id: i64, name: &str) {
        lock(&self.state).permissions.insert(
            PermissionId::new(id),
            Permission {
                id: PermissionId::new(id),
                name: name.to_owned(),
                description: None,
            },
        );
    }

    pub fn grant(&self, role: i64, permission: i64) {
        lock(&self.state)
            .grants
            .insert((RoleId::new(role), PermissionId::new(permission)));
    }

    pub fn add_patient(&self, id: i64, name: &str, code: Option<&str>) {
        lock(&self.state).patients.insert(
            PatientId::new(id),
            Patient {
                id: PatientId::new(id),
                name: name.to_owned(),
                patient_code: code.map(str::to_owned),
            },
        );
    }

    /// Insert a user with a cheap bcrypt hash of `password`.
    pub fn add_user(&self, name: &str, email: &str, password: &str, role: Option<i64>) -> UserProfile {
        let password_hash = match bcrypt::hash(password, super::TEST_HASH_COST) {
            Ok(hash) => hash,
            Err(error) => panic!("bcrypt hash failed: {error}"),
        };
        let mut state = lock(&self.state);
        state.next_user += 1;
        let id = UserId::new(state.next_user);
        let account = UserAccount {
            id,
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash,
        };
        let profile = account.profile();
        state.users.insert(id, account);
        if let Some(role) = role {
            state.user_roles.insert(id, RoleId::new(role));
        }
        profile
    }

    /// Drop a user and its role assignment.
    pub fn remove_user(&self, id: UserId) {
        let mut state = lock(&self.state);
        state.users.remove(&id);
        state.user_roles.remove(&id);
    }

    /// Number of role-permission writes attempted so far.
    pub fn grant_writes(&self) -> u64 {
        lock(&self.state).grant_writes
    }

    /// Every stored test, ordered by id.
    pub fn tests(&self) -> Vec<GlucoseTest> {
        lock(&self.state).tests.values().cloned().collect()
    }

    /// Overwrite `created_at` so batch projections can be arranged.
    pub fn set_created_at(&self, id: GlucoseTestId, created_at: chrono::DateTime<Utc>) {
        if let Some(test) = lock(&self.state).tests.get_mut(&id) {
            test.created_at = created_at;
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn online(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }
}

macro_rules! ensure_online {
    ($store:expr, $error:ident) => {
        if !$store.online() {
            return Err($error::connection("store offline"));
        }
    };
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, UserRepositoryError> {
        ensure_online!(self, UserRepositoryError);
        Ok(lock(&self.state)
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, UserRepositoryError> {
        ensure_online!(self, UserRepositoryError);
        Ok(lock(&self.state).users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<UserProfile>, UserRepositoryError> {
        ensure_online!(self, UserRepositoryError);
        Ok(lock(&self.state)
            .users
            .values()
            .map(UserAccount::profile)
            .collect())
    }

    async fn create_with_role(
        &self,
        user: &NewUser,
        role: RoleId,
    ) -> Result<UserAccount, UserRepositoryError> {
        ensure_online!(self, UserRepositoryError);
        let mut state = lock(&self.state);
        if state.users.values().any(|existing| existing.email == user.email) {
            return Err(UserRepositoryError::duplicate("users_email_key"));
        }
        if !state.roles.contains_key(&role) {
            return Err(UserRepositoryError::missing_reference(format!("role {role}")));
        }
        state.next_user += 1;
        let id = UserId::new(state.next_user);
        let account = UserAccount {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        };
        state.users.insert(id, account.clone());
        state.user_roles.insert(id, role);
        Ok(account)
    }

    async fn role_of(&self, id: UserId) -> Result<Option<RoleId>, UserRepositoryError> {
        ensure_online!(self, UserRepositoryError);
        Ok(lock(&self.state).user_roles.get(&id).copied())
    }

    async fn roles_of(&self, id: UserId) -> Result<Vec<Role>, UserRepositoryError> {
        ensure_online!(self, UserRepositoryError);
        let state = lock(&self.state);
        Ok(state
            .user_roles
            .get(&id)
            .and_then(|role| state.roles.get(role))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn assign_role(&self, id: UserId, role: RoleId) -> Result<(), UserRepositoryError> {
        ensure_online!(self, UserRepositoryError);
        let mut state = lock(&self.state);
        if !state.users.contains_key(&id) {
            return Err(UserRepositoryError::missing_reference(format!("user {id}")));
        }
        if !state.roles.contains_key(&role) {
            return Err(UserRepositoryError::missing_reference(format!("role {role}")));
        }
        state.user_roles.insert(id, role);
        Ok(())
    }

    async fn update_role(&self, id: UserId, role: RoleId) -> Result<bool, UserRepositoryError> {
        ensure_online!(self, UserRepositoryError);
        let mut state = lock(&self.state);
        match state.user_roles.get_mut(&id) {
            Some(current) => {
                *current = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PermissionRepository for InMemoryStore {
    async fn effective_permissions(
        &self,
        user: UserId,
    ) -> Result<EffectivePermissions, PermissionRepositoryError> {
        ensure_online!(self, PermissionRepositoryError);
        let state = lock(&self.state);
        let Some(role) = state.user_roles.get(&user).copied() else {
            return Ok(EffectivePermissions::empty());
        };
        Ok(EffectivePermissions::from_names(
            state
                .grants
                .iter()
                .filter(|(granted, _)| *granted == role)
                .filter_map(|(_, permission)| state.permissions.get(permission))
                .map(|permission| permission.name.clone()),
        ))
    }

    async fn find_role(&self, role: RoleId) -> Result<Option<Role>, PermissionRepositoryError> {
        ensure_online!(self, PermissionRepositoryError);
        Ok(lock(&self.state).roles.get(&role).cloned())
    }

    async fn permissions_for_role(
        &self,
        role: RoleId,
    ) -> Result<Vec<Permission>, PermissionRepositoryError> {
        ensure_online!(self, PermissionRepositoryError);
        let state = lock(&self.state);
        Ok(state
            .grants
            .iter()
            .filter(|(granted, _)| *granted == role)
            .filter_map(|(_, permission)| state.permissions.get(permission).cloned())
            .collect())
    }

    async fn insert_pair(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<(), PermissionRepositoryError> {
        ensure_online!(self, PermissionRepositoryError);
        let mut state = lock(&self.state);
        state.grant_writes += 1;
        if !state.roles.contains_key(&role) || !state.permissions.contains_key(&permission) {
            return Err(PermissionRepositoryError::missing_reference(format!(
                "role {role} / permission {permission}"
            )));
        }
        if !state.grants.insert((role, permission)) {
            return Err(PermissionRepositoryError::duplicate("role_permissions_pkey"));
        }
        Ok(())
    }

    async fn delete_pair(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<u64, PermissionRepositoryError> {
        ensure_online!(self, PermissionRepositoryError);
        let mut state = lock(&self.state);
        state.grant_writes += 1;
        Ok(u64::from(state.grants.remove(&(role, permission))))
    }

    async fn apply_diff(
        &self,
        role: RoleId,
        diff: &PermissionDiff,
    ) -> Result<(), PermissionRepositoryError> {
        ensure_online!(self, PermissionRepositoryError);
        let mut state = lock(&self.state);
        if let Some(missing) = diff
            .to_add
            .iter()
            .find(|permission| !state.permissions.contains_key(permission))
        {
            return Err(PermissionRepositoryError::missing_reference(format!(
                "permission {missing}"
            )));
        }
        for permission in &diff.to_remove {
            state.grants.remove(&(role, *permission));
        }
        for permission in &diff.to_add {
            state.grants.insert((role, *permission));
        }
        state.grant_writes += (diff.to_remove.len() + diff.to_add.len()) as u64;
        Ok(())
    }
}

#[async_trait]
impl PatientRepository for InMemoryStore {
    async fn find(&self, id: PatientId) -> Result<Option<Patient>, PatientRepositoryError> {
        ensure_online!(self, PatientRepositoryError);
        Ok(lock(&self.state).patients.get(&id).cloned())
    }
}

#[async_trait]
impl GlucoseTestRepository for InMemoryStore {
    async fn insert(&self, test: &NewGlucoseTest) -> Result<GlucoseTest, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let mut state = lock(&self.state);
        state.next_test += 1;
        let now = Utc::now();
        let stored = GlucoseTest {
            id: GlucoseTestId::new(state.next_test),
            date_time: test.date_time,
            value: test.value,
            unit: test.unit,
            patient_id: test.patient_id,
            device_name: test.device_name.clone(),
            method: test.method.clone(),
            validation: ValidationState::Unvalidated,
            reported: false,
            validated_by: None,
            note: test.note.clone(),
            created_at: now,
            updated_at: now,
        };
        state.tests.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find(
        &self,
        id: GlucoseTestId,
    ) -> Result<Option<GlucoseTestDetail>, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let state = lock(&self.state);
        Ok(state.tests.get(&id).map(|test| state.detail(test)))
    }

    async fn list(
        &self,
        filter: &GlucoseTestFilter,
        page: PageRequest,
    ) -> Result<(Vec<GlucoseTestDetail>, u64), GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let state = lock(&self.state);
        let matching: Vec<GlucoseTestDetail> = state
            .newest_first()
            .into_iter()
            .map(|test| state.detail(test))
            .filter(|detail| filter.matches(detail))
            .collect();
        let total = matching.len() as u64;
        Ok((page_slice(matching, Some(page)), total))
    }

    async fn list_by_patient(
        &self,
        patient: PatientId,
        page: Option<PageRequest>,
    ) -> Result<(Vec<GlucoseTest>, u64), GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let state = lock(&self.state);
        let matching: Vec<GlucoseTest> = state
            .newest_first()
            .into_iter()
            .filter(|test| test.patient_id == Some(patient))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        Ok((page_slice(matching, page), total))
    }

    async fn update(
        &self,
        id: GlucoseTestId,
        update: &GlucoseTestUpdate,
    ) -> Result<Option<GlucoseTest>, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let mut state = lock(&self.state);
        Ok(state.tests.get_mut(&id).map(|test| {
            test.date_time = update.date_time;
            test.value = update.value;
            test.unit = update.unit;
            test.updated_at = Utc::now();
            test.clone()
        }))
    }

    async fn delete(&self, id: GlucoseTestId) -> Result<bool, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        Ok(lock(&self.state).tests.remove(&id).is_some())
    }

    async fn mark_validated(
        &self,
        id: GlucoseTestId,
        validator: &str,
    ) -> Result<bool, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let mut state = lock(&self.state);
        match state.tests.get_mut(&id) {
            Some(test) if test.validation == ValidationState::Unvalidated => {
                test.validation = ValidationState::Validated;
                test.validated_by = Some(validator.to_owned());
                test.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_reported(&self, id: GlucoseTestId) -> Result<bool, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let mut state = lock(&self.state);
        Ok(state
            .tests
            .get_mut(&id)
            .map(|test| {
                test.reported = true;
                test.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn validated_snapshots(
        &self,
    ) -> Result<Vec<BridgingSnapshot>, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        Ok(lock(&self.state)
            .tests
            .values()
            .filter(|test| test.validation.is_validated())
            .map(GlucoseTest::to_bridging)
            .collect())
    }

    async fn summary(&self) -> Result<DashboardSummary, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let state = lock(&self.state);
        let validated = state
            .tests
            .values()
            .filter(|test| test.validation.is_validated())
            .count() as u64;
        let total = state.tests.len() as u64;
        Ok(DashboardSummary::new(validated, total - validated))
    }

    async fn monthly_counts(&self, year: i32) -> Result<Vec<(u32, u64)>, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
        for test in lock(&self.state).tests.values() {
            if test.date_time.year() == year {
                *counts.entry(test.date_time.month()).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn latest_unreported_batch(
        &self,
    ) -> Result<Vec<GlucoseTestDetail>, GlucoseTestRepositoryError> {
        ensure_online!(self, GlucoseTestRepositoryError);
        let state = lock(&self.state);
        let Some(day) = state
            .tests
            .values()
            .filter(|test| !test.validation.is_validated() && !test.reported)
            .map(|test| test.created_at.date_naive())
            .max()
        else {
            return Ok(Vec::new());
        };
        let mut batch: Vec<&GlucoseTest> = state
            .tests
            .values()
            .filter(|test| test.created_at.date_naive() == day)
            .collect();
        batch.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(batch.into_iter().map(|test| state.detail(test)).collect())
    }
}

#[async_trait]
impl StoreHealthCheck for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreHealthCheckError> {
        ensure_online!(self, StoreHealthCheckError);
        Ok(())
    }
}

/// Bridging store double keyed by test id.
#[derive(Default)]
pub struct InMemoryBridgingStore {
    rows: Mutex<BTreeMap<GlucoseTestId, BridgingSnapshot>>,
    offline: AtomicBool,
    failing_inserts: AtomicU32,
}

impl InMemoryBridgingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` inserts fail with a connection error.
    pub fn fail_next_inserts(&self, count: u32) {
        self.failing_inserts.store(count, Ordering::SeqCst);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Mirrored rows, ordered by id.
    pub fn rows(&self) -> Vec<BridgingSnapshot> {
        lock(&self.rows).values().cloned().collect()
    }

    /// Insert a row directly, bypassing fault injection.
    pub fn seed(&self, snapshot: BridgingSnapshot) {
        lock(&self.rows).insert(snapshot.id, snapshot);
    }

    fn online(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BridgingRepository for InMemoryBridgingStore {
    async fn insert(&self, snapshot: &BridgingSnapshot) -> Result<(), BridgingRepositoryError> {
        ensure_online!(self, BridgingRepositoryError);
        if self.take_injected_failure() {
            return Err(BridgingRepositoryError::connection("injected insert failure"));
        }
        let mut rows = lock(&self.rows);
        if rows.contains_key(&snapshot.id) {
            return Err(BridgingRepositoryError::duplicate("glucosa_test_pkey"));
        }
        rows.insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    async fn existing_ids(
        &self,
        ids: &[GlucoseTestId],
    ) -> Result<Vec<GlucoseTestId>, BridgingRepositoryError> {
        ensure_online!(self, BridgingRepositoryError);
        let rows = lock(&self.rows);
        Ok(ids.iter().copied().filter(|id| rows.contains_key(id)).collect())
    }

    async fn replace_all(
        &self,
        snapshots: &[BridgingSnapshot],
    ) -> Result<u64, BridgingRepositoryError> {
        ensure_online!(self, BridgingRepositoryError);
        let mut rows = lock(&self.rows);
        rows.clear();
        rows.extend(snapshots.iter().map(|s| (s.id, s.clone())));
        Ok(rows.len() as u64)
    }

    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<BridgingSnapshot>, u64), BridgingRepositoryError> {
        ensure_online!(self, BridgingRepositoryError);
        let rows = lock(&self.rows);
        let ordered: Vec<BridgingSnapshot> = rows.values().rev().cloned().collect();
        let total = ordered.len() as u64;
        Ok((page_slice(ordered, Some(page)), total))
    }

    async fn find(
        &self,
        id: GlucoseTestId,
    ) -> Result<Option<BridgingSnapshot>, BridgingRepositoryError> {
        ensure_online!(self, BridgingRepositoryError);
        Ok(lock(&self.rows).get(&id).cloned())
    }
}

#[async_trait]
impl StoreHealthCheck for InMemoryBridgingStore {
    async fn ping(&self) -> Result<(), StoreHealthCheckError> {
        ensure_online!(self, StoreHealthCheckError);
        Ok(())
    }
}

/// Activity sink that keeps entries in memory.
#[derive(Default)]
pub struct RecordingActivityLog {
    entries: Mutex<Vec<ActivityRecord>>,
    failing: AtomicBool,
}

impl RecordingActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ActivityRecord> {
        lock(&self.entries).clone()
    }

    /// Make every write fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActivityLogRepository for RecordingActivityLog {
    async fn record(&self, entry: &ActivityRecord) -> Result<(), ActivityLogError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ActivityLogError::write("sink rejected entry"));
        }
        lock(&self.entries).push(entry.clone());
        Ok(())
    }
}
