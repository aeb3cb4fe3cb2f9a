//! In-memory directory used by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use adtool::dispatcher::Connect;
use adtool::password::PasswordSource;
use adtool_core::{Error, Result};
use adtool_directory::{
    AccountControl, AccountName, Directory, DirectoryLayout, DistinguishedName, GroupEntry,
    MembershipChange, NewGroup, NewUser, UserEntry,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

pub const BASE_DN: &str = "DC=lab,DC=local";
pub const CONTAINER_DN: &str = "CN=Users,DC=lab,DC=local";

/// Every request the handlers sent, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    FindUser(String),
    FindGroup(String),
    CreateUser(String),
    CreateGroup(String),
    SetPassword(String),
    ReplaceAccountControl(String, u32),
    ChangeMembership {
        group: String,
        member: String,
        change: MembershipChange,
    },
    ListMembers(String),
}

impl Request {
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Self::FindUser(_) | Self::FindGroup(_) | Self::ListMembers(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct StoredUser {
    pub dn: String,
    pub account_name: String,
    pub account_control: Option<u32>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoredGroup {
    pub dn: String,
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Default)]
pub struct DirectoryState {
    pub users: Vec<StoredUser>,
    pub groups: Vec<StoredGroup>,
    pub requests: Vec<Request>,
    /// Returned by the next write instead of applying it.
    pub reject_next_write: Option<Error>,
    /// Returned by every request.
    pub fail_all: Option<Error>,
    pub panic_on_request: bool,
}

impl DirectoryState {
    fn user_by_dn(&mut self, dn: &str) -> Result<&mut StoredUser> {
        self.users
            .iter_mut()
            .find(|user| user.dn.eq_ignore_ascii_case(dn))
            .ok_or_else(|| Error::rejected(32, format!("0000208D: NameErr: no such object {dn}")))
    }

    fn dn_taken(&self, dn: &str) -> bool {
        self.users.iter().any(|u| u.dn.eq_ignore_ascii_case(dn))
            || self.groups.iter().any(|g| g.dn.eq_ignore_ascii_case(dn))
    }
}

/// Shared handle so tests can inspect the directory after the session is released.
#[derive(Debug, Clone, Default)]
pub struct SharedDirectory(Arc<Mutex<DirectoryState>>);

impl SharedDirectory {
    pub fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.0.lock().unwrap()
    }

    pub fn add_user(&self, account_name: &str, account_control: Option<u32>) -> String {
        let name = AccountName::parse(account_name).unwrap();
        let dn = layout().entry_dn(&name.display_name()).to_string();
        self.state().users.push(StoredUser {
            dn: dn.clone(),
            account_name: account_name.to_string(),
            account_control,
            password: None,
        });
        dn
    }

    pub fn add_group(&self, name: &str) -> String {
        let dn = layout().entry_dn(name).to_string();
        self.state().groups.push(StoredGroup {
            dn: dn.clone(),
            name: name.to_string(),
            members: Vec::new(),
        });
        dn
    }

    pub fn user(&self, account_name: &str) -> Option<StoredUser> {
        self.state()
            .users
            .iter()
            .find(|u| u.account_name == account_name)
            .cloned()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state().requests.clone()
    }

    pub fn writes(&self) -> Vec<Request> {
        self.requests().into_iter().filter(Request::is_write).collect()
    }

    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }
}

pub fn layout() -> DirectoryLayout {
    DirectoryLayout::new(
        DistinguishedName::parse(BASE_DN).unwrap(),
        DistinguishedName::parse(CONTAINER_DN).unwrap(),
        "lab.local",
    )
}

/// A session against the shared in-memory directory.
pub struct InMemoryDirectory {
    layout: DirectoryLayout,
    shared: SharedDirectory,
}

impl InMemoryDirectory {
    pub fn new(shared: SharedDirectory) -> Self {
        Self {
            layout: layout(),
            shared,
        }
    }

    fn begin(&self, request: Request) -> Result<MutexGuard<'_, DirectoryState>> {
        let mut state = self.shared.state();
        let is_write = request.is_write();
        state.requests.push(request);
        if state.panic_on_request {
            drop(state);
            panic!("simulated handler failure");
        }
        if let Some(err) = state.fail_all.clone() {
            return Err(err);
        }
        if is_write {
            if let Some(err) = state.reject_next_write.take() {
                return Err(err);
            }
        }
        Ok(state)
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    async fn find_user(&mut self, account_name: &str) -> Result<Option<UserEntry>> {
        let state = self.begin(Request::FindUser(account_name.to_string()))?;
        Ok(state
            .users
            .iter()
            .find(|u| u.account_name.eq_ignore_ascii_case(account_name))
            .map(|u| UserEntry {
                dn: DistinguishedName::parse(&u.dn).unwrap(),
                account_name: u.account_name.clone(),
                account_control: u.account_control.map(AccountControl::new),
            }))
    }

    async fn find_group(&mut self, name: &str) -> Result<Option<GroupEntry>> {
        let state = self.begin(Request::FindGroup(name.to_string()))?;
        Ok(state
            .groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .map(|g| GroupEntry {
                dn: DistinguishedName::parse(&g.dn).unwrap(),
                name: g.name.clone(),
            }))
    }

    async fn create_user(&mut self, user: &NewUser) -> Result<()> {
        let mut state = self.begin(Request::CreateUser(user.dn.to_string()))?;
        if state.dn_taken(user.dn.as_str()) {
            return Err(Error::rejected(68, "00002071: UpdErr: DSID-0305038D, problem 6005 (ENTRY_EXISTS)"));
        }
        // New accounts start out disabled until a password is set and they are enabled.
        state.users.push(StoredUser {
            dn: user.dn.to_string(),
            account_name: user.account.as_str().to_string(),
            account_control: Some(AccountControl::NORMAL_ACCOUNT | AccountControl::ACCOUNT_DISABLE),
            password: None,
        });
        Ok(())
    }

    async fn create_group(&mut self, group: &NewGroup) -> Result<()> {
        let mut state = self.begin(Request::CreateGroup(group.dn.to_string()))?;
        if state.dn_taken(group.dn.as_str()) {
            return Err(Error::rejected(68, "00002071: UpdErr: DSID-0305038D, problem 6005 (ENTRY_EXISTS)"));
        }
        state.groups.push(StoredGroup {
            dn: group.dn.to_string(),
            name: group.name.clone(),
            members: Vec::new(),
        });
        Ok(())
    }

    async fn set_password(
        &mut self,
        user_dn: &DistinguishedName,
        password: &SecretString,
    ) -> Result<()> {
        let mut state = self.begin(Request::SetPassword(user_dn.to_string()))?;
        state.user_by_dn(user_dn.as_str())?.password = Some(password.expose_secret().to_string());
        Ok(())
    }

    async fn replace_account_control(
        &mut self,
        user_dn: &DistinguishedName,
        value: AccountControl,
    ) -> Result<()> {
        let mut state = self.begin(Request::ReplaceAccountControl(
            user_dn.to_string(),
            value.bits(),
        ))?;
        state.user_by_dn(user_dn.as_str())?.account_control = Some(value.bits());
        Ok(())
    }

    async fn change_membership(
        &mut self,
        group_dn: &DistinguishedName,
        member_dn: &DistinguishedName,
        change: MembershipChange,
    ) -> Result<()> {
        let mut state = self.begin(Request::ChangeMembership {
            group: group_dn.to_string(),
            member: member_dn.to_string(),
            change,
        })?;
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.dn.eq_ignore_ascii_case(group_dn.as_str()))
            .ok_or_else(|| Error::rejected(32, "0000208D: NameErr: no such object"))?;
        let position = group
            .members
            .iter()
            .position(|m| m.eq_ignore_ascii_case(member_dn.as_str()));

        match (change, position) {
            (MembershipChange::Add, None) => group.members.push(member_dn.to_string()),
            (MembershipChange::Add, Some(_)) => {
                return Err(Error::rejected(68, "00000562: UpdErr: DSID-031A11E2, problem 6005 (ENTRY_EXISTS)"));
            }
            (MembershipChange::Remove, Some(index)) => {
                group.members.remove(index);
            }
            (MembershipChange::Remove, None) => {
                return Err(Error::rejected(53, "00000561: SvcErr: DSID-031A1256, problem 5003 (WILL_NOT_PERFORM)"));
            }
        }
        Ok(())
    }

    async fn list_members(&mut self, group_dn: &DistinguishedName) -> Result<Vec<String>> {
        let state = self.begin(Request::ListMembers(group_dn.to_string()))?;
        let Some(group) = state
            .groups
            .iter()
            .find(|g| g.dn.eq_ignore_ascii_case(group_dn.as_str()))
        else {
            return Ok(Vec::new());
        };
        Ok(group
            .members
            .iter()
            .filter_map(|member| {
                state
                    .users
                    .iter()
                    .find(|u| u.dn.eq_ignore_ascii_case(member))
                    .map(|u| u.account_name.clone())
            })
            .collect())
    }
}

/// Hands out sessions on a shared in-memory directory and counts them.
#[derive(Default)]
pub struct FakeConnect {
    pub directory: SharedDirectory,
    pub bind_error: Option<Error>,
    pub connects: AtomicUsize,
    pub releases: AtomicUsize,
}

impl FakeConnect {
    pub fn new(directory: SharedDirectory) -> Self {
        Self {
            directory,
            ..Self::default()
        }
    }

    pub fn failing_bind(directory: SharedDirectory) -> Self {
        Self {
            directory,
            bind_error: Some(Error::BindFailed(
                "Directory rejected the request (invalidCredentials, code 49): 80090308".into(),
            )),
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connect for FakeConnect {
    type Session = InMemoryDirectory;

    async fn connect(&self) -> Result<InMemoryDirectory> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.bind_error {
            Some(err) => Err(err.clone()),
            None => Ok(InMemoryDirectory::new(self.directory.clone())),
        }
    }

    async fn release(&self, _session: InMemoryDirectory) -> Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Always returns the same password and counts how often it was asked.
pub struct FixedPassword {
    password: String,
    calls: AtomicUsize,
}

impl FixedPassword {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PasswordSource for FixedPassword {
    fn new_password(&self, _account: &AccountName) -> Result<SecretString> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SecretString::from(self.password.as_str()))
    }
}

/// Behaves like an operator who aborts the prompt.
pub struct AbortedPrompt;

impl PasswordSource for AbortedPrompt {
    fn new_password(&self, _account: &AccountName) -> Result<SecretString> {
        Err(Error::InternalError("password prompt failed: interrupted".into()))
    }
}
