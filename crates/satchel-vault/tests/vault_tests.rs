// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the account vault lifecycle and registry.

use std::sync::Arc;

use proptest::prelude::*;
use satchel_config::model::VaultConfig;
use satchel_core::{Account, Accounts, LookupError, SatchelError, StateStore, VaultStatus};
use satchel_storage::{Database, MemoryStore, SqliteStore};
use satchel_test_utils::{MockResolver, RecordingNotifier, RecordingStore, StoreOp};
use satchel_vault::crypto;
use satchel_vault::kdf;
use satchel_vault::state::{self, PersistentState, SessionState};
use satchel_vault::{AccountVault, LATEST_VERSION, SigningAccount, VaultPorts};
use secrecy::SecretString;
use serde_json::{Map, Value, json};

fn pw(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn new_account(name: &str) -> Account {
    SigningAccount::generate().to_account(Some(name.to_string()))
}

fn mapping(accounts: &[&Account]) -> Accounts {
    accounts
        .iter()
        .map(|a| (a.address.clone(), (*a).clone()))
        .collect()
}

struct Fixture {
    vault: Arc<AccountVault>,
    persistent: Arc<MemoryStore>,
    session: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    resolver: Arc<MockResolver>,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_config(VaultConfig::default()).await
    }

    async fn with_config(config: VaultConfig) -> Self {
        let persistent = Arc::new(MemoryStore::new());
        let session = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let resolver = Arc::new(MockResolver::new());
        let ports = VaultPorts::new(persistent.clone(), session.clone())
            .with_notifier(notifier.clone())
            .with_resolver(resolver.clone());
        let vault = Arc::new(AccountVault::open(ports, config).await.unwrap());
        Self {
            vault,
            persistent,
            session,
            notifier,
            resolver,
        }
    }

    /// Re-open over the same persistent store with a fresh, empty session.
    async fn reopen_without_session(&self) -> AccountVault {
        AccountVault::open(
            VaultPorts::new(self.persistent.clone(), Arc::new(MemoryStore::new())),
            VaultConfig::default(),
        )
        .await
        .unwrap()
    }

    async fn persisted(&self) -> PersistentState {
        PersistentState::load(&*self.persistent).await.unwrap()
    }

    /// Lock and unlock again, returning what the persisted vault decrypts to.
    async fn relock(&self, password: &str) -> Accounts {
        self.vault.lock_accounts().await.unwrap();
        self.vault.unlock_accounts(&pw(password)).await.unwrap();
        self.vault.accounts().await.unwrap()
    }
}

// --- Lifecycle scenarios ---

#[tokio::test]
async fn init_then_unlock_yields_initial_mapping() {
    let fx = Fixture::new().await;
    let x = new_account("x");
    fx.vault
        .init_accounts(&pw("pw1"), mapping(&[&x]))
        .await
        .unwrap();

    let persisted = fx.persisted().await;
    assert_eq!(persisted.encrypted_state_version, Some(LATEST_VERSION));
    assert_eq!(persisted.active_account_address.as_deref(), Some(x.address.as_str()));
    assert_eq!(
        persisted.active_account_public_key.as_deref(),
        Some(x.public_key.as_str())
    );

    fx.vault.lock_accounts().await.unwrap();
    assert_eq!(fx.vault.state().await, VaultStatus::Locked);
    fx.vault.unlock_accounts(&pw("pw1")).await.unwrap();

    let session = SessionState::load(&*fx.session).await.unwrap();
    assert_eq!(session.accounts, Some(mapping(&[&x])));
    assert_eq!(fx.vault.accounts().await.unwrap(), mapping(&[&x]));
}

#[tokio::test]
async fn changed_password_replaces_old_one() {
    let fx = Fixture::new().await;
    let x = new_account("x");
    fx.vault
        .init_accounts(&pw("pw1"), mapping(&[&x]))
        .await
        .unwrap();

    fx.vault.change_password(&pw("pw1"), &pw("pw2")).await.unwrap();
    assert_eq!(fx.relock("pw2").await, mapping(&[&x]));

    fx.vault.lock_accounts().await.unwrap();
    let err = fx.vault.unlock_accounts(&pw("pw1")).await.unwrap_err();
    assert!(matches!(err, SatchelError::DecryptionFailed));
    assert_eq!(fx.vault.state().await, VaultStatus::Locked);
}

#[tokio::test]
async fn change_password_checks_old_password_against_persisted_vault() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("pw1"), Accounts::new()).await.unwrap();

    let err = fx
        .vault
        .change_password(&pw("wrong"), &pw("pw2"))
        .await
        .unwrap_err();
    assert!(matches!(err, SatchelError::DecryptionFailed));

    // Nothing changed: the original password still unlocks.
    fx.relock("pw1").await;
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("right"), Accounts::new()).await.unwrap();
    fx.vault.lock_accounts().await.unwrap();

    for attempt in ["wrong", "Right", "right ", ""] {
        let err = fx.vault.unlock_accounts(&pw(attempt)).await.unwrap_err();
        assert!(
            matches!(err, SatchelError::DecryptionFailed),
            "{attempt:?} gave {err:?}"
        );
    }
    assert!(fx.session.snapshot().await.is_empty());
}

#[tokio::test]
async fn legacy_vault_is_migrated_on_unlock() {
    let fx = Fixture::new().await;
    let mut legacy = new_account("legacy");
    legacy.mnemonic = Some("abandon ability able about above absent".into());

    // A vault written before schema versioning existed: no version key.
    let salt = kdf::generate_salt().unwrap();
    let key = kdf::derive_key(b"correct", &salt);
    let sealed = crypto::seal_accounts(&mapping(&[&legacy]), &key).unwrap();
    let mut items = Map::new();
    items.insert(state::ENCRYPTED_ACCOUNTS.into(), serde_json::to_value(&sealed).unwrap());
    items.insert(state::SALT.into(), Value::String(crypto::encode(&salt)));
    items.insert(state::ACTIVE_ACCOUNT_ADDRESS.into(), json!(legacy.address));
    fx.persistent.set(items).await.unwrap();

    let vault = fx.reopen_without_session().await;
    assert_eq!(vault.state().await, VaultStatus::Locked);
    vault.unlock_accounts(&pw("correct")).await.unwrap();

    let accounts = vault.accounts().await.unwrap();
    let migrated = &accounts[&legacy.address];
    assert!(migrated.mnemonic.is_none());
    assert_eq!(migrated.private_key, legacy.private_key);
    assert_eq!(migrated.name, legacy.name);
    assert_eq!(fx.persisted().await.encrypted_state_version, Some(LATEST_VERSION));

    // The persisted ciphertext itself no longer holds the mnemonic.
    let resealed = fx.persisted().await.encrypted_accounts.unwrap();
    let stored = crypto::open_accounts(&resealed, &key).unwrap();
    assert!(stored[&legacy.address].mnemonic.is_none());
}

#[tokio::test]
async fn vault_from_newer_release_is_refused() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();
    let mut items = Map::new();
    items.insert(state::ENCRYPTED_STATE_VERSION.into(), json!(LATEST_VERSION + 1));
    fx.persistent.set(items).await.unwrap();

    let vault = fx.reopen_without_session().await;
    let err = vault.unlock_accounts(&pw("pw")).await.unwrap_err();
    assert!(matches!(err, SatchelError::UnsupportedVersion { .. }));
    assert_eq!(vault.state().await, VaultStatus::Locked);
}

#[tokio::test]
async fn session_survives_reopen() {
    let fx = Fixture::new().await;
    let x = new_account("x");
    fx.vault
        .init_accounts(&pw("pw1"), mapping(&[&x]))
        .await
        .unwrap();

    let restored = AccountVault::open(
        VaultPorts::new(fx.persistent.clone(), fx.session.clone()),
        VaultConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(restored.state().await, VaultStatus::Unlocked);
    assert_eq!(restored.accounts().await.unwrap(), mapping(&[&x]));
    assert_eq!(
        restored.active_account_address().await.unwrap().as_deref(),
        Some(x.address.as_str())
    );

    // The restored key seals exactly like the original one.
    let y = new_account("y");
    restored.add_account(y.clone()).await.unwrap();
    let vault = fx.reopen_without_session().await;
    vault.unlock_accounts(&pw("pw1")).await.unwrap();
    assert_eq!(vault.accounts().await.unwrap(), mapping(&[&x, &y]));
}

#[tokio::test]
async fn operations_in_wrong_state_fail_fast() {
    let fx = Fixture::new().await;

    let err = fx.vault.unlock_accounts(&pw("pw")).await.unwrap_err();
    assert!(matches!(
        err,
        SatchelError::WrongState {
            state: VaultStatus::Uninitialized,
            ..
        }
    ));
    assert!(fx.vault.lock_accounts().await.is_err());
    assert!(fx.vault.clear_accounts().await.is_err());

    fx.vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();
    let err = fx
        .vault
        .init_accounts(&pw("pw"), Accounts::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot initialize accounts while vault is unlocked"
    );

    fx.vault.lock_accounts().await.unwrap();
    for result in [
        fx.vault.add_account(new_account("a")).await,
        fx.vault.remove_account("0x1").await,
        fx.vault.rename_account("0x1", "n").await,
        fx.vault.switch_account("0x1").await,
        fx.vault.change_password(&pw("pw"), &pw("pw2")).await,
    ] {
        assert!(matches!(
            result,
            Err(SatchelError::WrongState {
                state: VaultStatus::Locked,
                ..
            })
        ));
    }
    assert!(fx.vault.accounts().await.is_err());
    assert!(fx.vault.active_account().await.is_err());
}

#[tokio::test]
async fn locked_vault_still_reports_active_address() {
    let fx = Fixture::new().await;
    let x = new_account("x");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&x]))
        .await
        .unwrap();
    fx.vault.lock_accounts().await.unwrap();

    assert_eq!(
        fx.vault.active_account_address().await.unwrap().as_deref(),
        Some(x.address.as_str())
    );
}

#[tokio::test]
async fn clear_returns_to_uninitialized() {
    let fx = Fixture::new().await;
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&new_account("x")]))
        .await
        .unwrap();
    fx.vault.lock_accounts().await.unwrap();
    fx.vault.clear_accounts().await.unwrap();

    assert_eq!(fx.vault.state().await, VaultStatus::Uninitialized);
    assert!(fx.persistent.snapshot().await.is_empty());
    assert_eq!(
        fx.reopen_without_session().await.state().await,
        VaultStatus::Uninitialized
    );

    // A new vault can be created with a different password.
    fx.vault.init_accounts(&pw("other"), Accounts::new()).await.unwrap();
}

#[tokio::test]
async fn interrupted_init_leaves_vault_locked() {
    let persistent = Arc::new(MemoryStore::new());
    let session = Arc::new(RecordingStore::new());
    let vault = AccountVault::open(
        VaultPorts::new(persistent.clone(), session.clone()),
        VaultConfig::default(),
    )
    .await
    .unwrap();

    session.fail_writes(true);
    let err = vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap_err();
    assert!(matches!(err, SatchelError::Storage { .. }));
    assert_eq!(vault.state().await, VaultStatus::Locked);

    session.fail_writes(false);
    vault.unlock_accounts(&pw("pw")).await.unwrap();
}

/// A vault over two recording stores whose writes can be made to fail.
struct FaultyFixture {
    vault: AccountVault,
    persistent: Arc<RecordingStore>,
    session: Arc<RecordingStore>,
    notifier: Arc<RecordingNotifier>,
}

impl FaultyFixture {
    async fn unlocked(password: &str, initial: Accounts) -> Self {
        let persistent = Arc::new(RecordingStore::new());
        let session = Arc::new(RecordingStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let vault = Self::open_over(&persistent, &session, &notifier).await;
        vault.init_accounts(&pw(password), initial).await.unwrap();
        Self {
            vault,
            persistent,
            session,
            notifier,
        }
    }

    async fn open_over(
        persistent: &Arc<RecordingStore>,
        session: &Arc<RecordingStore>,
        notifier: &Arc<RecordingNotifier>,
    ) -> AccountVault {
        AccountVault::open(
            VaultPorts::new(persistent.clone(), session.clone()).with_notifier(notifier.clone()),
            VaultConfig::default(),
        )
        .await
        .unwrap()
    }

    /// What a restarted owner sees over the same two stores.
    async fn reopen(&self) -> AccountVault {
        Self::open_over(&self.persistent, &self.session, &self.notifier).await
    }

    async fn persisted_active(&self) -> Option<String> {
        PersistentState::load(&*self.persistent)
            .await
            .unwrap()
            .active_account_address
    }
}

#[tokio::test]
async fn interrupted_password_change_never_strands_the_vault() {
    let x = new_account("x");
    let fx = FaultyFixture::unlocked("pw1", mapping(&[&x])).await;

    fx.session.fail_writes(true);
    let err = fx.vault.change_password(&pw("pw1"), &pw("pw2")).await.unwrap_err();
    assert!(matches!(err, SatchelError::Storage { .. }));
    fx.session.fail_writes(false);

    // The session still holds the key for the old salt; it must not be trusted.
    let restarted = fx.reopen().await;
    assert_eq!(restarted.state().await, VaultStatus::Locked);
    assert!(matches!(
        restarted.unlock_accounts(&pw("pw1")).await.unwrap_err(),
        SatchelError::DecryptionFailed
    ));
    restarted.unlock_accounts(&pw("pw2")).await.unwrap();

    let y = new_account("y");
    restarted.add_account(y.clone()).await.unwrap();
    restarted.lock_accounts().await.unwrap();
    restarted.unlock_accounts(&pw("pw2")).await.unwrap();
    assert_eq!(restarted.accounts().await.unwrap(), mapping(&[&x, &y]));
}

#[tokio::test]
async fn failed_password_change_keeps_the_running_vault_usable() {
    let x = new_account("x");
    let fx = FaultyFixture::unlocked("pw1", mapping(&[&x])).await;

    fx.session.fail_writes(true);
    fx.vault
        .change_password(&pw("pw1"), &pw("pw2"))
        .await
        .unwrap_err();
    fx.session.fail_writes(false);

    // The in-memory key already follows the persisted salt.
    let y = new_account("y");
    fx.vault.add_account(y.clone()).await.unwrap();
    fx.vault.lock_accounts().await.unwrap();
    fx.vault.unlock_accounts(&pw("pw2")).await.unwrap();
    assert_eq!(fx.vault.accounts().await.unwrap(), mapping(&[&x, &y]));
}

#[tokio::test]
async fn failed_session_write_keeps_active_pointer_in_sync() {
    let a = new_account("a");
    let fx = FaultyFixture::unlocked("pw", mapping(&[&a])).await;
    let b = new_account("b");

    fx.session.fail_writes(true);
    let err = fx.vault.add_account(b.clone()).await.unwrap_err();
    assert!(matches!(err, SatchelError::Storage { .. }));

    assert_eq!(fx.persisted_active().await.as_deref(), Some(b.address.as_str()));
    assert_eq!(
        fx.vault.active_account_address().await.unwrap().as_deref(),
        Some(b.address.as_str())
    );
    assert_eq!(fx.notifier.last(), Some(Some(b.public())));
    assert!(fx.vault.accounts().await.unwrap().contains_key(&b.address));

    // The session copy of the mapping is stale; a restart reads the vault.
    fx.session.fail_writes(false);
    let restarted = fx.reopen().await;
    assert_eq!(restarted.state().await, VaultStatus::Unlocked);
    assert_eq!(restarted.accounts().await.unwrap(), mapping(&[&a, &b]));
}

#[tokio::test]
async fn failed_persistent_write_changes_nothing() {
    let a = new_account("a");
    let fx = FaultyFixture::unlocked("pw", mapping(&[&a])).await;

    fx.persistent.fail_writes(true);
    fx.vault.add_account(new_account("b")).await.unwrap_err();
    fx.vault
        .update_active_account(a.clone())
        .await
        .unwrap_err();

    assert_eq!(fx.notifier.count(), 0);
    assert_eq!(fx.vault.accounts().await.unwrap(), mapping(&[&a]));
    assert_eq!(
        fx.vault.active_account_address().await.unwrap().as_deref(),
        Some(a.address.as_str())
    );
}

#[tokio::test]
async fn remove_interrupted_after_pointer_write_stays_consistent() {
    let a = new_account("a");
    let b = new_account("b");
    let fx = FaultyFixture::unlocked("pw", mapping(&[&a, &b])).await;

    // The new active pointer lands, the re-sealed vault does not.
    fx.persistent.fail_writes_after(1);
    let err = fx.vault.remove_account(&a.address).await.unwrap_err();
    assert!(matches!(err, SatchelError::Storage { .. }));
    fx.persistent.fail_writes(false);

    assert_eq!(fx.persisted_active().await.as_deref(), Some(b.address.as_str()));
    assert_eq!(
        fx.vault.active_account_address().await.unwrap().as_deref(),
        Some(b.address.as_str())
    );
    assert_eq!(fx.notifier.last(), Some(Some(b.public())));

    // The account itself survives and can be removed again.
    fx.vault.lock_accounts().await.unwrap();
    fx.vault.unlock_accounts(&pw("pw")).await.unwrap();
    assert_eq!(fx.vault.accounts().await.unwrap(), mapping(&[&a, &b]));
    fx.vault.remove_account(&a.address).await.unwrap();
    assert_eq!(fx.vault.accounts().await.unwrap(), mapping(&[&b]));
}

#[tokio::test]
async fn failed_lock_keeps_the_session() {
    let fx = FaultyFixture::unlocked("pw", mapping(&[&new_account("x")])).await;

    fx.session.fail_writes(true);
    let err = fx.vault.lock_accounts().await.unwrap_err();
    assert!(matches!(err, SatchelError::Storage { .. }));
    assert_eq!(fx.vault.state().await, VaultStatus::Unlocked);
    assert!(fx.session.snapshot().await.contains_key(state::SESSION_ENCRYPTION_KEY));

    fx.session.fail_writes(false);
    fx.vault.lock_accounts().await.unwrap();
    assert!(fx.session.snapshot().await.is_empty());
    assert_eq!(fx.reopen().await.state().await, VaultStatus::Locked);
}

// --- Registry ---

#[tokio::test]
async fn removing_active_account_promotes_first_remaining() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();
    let a = new_account("a");
    let b = new_account("b");

    fx.vault.add_account(a.clone()).await.unwrap();
    fx.vault.add_account(b.clone()).await.unwrap();
    fx.vault.switch_account(&a.address).await.unwrap();
    fx.vault.remove_account(&a.address).await.unwrap();

    assert_eq!(
        fx.vault.active_account_address().await.unwrap().as_deref(),
        Some(b.address.as_str())
    );
    assert_eq!(fx.notifier.last(), Some(Some(b.public())));
    assert_eq!(
        fx.persisted().await.active_account_address.as_deref(),
        Some(b.address.as_str())
    );
    assert_eq!(fx.relock("pw").await, mapping(&[&b]));
}

#[tokio::test]
async fn removing_last_account_unsets_active() {
    let fx = Fixture::new().await;
    let a = new_account("a");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&a]))
        .await
        .unwrap();

    fx.vault.remove_account(&a.address).await.unwrap();

    assert_eq!(fx.vault.active_account_address().await.unwrap(), None);
    assert!(fx.vault.active_account().await.unwrap().is_none());
    assert_eq!(fx.notifier.last(), Some(None));
    let persisted = fx.persisted().await;
    assert!(persisted.active_account_address.is_none());
    assert!(persisted.active_account_public_key.is_none());
    assert!(fx.relock("pw").await.is_empty());
}

#[tokio::test]
async fn removing_inactive_account_does_not_notify() {
    let fx = Fixture::new().await;
    let a = new_account("a");
    let b = new_account("b");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&a, &b]))
        .await
        .unwrap();

    fx.vault.remove_account(&b.address).await.unwrap();
    fx.vault.remove_account("0xnot-there").await.unwrap();

    assert_eq!(fx.notifier.count(), 0);
    assert_eq!(
        fx.vault.active_account_address().await.unwrap().as_deref(),
        Some(a.address.as_str())
    );
    assert_eq!(fx.relock("pw").await, mapping(&[&a]));
}

#[tokio::test]
async fn active_pointer_is_persisted_before_the_vault() {
    let persistent = Arc::new(RecordingStore::new());
    let vault = AccountVault::open(
        VaultPorts::new(persistent.clone(), Arc::new(MemoryStore::new())),
        VaultConfig::default(),
    )
    .await
    .unwrap();
    let a = new_account("a");
    let b = new_account("b");
    vault
        .init_accounts(&pw("pw"), mapping(&[&a, &b]))
        .await
        .unwrap();
    persistent.clear_ops().await;

    vault.remove_account(&a.address).await.unwrap();

    assert_eq!(
        persistent.ops().await,
        vec![
            StoreOp::Set(vec![
                state::ACTIVE_ACCOUNT_ADDRESS.to_string(),
                state::ACTIVE_ACCOUNT_PUBLIC_KEY.to_string(),
            ]),
            StoreOp::Set(vec![state::ENCRYPTED_ACCOUNTS.to_string()]),
        ]
    );
}

#[tokio::test]
async fn add_overwrites_in_place_and_becomes_active() {
    let fx = Fixture::new().await;
    let a = new_account("a");
    let b = new_account("b");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&a, &b]))
        .await
        .unwrap();

    let mut renamed_a = a.clone();
    renamed_a.name = Some("a2".into());
    fx.vault.add_account(renamed_a.clone()).await.unwrap();

    let order: Vec<String> = fx.vault.accounts().await.unwrap().keys().cloned().collect();
    assert_eq!(order, vec![a.address.clone(), b.address.clone()]);
    assert_eq!(fx.notifier.calls(), vec![Some(a.public())]);
    assert_eq!(fx.relock("pw").await, mapping(&[&renamed_a, &b]));
}

#[tokio::test]
async fn update_active_account_moves_entry_to_end() {
    let fx = Fixture::new().await;
    let a = new_account("a");
    let b = new_account("b");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&a, &b]))
        .await
        .unwrap();

    let mut updated = a.clone();
    updated.name = Some("main".into());
    fx.vault.update_active_account(updated.clone()).await.unwrap();

    let accounts = fx.relock("pw").await;
    let order: Vec<&String> = accounts.keys().collect();
    assert_eq!(order, vec![&b.address, &a.address]);
    assert_eq!(accounts[&a.address].name.as_deref(), Some("main"));
    assert_eq!(fx.notifier.last(), Some(Some(updated.public())));
}

#[tokio::test]
async fn rename_persists_without_notifying() {
    let fx = Fixture::new().await;
    let a = new_account("a");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&a]))
        .await
        .unwrap();

    fx.vault.rename_account(&a.address, "savings").await.unwrap();
    fx.vault.rename_account("0xmissing", "ghost").await.unwrap();

    assert_eq!(fx.notifier.count(), 0);
    let accounts = fx.relock("pw").await;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[&a.address].name.as_deref(), Some("savings"));
}

#[tokio::test]
async fn switch_changes_only_the_active_pointer() {
    let fx = Fixture::new().await;
    let a = new_account("a");
    let b = new_account("b");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&a, &b]))
        .await
        .unwrap();
    let sealed_before = fx.persisted().await.encrypted_accounts;

    fx.vault.switch_account(&b.address).await.unwrap();

    let persisted = fx.persisted().await;
    assert_eq!(persisted.encrypted_accounts, sealed_before);
    assert_eq!(persisted.active_account_address.as_deref(), Some(b.address.as_str()));
    assert_eq!(
        persisted.active_account_public_key.as_deref(),
        Some(b.public_key.as_str())
    );
    assert_eq!(fx.notifier.calls(), vec![Some(b.public())]);
    assert_eq!(
        fx.vault.active_public_account().await.unwrap(),
        Some(b.public())
    );
}

#[tokio::test]
async fn strict_switch_rejects_unknown_address() {
    let fx = Fixture::new().await;
    let a = new_account("a");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&a]))
        .await
        .unwrap();

    let err = fx.vault.switch_account("0xunknown").await.unwrap_err();
    assert!(matches!(err, SatchelError::AccountNotFound(ref addr) if addr == "0xunknown"));
    assert_eq!(
        fx.persisted().await.active_account_address.as_deref(),
        Some(a.address.as_str())
    );
    assert_eq!(fx.notifier.count(), 0);
}

#[tokio::test]
async fn permissive_switch_records_unknown_address() {
    let fx = Fixture::with_config(VaultConfig {
        strict_switch_account: false,
    })
    .await;
    let a = new_account("a");
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&a]))
        .await
        .unwrap();

    fx.vault.switch_account("0xunknown").await.unwrap();

    let persisted = fx.persisted().await;
    assert_eq!(persisted.active_account_address.as_deref(), Some("0xunknown"));
    assert!(persisted.active_account_public_key.is_none());
    assert_eq!(fx.notifier.count(), 0);

    let err = fx.vault.active_account().await.unwrap_err();
    assert!(matches!(err, SatchelError::ActiveAccountMissing(_)));
}

#[tokio::test]
async fn active_account_signs_with_stored_key() {
    let fx = Fixture::new().await;
    let key = SigningAccount::generate();
    fx.vault
        .init_accounts(&pw("pw"), mapping(&[&key.to_account(None)]))
        .await
        .unwrap();

    let active = fx.vault.active_account().await.unwrap().unwrap();
    assert_eq!(active.address(), key.address());
    let signature = active.sign(b"payload");
    key.verify_strict(b"payload", &signature).unwrap();
}

// --- Original-address lookup ---

#[tokio::test]
async fn lookup_not_found_uses_derived_address() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();
    let key = SigningAccount::generate();
    fx.resolver.push_not_found().await;

    let stored = fx
        .vault
        .look_up_and_add_account(&key, None, Some("twelve words here"))
        .await
        .unwrap();

    assert_eq!(stored.address, key.derived_address());
    assert!(stored.mnemonic.is_none());
    assert_eq!(
        fx.resolver.calls().await,
        vec![(key.derived_address(), Some("twelve words here".to_string()))]
    );
    assert_eq!(fx.notifier.last(), Some(Some(stored.public())));
    assert!(fx.relock("pw").await.contains_key(&key.derived_address()));
}

#[tokio::test]
async fn lookup_stores_the_name_in_one_write() {
    let persistent = Arc::new(RecordingStore::new());
    let vault = AccountVault::open(
        VaultPorts::new(persistent.clone(), Arc::new(MemoryStore::new())),
        VaultConfig::default(),
    )
    .await
    .unwrap();
    vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();
    persistent.clear_ops().await;

    let key = SigningAccount::generate();
    let stored = vault
        .look_up_and_add_account(&key, Some("savings".into()), None)
        .await
        .unwrap();

    assert_eq!(stored.name.as_deref(), Some("savings"));
    assert_eq!(persistent.ops().await.len(), 1);
    assert_eq!(
        vault.accounts().await.unwrap()[&key.derived_address()].name.as_deref(),
        Some("savings")
    );
}

#[tokio::test]
async fn mnemonics_are_never_sealed() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();
    let mut a = new_account("a");
    a.mnemonic = Some("abandon ability able".into());
    let mut b = new_account("b");
    b.mnemonic = Some("zoo zone zero".into());

    fx.vault.add_account(a.clone()).await.unwrap();
    fx.vault.update_active_account(b.clone()).await.unwrap();

    let stored = fx.relock("pw").await;
    assert_eq!(fx.persisted().await.encrypted_state_version, Some(LATEST_VERSION));
    assert!(stored.values().all(|account| account.mnemonic.is_none()));
    let cached = serde_json::to_string(&fx.session.snapshot().await).unwrap();
    assert!(!cached.contains("abandon"));
    assert!(!cached.contains("zoo zone"));
}

#[tokio::test]
async fn lookup_of_rotated_key_uses_original_address() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();
    let key = SigningAccount::generate();
    fx.resolver.push_original("0xoriginal").await;

    let stored = fx.vault.look_up_and_add_account(&key, None, None).await.unwrap();

    assert_eq!(stored.address, "0xoriginal");
    assert_eq!(stored.public_key, key.public_key_hex());
    let active = fx.vault.active_account().await.unwrap().unwrap();
    assert_eq!(active.address(), "0xoriginal");
    assert_eq!(active.derived_address(), key.derived_address());
}

#[tokio::test]
async fn lookup_failure_propagates_and_stores_nothing() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();
    fx.resolver.push_failure("node unreachable").await;

    let err = fx
        .vault
        .look_up_and_add_account(&SigningAccount::generate(), None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SatchelError::Lookup(LookupError::Other(ref msg)) if msg == "node unreachable"
    ));
    assert!(fx.vault.accounts().await.unwrap().is_empty());
    assert_eq!(fx.notifier.count(), 0);
}

// --- Concurrency ---

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_are_not_lost() {
    let fx = Fixture::new().await;
    fx.vault.init_accounts(&pw("pw"), Accounts::new()).await.unwrap();

    let accounts: Vec<Account> = (0..16).map(|i| new_account(&format!("acct-{i}"))).collect();
    let handles: Vec<_> = accounts
        .iter()
        .cloned()
        .map(|account| {
            let vault = fx.vault.clone();
            tokio::spawn(async move { vault.add_account(account).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = fx.relock("pw").await;
    assert_eq!(stored.len(), accounts.len());
    for account in &accounts {
        assert_eq!(stored.get(&account.address), Some(account));
    }
    assert_eq!(fx.notifier.count(), accounts.len());
}

// --- SQLite-backed persistence ---

#[tokio::test]
async fn vault_persists_in_sqlite_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("satchel.db");
    let path = path.to_str().unwrap();
    let a = new_account("a");

    {
        let db = Database::open(path, true).await.unwrap();
        let ports = VaultPorts::new(
            Arc::new(SqliteStore::persistent(db)),
            Arc::new(MemoryStore::new()),
        );
        let vault = AccountVault::open(ports, VaultConfig::default()).await.unwrap();
        vault.init_accounts(&pw("pw"), mapping(&[&a])).await.unwrap();
        vault.rename_account(&a.address, "renamed").await.unwrap();
    }

    let db = Database::open(path, true).await.unwrap();
    let ports = VaultPorts::new(
        Arc::new(SqliteStore::persistent(db)),
        Arc::new(MemoryStore::new()),
    );
    let vault = AccountVault::open(ports, VaultConfig::default()).await.unwrap();
    assert_eq!(vault.state().await, VaultStatus::Locked);
    vault.unlock_accounts(&pw("pw")).await.unwrap();
    let accounts = vault.accounts().await.unwrap();
    assert_eq!(accounts[&a.address].name.as_deref(), Some("renamed"));
}

// --- Properties ---

fn arb_accounts() -> impl Strategy<Value = Accounts> {
    proptest::collection::vec(
        (
            "0x[0-9a-f]{8}",
            proptest::option::of("[a-zA-Z ]{0,12}"),
            proptest::option::of("[a-z]{3,8}( [a-z]{3,8}){0,3}"),
        ),
        0..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(address, name, mnemonic)| {
                let account = Account {
                    address: address.clone(),
                    public_key: format!("{address}-pub"),
                    private_key: format!("{address}-priv"),
                    name,
                    mnemonic,
                };
                (address, account)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn sealed_accounts_open_with_the_same_password(
        accounts in arb_accounts(),
        password in "[ -~]{1,24}",
        salt in proptest::array::uniform16(any::<u8>()),
    ) {
        let sealed = crypto::seal_accounts(&accounts, &kdf::derive_key(password.as_bytes(), &salt)).unwrap();
        let opened = crypto::open_accounts(&sealed, &kdf::derive_key(password.as_bytes(), &salt)).unwrap();
        prop_assert_eq!(opened, accounts);
    }

    #[test]
    fn sealed_accounts_reject_other_passwords(
        accounts in arb_accounts(),
        password in "[a-z]{1,12}",
        other in "[A-Z]{1,12}",
    ) {
        let salt = [3u8; kdf::SALT_LEN];
        let sealed = crypto::seal_accounts(&accounts, &kdf::derive_key(password.as_bytes(), &salt)).unwrap();
        let result = crypto::open_accounts(&sealed, &kdf::derive_key(other.as_bytes(), &salt));
        prop_assert!(matches!(result, Err(SatchelError::DecryptionFailed)));
    }
}
